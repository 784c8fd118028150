use std::fmt::Display;

use crate::{Race, RaceDocument, Venue, VenueLayout};

/// One row of the race list: where a race sits in the document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RaceEntry<'a> {
    pub(crate) day_key: Option<&'a str>,
    pub(crate) day_date: Option<&'a str>,
    pub(crate) venue: &'a Venue,
    pub(crate) race: &'a Race,
}

fn venue_matches(venue: &Venue, venue_id: &str) -> bool {
    venue.identifier().is_some_and(|id| id == venue_id)
}

fn race_matches(race: &Race, race_number: &str) -> bool {
    race.number().is_some_and(|num| num == race_number)
}

fn venues_of<'a>(layout: VenueLayout<'a>) -> Box<dyn Iterator<Item = &'a Venue> + 'a> {
    match layout {
        VenueLayout::DayGrouped(days) => Box::new(days.iter().flat_map(|(_, day)| day.venues.iter())),
        VenueLayout::FlatVenues(venues) => Box::new(venues.iter()),
    }
}

/// Finds a race by venue and race number, trying the day-grouped layout before
/// the flat one. Identifiers compare as strings, so a stored `3` matches `"3"`.
pub(crate) fn locate<'a>(
    document: &'a RaceDocument,
    venue_id: &str,
    race_number: impl Display,
) -> Option<&'a Race> {
    let race_number = race_number.to_string();
    document.layouts().into_iter().find_map(|layout| {
        venues_of(layout)
            .filter(|venue| venue_matches(venue, venue_id))
            .find_map(|venue| venue.races.iter().find(|race| race_matches(race, &race_number)))
    })
}

/// Like [`locate`], but a miss yields the placeholder race instead of `None`.
pub(crate) fn locate_or_placeholder(
    document: Option<&RaceDocument>,
    venue_id: &str,
    race_number: impl Display,
) -> Race {
    document
        .and_then(|doc| locate(doc, venue_id, race_number))
        .cloned()
        .unwrap_or_else(Race::placeholder)
}

pub(crate) fn venue_of<'a>(document: &'a RaceDocument, venue_id: &str) -> Option<&'a Venue> {
    document
        .layouts()
        .into_iter()
        .find_map(|layout| venues_of(layout).find(|venue| venue_matches(venue, venue_id)))
}

/// Flattens the document for the list view. Uses the day-grouped layout when the
/// document has one, otherwise the flat venue list.
pub(crate) fn list_entries(document: &RaceDocument) -> Vec<RaceEntry<'_>> {
    let mut entries = Vec::new();
    let Some(layout) = document.layouts().into_iter().next() else {
        return entries;
    };
    match layout {
        VenueLayout::DayGrouped(days) => {
            for (key, day) in days {
                for venue in &day.venues {
                    for race in &venue.races {
                        entries.push(RaceEntry {
                            day_key: Some(key.as_str()),
                            day_date: Some(day.date.as_str()),
                            venue,
                            race,
                        });
                    }
                }
            }
        }
        VenueLayout::FlatVenues(venues) => {
            for venue in venues {
                for race in &venue.races {
                    entries.push(RaceEntry {
                        day_key: None,
                        day_date: None,
                        venue,
                        race,
                    });
                }
            }
        }
    }
    entries
}
