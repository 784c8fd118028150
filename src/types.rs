use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::{ViewError, ViewResult};

pub(crate) const PLACEHOLDER_RACE_TITLE: &str = "レース情報が見つかりません";

// ── Scalar helpers ───────────────────────────────────────────────────────

/// Text form of an exported scalar. The exporter is loose about types, so
/// `3`, `3.0` and `"3"` all read back as `"3"`.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// JS-style truthiness for identifier fields.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First truthy candidate wins, in the order given.
pub(crate) fn first_truthy(candidates: &[&Value]) -> Option<String> {
    candidates
        .iter()
        .find(|value| is_truthy(value))
        .map(|value| scalar_text(value))
}

fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value))
}

fn de_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Race card ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Horse {
    #[serde(deserialize_with = "de_text")]
    pub(crate) num: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) name: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) waku: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) waku_color: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) serei: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) weight: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) jockey: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) trainer: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) bataiju: String,
    #[serde(deserialize_with = "de_text", skip_serializing_if = "String::is_empty")]
    pub(crate) odds: String,
    #[serde(deserialize_with = "de_text", skip_serializing_if = "String::is_empty")]
    pub(crate) father: String,
    #[serde(deserialize_with = "de_text", skip_serializing_if = "String::is_empty")]
    pub(crate) mother: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Race {
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) race_id: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) id: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) race_number: Value,
    #[serde(rename = "raceNum", skip_serializing_if = "Value::is_null")]
    pub(crate) race_num: Value,
    #[serde(deserialize_with = "de_text")]
    pub(crate) title: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) start_time: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) time: Value,
    #[serde(deserialize_with = "de_text")]
    pub(crate) course_distance: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) surface: String,
    #[serde(deserialize_with = "de_text", skip_serializing_if = "String::is_empty")]
    pub(crate) status: String,
    #[serde(deserialize_with = "de_list")]
    pub(crate) horses: Vec<Horse>,
}

impl Race {
    /// Stand-in rendered when a lookup misses, so the card table always has a race.
    pub(crate) fn placeholder() -> Self {
        Race {
            title: PLACEHOLDER_RACE_TITLE.to_string(),
            race_number: Value::String(String::new()),
            start_time: Value::String(String::new()),
            ..Race::default()
        }
    }

    pub(crate) fn number(&self) -> Option<String> {
        first_truthy(&[&self.race_number, &self.race_num])
    }

    pub(crate) fn start(&self) -> String {
        first_truthy(&[&self.start_time, &self.time]).unwrap_or_default()
    }

    pub(crate) fn identifier(&self) -> Option<String> {
        first_truthy(&[&self.race_id, &self.id])
    }

    pub(crate) fn is_placeholder(&self) -> bool {
        self.title == PLACEHOLDER_RACE_TITLE && self.horses.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Venue {
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) venue: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) name: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) venue_label: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) session: Value,
    #[serde(deserialize_with = "de_list")]
    pub(crate) races: Vec<Race>,
}

impl Venue {
    pub(crate) fn identifier(&self) -> Option<String> {
        first_truthy(&[&self.venue, &self.name])
    }

    pub(crate) fn label(&self) -> String {
        first_truthy(&[&self.venue_label, &self.session])
            .or_else(|| self.identifier())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct RaceDay {
    #[serde(deserialize_with = "de_text")]
    pub(crate) date: String,
    #[serde(deserialize_with = "de_list")]
    pub(crate) venues: Vec<Venue>,
}

/// Day-keyed venue groups in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct DayMap(pub(crate) Vec<(String, RaceDay)>);

impl DayMap {
    fn from_object(object: Map<String, Value>) -> ViewResult<Self> {
        let mut days = Vec::with_capacity(object.len());
        for (key, value) in object {
            days.push((key, serde_json::from_value(value)?));
        }
        Ok(DayMap(days))
    }
}

impl Serialize for DayMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, day) in &self.0 {
            map.serialize_entry(key, day)?;
        }
        map.end()
    }
}

/// The two exported shapes a race document can take. Exports in the wild
/// often carry both, so a document yields every layout it has.
#[derive(Debug, Clone, Copy)]
pub(crate) enum VenueLayout<'a> {
    DayGrouped(&'a [(String, RaceDay)]),
    FlatVenues(&'a [Venue]),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub(crate) struct RaceDocument {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(crate) date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(crate) generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) days: Option<DayMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) venues: Option<Vec<Venue>>,
}

impl RaceDocument {
    pub(crate) fn from_value(value: Value) -> ViewResult<Self> {
        let Value::Object(mut root) = value else {
            return Err(ViewError::Parse("race document root is not an object".into()));
        };
        let date = root.get("date").map(scalar_text).unwrap_or_default();
        let generated_at = root.get("generated_at").map(scalar_text).unwrap_or_default();

        let venues = match root.remove("venues") {
            Some(list @ Value::Array(_)) => Some(serde_json::from_value::<Vec<Venue>>(list)?),
            _ => None,
        };

        let days = match root.remove("days") {
            Some(Value::Object(object)) => Some(DayMap::from_object(object)?),
            _ if venues.is_none() => {
                // Older exports put the day keys directly at the root.
                let grouped: Map<String, Value> = root
                    .into_iter()
                    .filter(|(_, value)| value.get("venues").is_some_and(Value::is_array))
                    .collect();
                if grouped.is_empty() {
                    None
                } else {
                    Some(DayMap::from_object(grouped)?)
                }
            }
            _ => None,
        };

        Ok(RaceDocument {
            date,
            generated_at,
            days,
            venues,
        })
    }

    pub(crate) fn from_json(text: &str) -> ViewResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Layouts in resolution order: day-grouped first, then the flat root list.
    pub(crate) fn layouts(&self) -> Vec<VenueLayout<'_>> {
        let mut layouts = Vec::with_capacity(2);
        if let Some(days) = &self.days {
            layouts.push(VenueLayout::DayGrouped(&days.0));
        }
        if let Some(venues) = &self.venues {
            layouts.push(VenueLayout::FlatVenues(venues));
        }
        layouts
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.days.as_ref().is_none_or(|days| days.0.is_empty())
            && self.venues.as_ref().is_none_or(|venues| venues.is_empty())
    }
}

impl<'de> Deserialize<'de> for RaceDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RaceDocument::from_value(value).map_err(serde::de::Error::custom)
    }
}

// ── Profiles ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct PastRace {
    #[serde(deserialize_with = "de_text")]
    pub(crate) date: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) venue: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) title: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) distance: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) track: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) total: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) popularity: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) rank: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) jockey: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) weight: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) bataiju: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) time: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) winner: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct HorseProfile {
    #[serde(deserialize_with = "de_text")]
    pub(crate) name: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) serei: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) trainer: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) father: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) mother: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) birthday: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) color: String,
    #[serde(rename = "pastRaces", deserialize_with = "de_list")]
    pub(crate) past_races: Vec<PastRace>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct StatsTable {
    #[serde(deserialize_with = "de_list")]
    pub(crate) headers: Vec<String>,
    #[serde(deserialize_with = "de_list")]
    pub(crate) rows: Vec<Vec<String>>,
}

/// A jockey stats entry: the scraped table, or the one-line summary the
/// exporter falls back to when the page had no table.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum JockeyStats {
    Table(StatsTable),
    Text(String),
}

/// The exporter writes `""` or `{}` when it found nothing.
fn de_stats<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<JockeyStats>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(object) if object.contains_key("headers") || object.contains_key("rows") => {
            serde_json::from_value(Value::Object(object))
                .map(|table| Some(JockeyStats::Table(table)))
                .map_err(serde::de::Error::custom)
        }
        Value::String(text) if !text.trim().is_empty() => Ok(Some(JockeyStats::Text(text))),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct JockeyProfile {
    #[serde(deserialize_with = "de_text")]
    pub(crate) name: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) birthday: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) height: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) weight: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) first_license: String,
    #[serde(deserialize_with = "de_stats", skip_serializing_if = "Option::is_none")]
    pub(crate) stats_current: Option<JockeyStats>,
    #[serde(deserialize_with = "de_stats", skip_serializing_if = "Option::is_none")]
    pub(crate) stats_total: Option<JockeyStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct HorseIndex {
    #[serde(deserialize_with = "de_list")]
    pub(crate) horses: Vec<HorseProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JockeyIndex {
    #[serde(deserialize_with = "de_list")]
    pub(crate) jockeys: Vec<JockeyProfile>,
}

// ── Refresh job ──────────────────────────────────────────────────────────

/// Body of the refresh POST. Forwarded to the job runner as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct RefreshOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    pub(crate) playwright: bool,
    pub(crate) allow_partial: bool,
    pub(crate) all_venues: bool,
    pub(crate) fetch_horse_detail: bool,
    pub(crate) fetch_jockey_detail: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            target: None,
            venue: None,
            url: None,
            playwright: false,
            allow_partial: true,
            all_venues: true,
            fetch_horse_detail: true,
            fetch_jockey_detail: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RefreshResponse {
    #[serde(deserialize_with = "de_text")]
    pub(crate) status: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) reason: String,
    #[serde(deserialize_with = "de_text")]
    pub(crate) generated_at: String,
}
