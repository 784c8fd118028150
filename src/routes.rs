use crate::decode_segment;

/// Client-side route surface. Parameters are held decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    RaceList,
    Race { venue: String, race_number: String },
    Horse { name: String },
    Jockey { name: String },
    About,
    Help,
}

/// Splits a request target into path and query.
pub(crate) fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

impl Route {
    pub(crate) fn parse(target: &str) -> Option<Route> {
        let (path, _) = split_target(target);
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Some(Route::RaceList);
        }
        let segments: Vec<String> = trimmed
            .split('/')
            .map(|seg| decode_segment(seg).into_owned())
            .collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return None;
        }
        match segments.as_slice() {
            [page, venue, num] if page == "race" => Some(Route::Race {
                venue: venue.clone(),
                race_number: num.clone(),
            }),
            [page, name] if page == "horse" => Some(Route::Horse { name: name.clone() }),
            [page, name] if page == "jockey" => Some(Route::Jockey { name: name.clone() }),
            [page] if page == "about" => Some(Route::About),
            [page] if page == "help" => Some(Route::Help),
            _ => None,
        }
    }

    pub(crate) fn href(&self) -> String {
        match self {
            Route::RaceList => "/".to_string(),
            Route::Race { venue, race_number } => format!(
                "/race/{}/{}",
                urlencoding::encode(venue),
                urlencoding::encode(race_number)
            ),
            Route::Horse { name } => format!("/horse/{}", urlencoding::encode(name)),
            Route::Jockey { name } => format!("/jockey/{}", urlencoding::encode(name)),
            Route::About => "/about".to_string(),
            Route::Help => "/help".to_string(),
        }
    }
}
