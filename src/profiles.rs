use std::borrow::Cow;

use crate::{HorseIndex, HorseProfile, JockeyIndex, JockeyProfile};

/// Percent-decodes a route segment. Segments that do not decode to UTF-8 are used as-is.
pub(crate) fn decode_segment(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(raw),
    }
}

pub(crate) fn find_horse_named<'a>(index: &'a HorseIndex, name: &str) -> Option<&'a HorseProfile> {
    index.horses.iter().find(|horse| horse.name == name)
}

pub(crate) fn find_jockey_named<'a>(index: &'a JockeyIndex, name: &str) -> Option<&'a JockeyProfile> {
    index.jockeys.iter().find(|jockey| jockey.name == name)
}

/// Looks a horse up by a raw (possibly percent-encoded) route segment.
pub(crate) fn find_horse<'a>(index: &'a HorseIndex, raw_name: &str) -> Option<&'a HorseProfile> {
    find_horse_named(index, &decode_segment(raw_name))
}

pub(crate) fn find_jockey<'a>(index: &'a JockeyIndex, raw_name: &str) -> Option<&'a JockeyProfile> {
    find_jockey_named(index, &decode_segment(raw_name))
}

/// Empty profile shown under the requested name when the lookup misses.
pub(crate) fn horse_or_empty(index: Option<&HorseIndex>, name: &str) -> HorseProfile {
    index
        .and_then(|index| find_horse_named(index, name))
        .cloned()
        .unwrap_or_else(|| HorseProfile {
            name: name.to_string(),
            ..HorseProfile::default()
        })
}

pub(crate) fn jockey_or_empty(index: Option<&JockeyIndex>, name: &str) -> JockeyProfile {
    index
        .and_then(|index| find_jockey_named(index, name))
        .cloned()
        .unwrap_or_else(|| JockeyProfile {
            name: name.to_string(),
            ..JockeyProfile::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn horses() -> HorseIndex {
        serde_json::from_value(json!({"horses": [
            {"name": "ドウデュース", "father": "ハーツクライ", "pastRaces": [{"date": "2024/11/24", "rank": 1}]},
            {"name": "Equinox", "father": "Kitasan Black"}
        ]}))
        .unwrap()
    }

    #[test]
    fn decodes_percent_encoded_names() {
        let encoded = urlencoding::encode("ドウデュース").into_owned();
        let index = horses();
        let horse = find_horse(&index, &encoded).unwrap();
        assert_eq!(horse.father, "ハーツクライ");
        assert_eq!(horse.past_races[0].rank, "1");
    }

    #[test]
    fn matches_names_exactly() {
        let index = horses();
        assert!(find_horse(&index, "Equinox").is_some());
        assert!(find_horse(&index, "equinox").is_none());
        assert!(find_horse(&index, "Equi").is_none());
    }

    #[test]
    fn invalid_encoding_falls_back_to_raw_text() {
        assert_eq!(decode_segment("%FF%FE"), "%FF%FE");
        assert_eq!(decode_segment("a%20b"), "a b");
    }

    #[test]
    fn missing_jockey_yields_empty_profile_with_name() {
        let index: JockeyIndex =
            serde_json::from_value(json!({"jockeys": [{"name": "武豊", "height": "170"}]})).unwrap();
        assert_eq!(jockey_or_empty(Some(&index), "武豊").height, "170");
        let missing = jockey_or_empty(Some(&index), "C.ルメール");
        assert_eq!(missing.name, "C.ルメール");
        assert!(find_jockey(&index, "%E6%AD%A6%E8%B1%8A").is_some());
        assert!(missing.stats_current.is_none());
        assert_eq!(horse_or_empty(None, "Equinox").name, "Equinox");
    }
}
