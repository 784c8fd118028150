use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

/// Columns of the race card table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Column {
    Waku,
    Num,
    Mark,
    Name,
    Serei,
    Weight,
    Jockey,
    Trainer,
    Bataiju,
    Odds,
}

impl Column {
    pub(crate) const ALL: [Column; 10] = [
        Column::Waku,
        Column::Num,
        Column::Mark,
        Column::Name,
        Column::Serei,
        Column::Weight,
        Column::Jockey,
        Column::Trainer,
        Column::Bataiju,
        Column::Odds,
    ];

    pub(crate) fn key(self) -> &'static str {
        match self {
            Column::Waku => "waku",
            Column::Num => "num",
            Column::Mark => "mark",
            Column::Name => "name",
            Column::Serei => "serei",
            Column::Weight => "weight",
            Column::Jockey => "jockey",
            Column::Trainer => "trainer",
            Column::Bataiju => "bataiju",
            Column::Odds => "odds",
        }
    }

    pub(crate) fn header(self) -> &'static str {
        match self {
            Column::Waku => "枠",
            Column::Num => "馬番",
            Column::Mark => "印",
            Column::Name => "馬名",
            Column::Serei => "性齢",
            Column::Weight => "斤量",
            Column::Jockey => "騎手",
            Column::Trainer => "調教師",
            Column::Bataiju => "馬体重",
            Column::Odds => "オッズ",
        }
    }

    fn visible_by_default(self) -> bool {
        !matches!(self, Column::Odds)
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Column::ALL
            .into_iter()
            .find(|col| col.key().eq_ignore_ascii_case(needle) || col.header() == needle)
            .ok_or_else(|| format!("unknown column: {needle}"))
    }
}

/// Yosou marks a reader can put on an entrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Mark {
    Honmei,
    Taikou,
    Tanana,
    Renka,
    Hoshi,
    Check,
    Keshi,
}

impl Mark {
    pub(crate) const ALL: [Mark; 7] = [
        Mark::Honmei,
        Mark::Taikou,
        Mark::Tanana,
        Mark::Renka,
        Mark::Hoshi,
        Mark::Check,
        Mark::Keshi,
    ];

    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Mark::Honmei => "◎",
            Mark::Taikou => "○",
            Mark::Tanana => "▲",
            Mark::Renka => "△",
            Mark::Hoshi => "☆",
            Mark::Check => "✓",
            Mark::Keshi => "消",
        }
    }

    pub(crate) fn key(self) -> &'static str {
        match self {
            Mark::Honmei => "honmei",
            Mark::Taikou => "taikou",
            Mark::Tanana => "tanana",
            Mark::Renka => "renka",
            Mark::Hoshi => "hoshi",
            Mark::Check => "check",
            Mark::Keshi => "keshi",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Mark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Mark::ALL
            .into_iter()
            .find(|mark| mark.symbol() == needle || mark.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown mark: {needle}"))
    }
}

/// Parses `num:mark` or `num=mark`. An empty mark clears the entry.
pub(crate) fn parse_mark_assignment(raw: &str) -> Result<(String, Option<Mark>), String> {
    let Some((num, mark)) = raw.split_once(':').or_else(|| raw.split_once('=')) else {
        return Err(format!("expected <num>:<mark>, got '{raw}'"));
    };
    let num = num.trim();
    if num.is_empty() {
        return Err(format!("missing horse number in '{raw}'"));
    }
    let mark = if mark.trim().is_empty() {
        None
    } else {
        Some(mark.parse::<Mark>()?)
    };
    Ok((num.to_string(), mark))
}

/// UI-only state for one race card view. Owned by the view that renders it and
/// dropped with it; never written back to the document or the backend.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ViewState {
    visible: BTreeSet<Column>,
    marks: BTreeMap<String, Mark>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            visible: Column::ALL
                .into_iter()
                .filter(|col| col.visible_by_default())
                .collect(),
            marks: BTreeMap::new(),
        }
    }
}

impl ViewState {
    pub(crate) fn is_visible(&self, column: Column) -> bool {
        self.visible.contains(&column)
    }

    pub(crate) fn set_visible(&mut self, column: Column, visible: bool) {
        if visible {
            self.visible.insert(column);
        } else {
            self.visible.remove(&column);
        }
    }

    pub(crate) fn toggle(&mut self, column: Column) -> bool {
        let next = !self.is_visible(column);
        self.set_visible(column, next);
        next
    }

    pub(crate) fn visible_columns(&self) -> Vec<Column> {
        self.visible.iter().copied().collect()
    }

    pub(crate) fn set_mark(&mut self, num: &str, mark: Mark) {
        self.marks.insert(num.to_string(), mark);
    }

    pub(crate) fn clear_mark(&mut self, num: &str) -> Option<Mark> {
        self.marks.remove(num)
    }

    pub(crate) fn mark_for(&self, num: &str) -> Option<Mark> {
        self.marks.get(num).copied()
    }

    pub(crate) fn marks(&self) -> impl Iterator<Item = (&str, Mark)> {
        self.marks.iter().map(|(num, mark)| (num.as_str(), *mark))
    }

    /// Builds state from a query string. `view=1` means the `show` params list
    /// every visible column (a submitted checkbox form); otherwise `show` and
    /// `hide` adjust the defaults. Unknown columns and marks are ignored.
    pub(crate) fn from_query(query: &str) -> Self {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let mut state = ViewState::default();
        if pairs.iter().any(|(key, value)| key == "view" && value == "1") {
            state.visible.clear();
        }
        for (key, value) in &pairs {
            match key.as_str() {
                "show" => {
                    for col in value.split(',').filter_map(|c| c.parse::<Column>().ok()) {
                        state.set_visible(col, true);
                    }
                }
                "hide" => {
                    for col in value.split(',').filter_map(|c| c.parse::<Column>().ok()) {
                        state.set_visible(col, false);
                    }
                }
                "mark" => match parse_mark_assignment(value) {
                    Ok((num, Some(mark))) => state.set_mark(&num, mark),
                    Ok((num, None)) => {
                        state.clear_mark(&num);
                    }
                    Err(_) => {}
                },
                _ => {}
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hide_only_odds() {
        let state = ViewState::default();
        assert!(state.is_visible(Column::Name));
        assert!(state.is_visible(Column::Mark));
        assert!(!state.is_visible(Column::Odds));
        assert_eq!(state.visible_columns().len(), Column::ALL.len() - 1);
    }

    #[test]
    fn toggle_flips_visibility() {
        let mut state = ViewState::default();
        assert!(!state.toggle(Column::Jockey));
        assert!(!state.is_visible(Column::Jockey));
        assert!(state.toggle(Column::Jockey));
        assert!(state.is_visible(Column::Jockey));
    }

    #[test]
    fn visible_columns_keep_display_order() {
        let mut state = ViewState::default();
        state.set_visible(Column::Odds, true);
        state.set_visible(Column::Waku, false);
        let cols = state.visible_columns();
        assert_eq!(cols.first(), Some(&Column::Num));
        assert_eq!(cols.last(), Some(&Column::Odds));
    }

    #[test]
    fn marks_are_keyed_by_horse_number() {
        let mut state = ViewState::default();
        state.set_mark("3", Mark::Honmei);
        state.set_mark("3", Mark::Taikou);
        state.set_mark("5", Mark::Keshi);
        assert_eq!(state.mark_for("3"), Some(Mark::Taikou));
        assert_eq!(state.clear_mark("5"), Some(Mark::Keshi));
        assert_eq!(state.mark_for("5"), None);
        assert_eq!(state.marks().count(), 1);
    }

    #[test]
    fn mark_parses_symbol_or_name() {
        assert_eq!("◎".parse::<Mark>(), Ok(Mark::Honmei));
        assert_eq!("Renka".parse::<Mark>(), Ok(Mark::Renka));
        assert!("x".parse::<Mark>().is_err());
        assert_eq!(
            parse_mark_assignment("7=▲"),
            Ok(("7".to_string(), Some(Mark::Tanana)))
        );
        assert_eq!(parse_mark_assignment("7:"), Ok(("7".to_string(), None)));
        assert!(parse_mark_assignment("honmei").is_err());
    }

    #[test]
    fn column_parses_key_or_header() {
        assert_eq!("jockey".parse::<Column>(), Ok(Column::Jockey));
        assert_eq!("馬体重".parse::<Column>(), Ok(Column::Bataiju));
        assert!("speed".parse::<Column>().is_err());
    }

    #[test]
    fn query_adjusts_defaults() {
        let state = ViewState::from_query("hide=jockey,trainer&show=odds&mark=3%3A%E2%97%8E&mark=bad");
        assert!(!state.is_visible(Column::Jockey));
        assert!(!state.is_visible(Column::Trainer));
        assert!(state.is_visible(Column::Odds));
        assert_eq!(state.mark_for("3"), Some(Mark::Honmei));
    }

    #[test]
    fn submitted_form_replaces_visibility() {
        let state = ViewState::from_query("view=1&show=name&show=num&mark=4%3A");
        assert_eq!(state.visible_columns(), vec![Column::Num, Column::Name]);
        assert_eq!(state.mark_for("4"), None);
    }
}
