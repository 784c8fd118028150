pub(crate) mod html;
pub(crate) mod text;

use crate::{
    list_entries, locate_or_placeholder, venue_of, Column, Horse, HorseProfile, JockeyProfile,
    JockeyStats, Race, RaceDocument, Route, StatsTable, ViewState,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Cell {
    pub(crate) text: String,
    pub(crate) link: Option<String>,
    /// Background color hint (waku cells).
    pub(crate) color: Option<String>,
}

impl Cell {
    pub(crate) fn plain(text: impl Into<String>) -> Self {
        Cell {
            text: text.into(),
            ..Cell::default()
        }
    }

    pub(crate) fn linked(text: impl Into<String>, route: &Route) -> Self {
        Cell {
            text: text.into(),
            link: Some(route.href()),
            color: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Table {
    pub(crate) caption: Option<String>,
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<Cell>>,
}

impl Table {
    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Race card controls: which horses can take a mark, and the state to pre-fill.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CardControls {
    pub(crate) view: ViewState,
    pub(crate) entrants: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Page {
    pub(crate) title: String,
    pub(crate) facts: Vec<(String, String)>,
    pub(crate) tables: Vec<Table>,
    pub(crate) notice: Option<String>,
    pub(crate) paragraphs: Vec<String>,
    pub(crate) controls: Option<CardControls>,
}

const EMPTY_DOCUMENT_NOTICE: &str = "レースデータがありません";

pub(crate) fn race_list_page(document: Option<&RaceDocument>) -> Page {
    let mut table = Table {
        caption: None,
        headers: ["開催日", "場所", "開催", "R", "発走", "レース名", "コース", "馬場"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: Vec::new(),
    };
    let mut page = Page {
        title: "出馬表".to_string(),
        ..Page::default()
    };
    let Some(document) = document else {
        page.notice = Some(EMPTY_DOCUMENT_NOTICE.to_string());
        page.tables.push(table);
        return page;
    };
    if !document.date.is_empty() {
        page.facts.push(("日付".into(), document.date.clone()));
    }
    if !document.generated_at.is_empty() {
        page.facts.push(("更新".into(), document.generated_at.clone()));
    }
    for entry in list_entries(document) {
        let venue_id = entry.venue.identifier().unwrap_or_default();
        let number = entry.race.number().unwrap_or_default();
        let route = Route::Race {
            venue: venue_id.clone(),
            race_number: number.clone(),
        };
        let day = match (entry.day_date, entry.day_key) {
            (Some(date), _) if !date.is_empty() => date.to_string(),
            (_, Some(key)) => key.to_string(),
            _ => String::new(),
        };
        table.rows.push(vec![
            Cell::plain(day),
            Cell::plain(venue_id),
            Cell::plain(entry.venue.label()),
            Cell::linked(format!("{number}R"), &route),
            Cell::plain(entry.race.start()),
            Cell::linked(entry.race.title.clone(), &route),
            Cell::plain(entry.race.course_distance.clone()),
            Cell::plain(entry.race.surface.clone()),
        ]);
    }
    if table.is_empty() {
        page.notice = Some(EMPTY_DOCUMENT_NOTICE.to_string());
    }
    page.tables.push(table);
    page
}

/// Gate colors by waku number, for rows exported without a color name.
const WAKU_COLORS: [&str; 8] = ["白", "黒", "赤", "青", "黄", "緑", "橙", "桃"];

fn waku_color(horse: &Horse) -> Option<String> {
    if !horse.waku_color.is_empty() {
        return Some(horse.waku_color.clone());
    }
    let waku: usize = horse.waku.trim().parse().ok()?;
    WAKU_COLORS
        .get(waku.checked_sub(1)?)
        .map(|name| name.to_string())
}

fn horse_cell(horse: &Horse, column: Column, view: &ViewState) -> Cell {
    match column {
        Column::Waku => Cell {
            text: horse.waku.clone(),
            link: None,
            color: waku_color(horse),
        },
        Column::Num => Cell::plain(horse.num.clone()),
        Column::Mark => Cell::plain(
            view.mark_for(&horse.num)
                .map(|mark| mark.symbol().to_string())
                .unwrap_or_default(),
        ),
        Column::Name if !horse.name.is_empty() => Cell::linked(
            horse.name.clone(),
            &Route::Horse {
                name: horse.name.clone(),
            },
        ),
        Column::Name => Cell::plain(""),
        Column::Serei => Cell::plain(horse.serei.clone()),
        Column::Weight => Cell::plain(horse.weight.clone()),
        Column::Jockey if !horse.jockey.is_empty() => Cell::linked(
            horse.jockey.clone(),
            &Route::Jockey {
                name: horse.jockey.clone(),
            },
        ),
        Column::Jockey => Cell::plain(""),
        Column::Trainer => Cell::plain(horse.trainer.clone()),
        Column::Bataiju => Cell::plain(horse.bataiju.clone()),
        Column::Odds => Cell::plain(horse.odds.clone()),
    }
}

pub(crate) fn race_card_table(race: &Race, view: &ViewState) -> Table {
    let columns = view.visible_columns();
    Table {
        caption: None,
        headers: columns.iter().map(|col| col.header().to_string()).collect(),
        rows: race
            .horses
            .iter()
            .map(|horse| {
                columns
                    .iter()
                    .map(|col| horse_cell(horse, *col, view))
                    .collect()
            })
            .collect(),
    }
}

pub(crate) fn race_page(
    document: Option<&RaceDocument>,
    venue_id: &str,
    race_number: &str,
    view: &ViewState,
) -> Page {
    let race = locate_or_placeholder(document, venue_id, race_number);
    let label = document
        .and_then(|doc| venue_of(doc, venue_id))
        .map(|venue| venue.label())
        .unwrap_or_else(|| venue_id.to_string());
    let mut page = Page {
        title: if race.is_placeholder() {
            race.title.clone()
        } else {
            format!("{venue_id} {}R {}", race.number().unwrap_or_default(), race.title)
        },
        ..Page::default()
    };
    page.facts.push(("開催".into(), label));
    if let Some(id) = race.identifier() {
        page.facts.push(("レースID".into(), id));
    }
    for (name, value) in [
        ("発走", race.start()),
        ("コース", race.course_distance.clone()),
        ("馬場", race.surface.clone()),
    ] {
        if !value.is_empty() {
            page.facts.push((name.into(), value));
        }
    }
    let marks: Vec<String> = view
        .marks()
        .map(|(num, mark)| format!("{num}{}", mark.symbol()))
        .collect();
    if !marks.is_empty() {
        page.facts.push(("予想印".into(), marks.join(" ")));
    }
    if race.is_placeholder() {
        page.notice = Some(format!("{venue_id} {race_number}R は見つかりませんでした"));
    }
    page.tables.push(race_card_table(&race, view));
    page.controls = Some(CardControls {
        view: view.clone(),
        entrants: race
            .horses
            .iter()
            .map(|horse| (horse.num.clone(), horse.name.clone()))
            .collect(),
    });
    page
}

pub(crate) fn horse_page(profile: &HorseProfile) -> Page {
    let mut page = Page {
        title: profile.name.clone(),
        ..Page::default()
    };
    for (name, value) in [
        ("性齢", &profile.serei),
        ("調教師", &profile.trainer),
        ("父", &profile.father),
        ("母", &profile.mother),
        ("生年月日", &profile.birthday),
        ("毛色", &profile.color),
    ] {
        page.facts.push((name.into(), value.clone()));
    }
    let mut table = Table {
        caption: Some("過去のレース".into()),
        headers: [
            "日付", "場所", "レース名", "距離", "馬場", "頭数", "人気", "着順", "騎手", "斤量",
            "馬体重", "タイム", "勝ち馬",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect(),
        rows: Vec::new(),
    };
    for past in &profile.past_races {
        let jockey = if past.jockey.is_empty() {
            Cell::plain("")
        } else {
            Cell::linked(
                past.jockey.clone(),
                &Route::Jockey {
                    name: past.jockey.clone(),
                },
            )
        };
        table.rows.push(vec![
            Cell::plain(past.date.clone()),
            Cell::plain(past.venue.clone()),
            Cell::plain(past.title.clone()),
            Cell::plain(past.distance.clone()),
            Cell::plain(past.track.clone()),
            Cell::plain(past.total.clone()),
            Cell::plain(past.popularity.clone()),
            Cell::plain(past.rank.clone()),
            jockey,
            Cell::plain(past.weight.clone()),
            Cell::plain(past.bataiju.clone()),
            Cell::plain(past.time.clone()),
            Cell::plain(past.winner.clone()),
        ]);
    }
    if profile.past_races.is_empty() && profile.father.is_empty() {
        page.notice = Some(format!("{} の情報がありません", profile.name));
    }
    page.tables.push(table);
    page
}

fn stats_table(caption: &str, stats: &StatsTable) -> Table {
    Table {
        caption: Some(caption.to_string()),
        headers: stats.headers.clone(),
        rows: stats
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| Cell::plain(cell.clone())).collect())
            .collect(),
    }
}

pub(crate) fn jockey_page(profile: &JockeyProfile) -> Page {
    let mut page = Page {
        title: profile.name.clone(),
        ..Page::default()
    };
    for (name, value) in [
        ("生年月日", &profile.birthday),
        ("身長", &profile.height),
        ("体重", &profile.weight),
        ("初免許年", &profile.first_license),
    ] {
        page.facts.push((name.into(), value.clone()));
    }
    let mut has_stats = false;
    for (caption, stats) in [
        ("本年成績", &profile.stats_current),
        ("累計成績", &profile.stats_total),
    ] {
        match stats {
            Some(JockeyStats::Table(table)) => page.tables.push(stats_table(caption, table)),
            Some(JockeyStats::Text(summary)) => page.facts.push((caption.into(), summary.clone())),
            None => continue,
        }
        has_stats = true;
    }
    if !has_stats && profile.birthday.is_empty() {
        page.notice = Some(format!("{} の情報がありません", profile.name));
    }
    page
}

pub(crate) fn static_page(route: &Route) -> Option<Page> {
    match route {
        Route::About => Some(Page {
            title: "このサイトについて".into(),
            paragraphs: vec![
                "JRA の出馬表、競走馬の戦績、騎手の成績を表形式で閲覧できます。".into(),
                "データは更新サーバーが生成した JSON を読み込んで表示しています。".into(),
            ],
            ..Page::default()
        }),
        Route::Help => Some(Page {
            title: "使い方".into(),
            paragraphs: vec![
                "一覧からレースを選ぶと出馬表が表示されます。".into(),
                "チェックボックスで列の表示を切り替え、各馬に予想印を付けられます。印は保存されません。"
                    .into(),
                "「更新」を押すと最新の出馬表を取得します。更新中は再実行できません。".into(),
            ],
            ..Page::default()
        }),
        _ => None,
    }
}

pub(crate) fn message_page(title: &str, message: &str) -> Page {
    Page {
        title: title.to_string(),
        notice: Some(message.to_string()),
        ..Page::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mark, PLACEHOLDER_RACE_TITLE};
    use serde_json::json;

    fn sample() -> RaceDocument {
        RaceDocument::from_value(json!({
            "date": "2026-10-17",
            "days": {"saturday": {"date": "10月17日（土曜）", "venues": [{
                "venue": "東京",
                "venue_label": "4回東京5日",
                "races": [{
                    "race_number": 11,
                    "title": "アイルランドT",
                    "start_time": "15:45",
                    "course_distance": "1,800m",
                    "surface": "芝",
                    "horses": [
                        {"num": 1, "name": "Alpha", "waku": 1, "waku_color": "#ffffff", "jockey": "武豊", "odds": "3.2"},
                        {"num": 2, "name": "Beta", "waku": 2, "waku_color": "#000000", "jockey": ""}
                    ]
                }]
            }]}}
        }))
        .unwrap()
    }

    #[test]
    fn list_page_links_every_race() {
        let doc = sample();
        let page = race_list_page(Some(&doc));
        let table = &page.tables[0];
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0].text, "10月17日（土曜）");
        assert_eq!(table.rows[0][3].text, "11R");
        assert_eq!(
            table.rows[0][5].link.as_deref(),
            Some("/race/%E6%9D%B1%E4%BA%AC/11")
        );
        assert!(page.notice.is_none());
    }

    #[test]
    fn list_page_without_document_is_empty_not_an_error() {
        let page = race_list_page(None);
        assert!(page.tables[0].is_empty());
        assert!(page.notice.is_some());
    }

    #[test]
    fn race_card_respects_visibility_and_marks() {
        let doc = sample();
        let mut view = ViewState::default();
        view.set_visible(Column::Trainer, false);
        view.set_mark("2", Mark::Honmei);
        let page = race_page(Some(&doc), "東京", "11", &view);
        let table = &page.tables[0];
        assert!(!table.headers.contains(&"調教師".to_string()));
        assert!(!table.headers.contains(&"オッズ".to_string()));
        let mark_idx = table.headers.iter().position(|h| h == "印").unwrap();
        assert_eq!(table.rows[1][mark_idx].text, "◎");
        assert_eq!(table.rows[0][mark_idx].text, "");
        assert_eq!(table.rows[0][0].color.as_deref(), Some("#ffffff"));
        let jockey_idx = table.headers.iter().position(|h| h == "騎手").unwrap();
        assert!(table.rows[0][jockey_idx].link.is_some());
        assert!(table.rows[1][jockey_idx].link.is_none());
        assert!(page.facts.contains(&("開催".to_string(), "4回東京5日".to_string())));
        assert!(page.facts.contains(&("予想印".to_string(), "2◎".to_string())));
        assert_eq!(page.controls.unwrap().entrants.len(), 2);
    }

    #[test]
    fn missing_race_renders_placeholder_table() {
        let doc = sample();
        let page = race_page(Some(&doc), "京都", "1", &ViewState::default());
        assert_eq!(page.title, PLACEHOLDER_RACE_TITLE);
        assert!(page.tables[0].rows.is_empty());
        assert!(!page.tables[0].headers.is_empty());
        assert!(page.notice.is_some());
    }

    #[test]
    fn jockey_page_lists_stats_tables() {
        let profile: JockeyProfile = serde_json::from_value(json!({
            "name": "武豊",
            "stats_current": {"headers": ["1着", "2着"], "rows": [["30", "25"]]},
            "stats_total": {}
        }))
        .unwrap();
        let page = jockey_page(&profile);
        assert_eq!(page.tables.len(), 1);
        assert_eq!(page.tables[0].caption.as_deref(), Some("本年成績"));
        assert_eq!(page.tables[0].rows[0][1].text, "25");
    }

    #[test]
    fn jockey_page_shows_scraped_summaries_as_facts() {
        let profile: JockeyProfile = serde_json::from_value(json!({
            "name": "武豊",
            "stats_current": "12-8-5-70",
            "stats_total": "4400-3500"
        }))
        .unwrap();
        let page = jockey_page(&profile);
        assert!(page.tables.is_empty());
        assert!(page.facts.contains(&("本年成績".to_string(), "12-8-5-70".to_string())));
        assert!(page.facts.contains(&("累計成績".to_string(), "4400-3500".to_string())));
        assert!(page.notice.is_none());
    }

    #[test]
    fn waku_color_falls_back_to_gate_number() {
        let horse = Horse {
            waku: "5".into(),
            ..Horse::default()
        };
        assert_eq!(waku_color(&horse).as_deref(), Some("黄"));
        let horse = Horse {
            waku: "9".into(),
            ..Horse::default()
        };
        assert_eq!(waku_color(&horse), None);
        let horse = Horse {
            waku: "2".into(),
            waku_color: "白".into(),
            ..Horse::default()
        };
        assert_eq!(waku_color(&horse).as_deref(), Some("白"));
    }

    #[test]
    fn empty_horse_profile_gets_notice() {
        let page = horse_page(&HorseProfile {
            name: "Nobody".into(),
            ..HorseProfile::default()
        });
        assert!(page.notice.is_some());
        assert!(page.tables[0].is_empty());
    }
}
