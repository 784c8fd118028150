use std::fmt::Write;

use super::{CardControls, Page, Table};
use crate::{Column, Mark, Route};

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// CSS colors for the waku names the exporter writes (from the gate image alt text).
fn waku_css_color(name: &str) -> Option<&'static str> {
    match name {
        "白" => Some("#ffffff"),
        "黒" => Some("#000000"),
        "赤" => Some("#e60012"),
        "青" => Some("#0068b7"),
        "黄" => Some("#fff100"),
        "緑" => Some("#00a040"),
        "橙" => Some("#f39800"),
        "桃" => Some("#f19ec2"),
        _ => None,
    }
}

/// Only waku names, `#rgb`/`#rrggbb` and plain color names reach a style attribute.
fn safe_color(color: &str) -> Option<&str> {
    let color = color.trim();
    if let Some(css) = waku_css_color(color) {
        return Some(css);
    }
    let hex = color
        .strip_prefix('#')
        .is_some_and(|digits| matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()));
    let named = !color.is_empty() && color.chars().all(|c| c.is_ascii_alphabetic());
    (hex || named).then_some(color)
}

fn render_table(out: &mut String, table: &Table) {
    out.push_str("<table>\n");
    if let Some(caption) = &table.caption {
        let _ = writeln!(out, "<caption>{}</caption>", escape_html(caption));
    }
    out.push_str("<thead><tr>");
    for header in &table.headers {
        let _ = write!(out, "<th>{}</th>", escape_html(header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            match cell.color.as_deref().and_then(safe_color) {
                Some(color) => {
                    let _ = write!(out, "<td style=\"background:{color}\">");
                }
                None => out.push_str("<td>"),
            }
            match &cell.link {
                Some(link) => {
                    let _ = write!(
                        out,
                        "<a href=\"{}\">{}</a>",
                        escape_html(link),
                        escape_html(&cell.text)
                    );
                }
                None => out.push_str(&escape_html(&cell.text)),
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

fn render_controls(out: &mut String, controls: &CardControls) {
    out.push_str("<form method=\"get\" class=\"card-controls\">\n<input type=\"hidden\" name=\"view\" value=\"1\">\n<fieldset><legend>表示列</legend>\n");
    for column in Column::ALL {
        let checked = if controls.view.is_visible(column) {
            " checked"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "<label><input type=\"checkbox\" name=\"show\" value=\"{}\"{checked}>{}</label>",
            column.key(),
            escape_html(column.header())
        );
    }
    out.push_str("</fieldset>\n<fieldset><legend>予想印</legend>\n");
    for (num, name) in &controls.entrants {
        let num_attr = escape_html(num);
        let current = controls.view.mark_for(num);
        let _ = write!(
            out,
            "<label>{num_attr} {}<select name=\"mark\"><option value=\"{num_attr}:\"></option>",
            escape_html(name)
        );
        for mark in Mark::ALL {
            let selected = if current == Some(mark) { " selected" } else { "" };
            let _ = write!(
                out,
                "<option value=\"{num_attr}:{}\"{selected}>{}</option>",
                mark.key(),
                mark.symbol()
            );
        }
        out.push_str("</select></label>\n");
    }
    out.push_str("</fieldset>\n<button type=\"submit\">表示</button>\n</form>\n");
}

pub(crate) fn render_page(page: &Page) -> String {
    let mut out = String::new();
    let title = escape_html(&page.title);
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n"
    );
    let _ = writeln!(
        out,
        "<nav><a href=\"{}\">一覧</a> | <a href=\"{}\">使い方</a> | <a href=\"{}\">このサイトについて</a>\n<form method=\"post\" action=\"/update\" style=\"display:inline\"><button type=\"submit\">更新</button></form></nav>",
        Route::RaceList.href(),
        Route::Help.href(),
        Route::About.href()
    );
    let _ = writeln!(out, "<h1>{title}</h1>");
    if let Some(notice) = &page.notice {
        let _ = writeln!(out, "<p class=\"notice\">{}</p>", escape_html(notice));
    }
    if !page.facts.is_empty() {
        out.push_str("<dl>\n");
        for (name, value) in &page.facts {
            let _ = writeln!(
                out,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(name),
                escape_html(value)
            );
        }
        out.push_str("</dl>\n");
    }
    for paragraph in &page.paragraphs {
        let _ = writeln!(out, "<p>{}</p>", escape_html(paragraph));
    }
    if let Some(controls) = &page.controls {
        render_controls(&mut out, controls);
    }
    for table in &page.tables {
        render_table(&mut out, table);
    }
    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Cell, message_page};
    use crate::ViewState;

    #[test]
    fn escape_html_all_special() {
        assert_eq!(
            escape_html(r#"<a href="x">&'test'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;test&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("東京"), "東京");
    }

    #[test]
    fn unsafe_colors_are_dropped() {
        assert_eq!(safe_color("#fff"), Some("#fff"));
        assert_eq!(safe_color("#FF0000"), Some("#FF0000"));
        assert_eq!(safe_color("red"), Some("red"));
        assert_eq!(safe_color("red;position:fixed"), None);
        assert_eq!(safe_color("#12"), None);
        assert_eq!(safe_color("白"), Some("#ffffff"));
        assert_eq!(safe_color(" 桃 "), Some("#f19ec2"));
        assert_eq!(safe_color("紫"), None);
    }

    #[test]
    fn page_escapes_document_text() {
        let mut page = message_page("<b>", "a & b");
        page.tables.push(Table {
            caption: None,
            headers: vec!["馬名".into()],
            rows: vec![vec![Cell {
                text: "<script>".into(),
                link: Some("/horse/x".into()),
                color: Some("#000".into()),
            }]],
        });
        let html = render_page(&page);
        assert!(html.contains("<title>&lt;b&gt;</title>"));
        assert!(html.contains("<p class=\"notice\">a &amp; b</p>"));
        assert!(html.contains("<td style=\"background:#000\"><a href=\"/horse/x\">&lt;script&gt;</a></td>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn exported_waku_names_color_the_cells() {
        let doc = crate::RaceDocument::from_value(serde_json::json!({
            "venues": [{"venue": "東京", "races": [{"race_number": 1, "title": "T", "horses": [
                {"num": 1, "name": "Alpha", "waku": 1, "waku_color": "白"},
                {"num": 2, "name": "Beta", "waku": 3, "waku_color": "赤"},
                {"num": 3, "name": "Gamma", "waku": 8}
            ]}]}]
        }))
        .unwrap();
        let page = crate::render::race_page(Some(&doc), "東京", "1", &ViewState::default());
        let html = render_page(&page);
        assert!(html.contains("<td style=\"background:#ffffff\">1</td>"));
        assert!(html.contains("<td style=\"background:#e60012\">3</td>"));
        assert!(html.contains("<td style=\"background:#f19ec2\">8</td>"));
    }

    #[test]
    fn controls_reflect_view_state() {
        let mut view = ViewState::default();
        view.set_mark("3", Mark::Hoshi);
        let page = Page {
            title: "card".into(),
            controls: Some(CardControls {
                view,
                entrants: vec![("3".into(), "Alpha".into())],
            }),
            ..Page::default()
        };
        let html = render_page(&page);
        assert!(html.contains("value=\"name\" checked"));
        assert!(html.contains("value=\"odds\">"));
        assert!(html.contains("<option value=\"3:hoshi\" selected>☆</option>"));
        assert!(html.contains("action=\"/update\""));
    }
}
