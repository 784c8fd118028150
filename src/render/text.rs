use super::{Page, Table};

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

/// Terminal cell width; CJK wide and fullwidth characters take two cells.
pub(crate) fn display_width(text: &str) -> usize {
    text.chars().map(|ch| if is_wide(ch) { 2 } else { 1 }).sum()
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{text}{}", " ".repeat(fill))
}

pub(crate) fn render_table(table: &Table) -> String {
    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for (idx, header) in table.headers.iter().enumerate() {
        widths[idx] = widths[idx].max(display_width(header));
    }
    for row in &table.rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(&cell.text));
        }
    }

    let mut out = String::new();
    if let Some(caption) = &table.caption {
        out.push_str(&format!("[{caption}]\n"));
    }
    let line = |cells: Vec<&str>| -> String {
        let joined = cells
            .iter()
            .enumerate()
            .map(|(idx, text)| pad(text, widths[idx]))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", joined.trim_end())
    };
    out.push_str(&line(table.headers.iter().map(String::as_str).collect()));
    let rule_width = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
    out.push_str(&format!("{}\n", "-".repeat(rule_width)));
    for row in &table.rows {
        out.push_str(&line(row.iter().map(|cell| cell.text.as_str()).collect()));
    }
    out
}

pub(crate) fn render_page(page: &Page) -> String {
    let mut out = format!("== {} ==\n", page.title);
    if let Some(notice) = &page.notice {
        out.push_str(&format!("! {notice}\n"));
    }
    let label_width = page
        .facts
        .iter()
        .map(|(name, _)| display_width(name))
        .max()
        .unwrap_or(0);
    for (name, value) in &page.facts {
        out.push_str(&format!("{}  {value}\n", pad(name, label_width)));
    }
    for paragraph in &page.paragraphs {
        out.push_str(paragraph);
        out.push('\n');
    }
    for table in &page.tables {
        out.push('\n');
        out.push_str(&render_table(table));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Cell;

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("東京"), 4);
        assert_eq!(display_width("ドウデュース"), 12);
        assert_eq!(display_width("１"), 2);
    }

    #[test]
    fn columns_align_across_scripts() {
        let table = Table {
            caption: Some("出馬表".into()),
            headers: vec!["馬番".into(), "馬名".into()],
            rows: vec![
                vec![Cell::plain("1"), Cell::plain("Alpha")],
                vec![Cell::plain("12"), Cell::plain("ドウデュース")],
            ],
        };
        let text = render_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[出馬表]");
        assert_eq!(lines[1], "馬番  馬名");
        assert_eq!(lines[2], "-".repeat(4 + 2 + 12));
        assert_eq!(lines[3], "1     Alpha");
        assert_eq!(lines[4], "12    ドウデュース");
    }

    #[test]
    fn page_lists_notice_and_facts() {
        let page = Page {
            title: "武豊".into(),
            notice: Some("no data".into()),
            facts: vec![("身長".into(), "170".into()), ("初免許年".into(), "1987".into())],
            ..Page::default()
        };
        let text = render_page(&page);
        assert!(text.starts_with("== 武豊 ==\n! no data\n"));
        assert!(text.contains("身長      170\n"));
        assert!(text.contains("初免許年  1987\n"));
    }
}
