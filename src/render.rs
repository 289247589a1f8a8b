use comfy_table::{ContentArrangement, Table};

use crate::blocks::Record;

/// Aligned-column report: header row, a dash rule sized to the widest value
/// in the first (name) column, one row per record with the name column
/// left-justified. Only the name column is padded; the remaining columns
/// follow unaligned. Missing fields render as `?`. Empty input renders the
/// `empty` message alone.
pub fn render_table(records: &[Record], columns: &[(&str, &str)], empty: &str) -> String {
    if records.is_empty() {
        return format!("{}\n", empty);
    }
    let (name_field, name_header) = columns[0];
    let width = records
        .iter()
        .map(|r| r.get_or_placeholder(name_field).chars().count())
        .max()
        .unwrap_or(0)
        .max(name_header.chars().count());
    let mut out = String::new();
    let rest_headers: Vec<&str> = columns[1..].iter().map(|(_, h)| *h).collect();
    out.push_str(&format!("{:<width$} {}\n", name_header, rest_headers.join(" ")));
    out.push_str(&"-".repeat(width + 20));
    out.push('\n');
    for r in records {
        let rest: Vec<&str> = columns[1..].iter().map(|(f, _)| r.get_or_placeholder(f)).collect();
        out.push_str(&format!("{:<width$} {}\n", r.get_or_placeholder(name_field), rest.join(" ")));
    }
    out
}

/// comfy-table rendering of the same column spec, for `--text-format table`.
pub fn render_comfy(records: &[Record], columns: &[(&str, &str)], empty: &str) -> String {
    if records.is_empty() {
        return format!("{}\n", empty);
    }
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.iter().map(|(_, h)| h.to_string()).collect::<Vec<String>>());
    for r in records {
        table.add_row(columns.iter().map(|(f, _)| r.get_or_placeholder(f).to_string()).collect::<Vec<String>>());
    }
    format!("{}\n", table)
}

/// Emoji prefix, or nothing when --no-emoji is in effect.
pub fn glyph(emoji: bool, g: &str) -> &str {
    if emoji { g } else { "" }
}

/// Task banner line, e.g. "\n🛡️  Windows Services Audit".
pub fn banner(emoji: bool, g: &str, title: &str) -> String {
    format!("\n{}{}\n", glyph(emoji, g), title)
}
