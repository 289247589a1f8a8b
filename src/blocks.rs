use serde::{Deserialize, Serialize};

/// One parsed block of `key: value` lines. Insertion order is preserved;
/// writing an existing key replaces its value in place.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.to_string();
        } else {
            self.fields.push((key.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Field value or the `?` placeholder used throughout the reports.
    pub fn get_or_placeholder(&self, key: &str) -> &str {
        self.get(key).unwrap_or("?")
    }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

/// Parse blank-line-delimited, `key: value`-per-line text into records.
pub fn parse_blocks(text: &str) -> Vec<Record> {
    parse_blocks_where(text, ':', |_| true)
}

/// Same shape but with `=` (or any other) separating key and value, as wmic
/// list output uses.
pub fn parse_blocks_sep(text: &str, sep: char) -> Vec<Record> {
    parse_blocks_where(text, sep, |_| true)
}

/// Block parser with an inline keep-predicate applied at emission time, so
/// excluded blocks never materialize in the output at all.
///
/// Splits each non-blank line on the FIRST `sep` only (values may themselves
/// contain the separator, e.g. timestamps), trims both sides, ignores lines
/// without the separator, never emits an empty record, and emits an
/// unterminated trailing block.
pub fn parse_blocks_where(text: &str, sep: char, keep: impl Fn(&Record) -> bool) -> Vec<Record> {
    let mut out: Vec<Record> = Vec::new();
    let mut current = Record::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                if keep(&current) { out.push(current); }
                current = Record::new();
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(sep) {
            current.set(key.trim(), value.trim());
        }
        // lines without the separator are tolerated and skipped
    }
    if !current.is_empty() && keep(&current) { out.push(current); }
    out
}
