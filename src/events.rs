use std::time::Duration;

use crate::TextFormat;
use crate::blocks::{Record, parse_blocks};
use crate::render::{banner, glyph, render_comfy, render_table};
use crate::runner;

const FAILED_LOGON_EVENT_ID: u32 = 4625;
const COLUMNS: &[(&str, &str)] = &[("Account", "Account"), ("Count", "Count")];
const EMPTY_MSG: &str = "No failed logons found in the window.";

/// Tally failed-logon accounts from `wevtutil qe Security /f:text` output.
/// The text form is blank-line-delimited `key: value` blocks, so it flows
/// through the ordinary block parser; within one event the last `Account
/// Name` line wins, which is the target account in 4625 records.
pub fn tally_accounts(raw: &str, min_count: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for rec in parse_blocks(raw) {
        let Some(account) = rec.get("Account Name") else { continue };
        if account.is_empty() || account == "-" {
            continue;
        }
        match counts.iter_mut().find(|(a, _)| a == account) {
            Some((_, n)) => *n += 1,
            None => counts.push((account.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.retain(|(_, n)| *n >= min_count);
    counts
}

fn count_records(counts: &[(String, usize)]) -> Vec<Record> {
    counts
        .iter()
        .map(|(account, n)| {
            let mut r = Record::new();
            r.set("Account", account);
            r.set("Count", &n.to_string());
            r
        })
        .collect()
}

pub fn win_events(hours: i64, min_count: usize, timeout: Duration, emoji: bool, fmt: TextFormat) -> String {
    let mut out = banner(emoji, "🔐 ", &format!("Failed Logon Audit (last {} hours)", hours));
    let window_ms = (hours.max(0) as u64).saturating_mul(3_600_000);
    let query = format!(
        "*[System[(EventID={}) and TimeCreated[timediff(@SystemTime) <= {}]]]",
        FAILED_LOGON_EVENT_ID, window_ms
    );
    let raw = match runner::run(
        "wevtutil",
        &["qe", "Security", &format!("/q:{}", query), "/rd:true", "/f:text"],
        timeout,
    ) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("wevtutil query failed: {}", e);
            out.push_str(&format!(
                "{}Failed to query the Security log – try running as Administrator.\n",
                glyph(emoji, "❌ ")
            ));
            return out;
        }
    };
    let counts = tally_accounts(&raw, min_count);
    let records = count_records(&counts);
    out.push_str(&match fmt {
        TextFormat::Lines => render_table(&records, COLUMNS, EMPTY_MSG),
        TextFormat::Table => render_comfy(&records, COLUMNS, EMPTY_MSG),
    });
    out
}
