use std::time::Duration;

use crate::render::{banner, glyph};
use crate::runner;

pub const USAGE_WARN_RATIO: f64 = 0.10;

const USED_MARKER: &str = "Used Shadow Copy Storage space";
const MAX_MARKER: &str = "Maximum Shadow Copy Storage space";

/// Normalize a `<number> <unit>` size string to gigabytes. Only GB and TB are
/// understood; anything else is unknown, not zero.
pub fn parse_size_gb(s: &str) -> Option<f64> {
    let upper = s.trim().to_uppercase();
    let number: f64 = upper.split(' ').next()?.parse().ok()?;
    if upper.contains("GB") {
        Some(number)
    } else if upper.contains("TB") {
        Some(number * 1024.0)
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UsageCheck {
    /// used/maximum exceeds the warning threshold
    Warn(f64),
    Ok(f64),
    /// one of the sizes was missing or unparseable
    Unknown,
}

pub fn check_usage(used: Option<&str>, maximum: Option<&str>) -> UsageCheck {
    let (Some(u), Some(m)) = (used.and_then(parse_size_gb), maximum.and_then(parse_size_gb)) else {
        return UsageCheck::Unknown;
    };
    if m <= 0.0 {
        return UsageCheck::Unknown;
    }
    let ratio = u / m;
    if ratio > USAGE_WARN_RATIO { UsageCheck::Warn(ratio) } else { UsageCheck::Ok(ratio) }
}

/// Pull the used/maximum size strings out of `vssadmin list shadowstorage`
/// output. The markers are matched as literal substrings; the value is
/// whatever follows the first colon.
pub fn extract_storage_sizes(raw: &str) -> (Option<String>, Option<String>) {
    let mut used = None;
    let mut maximum = None;
    for line in raw.lines() {
        if line.contains(USED_MARKER) {
            if let Some((_, v)) = line.split_once(':') { used = Some(v.trim().to_string()); }
        } else if line.contains(MAX_MARKER) {
            if let Some((_, v)) = line.split_once(':') { maximum = Some(v.trim().to_string()); }
        }
    }
    (used, maximum)
}

pub fn win_vss(timeout: Duration, emoji: bool) -> String {
    let mut out = banner(emoji, "💾 ", "Shadow Copy Space Check");
    let raw = match runner::run("vssadmin", &["list", "shadowstorage"], timeout) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("vssadmin failed: {}", e);
            out.push_str(&format!(
                "{}Failed to list shadow storage – run as Administrator.\n",
                glyph(emoji, "❌ ")
            ));
            return out;
        }
    };
    let (used, maximum) = extract_storage_sizes(&raw);
    out.push_str(&format!("Used Storage: {}\n", used.as_deref().unwrap_or("N/A")));
    out.push_str(&format!("Max Storage: {}\n", maximum.as_deref().unwrap_or("N/A")));
    match check_usage(used.as_deref(), maximum.as_deref()) {
        UsageCheck::Warn(_) => out.push_str(&format!(
            "{}Warning: Shadow copy storage exceeds 10% of maximum size\n",
            glyph(emoji, "⚠️  ")
        )),
        UsageCheck::Ok(_) => {}
        UsageCheck::Unknown => out.push_str("(Could not calculate usage percentage)\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gb_and_tb_normalize() {
        assert_eq!(parse_size_gb("50 GB"), Some(50.0));
        assert_eq!(parse_size_gb("1.5 TB"), Some(1536.0));
        assert_eq!(parse_size_gb("  400 gb "), Some(400.0));
    }

    #[test]
    fn unknown_units_are_unknown_not_zero() {
        assert_eq!(parse_size_gb("512 MB"), None);
        assert_eq!(parse_size_gb("12345 bytes"), None);
        assert_eq!(parse_size_gb("garbage"), None);
    }

    #[test]
    fn warning_threshold() {
        assert!(matches!(check_usage(Some("50 GB"), Some("400 GB")), UsageCheck::Warn(r) if (r - 0.125).abs() < 1e-9));
        assert!(matches!(check_usage(Some("10 GB"), Some("400 GB")), UsageCheck::Ok(r) if (r - 0.025).abs() < 1e-9));
        assert!(matches!(check_usage(Some("200 GB"), Some("1 TB")), UsageCheck::Warn(_)));
    }

    #[test]
    fn missing_or_odd_sizes_degrade_to_unknown() {
        assert_eq!(check_usage(None, Some("400 GB")), UsageCheck::Unknown);
        assert_eq!(check_usage(Some("512 MB"), Some("400 GB")), UsageCheck::Unknown);
        assert_eq!(check_usage(Some("10 GB"), Some("0 GB")), UsageCheck::Unknown);
    }

    #[test]
    fn extracts_marker_lines() {
        let raw = "Shadow Copy Storage association\n   For volume: (C:)\\\\?\\Volume{}\\\n   Used Shadow Copy Storage space: 50 GB (12%)\n   Allocated Shadow Copy Storage space: 51 GB\n   Maximum Shadow Copy Storage space: 400 GB (100%)\n";
        let (used, maximum) = extract_storage_sizes(raw);
        assert_eq!(used.as_deref(), Some("50 GB (12%)"));
        assert_eq!(maximum.as_deref(), Some("400 GB (100%)"));
        assert!(matches!(check_usage(used.as_deref(), maximum.as_deref()), UsageCheck::Warn(_)));
    }
}
