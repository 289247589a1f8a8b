use std::time::Duration;

use anyhow::Context;

use crate::TextFormat;
use crate::blocks::{Record, parse_blocks_sep};
use crate::render::{banner, glyph, render_comfy, render_table};
use crate::runner;

const COLUMNS: &[(&str, &str)] = &[("Name", "Name"), ("Version", "Version")];
const EMPTY_MSG: &str = "No installed packages reported.";

/// Parse `wmic product get Name,Version /format:list` output (blank-line
/// blocks of `Key=Value` lines) into name-sorted package records.
pub fn installed_packages(raw: &str) -> Vec<Record> {
    let mut packages: Vec<Record> = parse_blocks_sep(raw, '=')
        .into_iter()
        .filter(|r| !r.get("Name").unwrap_or("").is_empty())
        .collect();
    packages.sort_by_key(|r| r.get("Name").unwrap_or("").to_lowercase());
    packages
}

pub fn export_csv(path: &str, packages: &[Record]) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path))?;
    wtr.write_record(["name", "version"])?;
    for p in packages {
        wtr.write_record([p.get_or_placeholder("Name"), p.get_or_placeholder("Version")])?;
    }
    wtr.flush()?;
    Ok(packages.len())
}

pub fn win_pkgs(csv_path: Option<&str>, timeout: Duration, emoji: bool, fmt: TextFormat) -> String {
    let mut out = banner(emoji, "📦 ", "Installed Package Inventory");
    let raw = match runner::run("wmic", &["product", "get", "Name,Version", "/format:list"], timeout) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("wmic product query failed: {}", e);
            out.push_str(&format!(
                "{}Failed to list installed packages – try running as Administrator.\n",
                glyph(emoji, "❌ ")
            ));
            return out;
        }
    };
    let packages = installed_packages(&raw);
    out.push_str(&format!("Found {} installed packages:\n", packages.len()));
    out.push_str(&match fmt {
        TextFormat::Lines => render_table(&packages, COLUMNS, EMPTY_MSG),
        TextFormat::Table => render_comfy(&packages, COLUMNS, EMPTY_MSG),
    });
    if let Some(path) = csv_path {
        match export_csv(path, &packages) {
            Ok(n) => out.push_str(&format!("Exported {} packages to {}\n", n, path)),
            Err(e) => {
                log::error!("CSV export failed for {}: {:#}", path, e);
                out.push_str(&format!("{}CSV export failed: {}\n", glyph(emoji, "❌ "), path));
            }
        }
    }
    out
}
