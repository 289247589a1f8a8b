use std::path::Path;

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

const DEFAULT_GLOB: &str = "*.txt";

#[derive(Clone, Debug)]
pub struct CensusRow {
    pub path: String,
    pub size_kb: f64,
}

fn build_glob(pattern: &str) -> Result<GlobSet, globset::Error> {
    let mut gs = GlobSetBuilder::new();
    gs.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    gs.build()
}

/// Walk `root` recursively and stat every file matching the glob. Files we
/// cannot stat are reported by name and skipped.
pub fn collect(root: &Path, glob: &GlobSet, progress: bool) -> (Vec<CensusRow>, Vec<String>) {
    let mut rows: Vec<CensusRow> = Vec::new();
    let mut denied: Vec<String> = Vec::new();
    let pb = if progress { Some(indicatif::ProgressBar::new_spinner()) } else { None };
    let mut seen = 0usize;
    for de in WalkDir::new(root).follow_links(false).into_iter().filter_map(Result::ok) {
        let p = de.path();
        if !p.is_file() { continue; }
        if !glob.is_match(p.file_name().unwrap_or_default()) { continue; }
        seen += 1;
        if let Some(ref pb) = pb && seen % 100 == 0 {
            pb.tick();
            pb.set_message(format!("Scanned {} files", seen));
        }
        let rel = p.strip_prefix(root).unwrap_or(p).to_string_lossy().into_owned();
        match de.metadata() {
            Ok(md) => rows.push(CensusRow { path: rel, size_kb: md.len() as f64 / 1024.0 }),
            Err(e) => {
                log::debug!("stat failed for {}: {}", rel, e);
                denied.push(rel);
            }
        }
    }
    if let Some(pb) = pb { pb.finish_and_clear(); }
    rows.sort_by(|a, b| a.path.cmp(&b.path));
    (rows, denied)
}

pub fn write_csv(path: &Path, rows: &[CensusRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.to_string_lossy()))?;
    wtr.write_record(["file", "size_kb"])?;
    for r in rows {
        wtr.write_record([r.path.as_str(), &format!("{:.1}", r.size_kb)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Pipeline A: directory walk, per-file stat, aligned table, CSV write.
pub fn scan_report(dir: &str, file_glob: Option<&str>, progress: bool) -> String {
    let root = Path::new(dir);
    if !root.exists() {
        return "Directory does not exist.\n".to_string();
    }
    let glob = match build_glob(file_glob.unwrap_or(DEFAULT_GLOB)) {
        Ok(g) => g,
        Err(e) => return format!("Invalid file glob: {}\n", e),
    };
    let (rows, denied) = collect(root, &glob, progress);
    let shown = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut out = format!("\nScanning: {}\n", shown.to_string_lossy());
    out.push_str(&format!("Found {} text files:\n\n", rows.len() + denied.len()));
    out.push_str(&format!("{:<40} {:>10}\n", "File", "Size (KB)"));
    out.push_str(&"-".repeat(52));
    out.push('\n');
    for name in &denied {
        out.push_str(&format!("Permission denied: {}\n", name));
    }
    let mut total = 0.0f64;
    for r in &rows {
        total += r.size_kb;
        out.push_str(&format!("{:<40} {:>10.1}\n", r.path, r.size_kb));
    }
    out.push_str(&"-".repeat(52));
    out.push('\n');
    out.push_str(&format!("Total size: {:.1} KB\n\n", total));
    let csv_path = root.join("output.csv");
    match write_csv(&csv_path, &rows) {
        Ok(()) => {
            let shown_csv = csv_path.canonicalize().unwrap_or(csv_path);
            out.push_str(&format!("Results written to {}\n", shown_csv.to_string_lossy()));
        }
        Err(e) => {
            log::error!("census CSV write failed: {:#}", e);
            out.push_str(&format!("Failed to write {}\n", csv_path.to_string_lossy()));
        }
    }
    out
}
