use std::time::Duration;

use crate::TextFormat;
use crate::blocks::{Record, parse_blocks_where};
use crate::render::{banner, glyph, render_comfy, render_table};
use crate::runner;

const COLUMNS: &[(&str, &str)] = &[("TaskName", "Task Name"), ("Next Run Time", "Next Run Time")];
const EMPTY_MSG: &str = "No non-Microsoft scheduled tasks found.";

/// Parse `schtasks /Query /FO LIST /V` output, excluding Microsoft tasks at
/// emission time so they never materialize in the sequence.
pub fn non_microsoft_tasks(raw: &str) -> Vec<Record> {
    parse_blocks_where(raw, ':', |t| !t.get("TaskName").unwrap_or("").contains("Microsoft"))
}

pub fn win_tasks(timeout: Duration, emoji: bool, fmt: TextFormat) -> String {
    let mut out = banner(emoji, "📆 ", "Scheduled Task Audit (non-Microsoft)");
    let raw = match runner::run("schtasks", &["/Query", "/FO", "LIST", "/V"], timeout) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("schtasks query failed: {}", e);
            out.push_str(&format!(
                "{}Failed to query scheduled tasks – try running as Administrator.\n",
                glyph(emoji, "❌ ")
            ));
            return out;
        }
    };
    let tasks = non_microsoft_tasks(&raw);
    out.push_str(&match fmt {
        TextFormat::Lines => render_table(&tasks, COLUMNS, EMPTY_MSG),
        TextFormat::Table => render_comfy(&tasks, COLUMNS, EMPTY_MSG),
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
HostName: DESKTOP-1\nTaskName: \\Microsoft\\Windows\\Defrag\\ScheduledDefrag\nNext Run Time: N/A\n\n\
HostName: DESKTOP-1\nTaskName: \\NightlyBackup\nNext Run Time: 2026-08-25 03:00:00\n\n\
HostName: DESKTOP-1\nTaskName: \\Microsoft\\Windows\\Time\\Sync\nNext Run Time: N/A\n";

    #[test]
    fn microsoft_tasks_never_materialize() {
        let tasks = non_microsoft_tasks(SAMPLE);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].get("TaskName"), Some("\\NightlyBackup"));
        assert_eq!(crate::blocks::parse_blocks(SAMPLE).len(), 3);
    }

    #[test]
    fn exclusion_is_case_sensitive() {
        let raw = "TaskName: \\MICROSOFT\\Something\n\n";
        assert_eq!(non_microsoft_tasks(raw).len(), 1);
    }

    #[test]
    fn report_keeps_colons_inside_run_times() {
        let tasks = non_microsoft_tasks(SAMPLE);
        let report = render_table(&tasks, COLUMNS, EMPTY_MSG);
        assert!(report.contains("2026-08-25 03:00:00"));
    }
}
