use crate::blocks::Record;

// Name matching is case-insensitive by design; the prefix and substring
// criteria are case-sensitive. The asymmetry is deliberate, see DESIGN.md.

/// Keep records whose `field` equals (not merely contains) one of `allow`,
/// compared lower-cased. An empty allow-list keeps everything.
pub fn by_name_allow_list(records: Vec<Record>, field: &str, allow: &[String]) -> Vec<Record> {
    if allow.is_empty() { return records; }
    let wanted: Vec<String> = allow.iter().map(|w| w.to_lowercase()).collect();
    records
        .into_iter()
        .filter(|r| {
            let name = r.get(field).unwrap_or("").to_lowercase();
            wanted.iter().any(|w| *w == name)
        })
        .collect()
}

/// Keep records whose `field` starts with the literal `prefix`.
pub fn by_state_prefix(records: Vec<Record>, field: &str, prefix: &str) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| r.get(field).unwrap_or("").starts_with(prefix))
        .collect()
}

/// Keep records whose `field` does NOT contain the literal `needle`.
pub fn without_substring(records: Vec<Record>, field: &str, needle: &str) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| !r.get(field).unwrap_or("").contains(needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::parse_blocks;

    fn sample() -> Vec<Record> {
        parse_blocks("SERVICE_NAME: Spooler\nSTATE: STOPPED\n\nSERVICE_NAME: Fax\nSTATE: RUNNING\n\nSERVICE_NAME: W32Time\nSTATE: STOPPED  (NOT_STOPPABLE)\n")
    }

    #[test]
    fn empty_allow_list_keeps_all() {
        let recs = sample();
        let n = recs.len();
        assert_eq!(by_name_allow_list(recs, "SERVICE_NAME", &[]).len(), n);
    }

    #[test]
    fn allow_list_is_case_insensitive_exact() {
        let allow = vec!["spooler".to_string(), "W32TIME".to_string()];
        let kept = by_name_allow_list(sample(), "SERVICE_NAME", &allow);
        assert_eq!(kept.len(), 2);
        for r in &kept {
            let name = r.get("SERVICE_NAME").unwrap().to_lowercase();
            assert!(allow.iter().any(|w| w.to_lowercase() == name));
        }
        // "Spool" is a substring of "Spooler", not an exact match
        let partial = by_name_allow_list(sample(), "SERVICE_NAME", &["Spool".to_string()]);
        assert!(partial.is_empty());
    }

    #[test]
    fn state_prefix_is_case_sensitive() {
        let kept = by_state_prefix(sample(), "STATE", "STOPPED");
        assert_eq!(kept.len(), 2);
        assert!(by_state_prefix(sample(), "STATE", "stopped").is_empty());
    }

    #[test]
    fn substring_exclusion() {
        let recs = parse_blocks("TaskName: \\Microsoft\\Defrag\n\nTaskName: \\Backup\n");
        let kept = without_substring(recs, "TaskName", "Microsoft");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].get("TaskName"), Some("\\Backup"));
    }

    #[test]
    fn order_is_preserved() {
        let kept = by_state_prefix(sample(), "STATE", "STOPPED");
        assert_eq!(kept[0].get("SERVICE_NAME"), Some("Spooler"));
        assert_eq!(kept[1].get("SERVICE_NAME"), Some("W32Time"));
    }

    #[test]
    fn empty_input_never_faults() {
        assert!(by_name_allow_list(vec![], "x", &["a".to_string()]).is_empty());
        assert!(by_state_prefix(vec![], "x", "S").is_empty());
        assert!(without_substring(vec![], "x", "S").is_empty());
    }
}
