//! Heuristic extraction of the free-text "duration" annotation from an
//! issue body. Two forms are recognized, in order:
//!
//! 1. a `Duration: 2h` (or `Duration - 2h`) key-value line,
//! 2. a `## Duration` / `### Duration` heading section, taking the first
//!    non-blank line beneath it with blockquote and bold markers stripped.
//!
//! The key-value form wins when both are present.

use regex::Regex;
use std::sync::LazyLock;

static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*duration\s*[:\-]\s*(.+?)\s*$").unwrap());

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*#{2,3}\s*duration\s*$").unwrap());

static SECTION_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{2,3}\s").unwrap());

pub fn extract_duration(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    if let Some(caps) = KEY_VALUE.captures(body) {
        return Some(caps[1].trim().to_string());
    }

    let mut in_section = false;
    for line in body.lines() {
        if in_section {
            if SECTION_END.is_match(line) {
                break;
            }
            if !line.trim().is_empty() {
                return Some(clean_section_line(line));
            }
        } else if HEADING.is_match(line) {
            in_section = true;
        }
    }

    None
}

/// Strip a leading blockquote marker and surrounding bold markup.
fn clean_section_line(line: &str) -> String {
    let line = line.trim();
    let line = line.strip_prefix('>').map_or(line, str::trim_start);
    let line = line.strip_prefix("**").map_or(line, str::trim_start);
    let line = line.strip_suffix("**").map_or(line, str::trim_end);
    line.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_value_colon() {
        let body = "Some context.\nDuration: 2h\nMore text.";
        assert_eq!(extract_duration(body).as_deref(), Some("2h"));
    }

    #[test]
    fn test_key_value_hyphen() {
        assert_eq!(extract_duration("Duration - 3 days").as_deref(), Some("3 days"));
    }

    #[test]
    fn test_key_value_case_insensitive() {
        assert_eq!(extract_duration("duration: 45m").as_deref(), Some("45m"));
        assert_eq!(extract_duration("DURATION:1h30m").as_deref(), Some("1h30m"));
    }

    #[test]
    fn test_key_value_leading_whitespace() {
        assert_eq!(extract_duration("  Duration: 2h  ").as_deref(), Some("2h"));
    }

    #[test]
    fn test_heading_section_with_quote_and_bold() {
        let body = "### Duration\n\n> **5h**\n\n### Next\nother";
        assert_eq!(extract_duration(body).as_deref(), Some("5h"));
    }

    #[test]
    fn test_heading_level_two() {
        let body = "## Duration\nabout a week";
        assert_eq!(extract_duration(body).as_deref(), Some("about a week"));
    }

    #[test]
    fn test_heading_section_skips_blank_lines() {
        let body = "### Duration\n\n\n2h";
        assert_eq!(extract_duration(body).as_deref(), Some("2h"));
    }

    #[test]
    fn test_heading_section_empty_before_next_heading() {
        let body = "### Duration\n\n### Other\n2h";
        assert_eq!(extract_duration(body), None);
    }

    #[test]
    fn test_key_value_wins_over_heading() {
        let body = "### Duration\n\n> **5h**\n\nDuration: 2h";
        assert_eq!(extract_duration(body).as_deref(), Some("2h"));
    }

    #[test]
    fn test_no_duration() {
        assert_eq!(extract_duration(""), None);
        assert_eq!(extract_duration("Just a plain bug report."), None);
        assert_eq!(extract_duration("# Duration\n2h"), None);
    }

    #[test]
    fn test_bold_without_quote() {
        let body = "## Duration\n**2 days**";
        assert_eq!(extract_duration(body).as_deref(), Some("2 days"));
    }

    #[test]
    fn test_heading_requires_exact_title() {
        assert_eq!(extract_duration("### Durations\n2h"), None);
    }

    proptest! {
        #[test]
        fn prop_never_panics(body in "\\PC{0,200}") {
            let _ = extract_duration(&body);
        }

        #[test]
        fn prop_key_value_is_trimmed(value in "[a-z0-9 ]{1,20}") {
            let body = format!("Duration: {value}");
            if let Some(found) = extract_duration(&body) {
                prop_assert_eq!(found.as_str(), value.trim());
            }
        }
    }
}
