use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::csv;
use crate::github::GithubClient;
use crate::models::IssueRecord;
use crate::project::{self, ProjectFields};
use crate::table;

/// Fetch, flatten, optionally resolve project fields, and write the CSV.
pub fn run(config: &Config) -> Result<()> {
    let client = GithubClient::new(&config.token)?;

    info!(owner = %config.owner, repo = %config.repo, "fetching issues");
    let raw = client.fetch_all_issues(&config.owner, &config.repo)?;
    let records: Vec<IssueRecord> = raw
        .iter()
        .filter(|r| !r.is_pull_request())
        .map(IssueRecord::from_raw)
        .collect();
    info!(count = records.len(), "flattened issue records");

    let project = match config.project_number {
        Some(number) => {
            let schema = project::fetch_field_schema(&client, &config.project_owner, number)?;
            let mut per_issue = Vec::with_capacity(records.len());
            for record in &records {
                per_issue.push(project::fetch_issue_fields(
                    &client,
                    &record.node_id,
                    number,
                    &schema,
                )?);
            }
            per_issue
        }
        None => Vec::new(),
    };

    let count = write_csv(&records, &project, &config.output)?;
    println!("Exported {} issues -> {}", count, config.output.display());
    Ok(())
}

/// Assemble the table and write it in one shot; nothing is written on a
/// failure earlier in the run.
pub fn write_csv(
    records: &[IssueRecord],
    project: &[ProjectFields],
    path: &Path,
) -> Result<usize> {
    let table = table::assemble(records, project);
    let mut buf = Vec::new();
    csv::write_table(&mut buf, &table)?;
    fs::write(path, buf).context("Failed to write export file")?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawIssue;
    use tempfile::tempdir;

    const PAGE_FIXTURE: &str = r#"[
        {
            "number": 1,
            "node_id": "I_1",
            "title": "Crash on startup",
            "state": "open",
            "user": { "login": "octocat" },
            "labels": [ { "name": "bug" } ],
            "milestone": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "closed_at": null,
            "html_url": "https://github.com/o/r/issues/1",
            "body": "Duration: 2h",
            "comments": 0,
            "locked": false,
            "reactions": null
        },
        {
            "number": 2,
            "node_id": "I_2",
            "title": "Old bug",
            "state": "closed",
            "user": { "login": "octocat" },
            "milestone": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-03T00:00:00Z",
            "closed_at": "2024-01-03T00:00:00Z",
            "html_url": "https://github.com/o/r/issues/2",
            "body": null,
            "reactions": null
        },
        {
            "number": 3,
            "node_id": "PR_3",
            "title": "A pull request",
            "state": "open",
            "user": null,
            "milestone": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "closed_at": null,
            "html_url": "https://github.com/o/r/pull/3",
            "body": null,
            "reactions": null,
            "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/3" }
        }
    ]"#;

    fn fixture_records() -> Vec<IssueRecord> {
        let raw: Vec<RawIssue> = serde_json::from_str(PAGE_FIXTURE).unwrap();
        raw.iter()
            .filter(|r| !r.is_pull_request())
            .map(IssueRecord::from_raw)
            .collect()
    }

    #[test]
    fn test_pull_requests_excluded() {
        let records = fixture_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].number, 1);
        assert_eq!(records[1].number, 2);
    }

    #[test]
    fn test_end_to_end_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues_export.csv");
        let records = fixture_records();
        let count = write_csv(&records, &[], &path).unwrap();
        assert_eq!(count, 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("number,title,state,"));

        // Row order and per-row fields match the input issues.
        assert!(lines[1].starts_with("1,Crash on startup,open,"));
        assert!(lines[2].starts_with("2,Old bug,closed,"));
        let labels_idx = lines[0].split(',').position(|c| c == "labels").unwrap();
        assert_eq!(lines[1].split(',').nth(labels_idx).unwrap(), "bug");
        assert_eq!(lines[2].split(',').nth(labels_idx).unwrap(), "");
    }

    #[test]
    fn test_csv_includes_duration_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&fixture_records(), &[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        let duration_idx = lines[0].split(',').position(|c| c == "duration").unwrap();
        assert_eq!(lines[1].split(',').nth(duration_idx).unwrap(), "2h");
        assert_eq!(lines[2].split(',').nth(duration_idx).unwrap(), "");
    }

    #[test]
    fn test_csv_with_project_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = fixture_records();
        let project = vec![
            vec![("Status".to_string(), Some("Todo".to_string()))],
            Vec::new(),
        ];
        write_csv(&records, &project, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].ends_with(",proj_Status"));
        assert!(lines[1].ends_with(",Todo"));
        assert!(lines[2].ends_with(","));
    }

    #[test]
    fn test_empty_export_writes_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let count = write_csv(&[], &[], &path).unwrap();
        assert_eq!(count, 0);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
