//! Merges flattened issue records with optional project field values into
//! a single column-ordered table.

use crate::models::{IssueRecord, Reactions};
use crate::project::ProjectFields;

/// Fixed leading columns, in output order. Everything else (`duration`,
/// project columns) follows in encountered order. The internal `node_id`
/// is never a column.
pub const BASE_COLUMNS: &[&str] = &[
    "number",
    "title",
    "state",
    "created_at",
    "updated_at",
    "url",
    "author",
    "assignees",
    "labels",
    "milestone",
    "comments_count",
    "closed_at",
    "locked",
    "reactions_+1",
    "reactions_-1",
    "reactions_laugh",
    "reactions_hooray",
    "reactions_confused",
    "reactions_heart",
    "reactions_rocket",
    "reactions_eyes",
    "body",
];

/// Prefix keeping project columns clear of the base column namespace.
pub const PROJECT_COLUMN_PREFIX: &str = "proj_";

pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Build the output table. `project` holds one field set per record (or is
/// empty when no project is configured); the project column set is the
/// union across all records, missing values left empty.
pub fn assemble(records: &[IssueRecord], project: &[ProjectFields]) -> Table {
    let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    columns.push("duration".to_string());
    for fields in project {
        for (name, _) in fields {
            let column = format!("{PROJECT_COLUMN_PREFIX}{name}");
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }

    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let fields = project.get(idx);
            columns
                .iter()
                .map(|column| cell_value(record, fields, column))
                .collect()
        })
        .collect();

    Table { columns, rows }
}

fn cell_value(record: &IssueRecord, fields: Option<&ProjectFields>, column: &str) -> String {
    if let Some(name) = column.strip_prefix(PROJECT_COLUMN_PREFIX) {
        return fields
            .and_then(|f| f.iter().find(|(n, _)| n == name))
            .and_then(|(_, value)| value.clone())
            .unwrap_or_default();
    }
    base_field_value(record, column)
}

fn base_field_value(record: &IssueRecord, column: &str) -> String {
    match column {
        "number" => record.number.to_string(),
        "title" => record.title.clone(),
        "state" => record.state.clone(),
        "created_at" => record.created_at.clone(),
        "updated_at" => record.updated_at.clone(),
        "url" => record.url.clone(),
        "author" => record.author.clone().unwrap_or_default(),
        "assignees" => record.assignees.clone(),
        "labels" => record.labels.clone(),
        "milestone" => record.milestone.clone().unwrap_or_default(),
        "comments_count" => record.comments_count.to_string(),
        "closed_at" => record.closed_at.clone().unwrap_or_default(),
        "locked" => record.locked.to_string(),
        "reactions_+1" => reaction_value(record, |r| r.plus_one),
        "reactions_-1" => reaction_value(record, |r| r.minus_one),
        "reactions_laugh" => reaction_value(record, |r| r.laugh),
        "reactions_hooray" => reaction_value(record, |r| r.hooray),
        "reactions_confused" => reaction_value(record, |r| r.confused),
        "reactions_heart" => reaction_value(record, |r| r.heart),
        "reactions_rocket" => reaction_value(record, |r| r.rocket),
        "reactions_eyes" => reaction_value(record, |r| r.eyes),
        "body" => record.body.clone(),
        "duration" => record.duration.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Absent reactions render empty, not zero.
fn reaction_value(record: &IssueRecord, pick: impl Fn(&Reactions) -> i64) -> String {
    record
        .reactions
        .as_ref()
        .map(|r| pick(r).to_string())
        .unwrap_or_default()
}
