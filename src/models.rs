use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::duration::extract_duration;

/// One item from the REST issues listing. The endpoint returns pull
/// requests too; those carry a `pull_request` marker and are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub number: i64,
    pub title: String,
    pub state: String,
    pub user: Option<Actor>,
    #[serde(default)]
    pub assignees: Vec<Actor>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub milestone: Option<Milestone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub html_url: String,
    pub body: Option<String>,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub locked: bool,
    pub node_id: String,
    pub reactions: Option<Reactions>,
    pub pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Milestone {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reactions {
    #[serde(rename = "+1", default)]
    pub plus_one: i64,
    #[serde(rename = "-1", default)]
    pub minus_one: i64,
    #[serde(default)]
    pub laugh: i64,
    #[serde(default)]
    pub hooray: i64,
    #[serde(default)]
    pub confused: i64,
    #[serde(default)]
    pub heart: i64,
    #[serde(default)]
    pub rocket: i64,
    #[serde(default)]
    pub eyes: i64,
}

/// Flattened per-issue record, immutable after construction. One CSV row.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub number: i64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub closed_at: Option<String>,
    pub url: String,
    pub author: Option<String>,
    pub assignees: String,
    pub labels: String,
    pub milestone: Option<String>,
    pub comments_count: i64,
    pub locked: bool,
    pub reactions: Option<Reactions>,
    pub body: String,
    pub duration: Option<String>,
    /// GraphQL node id, used for Projects-v2 lookups. Never exported.
    pub node_id: String,
}

impl IssueRecord {
    pub fn from_raw(raw: &RawIssue) -> Self {
        let body = raw
            .body
            .as_deref()
            .unwrap_or_default()
            .replace("\r\n", "\n");

        IssueRecord {
            number: raw.number,
            title: raw.title.clone(),
            state: raw.state.clone(),
            created_at: format_timestamp(&raw.created_at),
            updated_at: format_timestamp(&raw.updated_at),
            closed_at: raw.closed_at.as_ref().map(format_timestamp),
            url: raw.html_url.clone(),
            author: raw.user.as_ref().map(|u| u.login.clone()),
            assignees: join_logins(&raw.assignees),
            labels: raw
                .labels
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            milestone: raw.milestone.as_ref().map(|m| m.title.clone()),
            comments_count: raw.comments,
            locked: raw.locked,
            reactions: raw.reactions.clone(),
            duration: extract_duration(&body),
            body,
            node_id: raw.node_id.clone(),
        }
    }
}

fn join_logins(actors: &[Actor]) -> String {
    actors
        .iter()
        .map(|a| a.login.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
