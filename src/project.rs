//! GitHub Projects-v2 field resolution over GraphQL: fetch the board's
//! field schema once, then resolve each issue's typed field values into
//! scalars for the CSV.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

use crate::github::GithubClient;

/// Field values resolved for one issue, in the order the API returned
/// them. `None` values keep their column but render empty.
pub type ProjectFields = Vec<(String, Option<String>)>;

const FIELDS_QUERY: &str = r#"
query($login: String!, $number: Int!) {
  user(login: $login) {
    projectV2(number: $number) {
      fields(first: 100) {
        nodes {
          ... on ProjectV2FieldCommon { id name dataType }
          ... on ProjectV2SingleSelectField { options { id name } }
        }
      }
    }
  }
  organization(login: $login) {
    projectV2(number: $number) {
      fields(first: 100) {
        nodes {
          ... on ProjectV2FieldCommon { id name dataType }
          ... on ProjectV2SingleSelectField { options { id name } }
        }
      }
    }
  }
}"#;

const ITEM_QUERY: &str = r#"
query($id: ID!) {
  node(id: $id) {
    ... on Issue {
      projectItems(first: 50, includeArchived: false) {
        nodes {
          project { number }
          fieldValues(first: 100) {
            nodes {
              __typename
              ... on ProjectV2ItemFieldValueCommon {
                field { ... on ProjectV2FieldCommon { id name } }
              }
              ... on ProjectV2ItemFieldTextValue { text }
              ... on ProjectV2ItemFieldNumberValue { number }
              ... on ProjectV2ItemFieldDateValue { date }
              ... on ProjectV2ItemFieldSingleSelectValue { optionId }
              ... on ProjectV2ItemFieldIterationValue { title }
              ... on ProjectV2ItemFieldMilestoneValue { milestone { title } }
              ... on ProjectV2ItemFieldRepositoryValue { repository { nameWithOwner } }
              ... on ProjectV2ItemFieldPullRequestValue {
                pullRequests(first: 5) { nodes { number } }
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Field schema of one project board: field id to name, and option names
/// for single-select fields.
pub struct FieldSchema {
    fields: HashMap<String, FieldInfo>,
}

struct FieldInfo {
    name: String,
    options: HashMap<String, String>,
}

impl FieldSchema {
    pub fn field_name(&self, field_id: &str) -> Option<&str> {
        self.fields.get(field_id).map(|f| f.name.as_str())
    }

    pub fn option_name(&self, field_id: &str, option_id: &str) -> Option<&str> {
        self.fields
            .get(field_id)
            .and_then(|f| f.options.get(option_id))
            .map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

// `default = "Vec::new"` keeps the derive from demanding `T: Default`.
#[derive(Deserialize)]
struct NodeList<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<T>,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        NodeList { nodes: Vec::new() }
    }
}

#[derive(Deserialize)]
struct SchemaData {
    user: Option<OwnerNode>,
    organization: Option<OwnerNode>,
}

#[derive(Deserialize)]
struct OwnerNode {
    #[serde(rename = "projectV2")]
    project_v2: Option<ProjectNode>,
}

#[derive(Deserialize)]
struct ProjectNode {
    fields: NodeList<FieldNode>,
}

#[derive(Deserialize)]
struct FieldNode {
    id: String,
    name: String,
    #[serde(rename = "dataType")]
    data_type: String,
    #[serde(default)]
    options: Vec<FieldOption>,
}

#[derive(Deserialize)]
struct FieldOption {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct ItemData {
    node: Option<IssueNode>,
}

#[derive(Deserialize)]
struct IssueNode {
    #[serde(rename = "projectItems", default)]
    project_items: Option<NodeList<ProjectItem>>,
}

#[derive(Deserialize)]
struct ProjectItem {
    project: ProjectRef,
    #[serde(rename = "fieldValues", default)]
    field_values: NodeList<ValueNode>,
}

#[derive(Deserialize)]
struct ProjectRef {
    number: i64,
}

#[derive(Deserialize)]
struct ValueNode {
    #[serde(default)]
    field: Option<FieldRef>,
    #[serde(flatten)]
    value: FieldValue,
}

#[derive(Deserialize)]
struct FieldRef {
    id: String,
    #[serde(default)]
    name: String,
}

/// Closed set of Projects-v2 value kinds, keyed by `__typename`. Anything
/// the API adds later lands in `Unknown` and decodes to an empty value.
#[derive(Deserialize)]
#[serde(tag = "__typename")]
enum FieldValue {
    #[serde(rename = "ProjectV2ItemFieldTextValue")]
    Text { text: Option<String> },
    #[serde(rename = "ProjectV2ItemFieldNumberValue")]
    Number { number: Option<serde_json::Number> },
    #[serde(rename = "ProjectV2ItemFieldDateValue")]
    Date { date: Option<String> },
    #[serde(rename = "ProjectV2ItemFieldSingleSelectValue")]
    SingleSelect {
        #[serde(rename = "optionId")]
        option_id: Option<String>,
    },
    #[serde(rename = "ProjectV2ItemFieldIterationValue")]
    Iteration { title: Option<String> },
    #[serde(rename = "ProjectV2ItemFieldMilestoneValue")]
    Milestone { milestone: Option<MilestoneRef> },
    #[serde(rename = "ProjectV2ItemFieldRepositoryValue")]
    Repository { repository: Option<RepositoryRef> },
    #[serde(rename = "ProjectV2ItemFieldPullRequestValue")]
    PullRequests {
        // The API can pad the list with null entries; those are skipped.
        #[serde(rename = "pullRequests")]
        pull_requests: Option<NodeList<Option<PullRequestRef>>>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
struct MilestoneRef {
    title: String,
}

#[derive(Deserialize)]
struct RepositoryRef {
    #[serde(rename = "nameWithOwner")]
    name_with_owner: String,
}

#[derive(Deserialize)]
struct PullRequestRef {
    number: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch the field schema of project `number` owned by `login`. The query
/// asks both the user and the organization arm; whichever resolves wins.
pub fn fetch_field_schema(
    client: &GithubClient,
    login: &str,
    number: i64,
) -> Result<FieldSchema> {
    let data: SchemaData =
        client.graphql(FIELDS_QUERY, json!({ "login": login, "number": number }))?;

    let project = data
        .user
        .and_then(|o| o.project_v2)
        .or_else(|| data.organization.and_then(|o| o.project_v2))
        .with_context(|| format!("ProjectV2 {login} #{number} not found"))?;

    let mut fields = HashMap::new();
    for node in project.fields.nodes {
        debug!(field = %node.name, data_type = %node.data_type, "project field");
        fields.insert(
            node.id,
            FieldInfo {
                name: node.name,
                options: node.options.into_iter().map(|o| (o.id, o.name)).collect(),
            },
        );
    }

    Ok(FieldSchema { fields })
}

/// Resolve the project field values of one issue. Issues without an item
/// on the target board yield an empty set.
pub fn fetch_issue_fields(
    client: &GithubClient,
    issue_node_id: &str,
    project_number: i64,
    schema: &FieldSchema,
) -> Result<ProjectFields> {
    let data: ItemData = client.graphql(ITEM_QUERY, json!({ "id": issue_node_id }))?;

    let Some(node) = data.node else {
        return Ok(Vec::new());
    };
    let items = node.project_items.unwrap_or_default().nodes;
    let Some(item) = items
        .into_iter()
        .find(|it| it.project.number == project_number)
    else {
        return Ok(Vec::new());
    };

    let mut out: ProjectFields = Vec::new();
    for value in item.field_values.nodes {
        let Some(name) = value.resolve_name(schema) else {
            continue;
        };
        let decoded = value.decode(schema);
        match out.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = decoded,
            None => out.push((name, decoded)),
        }
    }
    Ok(out)
}

impl ValueNode {
    /// Field name: the value's own name, else the schema name for its id,
    /// else the raw id. Values with no field reference are dropped.
    fn resolve_name(&self, schema: &FieldSchema) -> Option<String> {
        let field = self.field.as_ref()?;
        if !field.name.is_empty() {
            return Some(field.name.clone());
        }
        match schema.field_name(&field.id) {
            Some(name) => Some(name.to_string()),
            None => Some(field.id.clone()),
        }
    }

    fn decode(&self, schema: &FieldSchema) -> Option<String> {
        match &self.value {
            FieldValue::Text { text } => text.clone(),
            FieldValue::Number { number } => number.as_ref().map(|n| n.to_string()),
            FieldValue::Date { date } => date.clone(),
            FieldValue::SingleSelect { option_id } => option_id.as_ref().map(|id| {
                let field_id = self.field.as_ref().map(|f| f.id.as_str());
                field_id
                    .and_then(|fid| schema.option_name(fid, id))
                    .unwrap_or(id)
                    .to_string()
            }),
            FieldValue::Iteration { title } => title.clone(),
            FieldValue::Milestone { milestone } => {
                milestone.as_ref().map(|m| m.title.clone())
            }
            FieldValue::Repository { repository } => {
                repository.as_ref().map(|r| r.name_with_owner.clone())
            }
            FieldValue::PullRequests { pull_requests } => {
                let refs: Vec<String> = pull_requests
                    .as_ref()
                    .map(|l| {
                        l.nodes
                            .iter()
                            .flatten()
                            .map(|p| format!("#{}", p.number))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(refs.join(","))
            }
            FieldValue::Unknown => None,
        }
    }
}
