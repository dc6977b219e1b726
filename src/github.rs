use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::models::RawIssue;

const API_ROOT: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("gh-issue-export/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for the GitHub REST and GraphQL APIs.
pub struct GithubClient {
    http: Client,
    token: String,
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

impl GithubClient {
    pub fn new(token: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(GithubClient {
            http,
            token: token.to_string(),
        })
    }

    /// Fetch every issue of `owner/repo` (state=all), walking pages of 100
    /// until an empty page. Pull requests are still present in the result;
    /// the caller filters them.
    pub fn fetch_all_issues(&self, owner: &str, repo: &str) -> Result<Vec<RawIssue>> {
        let url = format!("{API_ROOT}/repos/{owner}/{repo}/issues");

        fetch_paged(|page| {
            debug!(page, "fetching issue page");
            let resp = self.get(
                &url,
                &[
                    ("state", "all".to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ],
            )?;
            resp.json::<Vec<RawIssue>>()
                .context("Failed to decode issue page")
        })
    }

    /// Run a GraphQL query and decode its `data` payload. A non-empty
    /// `errors` array in the response is treated as a failure.
    pub fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        debug!(?variables, "sending GraphQL query");
        let resp = self
            .http
            .post(format!("{API_ROOT}/graphql"))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&GraphqlRequest { query, variables })
            .send()
            .context("GraphQL request failed")?;
        let resp = check_response(resp)?;

        let envelope: GraphqlResponse<T> = resp
            .json()
            .context("Failed to decode GraphQL response")?;
        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                bail!("GraphQL query returned errors: {}", messages.join("; "));
            }
        }
        envelope
            .data
            .context("GraphQL response carried no data")
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(query)
            .send()
            .with_context(|| format!("Request to {url} failed"))?;
        check_response(resp)
    }
}

/// Fail on any non-success status, carrying the status code and body.
fn check_response(resp: Response) -> Result<Response> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        bail!("Request failed ({status}): {body}");
    }
    Ok(resp)
}

/// Concatenate pages 1, 2, ... until `fetch_page` returns an empty page.
/// Any page error aborts the walk.
pub fn fetch_paged<T>(mut fetch_page: impl FnMut(u32) -> Result<Vec<T>>) -> Result<Vec<T>> {
    let mut all = Vec::new();
    let mut page = 1;

    loop {
        let batch = fetch_page(page)?;
        if batch.is_empty() {
            break;
        }
        all.extend(batch);
        page += 1;
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_fetch_paged_collects_all_pages() {
        // 250 items spread over pages of 100: 100 + 100 + 50 + empty.
        let result = fetch_paged(|page| {
            Ok(match page {
                1 | 2 => (0..100).collect::<Vec<i64>>(),
                3 => (0..50).collect(),
                _ => Vec::new(),
            })
        })
        .unwrap();
        assert_eq!(result.len(), 250);
    }

    #[test]
    fn test_fetch_paged_empty_first_page() {
        let result: Vec<i64> = fetch_paged(|_| Ok(Vec::new())).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_fetch_paged_stops_at_first_empty_page() {
        let mut requested = Vec::new();
        fetch_paged(|page| {
            requested.push(page);
            Ok(if page <= 2 { vec![page] } else { Vec::new() })
        })
        .unwrap();
        assert_eq!(requested, vec![1, 2, 3]);
    }

    #[test]
    fn test_fetch_paged_propagates_errors() {
        let result: Result<Vec<i64>> = fetch_paged(|page| {
            if page == 2 {
                Err(anyhow!("boom"))
            } else {
                Ok(vec![1])
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_graphql_error_envelope_parses() {
        let envelope: GraphqlResponse<serde_json::Value> = serde_json::from_str(
            r#"{ "data": null, "errors": [ { "message": "Could not resolve" } ] }"#,
        )
        .unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.unwrap()[0].message, "Could not resolve");
    }

    #[test]
    fn test_graphql_data_envelope_parses() {
        let envelope: GraphqlResponse<serde_json::Value> =
            serde_json::from_str(r#"{ "data": { "ok": true } }"#).unwrap();
        assert!(envelope.data.is_some());
        assert!(envelope.errors.is_none());
    }
}
