use anyhow::{bail, Result};
use std::path::PathBuf;

/// Runtime configuration, built once at startup and passed to every
/// component. Nothing else reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub owner: String,
    pub repo: String,
    pub token: String,
    /// Projects-v2 board number; `None` disables project columns.
    pub project_number: Option<i64>,
    /// Login that owns the project board. Defaults to the repository owner.
    pub project_owner: String,
    pub output: PathBuf,
}

impl Config {
    pub fn new(
        repository: &str,
        token: String,
        project_number: Option<i64>,
        project_owner: Option<String>,
        output: PathBuf,
    ) -> Result<Self> {
        let Some((owner, repo)) = repository.split_once('/') else {
            bail!("Invalid repository '{}': expected owner/repo", repository);
        };
        if owner.is_empty() || repo.is_empty() {
            bail!("Invalid repository '{}': expected owner/repo", repository);
        }
        if token.is_empty() {
            bail!("GitHub token is empty");
        }

        Ok(Config {
            project_owner: project_owner.unwrap_or_else(|| owner.to_string()),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token,
            project_number,
            output,
        })
    }
}
