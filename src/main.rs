use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gh_issue_export::config::Config;
use gh_issue_export::export;

#[derive(Parser)]
#[command(name = "gh-issue-export")]
#[command(about = "Export GitHub issues (with optional Projects-v2 fields) to a CSV file")]
#[command(version)]
struct Cli {
    /// Repository in "owner/repo" form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: String,

    /// GitHub access token
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    token: String,

    /// Projects-v2 board number; adds proj_* columns when set
    #[arg(long, env = "PROJECT_NUMBER")]
    project_number: Option<i64>,

    /// Login that owns the project board (defaults to the repository owner)
    #[arg(long, env = "PROJECT_OWNER")]
    project_owner: Option<String>,

    /// Output CSV path
    #[arg(short, long, default_value = "issues_export.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::new(
        &cli.repo,
        cli.token,
        cli.project_number,
        cli.project_owner,
        cli.output,
    )?;

    export::run(&config)
}
