use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, ValueHint};
use contrib_graph::sources::{ContributionSource, GithubSource, GitlabSource};
use contrib_graph::svg::{render_svg, RenderOptions};
use contrib_graph::{build_base_range, classify_calendar, merge_into, Window};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USER_AGENT: &str = concat!("contrib-graph/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Contribution calendar SVG generator", long_about = None)]
struct Cli {
    /// Output SVG path (`-` for stdout)
    #[arg(short, long, default_value = "public/contrib.svg", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Omit the summary header band above the grid
    #[arg(long, action = ArgAction::SetTrue)]
    no_header: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Clone, Debug)]
struct Config {
    github_login: String,
    github_token: String,
    gitlab_user: String,
}

impl Config {
    /// Read identities and the API token from the environment. Fails before
    /// any network I/O when a required value is missing or empty.
    fn from_env() -> Result<Self> {
        let github_login = require_env("GITHUB_USERNAME")?;
        let github_token = first_non_empty(&["GITHUB_TOKEN", "GH_TOKEN"])
            .ok_or_else(|| anyhow!("missing GitHub token: set GITHUB_TOKEN or GH_TOKEN"))?;
        let gitlab_user = require_env("GITLAB_USERNAME")?;
        Ok(Self {
            github_login,
            github_token,
            gitlab_user,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(anyhow!("missing required environment variable {name}")),
    }
}

fn first_non_empty(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| env::var(name).ok().filter(|value| !value.trim().is_empty()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::from_env()?;
    let today = Utc::now().date_naive();
    let window = Window::trailing_year(today);
    info!("Window: {} to {}", window.start, window.end);

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;

    let github = GithubSource {
        login: config.github_login.clone(),
        token: config.github_token.clone(),
    };
    let gitlab = GitlabSource {
        username: config.gitlab_user.clone(),
    };

    let t_fetch = Instant::now();
    let (github_counts, gitlab_counts) = tokio::try_join!(
        github.fetch(&client, &window),
        gitlab.fetch(&client, &window)
    )?;
    info!(
        "Fetch stage: {:.1} ms ({} GitHub days, {} GitLab days)",
        t_fetch.elapsed().as_secs_f64() * 1000.0,
        github_counts.len(),
        gitlab_counts.len()
    );

    let mut calendar = build_base_range(&window);
    let summary = merge_into(
        &mut calendar,
        &[
            (github.name(), github_counts),
            (gitlab.name(), gitlab_counts),
        ],
    );
    let per_source = summary
        .per_source
        .iter()
        .map(|(name, total)| format!("{name} {total}"))
        .collect::<Vec<_>>()
        .join(", ");
    info!("Merged {} contributions ({})", summary.total, per_source);

    let stats = classify_calendar(&calendar);
    let svg = render_svg(
        &stats,
        &window,
        &summary,
        &RenderOptions {
            header: !cli.no_header,
        },
    );

    if cli.output.as_os_str() == "-" {
        io::stdout()
            .write_all(svg.as_bytes())
            .context("failed to write SVG to stdout")?;
    } else {
        if let Some(parent) = cli.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        fs::write(&cli.output, &svg)
            .with_context(|| format!("failed to write {}", cli.output.display()))?;
        info!("Wrote contribution graph: {}", cli.output.display());
    }

    Ok(())
}
