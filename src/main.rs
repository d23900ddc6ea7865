use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::Parser;
use futures::future::join_all;
use postbake::{
    ChartExports, EngineConfig, Formatter, RawPost, Settings, SourceBundle, chart_urls,
    init_engine,
};
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Format authored posts into publish-ready article records")]
struct Cli {
    /// JSON bundle with `tables`, `uploads` and `charts`
    #[arg(long, env = "POSTBAKE_SOURCES")]
    sources: Option<PathBuf>,
    /// JSON settings file
    #[arg(long, env = "POSTBAKE_CONFIG")]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
    /// Print the chart embed URLs of each post instead of formatting it
    #[arg(long = "list-charts")]
    list_charts: bool,
    /// Post records as JSON, one per file; read from stdin when omitted
    files: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct Overrides {
    /// Upgrade `http://` iframe embeds to `https://`
    #[arg(
        long = "https-only",
        env = "POSTBAKE_HTTPS_ONLY",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    https_only: Option<bool>,
    /// Canonical public origin
    #[arg(long = "baked-url", env = "POSTBAKE_BAKED_URL")]
    baked_url: Option<String>,
}

async fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("failed to read standard input")?;
            Ok(input)
        }
    }
}

async fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let text = read_input(Some(path.as_path())).await?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid settings in {}", path.display()))?
        }
        None => Settings::default(),
    };
    if let Some(https_only) = cli.overrides.https_only {
        settings.https_only = https_only;
    }
    if let Some(baked_url) = &cli.overrides.baked_url {
        settings.baked_url.clone_from(baked_url);
    }
    Ok(settings)
}

async fn load_sources(path: Option<&Path>) -> anyhow::Result<SourceBundle> {
    let Some(path) = path else {
        return Ok(SourceBundle::default());
    };
    let text = read_input(Some(path)).await?;
    serde_json::from_str(&text).with_context(|| format!("invalid sources in {}", path.display()))
}

async fn load_post(path: Option<&Path>) -> anyhow::Result<RawPost> {
    let text = read_input(path).await?;
    let name = path.map_or_else(|| "standard input".to_string(), |p| p.display().to_string());
    serde_json::from_str(&text).with_context(|| format!("invalid post record in {name}"))
}

/// Format every post, printing one JSON record per line. Returns the number
/// of posts that failed.
async fn format_all(
    formatter: &Formatter,
    posts: Vec<(String, RawPost)>,
    charts: &ChartExports,
) -> anyhow::Result<usize> {
    let results = join_all(
        posts
            .iter()
            .map(|(_, post)| formatter.format_post(post, Some(charts))),
    )
    .await;
    let mut failed = 0;
    let mut stdout = io::stdout().lock();
    for ((name, _), result) in posts.iter().zip(results) {
        match result {
            Ok(formatted) => {
                let line = serde_json::to_string(&formatted)
                    .with_context(|| format!("failed to encode {name}"))?;
                writeln!(stdout, "{line}")?;
            }
            Err(err) => {
                eprintln!("{name}: {err}");
                failed += 1;
            }
        }
    }
    Ok(failed)
}

fn list_charts(posts: &[(String, RawPost)]) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    for (_, post) in posts {
        for url in chart_urls(&post.content) {
            writeln!(stdout, "{url}")?;
        }
    }
    Ok(())
}

/// Entry point for the command-line formatter.
///
/// Reads post records from the given files, or a single record from standard
/// input, and prints the formatted records as JSON lines. A post that fails
/// is reported on standard error; the others are still printed and the exit
/// status is non-zero.
///
/// # Examples
///
/// ```sh
/// # Format two posts using tables and uploads from a bundle
/// postbake --sources bundle.json hunger.json about.json
///
/// # Format a post from standard input without upgrading iframes
/// cat post.json | postbake --https-only=false
/// ```
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli).await?;
    init_engine(EngineConfig::from_env());

    let inputs: Vec<Option<&Path>> = if cli.files.is_empty() {
        vec![None]
    } else {
        cli.files.iter().map(|p| Some(p.as_path())).collect()
    };
    let mut posts = Vec::with_capacity(inputs.len());
    let mut failed = 0usize;
    for input in inputs {
        let name = input.map_or_else(|| "-".to_string(), |p| p.display().to_string());
        match load_post(input).await {
            Ok(post) => posts.push((name, post)),
            Err(err) => {
                eprintln!("{name}: {err:#}");
                failed += 1;
            }
        }
    }

    if cli.list_charts {
        list_charts(&posts)?;
    } else {
        let (tables, uploads, charts) = load_sources(cli.sources.as_deref()).await?.into_parts();
        let formatter = Formatter::new(settings)
            .with_tables(Arc::new(tables))
            .with_uploads(Arc::new(uploads));
        debug!(posts = posts.len(), "formatting");
        failed += format_all(&formatter, posts, &charts).await?;
    }

    if failed > 0 {
        bail!("{failed} post(s) failed");
    }
    Ok(())
}
