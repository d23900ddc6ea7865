//! Math typesetting through an external engine.
//!
//! The engine settings are process-wide and set at most once: either
//! explicitly with [`init_engine`] or lazily from the environment on first
//! use. Every math block is typeset independently; a failing block turns into
//! its source text plus a short diagnostic and never aborts the document.

use std::process::Stdio;
use std::time::Duration;

use futures::future::{BoxFuture, join_all};
use once_cell::sync::OnceCell;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::TypesetError;

static ENGINE: OnceCell<EngineConfig> = OnceCell::new();

const DEFAULT_COMMAND: &str = "tex2svg";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How to invoke the TeX-to-SVG engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Executable to run.
    pub command: String,
    /// Arguments placed before `--` and the TeX source, which is always last.
    pub args: Vec<String>,
    /// Upper bound for a single block.
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Read `POSTBAKE_TEX_COMMAND` and `POSTBAKE_TEX_TIMEOUT_MS`, falling back
    /// to the defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(command) = std::env::var("POSTBAKE_TEX_COMMAND") {
            if !command.trim().is_empty() {
                config.command = command;
            }
        }
        if let Some(ms) = std::env::var("POSTBAKE_TEX_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }
}

/// Install the engine settings for this process.
///
/// The first call wins; later calls, including concurrent ones, return the
/// settings already in place.
pub fn init_engine(config: EngineConfig) -> &'static EngineConfig {
    ENGINE.get_or_init(|| config)
}

/// The engine settings, initialised from the environment if nobody called
/// [`init_engine`] first.
pub fn engine() -> &'static EngineConfig {
    ENGINE.get_or_init(EngineConfig::from_env)
}

/// Renders TeX source into SVG markup.
pub trait Typesetter: Send + Sync {
    fn typeset<'a>(&'a self, tex: &'a str) -> BoxFuture<'a, Result<String, TypesetError>>;
}

/// Runs the configured engine as a child process, one per block.
///
/// The source is passed as the last argument and the SVG is read from
/// stdout. The child is killed if the call is abandoned.
#[derive(Debug, Clone, Default)]
pub struct CommandTypesetter {
    config: Option<EngineConfig>,
}

impl CommandTypesetter {
    /// Use the process-wide [`engine`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use private settings instead of the process-wide ones.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl CommandTypesetter {
    async fn run(&self, tex: &str) -> Result<String, TypesetError> {
        let config = match &self.config {
            Some(config) => config,
            None => engine(),
        };
        let output = Command::new(&config.command)
            .args(&config.args)
            .arg("--")
            .arg(tex)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TypesetError::Spawn {
                command: config.command.clone(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TypesetError::Engine(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Typesetter for CommandTypesetter {
    fn typeset<'a>(&'a self, tex: &'a str) -> BoxFuture<'a, Result<String, TypesetError>> {
        Box::pin(self.run(tex))
    }
}

fn render(index: usize, tex: &str, result: Result<String, TypesetError>) -> String {
    match result {
        Ok(svg) => svg.replacen("<svg", r#"<svg class="latex""#, 1),
        Err(err) => {
            warn!(index, error = %err, "math block failed to typeset");
            format!("{tex} (parse error: {err})")
        }
    }
}

/// Typeset every block, returning outputs aligned with `blocks`.
///
/// Calls are issued in source order and awaited together; each is bounded
/// by `limit`. Completion order has no effect on the result order.
pub async fn typeset_all(
    typesetter: &dyn Typesetter,
    blocks: &[String],
    limit: Duration,
) -> Vec<String> {
    debug!(blocks = blocks.len(), "typesetting math");
    let calls = blocks.iter().enumerate().map(|(index, tex)| async move {
        let result = timeout(limit, typesetter.typeset(tex))
            .await
            .unwrap_or_else(|_| Err(TypesetError::Timeout(limit)));
        render(index, tex, result)
    });
    join_all(calls).await
}
