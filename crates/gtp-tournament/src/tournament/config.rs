//! Tournament configuration (TOML)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::gtp::{ClientOptions, DEFAULT_MAX_NOISE_LINES};

pub const MIN_BOARD_SIZE: usize = 2;
pub const MAX_BOARD_SIZE: usize = 25;

/// How to launch one engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSpec {
    /// Executable followed by its arguments
    pub command: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Overrides the name the engine reports
    #[serde(default)]
    pub name: Option<String>,
}

impl EngineSpec {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            working_dir: None,
            name: None,
        }
    }

    /// Label usable before the engine has been asked for its name
    pub fn launch_label(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.command.first().map(String::as_str))
            .unwrap_or("<empty>")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TournamentConfig {
    pub engines: Vec<EngineSpec>,
    pub scorer: EngineSpec,
    #[serde(default = "default_board_size")]
    pub board_size: usize,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Result file, appended to
    pub output: PathBuf,
    #[serde(default)]
    pub komi: Option<f32>,
    /// Read timeout for `genmove`; unset waits forever
    #[serde(default)]
    pub move_timeout_ms: Option<u64>,
    /// Read timeout for every other command; unset waits forever
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,
    #[serde(default = "default_max_noise_lines")]
    pub max_noise_lines: usize,
    /// Directory of `.sgf` openings
    #[serde(default)]
    pub openings_dir: Option<PathBuf>,
}

fn default_board_size() -> usize {
    9
}

fn default_iterations() -> u32 {
    1
}

fn default_concurrency() -> usize {
    1
}

fn default_max_noise_lines() -> usize {
    DEFAULT_MAX_NOISE_LINES
}

impl TournamentConfig {
    /// Configuration with defaults for everything but the engines.
    pub fn new(engines: Vec<EngineSpec>, scorer: EngineSpec, output: PathBuf) -> Self {
        Self {
            engines,
            scorer,
            board_size: default_board_size(),
            iterations: default_iterations(),
            concurrency: default_concurrency(),
            output,
            komi: None,
            move_timeout_ms: None,
            response_timeout_ms: None,
            max_noise_lines: default_max_noise_lines(),
            openings_dir: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: Self =
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engines.len() < 2 {
            bail!("at least 2 engines are required (got {})", self.engines.len());
        }
        for (i, engine) in self.engines.iter().enumerate() {
            if engine.command.is_empty() {
                bail!("engines[{i}]: command is empty");
            }
        }
        if self.scorer.command.is_empty() {
            bail!("scorer: command is empty");
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.iterations == 0 {
            bail!("iterations must be at least 1");
        }
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            bail!(
                "board_size must be between {MIN_BOARD_SIZE} and {MAX_BOARD_SIZE} (got {})",
                self.board_size
            );
        }
        if self.max_noise_lines == 0 {
            bail!("max_noise_lines must be at least 1");
        }
        Ok(())
    }

    /// Number of games the batch will play
    pub fn total_games(&self) -> u64 {
        let n = self.engines.len() as u64;
        u64::from(self.iterations) * n * n.saturating_sub(1)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            move_timeout: self.move_timeout_ms.map(Duration::from_millis),
            response_timeout: self.response_timeout_ms.map(Duration::from_millis),
            max_noise_lines: self.max_noise_lines,
        }
    }
}
