use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::collectors::http::{DEFAULT_USER_AGENT, HttpSettings};
use crate::error::ConfigError;
use crate::models::source::SourceEntry;
use crate::scoring::Scorer;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobsweep", about = "Collect job postings from ATS boards into a local tracker")]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "JOBSWEEP_DATABASE", default_value = "jobs.db", global = true)]
    pub database: PathBuf,

    /// YAML file listing the boards to collect
    #[arg(long, env = "JOBSWEEP_CONFIG", default_value = "companies.yaml", global = true)]
    pub config: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "JOBSWEEP_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,

    /// User-Agent sent to job boards
    #[arg(long, env = "JOBSWEEP_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect every configured board (default when no subcommand given)
    Run,
    /// Write new jobs and today's top jobs to dated CSV files
    Export {
        /// Output directory
        #[arg(long, default_value = "exports")]
        out_dir: PathBuf,

        /// Rows in the top-jobs file
        #[arg(long, default_value = "20")]
        limit: i64,

        /// Leave exported jobs flagged as new
        #[arg(long)]
        keep_new: bool,
    },
    /// Recompute stored scores with the current scoring tables
    Rescore,
    /// Print stored jobs by descending score
    Top {
        #[arg(long)]
        min_score: Option<i64>,

        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Clear the new flag on every job
    ResetNew,
    /// Mark a job as applied (or not, with --undo)
    Applied {
        #[arg(long)]
        source: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        job_id: String,

        #[arg(long)]
        undo: bool,
    },
}

impl Config {
    /// Resolve the command, defaulting to Run if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout),
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

/// Contents of the YAML config: the ordered board list and scoring tables.
#[derive(Debug, Default)]
pub struct SourcesFile {
    pub companies: Vec<SourceEntry>,
    pub scoring: Scorer,
}

#[derive(Deserialize, Default)]
struct RawFile {
    #[serde(default)]
    companies: Vec<serde_yaml::Value>,
    #[serde(default)]
    scoring: Option<Scorer>,
}

impl SourcesFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Entries that do not deserialize are logged and dropped; the rest of the
    /// file still loads.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawFile = serde_yaml::from_str::<Option<RawFile>>(text)?.unwrap_or_default();

        let companies = raw
            .companies
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                serde_yaml::from_value::<SourceEntry>(value)
                    .inspect_err(|e| tracing::warn!("Skipping companies[{index}]: {e}"))
                    .ok()
            })
            .collect();

        Ok(Self {
            companies,
            scoring: raw.scoring.unwrap_or_default(),
        })
    }
}
