pub mod toml_config;

use crate::core::executor::{DEFAULT_CONCURRENCY, DEFAULT_RETRIES};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use toml_config::FileConfig;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_RETRIES: u32 = 10;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "split-audit")]
#[command(about = "Audit npm dependencies one top-level package at a time")]
pub struct CliConfig {
    /// Project directory containing package.json and a lockfile
    #[arg(long, default_value = ".")]
    pub prefix: PathBuf,

    /// Registry that serves the audit endpoint
    #[arg(long, env = "NPM_CONFIG_REGISTRY")]
    pub registry: Option<String>,

    /// Maximum audits in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Extra attempts per dependency after a failed one
    #[arg(long)]
    pub retries: Option<u32>,

    /// Wait between attempts, in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, help = "Only log errors")]
    pub quiet: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Merges flags over the settings file over built-in defaults.
    pub fn resolve(&self) -> Result<AuditSettings> {
        let file = match &self.config {
            Some(path) => {
                let file = FileConfig::from_file(path)?;
                file.validate()?;
                file
            }
            None => FileConfig::default(),
        };
        Ok(AuditSettings::merge(self, file))
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSettings {
    pub prefix: PathBuf,
    pub registry: String,
    pub concurrency: usize,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
    pub headers: BTreeMap<String, String>,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from("."),
            registry: DEFAULT_REGISTRY.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            retries: DEFAULT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            headers: BTreeMap::new(),
        }
    }
}

impl AuditSettings {
    #[cfg(feature = "cli")]
    fn merge(cli: &CliConfig, file: FileConfig) -> Self {
        let defaults = Self::default();
        Self {
            prefix: cli.prefix.clone(),
            registry: cli
                .registry
                .clone()
                .or(file.registry.url)
                .unwrap_or(defaults.registry),
            concurrency: cli
                .concurrency
                .or(file.fanout.concurrency)
                .unwrap_or(defaults.concurrency),
            retries: cli.retries.or(file.fanout.retries).unwrap_or(defaults.retries),
            retry_delay_ms: cli
                .retry_delay_ms
                .or(file.fanout.retry_delay_ms)
                .unwrap_or(defaults.retry_delay_ms),
            timeout_seconds: cli
                .timeout_seconds
                .or(file.registry.timeout_seconds)
                .unwrap_or(defaults.timeout_seconds),
            headers: file.registry.headers,
        }
    }
}

impl ConfigProvider for AuditSettings {
    fn registry_url(&self) -> &str {
        &self.registry
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn retries(&self) -> u32 {
        self.retries
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for AuditSettings {
    fn validate(&self) -> Result<()> {
        validate_path("prefix", &self.prefix.to_string_lossy())?;
        validate_url("registry", &self.registry)?;
        validate_positive_number("concurrency", self.concurrency, 1)?;
        validate_range("retries", self.retries, 0, MAX_RETRIES)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds as usize, 1)?;
        Ok(())
    }
}
