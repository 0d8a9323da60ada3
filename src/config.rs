use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::error::TravisDumpError;

/// Largest page size the Travis API honours.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Configuration file structure for travis-dump.
///
/// Loaded once at startup. Command-line flags are applied on top and the
/// result is validated into [`RunSettings`], which is what the rest of the
/// program sees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Travis API connection and traversal settings
    #[serde(default)]
    pub travis: TravisConfig,

    /// CSV destination
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TravisConfig {
    /// Travis API token
    pub token: Option<String>,

    /// Travis API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Repository id or slug (e.g. '12345' or 'owner/repo')
    pub repository: Option<String>,

    /// Builds requested per page
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Number of builds to skip, newest first
    #[serde(default)]
    pub offset: u64,

    /// What to do with a page that fails to decode
    #[serde(default)]
    pub decode_policy: DecodePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// CSV file, truncated on every run
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

/// Handling of a response body that is not the expected JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Log the failure and treat the page as empty, which ends the drain.
    #[default]
    Lenient,
    /// Abort the run.
    Strict,
}

impl Default for TravisConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            repository: None,
            limit: default_limit(),
            offset: 0,
            decode_policy: DecodePolicy::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.travis-ci.com".to_string()
}

fn default_limit() -> usize {
    MAX_PAGE_LIMIT
}

fn default_output_path() -> PathBuf {
    PathBuf::from("travis-builds.csv")
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./travis-dump.toml
    /// 3. ./travis-dump.json
    /// 4. ./travis-dump.yaml
    /// 5. ./travis-dump.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "travis-dump.toml",
            "travis-dump.json",
            "travis-dump.yaml",
            "travis-dump.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

/// Validated, immutable settings for one export run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub token: Option<Token>,
    pub base_url: String,
    pub repository: String,
    pub limit: usize,
    pub offset: u64,
    pub decode_policy: DecodePolicy,
    pub output_path: PathBuf,
}

impl TryFrom<Config> for RunSettings {
    type Error = TravisDumpError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        let travis = config.travis;

        let repository = travis
            .repository
            .map(|repo| repo.trim().to_string())
            .filter(|repo| !repo.is_empty())
            .ok_or_else(|| TravisDumpError::Config("repository must not be empty".into()))?;

        if travis.limit == 0 || travis.limit > MAX_PAGE_LIMIT {
            return Err(TravisDumpError::Config(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}, got {}",
                travis.limit
            )));
        }

        Ok(Self {
            token: travis
                .token
                .filter(|token| !token.is_empty())
                .map(Token::from),
            base_url: travis.base_url,
            repository,
            limit: travis.limit,
            offset: travis.offset,
            decode_policy: travis.decode_policy,
            output_path: config.output.path,
        })
    }
}
