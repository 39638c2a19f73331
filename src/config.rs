//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/folio.sqlite"
//!
//! [related]
//! default_limit = 5
//! max_limit = 20
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! cache_max_age_secs = 300
//! stale_while_revalidate_secs = 600
//!
//! [import]
//! root = "./content/blog"
//! include_globs = ["**/*.md"]
//! exclude_globs = ["drafts/**"]
//! ```
//!
//! Only `[db]` and `[server].bind` are required; everything else has a
//! default. See [`load_config`] for validation rules.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use folio_core::related::{DEFAULT_LIMIT, MAX_LIMIT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub related: RelatedConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub import: Option<ImportConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelatedConfig {
    /// Results returned when the caller gives no limit.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Largest limit a caller may ask for.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}
fn default_max_limit() -> usize {
    MAX_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: u64,
    #[serde(default = "default_stale_while_revalidate")]
    pub stale_while_revalidate_secs: u64,
}

fn default_cache_max_age() -> u64 {
    300
}
fn default_stale_while_revalidate() -> u64 {
    600
}

impl ServerConfig {
    /// `Cache-Control` value attached to successful related responses.
    pub fn cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.cache_max_age_secs, self.stale_while_revalidate_secs
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.markdown".to_string()]
}

impl ImportConfig {
    /// Import settings for `root` with the default globs.
    pub fn at(root: PathBuf) -> Self {
        Self {
            root,
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

impl RelatedConfig {
    /// Resolve a caller-supplied limit, applying the default and enforcing
    /// `1..=max_limit`.
    pub fn resolve_limit(&self, requested: Option<i64>) -> Result<usize, LimitError> {
        let Some(limit) = requested else {
            return Ok(self.default_limit);
        };
        if limit < 1 {
            return Err(LimitError::NotPositive(limit));
        }
        let limit = usize::try_from(limit).map_err(|_| LimitError::TooLarge {
            requested: limit,
            max: self.max_limit,
        })?;
        if limit > self.max_limit {
            return Err(LimitError::TooLarge {
                requested: limit as i64,
                max: self.max_limit,
            });
        }
        Ok(limit)
    }
}

/// Rejected result-count limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitError {
    #[error("limit must be a positive integer, got {0}")]
    NotPositive(i64),
    #[error("limit must be at most {max}, got {requested}")]
    TooLarge { requested: i64, max: usize },
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.related.max_limit == 0 {
        anyhow::bail!("related.max_limit must be >= 1");
    }

    if config.related.default_limit == 0 || config.related.default_limit > config.related.max_limit
    {
        anyhow::bail!(
            "related.default_limit must be in [1, {}], got {}",
            config.related.max_limit,
            config.related.default_limit
        );
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
