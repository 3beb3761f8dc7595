use crate::fetch::DEFAULT_USER_AGENTS;
use crate::pipeline::MAX_IN_FLIGHT;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_STORE_ROOT: &str = "downloads";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8000/api/downloads";
const DEFAULT_TIMEOUT_SECS: u64 = 25;
const MAX_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_RESOURCE_BYTES: u64 = 32 * 1024 * 1024;
const MAX_MAX_RESOURCE_BYTES: u64 = 512 * 1024 * 1024;

/// What counts as "this page was already scraped".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheHitPolicy {
    /// The page directory exists, even if it holds no media.
    #[default]
    DirectoryExists,
    /// The page directory holds at least one media file; empty directories
    /// are scraped again.
    DirectoryHasMedia,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub store_root: PathBuf,
    pub max_in_flight: usize,
    pub request_timeout_secs: u64,
    pub max_resource_bytes: u64,
    pub user_agents: Vec<String>,
    /// Prefix of the location handed back after a scrape; the page identity
    /// is appended.
    pub public_base_url: String,
    pub cache_hit: CacheHitPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from(DEFAULT_STORE_ROOT),
            max_in_flight: MAX_IN_FLIGHT,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_resource_bytes: DEFAULT_MAX_RESOURCE_BYTES,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            cache_hit: CacheHitPolicy::default(),
        }
    }
}

impl ScraperConfig {
    /// Clamps limits into their supported ranges and drops blank user agents.
    pub fn normalized(mut self) -> Self {
        self.max_in_flight = self.max_in_flight.clamp(1, MAX_IN_FLIGHT);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, MAX_TIMEOUT_SECS);
        self.max_resource_bytes = self.max_resource_bytes.clamp(1, MAX_MAX_RESOURCE_BYTES);
        self.user_agents = self
            .user_agents
            .into_iter()
            .map(|agent| agent.trim().to_string())
            .filter(|agent| !agent.is_empty())
            .collect();
        let base = self.public_base_url.trim().trim_end_matches('/');
        self.public_base_url = if base.is_empty() {
            DEFAULT_PUBLIC_BASE_URL.to_string()
        } else {
            base.to_string()
        };
        if self.store_root.as_os_str().is_empty() {
            self.store_root = PathBuf::from(DEFAULT_STORE_ROOT);
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn load_config(path: &Path) -> Result<ScraperConfig> {
    if !path.exists() {
        return Ok(ScraperConfig::default());
    }
    let bytes = std::fs::read(path)?;
    let parsed: ScraperConfig = serde_json::from_slice(&bytes).map_err(|e| {
        EngineError::Config(format!(
            "failed to parse scraper config at {}: {e}",
            path.to_string_lossy()
        ))
    })?;
    Ok(parsed.normalized())
}

pub fn save_config(path: &Path, config: &ScraperConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(&dir.path().join("nope.json")).expect("load");
        assert_eq!(config, ScraperConfig::default());
        assert_eq!(config.max_in_flight, 10);
        assert_eq!(config.cache_hit, CacheHitPolicy::DirectoryExists);
    }

    #[test]
    fn partial_file_is_filled_and_clamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"max_in_flight": 64, "request_timeout_secs": 0, "user_agents": ["  ", "bot/1.0"], "public_base_url": "https://cdn.site/dl/", "cache_hit": "directory_has_media"}"#,
        )
        .expect("write");

        let config = load_config(&path).expect("load");
        assert_eq!(config.max_in_flight, MAX_IN_FLIGHT);
        assert_eq!(config.request_timeout_secs, 1);
        assert_eq!(config.user_agents, vec!["bot/1.0".to_string()]);
        assert_eq!(config.public_base_url, "https://cdn.site/dl");
        assert_eq!(config.cache_hit, CacheHitPolicy::DirectoryHasMedia);
        assert_eq!(config.store_root, PathBuf::from("downloads"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(load_config(&path), Err(EngineError::Config(_))));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = ScraperConfig {
            store_root: dir.path().join("store"),
            max_in_flight: 4,
            cache_hit: CacheHitPolicy::DirectoryHasMedia,
            ..ScraperConfig::default()
        };
        save_config(&path, &config).expect("save");
        assert!(std::fs::read_to_string(&path).expect("read").ends_with("}\n"));
        assert_eq!(load_config(&path).expect("load"), config);
    }
}
