//! TOML configuration.
//!
//! ```toml
//! [manifest]
//! path = "./alias.json"
//!
//! [network]
//! proxy_origin = "https://ghproxy.vanillaaaa.org"
//! branch = "master"
//! timeout_secs = 30
//! sticky_endpoint = false
//!
//! [search]
//! debounce_ms = 300
//! cache_limit = 0
//!
//! [output]
//! dir = "./downloads"
//!
//! [[endpoints]]
//! id = 1718000000000
//! kind = "gitea"
//! name = "main"
//! host = "git.example.org"
//! owner = "someone"
//! repo = "charts"
//! use_proxy = true
//! ```
//!
//! A legacy single-endpoint `[api]` table (`host`, `owner`, `repo`,
//! optional `use_proxy`) is migrated into `[[endpoints]]` on load when no
//! endpoints are present.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use aliaszip_core::models::{EndpointConfig, EndpointKind};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    /// Pre-pool single endpoint. Never written back.
    #[serde(default, rename = "api", skip_serializing)]
    pub legacy_api: Option<LegacyApiConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ManifestConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_proxy_origin")]
    pub proxy_origin: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reuse the listing endpoint for the fetch phase instead of drawing again.
    #[serde(default)]
    pub sticky_endpoint: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy_origin: default_proxy_origin(),
            branch: default_branch(),
            timeout_secs: default_timeout_secs(),
            sticky_endpoint: false,
        }
    }
}

fn default_proxy_origin() -> String {
    "https://ghproxy.vanillaaaa.org".to_string()
}
fn default_branch() -> String {
    "master".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Per-cache entry limit for the term caches. 0 = unbounded.
    #[serde(default)]
    pub cache_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            cache_limit: 0,
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LegacyApiConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    pub use_proxy: Option<bool>,
}

impl Config {
    /// Endpoints that satisfy the usability invariant. Incomplete entries are
    /// skipped with a warning.
    pub fn usable_endpoints(&self) -> Vec<EndpointConfig> {
        self.endpoints
            .iter()
            .filter(|ep| {
                let missing = ep.missing_fields();
                if !missing.is_empty() {
                    tracing::warn!(
                        id = ep.id,
                        name = %ep.name,
                        "skipping endpoint with missing fields: {}",
                        missing.join(", ")
                    );
                }
                missing.is_empty()
            })
            .cloned()
            .collect()
    }

    /// Move a legacy `[api]` table into the endpoint pool.
    ///
    /// Returns `true` if the config changed and should be saved. The legacy
    /// table is only honoured when the pool is empty and the table is complete.
    pub fn migrate_legacy(&mut self) -> bool {
        let Some(api) = self.legacy_api.take() else {
            return false;
        };
        if !self.endpoints.is_empty() {
            return true;
        }
        if api.host.trim().is_empty() || api.owner.trim().is_empty() || api.repo.trim().is_empty()
        {
            tracing::warn!("ignoring incomplete legacy [api] table");
            return true;
        }
        self.endpoints.push(EndpointConfig {
            id: chrono::Utc::now().timestamp_millis(),
            kind: EndpointKind::Gitea,
            name: "migrated".to_string(),
            host: api.host.trim().to_string(),
            owner: api.owner.trim().to_string(),
            repo: api.repo.trim().to_string(),
            use_proxy: api.use_proxy.unwrap_or(true),
        });
        tracing::info!("migrated legacy [api] table into [[endpoints]]");
        true
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.manifest.path.as_os_str().is_empty() {
        bail!("manifest.path must not be empty");
    }

    if config.network.timeout_secs == 0 {
        bail!("network.timeout_secs must be > 0");
    }

    if config.network.branch.trim().is_empty() {
        bail!("network.branch must not be empty");
    }

    let proxy = &config.network.proxy_origin;
    if !(proxy.starts_with("http://") || proxy.starts_with("https://")) {
        bail!(
            "network.proxy_origin must start with http:// or https://, got '{}'",
            proxy
        );
    }

    let mut seen = std::collections::HashSet::new();
    for ep in &config.endpoints {
        if !seen.insert(ep.id) {
            bail!("duplicate endpoint id {}", ep.id);
        }
    }

    Ok(())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Write `config` back to `path`, creating parent directories as needed.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[manifest]
path = "alias.json"
"#;

    #[test]
    fn test_defaults() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(cfg.network.branch, "master");
        assert_eq!(cfg.network.timeout_secs, 30);
        assert!(!cfg.network.sticky_endpoint);
        assert_eq!(cfg.search.debounce_ms, 300);
        assert_eq!(cfg.search.cache_limit, 0);
        assert!(cfg.endpoints.is_empty());
        assert!(cfg.usable_endpoints().is_empty());
    }

    #[test]
    fn test_endpoints_parse_and_proxy_default() {
        let cfg = parse_config(
            r#"
[manifest]
path = "alias.json"

[[endpoints]]
id = 1
name = "a"
host = "git.example.org"
owner = "o"
repo = "r"

[[endpoints]]
id = 2
kind = "gitea"
name = "b"
host = "http://127.0.0.1:3000"
owner = "o"
repo = "r"
use_proxy = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.endpoints.len(), 2);
        assert!(cfg.endpoints[0].use_proxy);
        assert!(!cfg.endpoints[1].use_proxy);
    }

    #[test]
    fn test_incomplete_endpoint_not_usable() {
        let cfg = parse_config(
            r#"
[manifest]
path = "alias.json"

[[endpoints]]
id = 1
name = "a"
host = ""
owner = "o"
repo = "r"
"#,
        )
        .unwrap();
        assert_eq!(cfg.endpoints.len(), 1);
        assert!(cfg.usable_endpoints().is_empty());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = parse_config(
            r#"
[manifest]
path = "alias.json"

[network]
timeout_secs = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_rejects_bad_proxy_origin() {
        let err = parse_config(
            r#"
[manifest]
path = "alias.json"

[network]
proxy_origin = "ghproxy.example.org"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("proxy_origin"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = parse_config(
            r#"
[manifest]
path = "alias.json"

[[endpoints]]
id = 5
name = "a"
host = "h"
owner = "o"
repo = "r"

[[endpoints]]
id = 5
name = "b"
host = "h"
owner = "o"
repo = "r"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_migrate_legacy_api() {
        let mut cfg = parse_config(
            r#"
[manifest]
path = "alias.json"

[api]
host = "git.example.org"
owner = "o"
repo = "r"
"#,
        )
        .unwrap();
        assert!(cfg.migrate_legacy());
        assert_eq!(cfg.endpoints.len(), 1);
        let ep = &cfg.endpoints[0];
        assert_eq!(ep.name, "migrated");
        assert_eq!(ep.host, "git.example.org");
        assert!(ep.use_proxy);
        assert!(ep.is_usable());
        assert!(cfg.legacy_api.is_none());
        assert!(!cfg.migrate_legacy());
    }

    #[test]
    fn test_migrate_legacy_keeps_existing_pool() {
        let mut cfg = parse_config(
            r#"
[manifest]
path = "alias.json"

[api]
host = "old.example.org"
owner = "o"
repo = "r"
use_proxy = false

[[endpoints]]
id = 9
name = "current"
host = "new.example.org"
owner = "o"
repo = "r"
"#,
        )
        .unwrap();
        assert!(cfg.migrate_legacy());
        assert_eq!(cfg.endpoints.len(), 1);
        assert_eq!(cfg.endpoints[0].host, "new.example.org");
    }

    #[test]
    fn test_save_round_trip_drops_legacy() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("aliaszip.toml");
        let mut cfg = parse_config(
            r#"
[manifest]
path = "alias.json"

[api]
host = "git.example.org"
owner = "o"
repo = "r"
use_proxy = false
"#,
        )
        .unwrap();
        cfg.migrate_legacy();
        save_config(&path, &cfg).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("[api]"));

        let reloaded = load_config(&path).unwrap();
        assert_eq!(reloaded.endpoints, cfg.endpoints);
        assert!(!reloaded.endpoints[0].use_proxy);
    }
}
