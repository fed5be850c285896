//! Remote repository access.
//!
//! [`RepoSource`] is the seam between the pipeline and the network: list one
//! directory, fetch one file's raw bytes. [`GiteaSource`] implements it over
//! the Gitea contents and raw-branch endpoints, honouring the endpoint's proxy
//! preference on every request.
//!
//! [`SourceProvider`] turns an [`EndpointConfig`] drawn from the pool into a
//! source, which lets the pipeline draw a fresh endpoint per phase and lets
//! tests substitute in-memory sources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use aliaszip_core::endpoint::{contents_url, raw_url};
use aliaszip_core::models::EndpointConfig;

use crate::config::NetworkConfig;
use crate::error::SourceError;

/// Kind of a directory-listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules, anything else. Ignored by the walker.
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Dir,
        }
    }
}

/// A remote repository that can list directories and serve raw files.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Human-readable label for logs (e.g. the endpoint name).
    fn label(&self) -> &str;

    /// List the direct children of `path` (relative to the repository root).
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, SourceError>;

    /// Fetch the raw bytes of the file at `path` (relative to the repository root).
    async fn fetch_raw(&self, path: &str) -> Result<Vec<u8>, SourceError>;
}

/// Builds a [`RepoSource`] for an endpoint drawn from the pool.
pub trait SourceProvider: Send + Sync {
    fn open(&self, endpoint: &EndpointConfig) -> Arc<dyn RepoSource>;
}

/// Wire shape of a Gitea contents entry; other fields are ignored.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Gitea HTTP source for one endpoint.
pub struct GiteaSource {
    client: reqwest::Client,
    endpoint: EndpointConfig,
    proxy_origin: String,
    branch: String,
}

impl GiteaSource {
    pub fn new(client: reqwest::Client, endpoint: EndpointConfig, network: &NetworkConfig) -> Self {
        Self {
            client,
            endpoint,
            proxy_origin: network.proxy_origin.clone(),
            branch: network.branch.clone(),
        }
    }
}

#[async_trait]
impl RepoSource for GiteaSource {
    fn label(&self) -> &str {
        &self.endpoint.name
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, SourceError> {
        let url = contents_url(&self.endpoint, &self.proxy_origin, path);
        tracing::debug!(endpoint = %self.endpoint.name, %url, "listing directory");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_listing(&body)
    }

    async fn fetch_raw(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        let url = raw_url(&self.endpoint, &self.proxy_origin, &self.branch, path);
        tracing::debug!(endpoint = %self.endpoint.name, %url, "fetching file");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Parse a contents-API body. A single object (the path named a file) is
/// rejected: only directory listings are valid here.
fn parse_listing(body: &str) -> Result<Vec<DirEntry>, SourceError> {
    let entries: Vec<ContentEntry> =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
    Ok(entries
        .into_iter()
        .map(|e| DirEntry {
            kind: match e.kind.as_str() {
                "file" => EntryKind::File,
                "dir" => EntryKind::Dir,
                _ => EntryKind::Other,
            },
            name: e.name,
        })
        .collect())
}

/// Opens [`GiteaSource`]s that share one HTTP client.
pub struct HttpProvider {
    client: reqwest::Client,
    network: NetworkConfig,
}

impl HttpProvider {
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network.timeout_secs))
            .user_agent(concat!("aliaszip/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            network: network.clone(),
        })
    }
}

impl SourceProvider for HttpProvider {
    fn open(&self, endpoint: &EndpointConfig) -> Arc<dyn RepoSource> {
        Arc::new(GiteaSource::new(
            self.client.clone(),
            endpoint.clone(),
            &self.network,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_kinds() {
        let body = r#"[
            {"name": "a.txt", "type": "file", "size": 3, "sha": "abc"},
            {"name": "sub", "type": "dir"},
            {"name": "link", "type": "symlink"},
            {"name": "mod", "type": "submodule"}
        ]"#;
        let entries = parse_listing(body).unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry::file("a.txt"),
                DirEntry::dir("sub"),
                DirEntry {
                    name: "link".to_string(),
                    kind: EntryKind::Other
                },
                DirEntry {
                    name: "mod".to_string(),
                    kind: EntryKind::Other
                },
            ]
        );
    }

    #[test]
    fn test_parse_listing_empty_dir() {
        assert!(parse_listing("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_listing_rejects_single_object() {
        let err = parse_listing(r#"{"name": "a.txt", "type": "file"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
