//! Core data types shared by the matcher and the download pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One manifest entry: the remote base directory plus alternate names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Remote base directory of the resource, relative to the repository root.
    pub path: String,
    /// Alternate names and spellings, used only for matching.
    #[serde(default)]
    pub alias: Vec<String>,
}

/// Resource key → entry, in manifest insertion order.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: IndexMap<String, AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Returns `false` (and leaves the table untouched) if
    /// the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, entry: AliasEntry) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, entry);
        true
    }

    pub fn get(&self, key: &str) -> Option<&AliasEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, AliasEntry)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (K, AliasEntry)>>(iter: I) -> Self {
        let mut table = AliasTable::new();
        for (key, entry) in iter {
            table.insert(key, entry);
        }
        table
    }
}

/// Repository flavour served by an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    #[default]
    Gitea,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Gitea => "gitea",
        }
    }
}

/// One configured remote repository location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub id: i64,
    #[serde(default)]
    pub kind: EndpointKind,
    /// Display name.
    pub name: String,
    /// Host, optionally with an explicit `http://` or `https://` scheme.
    pub host: String,
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Route requests through the acceleration proxy. Absent means `true`.
    #[serde(default = "default_use_proxy")]
    pub use_proxy: bool,
}

fn default_use_proxy() -> bool {
    true
}

impl EndpointConfig {
    /// Names of required fields that are empty (after trimming).
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.id == 0 {
            missing.push("id");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.owner.trim().is_empty() {
            missing.push("owner");
        }
        if self.repo.trim().is_empty() {
            missing.push("repo");
        }
        missing
    }

    /// An endpoint is usable once every field except `use_proxy` is set.
    pub fn is_usable(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A file discovered by the directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRef {
    /// File name (last path segment).
    pub name: String,
    /// Path below the resource's base directory, `/`-separated.
    pub relative_path: String,
    /// Path from the repository root, used to build the raw-content URL.
    pub full_remote_path: String,
}
