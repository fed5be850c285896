//! Resource manifest loading.
//!
//! The manifest maps resource keys to their remote base directory and
//! aliases. Three shapes are accepted:
//!
//! | Shape | Example |
//! |-------|---------|
//! | Legacy object | `{ "Doremi": { "path": "songs/doremi", "alias": ["どれみ"] } }` |
//! | Versioned | `{ "version": 3, "items": [ { "id": "doremi", "name": "Doremi", "path": "songs/doremi", "alias": [] } ] }` |
//! | Bare array | `[ { "id": "doremi", "name": "Doremi", "path": "songs/doremi" } ]` |
//!
//! Item forms are keyed by `name`. When a name repeats, the later item is
//! keyed by its `id` instead and keeps its name as an alias, so both stay
//! searchable. Entries without a path are skipped.

use std::path::Path;

use serde_json::Value;

use aliaszip_core::catalog::ManifestItem;
use aliaszip_core::models::{AliasEntry, AliasTable};

use crate::error::ManifestError;

/// A manifest document reduced to its item list.
///
/// `version` is `None` for the legacy object shape and `Some(2)` for item
/// lists that carry no integer version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDoc {
    pub version: Option<u64>,
    pub items: Vec<ManifestItem>,
}

/// Read and parse the manifest at `path`.
pub fn load_manifest(path: &Path) -> Result<AliasTable, ManifestError> {
    let table = table_from_items(read_document(path)?.items).map_err(|reason| {
        ManifestError::Invalid {
            path: path.to_path_buf(),
            reason,
        }
    })?;
    tracing::debug!(entries = table.len(), "loaded manifest {}", path.display());
    Ok(table)
}

/// Read the manifest at `path` as a [`ManifestDoc`].
pub fn read_document(path: &Path) -> Result<ManifestDoc, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(value).map_err(|reason| ManifestError::Invalid {
        path: path.to_path_buf(),
        reason,
    })
}

/// Interpret an already-parsed manifest document.
pub fn parse_manifest(value: Value) -> Result<AliasTable, String> {
    table_from_items(parse_document(value)?.items)
}

/// Normalize any of the three manifest shapes into items.
///
/// Only an object whose `items` member is an array is the versioned shape.
/// Every other object is a legacy map, even one with a resource named
/// `items`.
pub fn parse_document(value: Value) -> Result<ManifestDoc, String> {
    match value {
        Value::Object(mut map) if matches!(map.get("items"), Some(Value::Array(_))) => {
            let version = map.get("version").and_then(Value::as_u64).or(Some(2));
            let items = match map.remove("items") {
                Some(Value::Array(items)) => items_from_values(items)?,
                _ => Vec::new(),
            };
            Ok(ManifestDoc { version, items })
        }
        Value::Object(map) => Ok(ManifestDoc {
            version: None,
            items: items_from_legacy_object(map)?,
        }),
        Value::Array(items) => Ok(ManifestDoc {
            version: Some(2),
            items: items_from_values(items)?,
        }),
        _ => Err("expected a JSON object or array".to_string()),
    }
}

fn items_from_legacy_object(map: serde_json::Map<String, Value>) -> Result<Vec<ManifestItem>, String> {
    map.into_iter()
        .map(|(key, val)| {
            let mut item: ManifestItem =
                serde_json::from_value(val).map_err(|e| format!("entry '{}': {}", key, e))?;
            if item.id.is_empty() {
                item.id = if item.path.is_empty() {
                    key.clone()
                } else {
                    item.path.clone()
                };
            }
            item.name = key;
            Ok(item)
        })
        .collect()
}

fn items_from_values(values: Vec<Value>) -> Result<Vec<ManifestItem>, String> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let mut item: ManifestItem =
                serde_json::from_value(raw).map_err(|e| format!("item {}: {}", i, e))?;
            if item.id.is_empty() {
                item.id = if item.path.is_empty() {
                    item.name.clone()
                } else {
                    item.path.clone()
                };
            }
            Ok(item)
        })
        .collect()
}

fn table_from_items(items: Vec<ManifestItem>) -> Result<AliasTable, String> {
    let mut table = AliasTable::new();
    for (i, item) in items.into_iter().enumerate() {
        if item.path.trim().is_empty() {
            tracing::warn!(index = i, name = %item.name, "skipping manifest item without a path");
            continue;
        }

        let name = if item.name.is_empty() {
            item.path.rsplit('/').next().unwrap_or(&item.path).to_string()
        } else {
            item.name
        };

        let mut entry = AliasEntry {
            path: item.path,
            alias: item.alias,
        };

        if !table.contains_key(&name) {
            table.insert(name, entry);
            continue;
        }

        let fallback = if item.id.is_empty() {
            entry.path.clone()
        } else {
            item.id
        };
        if table.contains_key(&fallback) {
            return Err(format!(
                "item {}: key '{}' is not unique (name and id both taken)",
                i, fallback
            ));
        }
        if !entry.alias.contains(&name) {
            entry.alias.push(name);
        }
        table.insert(fallback, entry);
    }
    Ok(table)
}
