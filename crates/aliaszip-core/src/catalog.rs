//! Manifest item identity: stable slug ids, id migration, and merging a
//! freshly scanned remote tree into existing items.
//!
//! Ids are derived from the item name (`"Hello World"` → `hello-world`) and
//! never change when the item's path moves. Colliding slugs get `-2`, `-3`, …
//! suffixes in order of appearance.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Manifest document version written by [`merge_structure`] callers.
pub const CURRENT_VERSION: u64 = 3;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("valid separator regex"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\-]").expect("valid slug charset regex"));
static DASH_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("valid dash regex"));

/// One manifest item in the versioned (`items`) form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub alias: Vec<String>,
}

impl ManifestItem {
    /// Item for a newly discovered `parent/child` directory.
    pub fn discovered(id: String, path: &str) -> Self {
        Self {
            id,
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            alias: Vec::new(),
        }
    }
}

/// ASCII slug of `name`; `"item"` when nothing survives.
pub fn slug(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let dashed = SEPARATORS.replace_all(&lowered, "-");
    let kept = DISALLOWED.replace_all(&dashed, "");
    let collapsed = DASH_RUNS.replace_all(&kept, "-");
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        "item".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Slug of `base_name`, suffixed until it is not in `used`. The result is
/// added to `used`.
pub fn generate_id(base_name: &str, used: &mut HashSet<String>) -> String {
    let base = slug(base_name);
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// An id needs regenerating when it is empty, path-shaped (older manifests
/// used the path as id), or already taken by an earlier item.
fn needs_new_id(id: &str, used: &HashSet<String>) -> bool {
    id.is_empty() || id.contains('/') || used.contains(id)
}

/// Reassign ids that are empty, path-shaped, or duplicated. Valid ids are
/// kept; order is preserved.
pub fn migrate_ids(items: Vec<ManifestItem>) -> Vec<ManifestItem> {
    let mut used = HashSet::new();
    items
        .into_iter()
        .map(|mut item| {
            if needs_new_id(&item.id, &used) {
                item.id = generate_id(&item.name, &mut used);
            } else {
                used.insert(item.id.clone());
            }
            item
        })
        .collect()
}

/// Does a document of `version` holding `items` need [`migrate_ids`]?
/// Unversioned (`None`) and pre-3 documents always do.
pub fn needs_id_upgrade(items: &[ManifestItem], version: Option<u64>) -> bool {
    match version {
        Some(v) if v >= CURRENT_VERSION => {}
        _ => return true,
    }
    let mut seen = HashSet::new();
    items.iter().any(|item| {
        let bad = needs_new_id(&item.id, &seen);
        seen.insert(item.id.clone());
        bad
    })
}

/// Rebuild the item list from the scanned `parent/child` directory paths.
///
/// Existing items are migrated first and then matched by path, keeping their
/// id, name and aliases. New paths get fresh ids. Items whose path is no
/// longer present are dropped. The result is sorted by path.
pub fn merge_structure(paths: &BTreeSet<String>, existing: Vec<ManifestItem>) -> Vec<ManifestItem> {
    let existing = migrate_ids(existing);
    let mut used: HashSet<String> = existing.iter().map(|it| it.id.clone()).collect();
    let mut by_path: HashMap<String, ManifestItem> = existing
        .into_iter()
        .map(|it| (it.path.clone(), it))
        .collect();

    paths
        .iter()
        .map(|path| match by_path.remove(path) {
            Some(item) => item,
            None => {
                let name = path.rsplit('/').next().unwrap_or(path);
                ManifestItem::discovered(generate_id(name, &mut used), path)
            }
        })
        .collect()
}

/// `(path, alias)` pairs, the part of an item list a rewrite must preserve.
pub fn content_fingerprint(items: &[ManifestItem]) -> BTreeSet<(String, Vec<String>)> {
    items
        .iter()
        .map(|it| (it.path.clone(), it.alias.clone()))
        .collect()
}
