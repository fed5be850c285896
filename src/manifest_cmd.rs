//! `aliaszip manifest update`: rebuild the manifest from the remote tree.
//!
//! Every second-level directory (`parent/child`) of the repository becomes
//! one item. Items already in the manifest keep their id, name and aliases;
//! new directories get a slug id. The file is always written in the
//! versioned form with 4-space indentation.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use aliaszip_core::catalog::{
    content_fingerprint, merge_structure, migrate_ids, needs_id_upgrade, ManifestItem,
    CURRENT_VERSION,
};

use crate::error::ManifestError;
use crate::manifest::{read_document, ManifestDoc};
use crate::remote::{EntryKind, RepoSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Only migrate ids; never contact the remote.
    pub migrate_only: bool,
    /// Write even when nothing changed.
    pub force: bool,
}

/// What [`run_manifest_update`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Ids were migrated without a remote scan.
    Migrated { items: usize },
    /// Migration only, and the ids were already current.
    AlreadyCurrent,
    /// The scan matched the file and the file was already current.
    Unchanged,
    /// The merged item list was written.
    Written { action: &'static str, items: usize },
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Migrated { items } => {
                write!(f, "Migrated manifest to version {}, total items: {}", CURRENT_VERSION, items)
            }
            UpdateOutcome::AlreadyCurrent => {
                write!(f, "Already version {} with stable ids, no action.", CURRENT_VERSION)
            }
            UpdateOutcome::Unchanged => write!(f, "No changes."),
            UpdateOutcome::Written { action, items } => {
                write!(f, "{} manifest (v{}), total items: {}", action, CURRENT_VERSION, items)
            }
        }
    }
}

#[derive(Serialize)]
struct VersionedDocument<'a> {
    version: u64,
    items: &'a [ManifestItem],
}

/// Update the manifest at `path`.
///
/// With `source == None` or `migrate_only`, only ids are migrated (and only
/// when they need it). A missing manifest counts as empty; a malformed one is
/// an error and is left untouched.
pub async fn run_manifest_update(
    path: &Path,
    source: Option<&dyn RepoSource>,
    opts: UpdateOptions,
) -> Result<UpdateOutcome> {
    let doc = load_existing(path)?;

    let source = match source {
        Some(source) if !opts.migrate_only => source,
        _ => return migrate_in_place(path, doc),
    };

    let paths = scan_structure(source).await?;
    let before = content_fingerprint(&doc.items);
    let merged = merge_structure(&paths, doc.items);

    if doc.version == Some(CURRENT_VERSION) && !opts.force && before == content_fingerprint(&merged) {
        return Ok(UpdateOutcome::Unchanged);
    }

    save_document(path, &merged)?;
    let action = if opts.force {
        "Forced write"
    } else if doc.version.unwrap_or(0) < CURRENT_VERSION {
        "Migrated & updated"
    } else {
        "Updated"
    };
    Ok(UpdateOutcome::Written {
        action,
        items: merged.len(),
    })
}

fn migrate_in_place(path: &Path, doc: ManifestDoc) -> Result<UpdateOutcome> {
    if !needs_id_upgrade(&doc.items, doc.version) {
        return Ok(UpdateOutcome::AlreadyCurrent);
    }
    let migrated = migrate_ids(doc.items);
    save_document(path, &migrated)?;
    Ok(UpdateOutcome::Migrated {
        items: migrated.len(),
    })
}

fn load_existing(path: &Path) -> Result<ManifestDoc> {
    match read_document(path) {
        Ok(doc) => Ok(doc),
        Err(ManifestError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no manifest at {}, starting empty", path.display());
            Ok(ManifestDoc {
                version: None,
                items: Vec::new(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Collect every `parent/child` directory path under the repository root.
///
/// Any failed listing aborts the scan, so a flaky request can never drop
/// items from the rewritten manifest.
pub async fn scan_structure(source: &dyn RepoSource) -> Result<BTreeSet<String>> {
    let root = source
        .list_dir("")
        .await
        .with_context(|| format!("failed to list repository root via {}", source.label()))?;

    let mut paths = BTreeSet::new();
    for parent in root.iter().filter(|e| e.kind == EntryKind::Dir) {
        let children = source
            .list_dir(&parent.name)
            .await
            .with_context(|| format!("failed to list {} via {}", parent.name, source.label()))?;
        paths.extend(
            children
                .into_iter()
                .filter(|e| e.kind == EntryKind::Dir)
                .map(|e| format!("{}/{}", parent.name, e.name)),
        );
    }
    tracing::debug!(items = paths.len(), "scanned repository structure");
    Ok(paths)
}

/// Atomically write `items` as a versioned manifest.
pub fn save_document(path: &Path, items: &[ManifestItem]) -> Result<()> {
    let doc = VersionedDocument {
        version: CURRENT_VERSION,
        items,
    };
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    buf.push(b'\n');

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&buf)?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write manifest {}", path.display()))?;
    Ok(())
}
