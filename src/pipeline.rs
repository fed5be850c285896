//! Download pipeline: resolve a key, walk its remote directory, fetch every
//! file into an in-memory zip and save it as `<key>.zip`.
//!
//! # State Machine
//!
//! ```text
//! Idle → ResolvingList → ListOk | ListFailed
//!      → (Empty)
//!      → Downloading(1/n) … Downloading(n/n) → AllFetched | FetchFailed
//!      → Packaging → Done
//! ```
//!
//! Each state is reported through the [`StatusReporter`] before the step it
//! announces runs. All work inside one invocation is sequential: the walk
//! completes before the first fetch, and files are fetched one at a time in
//! listing order. Nothing is retried and nothing is written unless every
//! file was fetched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aliaszip_core::endpoint::pick_endpoint;
use aliaszip_core::models::{AliasTable, EndpointConfig};

use crate::archive::{save_archive, PendingArchive};
use crate::error::PipelineError;
use crate::remote::{RepoSource, SourceProvider};
use crate::status::{PipelineState, StatusReporter};
use crate::walker::list_files;

/// Everything a download needs besides the key and the manifest.
pub struct DownloadContext<'a> {
    /// Usable endpoints. Empty means `NotConfigured`.
    pub endpoints: &'a [EndpointConfig],
    pub provider: &'a dyn SourceProvider,
    pub reporter: &'a dyn StatusReporter,
    pub output_dir: &'a Path,
    /// Reuse the listing endpoint for the fetch phase.
    pub sticky_endpoint: bool,
}

/// Successful terminal outcome of a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Archive written to `path` with `files` entries.
    Saved { path: PathBuf, files: usize },
    /// The resource directory contains no files. Nothing was written.
    Empty,
}

/// Download the resource `key` into `<output_dir>/<key>.zip`.
pub async fn download_resource(
    key: &str,
    table: &AliasTable,
    ctx: &DownloadContext<'_>,
) -> Result<DownloadOutcome, PipelineError> {
    let result = run(key, table, ctx).await;
    if let Err(e) = &result {
        report_failure(ctx.reporter, e);
    }
    result
}

async fn run(
    key: &str,
    table: &AliasTable,
    ctx: &DownloadContext<'_>,
) -> Result<DownloadOutcome, PipelineError> {
    ctx.reporter.report(&PipelineState::Idle);

    let Some(list_endpoint) = pick_endpoint(ctx.endpoints) else {
        return Err(PipelineError::NotConfigured);
    };
    let entry = table
        .get(key)
        .ok_or_else(|| PipelineError::UnknownKey(key.to_string()))?;

    // Listing phase
    ctx.reporter.report(&PipelineState::ResolvingList {
        key: key.to_string(),
        base_path: entry.path.clone(),
    });
    tracing::info!(key = %key, endpoint = %list_endpoint.name, "listing {}", entry.path);
    let list_source = ctx.provider.open(list_endpoint);
    let files = list_files(list_source.as_ref(), &entry.path).await?;
    ctx.reporter.report(&PipelineState::ListOk { files: files.len() });

    if files.is_empty() {
        ctx.reporter.report(&PipelineState::Empty {
            key: key.to_string(),
        });
        return Ok(DownloadOutcome::Empty);
    }

    // Fetch phase
    let fetch_source: Arc<dyn RepoSource> = if ctx.sticky_endpoint {
        list_source
    } else {
        match pick_endpoint(ctx.endpoints) {
            Some(ep) => ctx.provider.open(ep),
            None => return Err(PipelineError::NotConfigured),
        }
    };
    tracing::info!(
        key = %key,
        endpoint = fetch_source.label(),
        files = files.len(),
        "fetching files"
    );

    let total = files.len();
    let mut pending = PendingArchive::new(key);
    for (i, file) in files.iter().enumerate() {
        ctx.reporter.report(&PipelineState::Downloading {
            index: i + 1,
            total,
            path: file.relative_path.clone(),
        });
        let bytes = fetch_source
            .fetch_raw(&file.full_remote_path)
            .await
            .map_err(|source| {
                tracing::warn!(path = %file.full_remote_path, error = %source, "fetch failed");
                PipelineError::FetchFailed {
                    path: file.relative_path.clone(),
                    source,
                }
            })?;
        pending.add(&file.relative_path, &bytes)?;
    }
    ctx.reporter.report(&PipelineState::AllFetched { files: total });

    // Packaging
    ctx.reporter.report(&PipelineState::Packaging { files: total });
    let bytes = pending.finish()?;
    let path = save_archive(ctx.output_dir, key, &bytes)?;

    ctx.reporter.report(&PipelineState::Done {
        key: key.to_string(),
        files: total,
        bytes: bytes.len() as u64,
        path: path.clone(),
    });
    tracing::info!(key = %key, files = total, "saved {}", path.display());
    Ok(DownloadOutcome::Saved { path, files: total })
}

fn report_failure(reporter: &dyn StatusReporter, err: &PipelineError) {
    let state = match err {
        PipelineError::ListFailed { path, source } => PipelineState::ListFailed {
            path: path.clone(),
            reason: source.to_string(),
        },
        PipelineError::FetchFailed { path, source } => PipelineState::FetchFailed {
            path: path.clone(),
            reason: source.to_string(),
        },
        other => PipelineState::Failed {
            reason: other.to_string(),
        },
    };
    reporter.report(&state);
}
