//! In-memory zip assembly and atomic save.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PipelineError;

/// Archive under construction for one download. Dropping it discards
/// everything written so far.
pub struct PendingArchive {
    key: String,
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl PendingArchive {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Add `bytes` under `relative_path`.
    pub fn add(&mut self, relative_path: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(bytes.len() as u64 >= u32::MAX as u64);
        self.writer.start_file(relative_path, options)?;
        self.writer
            .write_all(bytes)
            .map_err(|e| PipelineError::Archive(e.into()))?;
        self.entries += 1;
        Ok(())
    }

    /// Finish the central directory and return the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, PipelineError> {
        let bytes = self.writer.finish()?.into_inner();
        tracing::debug!(key = %self.key, entries = self.entries, bytes = bytes.len(), "archive finished");
        Ok(bytes)
    }
}

/// File name for the archive of `key`: path separators and characters that
/// are invalid on common filesystems become `_`.
pub fn archive_file_name(key: &str) -> String {
    let mut name: String = key
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        name = "archive".to_string();
    }
    format!("{}.zip", name)
}

/// Write `bytes` to `dir/<key>.zip` through a temporary file in the same
/// directory, so the final path only ever holds a complete archive.
pub fn save_archive(dir: &Path, key: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
    let dest = dir.join(archive_file_name(key));
    let io_err = |source: std::io::Error| PipelineError::Io {
        path: dest.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(&dest).map_err(|e| io_err(e.error))?;
    Ok(dest)
}
