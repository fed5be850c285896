//! Depth-first remote directory walk.
//!
//! The walk keeps an explicit stack of directory cursors instead of recursing,
//! so tree depth is bounded only by memory. Ordering matches a recursive
//! walk: a subdirectory is fully listed before the entries that follow it.
//! Listing calls are issued one at a time, one per directory.

use aliaszip_core::models::RemoteFileRef;

use crate::error::PipelineError;
use crate::remote::{DirEntry, EntryKind, RepoSource};

/// A directory whose listing is being consumed.
struct Frame {
    path: String,
    entries: std::vec::IntoIter<DirEntry>,
}

/// List every file below `base_path`.
///
/// Any failed listing aborts the walk with [`PipelineError::ListFailed`]
/// naming the directory; files found so far are discarded.
pub async fn list_files(
    source: &dyn RepoSource,
    base_path: &str,
) -> Result<Vec<RemoteFileRef>, PipelineError> {
    let base = base_path.trim_end_matches('/');
    let mut files = Vec::new();
    let mut stack = vec![open_dir(source, base).await?];

    while let Some(frame) = stack.last_mut() {
        let Some(entry) = frame.entries.next() else {
            stack.pop();
            continue;
        };
        let full_path = join(&frame.path, &entry.name);
        match entry.kind {
            EntryKind::File => {
                let relative_path = relative_to(base, &frame.path, &entry.name);
                files.push(RemoteFileRef {
                    name: entry.name,
                    relative_path,
                    full_remote_path: full_path,
                });
            }
            EntryKind::Dir => {
                let child = open_dir(source, &full_path).await?;
                stack.push(child);
            }
            EntryKind::Other => {
                tracing::debug!(path = %full_path, "skipping non-file entry");
            }
        }
    }

    tracing::debug!(
        base = %base,
        files = files.len(),
        source = source.label(),
        "walk complete"
    );
    Ok(files)
}

async fn open_dir(source: &dyn RepoSource, path: &str) -> Result<Frame, PipelineError> {
    let entries = source.list_dir(path).await.map_err(|e| {
        tracing::warn!(path = %path, error = %e, "directory listing failed");
        PipelineError::ListFailed {
            path: path.to_string(),
            source: e,
        }
    })?;
    Ok(Frame {
        path: path.to_string(),
        entries: entries.into_iter(),
    })
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Path of `name` inside `dir`, relative to `base`.
fn relative_to(base: &str, dir: &str, name: &str) -> String {
    if dir == base {
        return name.to_string();
    }
    let below = if base.is_empty() {
        dir
    } else {
        dir.strip_prefix(base)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(dir)
    };
    format!("{}/{}", below, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// In-memory tree: directory path → entries. Records every listing call.
    struct TreeSource {
        dirs: HashMap<String, Vec<DirEntry>>,
        fail_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl TreeSource {
        fn new(dirs: Vec<(&str, Vec<DirEntry>)>) -> Self {
            Self {
                dirs: dirs
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                fail_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, path: &str) -> Self {
            self.fail_on = Some(path.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RepoSource for TreeSource {
        fn label(&self) -> &str {
            "tree"
        }

        async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, SourceError> {
            self.calls.lock().unwrap().push(path.to_string());
            if self.fail_on.as_deref() == Some(path) {
                return Err(SourceError::Status { status: 500 });
            }
            self.dirs
                .get(path)
                .cloned()
                .ok_or(SourceError::Status { status: 404 })
        }

        async fn fetch_raw(&self, _path: &str) -> Result<Vec<u8>, SourceError> {
            unreachable!("the walker never fetches file contents")
        }
    }

    fn sample_tree() -> TreeSource {
        TreeSource::new(vec![
            (
                "songs/doremi",
                vec![
                    DirEntry::file("readme.txt"),
                    DirEntry::dir("easy"),
                    DirEntry::file("cover.png"),
                    DirEntry::dir("hard"),
                ],
            ),
            (
                "songs/doremi/easy",
                vec![DirEntry::file("chart.json"), DirEntry::dir("extra")],
            ),
            ("songs/doremi/easy/extra", vec![DirEntry::file("notes.md")]),
            ("songs/doremi/hard", vec![DirEntry::file("chart.json")]),
        ])
    }

    #[tokio::test]
    async fn test_depth_first_order_and_paths() {
        let source = sample_tree();
        let files = list_files(&source, "songs/doremi").await.unwrap();
        let rel: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(
            rel,
            vec![
                "readme.txt",
                "easy/chart.json",
                "easy/extra/notes.md",
                "cover.png",
                "hard/chart.json",
            ]
        );
        assert_eq!(files[2].name, "notes.md");
        assert_eq!(files[2].full_remote_path, "songs/doremi/easy/extra/notes.md");
        assert_eq!(files[0].full_remote_path, "songs/doremi/readme.txt");
    }

    #[tokio::test]
    async fn test_one_listing_per_directory_and_unique_paths() {
        let source = sample_tree();
        let files = list_files(&source, "songs/doremi").await.unwrap();

        // 4 directories (including the base), 5 files
        assert_eq!(source.calls().len(), 4);
        assert_eq!(files.len(), 5);
        let unique: HashSet<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(unique.len(), files.len());
    }

    #[tokio::test]
    async fn test_trailing_slash_on_base() {
        let source = sample_tree();
        let files = list_files(&source, "songs/doremi/").await.unwrap();
        assert_eq!(files[0].relative_path, "readme.txt");
        assert_eq!(files[1].relative_path, "easy/chart.json");
    }

    #[tokio::test]
    async fn test_failure_aborts_whole_walk() {
        let source = sample_tree().failing_on("songs/doremi/hard");
        let err = list_files(&source, "songs/doremi").await.unwrap_err();
        match err {
            PipelineError::ListFailed { path, source } => {
                assert_eq!(path, "songs/doremi/hard");
                assert!(matches!(source, SourceError::Status { status: 500 }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failure_at_base() {
        let source = TreeSource::new(vec![]);
        let err = list_files(&source, "missing").await.unwrap_err();
        assert!(matches!(err, PipelineError::ListFailed { ref path, .. } if path == "missing"));
    }

    #[tokio::test]
    async fn test_empty_tree() {
        let source = TreeSource::new(vec![
            ("a", vec![DirEntry::dir("b")]),
            ("a/b", vec![]),
        ]);
        let files = list_files(&source, "a").await.unwrap();
        assert!(files.is_empty());
        assert_eq!(source.calls(), vec!["a", "a/b"]);
    }

    #[tokio::test]
    async fn test_other_entries_ignored() {
        let source = TreeSource::new(vec![(
            "a",
            vec![
                DirEntry {
                    name: "link".to_string(),
                    kind: EntryKind::Other,
                },
                DirEntry::file("x"),
            ],
        )]);
        let files = list_files(&source, "a").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(source.calls().len(), 1);
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("a/b", "a/b", "f"), "f");
        assert_eq!(relative_to("a/b", "a/b/c/d", "f"), "c/d/f");
        assert_eq!(relative_to("", "c", "f"), "c/f");
    }
}
