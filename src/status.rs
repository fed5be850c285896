//! Download status reporting.
//!
//! Every state transition of a download is reported before the step it
//! announces starts. Reports go to **stderr** so stdout stays parseable for
//! scripts: one human-readable line per transition, or one JSON object per
//! line with `--status json`.

use std::io::Write;
use std::path::PathBuf;

/// States of one download invocation.
///
/// `Idle → ResolvingList → ListOk | ListFailed → (Empty) → Downloading(i/n)
/// → AllFetched | FetchFailed → Packaging → Done`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ResolvingList { key: String, base_path: String },
    ListOk { files: usize },
    ListFailed { path: String, reason: String },
    /// The walk succeeded but found nothing. Terminal, not an error.
    Empty { key: String },
    Downloading {
        index: usize,
        total: usize,
        path: String,
    },
    AllFetched { files: usize },
    FetchFailed { path: String, reason: String },
    Packaging { files: usize },
    Done {
        key: String,
        files: usize,
        bytes: u64,
        path: PathBuf,
    },
    /// Terminal failure outside listing and fetching (configuration, unknown
    /// key, archive write).
    Failed { reason: String },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::ListFailed { .. }
                | PipelineState::Empty { .. }
                | PipelineState::FetchFailed { .. }
                | PipelineState::Done { .. }
                | PipelineState::Failed { .. }
        )
    }

    /// Short machine name used in JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::ResolvingList { .. } => "resolving_list",
            PipelineState::ListOk { .. } => "list_ok",
            PipelineState::ListFailed { .. } => "list_failed",
            PipelineState::Empty { .. } => "empty",
            PipelineState::Downloading { .. } => "downloading",
            PipelineState::AllFetched { .. } => "all_fetched",
            PipelineState::FetchFailed { .. } => "fetch_failed",
            PipelineState::Packaging { .. } => "packaging",
            PipelineState::Done { .. } => "done",
            PipelineState::Failed { .. } => "failed",
        }
    }

    /// Human-readable status line.
    pub fn message(&self) -> String {
        match self {
            PipelineState::Idle => "ready".to_string(),
            PipelineState::ResolvingList { key, base_path } => {
                format!("fetching file list for {} ({})...", key, base_path)
            }
            PipelineState::ListOk { files } => {
                format!("file list fetched: {} files", format_number(*files as u64))
            }
            PipelineState::ListFailed { path, reason } => {
                format!("failed to fetch file list at {}: {}", path, reason)
            }
            PipelineState::Empty { key } => format!("no files found for {}", key),
            PipelineState::Downloading { index, total, path } => {
                format!("downloading ({}/{}): {}", index, total, path)
            }
            PipelineState::AllFetched { files } => {
                format!("all {} files fetched", format_number(*files as u64))
            }
            PipelineState::FetchFailed { path, reason } => {
                format!("download error at {}: {}", path, reason)
            }
            PipelineState::Packaging { files } => {
                format!("packaging {} files...", format_number(*files as u64))
            }
            PipelineState::Done {
                files, bytes, path, ..
            } => format!(
                "done: {} files packaged ({} bytes) -> {}",
                format_number(*files as u64),
                format_number(*bytes),
                path.display()
            ),
            PipelineState::Failed { reason } => format!("error: {}", reason),
        }
    }
}

/// Receives state transitions from the pipeline.
pub trait StatusReporter: Send + Sync {
    fn report(&self, state: &PipelineState);
}

/// Human-friendly status on stderr: "downloading (3/12): easy/chart.json".
pub struct StderrStatus;

impl StatusReporter for StderrStatus {
    fn report(&self, state: &PipelineState) {
        let line = format!("{}\n", state.message());
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable status: one JSON object per line on stderr.
pub struct JsonStatus;

impl JsonStatus {
    fn to_json(state: &PipelineState) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "event": "status",
            "state": state.name(),
            "message": state.message(),
        });
        let extra = match state {
            PipelineState::ResolvingList { key, base_path } => {
                serde_json::json!({ "key": key, "base_path": base_path })
            }
            PipelineState::ListOk { files }
            | PipelineState::AllFetched { files }
            | PipelineState::Packaging { files } => serde_json::json!({ "files": files }),
            PipelineState::ListFailed { path, reason }
            | PipelineState::FetchFailed { path, reason } => {
                serde_json::json!({ "path": path, "reason": reason })
            }
            PipelineState::Empty { key } => serde_json::json!({ "key": key }),
            PipelineState::Downloading { index, total, path } => {
                serde_json::json!({ "n": index, "total": total, "path": path })
            }
            PipelineState::Done {
                key,
                files,
                bytes,
                path,
            } => serde_json::json!({
                "key": key,
                "files": files,
                "bytes": bytes,
                "path": path.display().to_string(),
            }),
            PipelineState::Failed { reason } => serde_json::json!({ "reason": reason }),
            PipelineState::Idle => serde_json::json!({}),
        };
        if let (Some(dst), serde_json::Value::Object(src)) = (obj.as_object_mut(), extra) {
            dst.extend(src);
        }
        obj
    }
}

impl StatusReporter for JsonStatus {
    fn report(&self, state: &PipelineState) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(state)) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// No-op reporter when status output is disabled.
pub struct NoStatus;

impl StatusReporter for NoStatus {
    fn report(&self, _state: &PipelineState) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Status mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusMode {
    Off,
    Human,
    Json,
}

impl StatusMode {
    /// Default: human status when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            StatusMode::Human
        } else {
            StatusMode::Off
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(StatusMode::Off),
            "human" => Some(StatusMode::Human),
            "json" => Some(StatusMode::Json),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn StatusReporter> {
        match self {
            StatusMode::Off => Box::new(NoStatus),
            StatusMode::Human => Box::new(StderrStatus),
            StatusMode::Json => Box::new(JsonStatus),
        }
    }
}
