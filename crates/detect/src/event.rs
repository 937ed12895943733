//! Events emitted by the detection engine.

use crate::source::ProcessRecord;
use chrono::{DateTime, Utc};
use docwatch_readers::{resolve_reader_label, DocumentExtension};
use serde::{Deserialize, Serialize};

/// Full path placeholder when only a window title was observed.
pub const UNKNOWN_PATH: &str = "unknown";

/// Reader label for detections from the recent-items folder.
pub const RECENT_READER_LABEL: &str = "Recently Accessed";

/// Process name for detections from the recent-items folder.
pub const RECENT_PROCESS_NAME: &str = "Recent Files";

/// Process id for detections from the recent-items folder.
pub const RECENT_PROCESS_ID: &str = "Recent";

/// Which strategy produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionStrategy {
    /// Command line of a windowed reader process.
    ProcessScan,
    /// File name in a reader's window title.
    WindowTitle,
    /// Filesystem change confirmed by an open window.
    FileSystemWatch,
    /// Command line of any reader process mentioning a document.
    HandleScan,
    /// Shell recent-items folder.
    RecentFiles,
}

impl DetectionStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            DetectionStrategy::ProcessScan => "ProcessScan",
            DetectionStrategy::WindowTitle => "WindowTitle",
            DetectionStrategy::FileSystemWatch => "FileSystemWatch",
            DetectionStrategy::HandleScan => "HandleScan",
            DetectionStrategy::RecentFiles => "RecentFiles",
        }
    }
}

impl std::fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identity of the process behind a detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessId {
    /// A live OS process.
    Pid(u32),
    /// Placeholder when no live process is associated.
    Sentinel(String),
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessId::Pid(pid) => write!(f, "{pid}"),
            ProcessId::Sentinel(s) => write!(f, "{s}"),
        }
    }
}

/// A supported document was opened.
///
/// Built at emission time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOpenEvent {
    pub file_name: String,
    /// Absolute path, or [`UNKNOWN_PATH`].
    pub full_path: String,
    pub extension: DocumentExtension,
    /// Human-readable reader application.
    pub reader: String,
    pub process_name: String,
    pub process_id: ProcessId,
    pub window_title: Option<String>,
    pub strategy: DetectionStrategy,
    pub detected_at: DateTime<Utc>,
}

impl FileOpenEvent {
    /// Detection tied to a live process.
    pub fn from_process(
        process: &ProcessRecord,
        full_path: &str,
        file_name: &str,
        extension: DocumentExtension,
        strategy: DetectionStrategy,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            full_path: full_path.to_string(),
            extension,
            reader: resolve_reader_label(&process.name),
            process_name: process.name.clone(),
            process_id: ProcessId::Pid(process.pid),
            window_title: process.window_title.clone(),
            strategy,
            detected_at: Utc::now(),
        }
    }

    /// Detection from the recent-items folder; no process is known.
    pub fn from_recent(target: &str) -> Option<Self> {
        let extension = DocumentExtension::of(target)?;
        Some(Self {
            file_name: file_name_of(target).to_string(),
            full_path: target.to_string(),
            extension,
            reader: RECENT_READER_LABEL.to_string(),
            process_name: RECENT_PROCESS_NAME.to_string(),
            process_id: ProcessId::Sentinel(RECENT_PROCESS_ID.to_string()),
            window_title: None,
            strategy: DetectionStrategy::RecentFiles,
            detected_at: Utc::now(),
        })
    }

    /// True when the full path could not be determined.
    pub fn has_unknown_path(&self) -> bool {
        self.full_path == UNKNOWN_PATH
    }
}

/// Last component of a `/` or `\` separated path.
pub(crate) fn file_name_of(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

/// Unexpected engine-level failure. Per-cycle source failures never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFault {
    pub message: String,
    pub cause: Option<String>,
}

impl EngineFault {
    pub fn new(message: impl Into<String>, cause: &dyn std::error::Error) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }
}

/// Everything the engine reports to its consumer.
#[derive(Debug, Clone)]
pub enum DetectEvent {
    FileOpened(FileOpenEvent),
    Error(EngineFault),
}

pub type DetectCallback = std::sync::Arc<dyn Fn(DetectEvent) + Send + Sync + 'static>;

pub fn new_callback<F>(f: F) -> DetectCallback
where
    F: Fn(DetectEvent) + Send + Sync + 'static,
{
    std::sync::Arc::new(f)
}
