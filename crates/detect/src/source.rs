//! Source traits for OS signals.
//!
//! These traits abstract the platform-specific process, filesystem and shell
//! integrations, so the engine's scheduling and dedup logic can be tested
//! with fakes.

use crate::error::SourceError;
use async_trait::async_trait;
use docwatch_readers::{is_reader_process, SUPPORTED_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::mpsc;

/// A running process as seen by one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Image name, with or without `.exe` depending on the source.
    pub name: String,
    pub window_title: Option<String>,
    pub command_line: Option<String>,
}

impl ProcessRecord {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            window_title: None,
            command_line: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }

    pub fn with_command_line(mut self, command_line: impl Into<String>) -> Self {
        self.command_line = Some(command_line.into());
        self
    }

    fn title(&self) -> Option<&str> {
        self.window_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// What a process snapshot should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessQuery {
    /// Reader processes with a non-empty window title.
    WindowedReaders,
    /// Reader processes whose command line mentions a supported extension.
    ReaderCommandLines,
    /// Processes whose window title contains `file_name`, or any reader process.
    TitleOrReader { file_name: String },
}

impl ProcessQuery {
    /// Whether a record satisfies this query.
    ///
    /// Sources may filter natively for speed but should agree with this.
    pub fn matches(&self, record: &ProcessRecord) -> bool {
        match self {
            ProcessQuery::WindowedReaders => {
                is_reader_process(&record.name) && record.title().is_some()
            }
            ProcessQuery::ReaderCommandLines => {
                is_reader_process(&record.name)
                    && record
                        .command_line
                        .as_deref()
                        .is_some_and(mentions_document)
            }
            ProcessQuery::TitleOrReader { file_name } => {
                let needle = file_name.to_lowercase();
                let title_match = record
                    .title()
                    .is_some_and(|t| t.to_lowercase().contains(&needle));
                title_match || is_reader_process(&record.name)
            }
        }
    }

    /// Whether the caller wants command lines filled in.
    pub fn wants_command_line(&self) -> bool {
        !matches!(self, ProcessQuery::TitleOrReader { .. })
    }
}

fn mentions_document(command_line: &str) -> bool {
    let lower = command_line.to_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

/// Point-in-time view of running processes.
#[async_trait]
pub trait ProcessSnapshotSource: Send + Sync {
    /// Processes matching `query`. Fails closed: non-zero exit or malformed
    /// output is an error, never a partial list.
    async fn snapshot(&self, query: &ProcessQuery) -> Result<Vec<ProcessRecord>, SourceError>;
}

/// Kind of filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Renamed,
    Accessed,
    Removed,
    Other,
}

/// One change inside a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

pub type ChangeSender = mpsc::UnboundedSender<DirectoryChange>;

/// An active directory subscription.
pub trait WatchHandle: Send {
    /// Stop delivering changes. Called once, from `stop()`.
    fn close(&mut self) -> Result<(), SourceError>;
}

/// Shallow (non-recursive) directory change notifications.
pub trait DirectoryChangeSource: Send + Sync {
    fn subscribe(
        &self,
        dir: &Path,
        sender: ChangeSender,
    ) -> Result<Box<dyn WatchHandle>, SourceError>;
}

/// A shortcut in the shell's recent-items folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentItem {
    pub link_path: PathBuf,
    /// Display name, without the shortcut suffix.
    pub file_name: String,
    pub modified_at: SystemTime,
}

/// The shell's "recently accessed" list.
#[async_trait]
pub trait RecentItemsSource: Send + Sync {
    /// False when the platform has no recent-items folder.
    fn is_available(&self) -> bool;

    async fn list_recent(&self) -> Result<Vec<RecentItem>, SourceError>;

    /// Target of a shortcut, `None` if it points nowhere.
    async fn resolve_target(&self, link: &Path) -> Result<Option<PathBuf>, SourceError>;
}

/// Null implementation for testing or unsupported platforms.
pub struct NullSource;

#[async_trait]
impl ProcessSnapshotSource for NullSource {
    async fn snapshot(&self, _query: &ProcessQuery) -> Result<Vec<ProcessRecord>, SourceError> {
        Ok(Vec::new())
    }
}

struct NullWatch;

impl WatchHandle for NullWatch {
    fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

impl DirectoryChangeSource for NullSource {
    fn subscribe(
        &self,
        _dir: &Path,
        _sender: ChangeSender,
    ) -> Result<Box<dyn WatchHandle>, SourceError> {
        Ok(Box::new(NullWatch))
    }
}

#[async_trait]
impl RecentItemsSource for NullSource {
    fn is_available(&self) -> bool {
        false
    }

    async fn list_recent(&self) -> Result<Vec<RecentItem>, SourceError> {
        Ok(Vec::new())
    }

    async fn resolve_target(&self, _link: &Path) -> Result<Option<PathBuf>, SourceError> {
        Ok(None)
    }
}
