//! Detects documents (PDF and Word) being opened on the local machine.
//!
//! [`DetectionEngine`] runs four strategies side by side:
//!
//! - process scan: reader processes with a window title, analyzed for
//!   document paths on the command line and names in the title
//! - handle scan: reader processes whose command line names a document
//! - filesystem watch: document changes in watched directories, confirmed
//!   against open windows after a settle delay
//! - recent files: fresh shortcuts in the shell's recent-items folder
//!
//! Detections are delivered through a [`DetectCallback`].
//!
//! ```no_run
//! use docwatch_detect::{new_callback, DetectConfig, DetectEvent, DetectionEngine, Sources};
//!
//! # async fn run() {
//! let config = DetectConfig::default();
//! let sources = Sources::platform(&config);
//! let mut engine = DetectionEngine::new(
//!     config,
//!     sources,
//!     new_callback(|event| {
//!         if let DetectEvent::FileOpened(file) = event {
//!             println!("{} opened in {}", file.file_name, file.reader);
//!         }
//!     }),
//! );
//! engine.start();
//! # }
//! ```

mod analyze;
mod config;
mod dedup;
mod engine;
mod error;
mod event;
mod source;

pub mod platform;

pub use analyze::analyze_process;
pub use config::*;
pub use dedup::DedupCache;
pub use engine::{DetectionEngine, EngineStatus, Sources};
pub use error::{ConfigError, DetectError, SourceError};
pub use event::{
    new_callback, DetectCallback, DetectEvent, DetectionStrategy, EngineFault, FileOpenEvent,
    ProcessId, RECENT_PROCESS_ID, RECENT_PROCESS_NAME, RECENT_READER_LABEL, UNKNOWN_PATH,
};
pub use source::{
    ChangeKind, ChangeSender, DirectoryChange, DirectoryChangeSource, NullSource, ProcessQuery,
    ProcessRecord, ProcessSnapshotSource, RecentItem, RecentItemsSource, WatchHandle,
};

pub use docwatch_readers::DocumentExtension;
