//! Directory watch strategy.
//!
//! A filesystem change only proves a document was touched. After a settle
//! delay the change is cross-checked against open windows before anything
//! is emitted.

use super::RunState;
use crate::event::{DetectionStrategy, FileOpenEvent};
use crate::source::{
    ChangeKind, ChangeSender, DirectoryChange, DirectoryChangeSource, ProcessQuery, WatchHandle,
};
use docwatch_readers::DocumentExtension;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Subscribe to every existing directory. Missing directories and failed
/// subscriptions are skipped.
pub(super) fn subscribe_all(
    source: &dyn DirectoryChangeSource,
    directories: &[PathBuf],
    sender: &ChangeSender,
) -> HashMap<PathBuf, Box<dyn WatchHandle>> {
    let mut watchers = HashMap::new();

    for dir in directories {
        if watchers.contains_key(dir) {
            continue;
        }
        if !dir.is_dir() {
            tracing::debug!(path = %dir.display(), "Watch directory does not exist, skipping");
            continue;
        }

        match source.subscribe(dir, sender.clone()) {
            Ok(handle) => {
                tracing::info!(path = %dir.display(), "Watching directory");
                watchers.insert(dir.clone(), handle);
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to watch directory");
            }
        }
    }

    watchers
}

/// Consume change notifications until cancelled or every watch is closed.
pub(super) async fn listen(
    state: Arc<RunState>,
    mut changes: mpsc::UnboundedReceiver<DirectoryChange>,
    cancel: CancellationToken,
) {
    loop {
        let change = tokio::select! {
            _ = cancel.cancelled() => break,
            change = changes.recv() => match change {
                Some(change) => change,
                None => break,
            },
        };

        if change.kind == ChangeKind::Removed {
            continue;
        }
        let Some(extension) = DocumentExtension::of_path(&change.path) else {
            continue;
        };

        tracing::debug!(path = %change.path.display(), kind = ?change.kind, "Document changed");
        tokio::spawn(confirm_access(Arc::clone(&state), change.path, extension));
    }

    tracing::debug!("Directory listener stopped");
}

async fn confirm_access(state: Arc<RunState>, path: PathBuf, extension: DocumentExtension) {
    tokio::time::sleep(state.config.settle_delay()).await;

    if !state.is_active() {
        return;
    }

    let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
        return;
    };

    let strategy = DetectionStrategy::FileSystemWatch;
    let query = ProcessQuery::TitleOrReader {
        file_name: file_name.clone(),
    };
    let Some(records) = state
        .guarded(strategy, "process snapshot", state.processes.snapshot(&query))
        .await
    else {
        return;
    };

    let full_path = path.to_string_lossy();
    for record in records {
        state.emit(FileOpenEvent::from_process(
            &record,
            &full_path,
            &file_name,
            extension,
            strategy,
        ));
    }
}
