//! Directory change notifications via `notify`.

use crate::error::SourceError;
use crate::source::{ChangeKind, ChangeSender, DirectoryChange, DirectoryChangeSource, WatchHandle};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// One `RecommendedWatcher` per subscribed directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyDirectorySource;

impl NotifyDirectorySource {
    pub fn new() -> Self {
        Self
    }
}

fn change_kind(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Access(_) => ChangeKind::Accessed,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Any | EventKind::Other => ChangeKind::Other,
    }
}

fn forward(event: Event, sender: &ChangeSender) {
    let kind = change_kind(&event.kind);
    for path in event.paths {
        // Receiver gone means the engine stopped; nothing left to do.
        if sender.send(DirectoryChange { kind, path }).is_err() {
            return;
        }
    }
}

impl DirectoryChangeSource for NotifyDirectorySource {
    fn subscribe(
        &self,
        dir: &Path,
        sender: ChangeSender,
    ) -> Result<Box<dyn WatchHandle>, SourceError> {
        let watch_error = |e: notify::Error| SourceError::Watch {
            path: dir.to_path_buf(),
            message: e.to_string(),
        };

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => forward(event, &sender),
                Err(e) => tracing::warn!(error = %e, "File watcher error"),
            },
            Config::default(),
        )
        .map_err(watch_error)?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;

        Ok(Box::new(NotifyWatch {
            watcher: Some(watcher),
            path: dir.to_path_buf(),
        }))
    }
}

struct NotifyWatch {
    watcher: Option<RecommendedWatcher>,
    path: PathBuf,
}

impl WatchHandle for NotifyWatch {
    fn close(&mut self) -> Result<(), SourceError> {
        let Some(mut watcher) = self.watcher.take() else {
            return Ok(());
        };

        // Dropping the watcher releases it even if unwatch fails.
        watcher.unwatch(&self.path).map_err(|e| SourceError::Watch {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind, RenameMode};
    use tokio::sync::mpsc;

    #[test]
    fn test_change_kind_mapping() {
        assert_eq!(
            change_kind(&EventKind::Create(CreateKind::File)),
            ChangeKind::Created
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            ChangeKind::Renamed
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            ChangeKind::Modified
        );
        assert_eq!(
            change_kind(&EventKind::Access(AccessKind::Any)),
            ChangeKind::Accessed
        );
        assert_eq!(
            change_kind(&EventKind::Remove(RemoveKind::File)),
            ChangeKind::Removed
        );
        assert_eq!(change_kind(&EventKind::Any), ChangeKind::Other);
    }

    #[test]
    fn test_forward_sends_every_path() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/docs/a.pdf"))
            .add_path(PathBuf::from("/docs/b.docx"));

        forward(event, &tx);

        assert_eq!(rx.try_recv().unwrap().path, PathBuf::from("/docs/a.pdf"));
        assert_eq!(rx.try_recv().unwrap().path, PathBuf::from("/docs/b.docx"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscribe_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut handle = NotifyDirectorySource::new()
            .subscribe(dir.path(), tx)
            .unwrap();
        handle.close().unwrap();
        handle.close().unwrap();
    }

    #[test]
    fn test_subscribe_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = NotifyDirectorySource::new().subscribe(&dir.path().join("missing"), tx);
        assert!(matches!(result, Err(SourceError::Watch { .. })));
    }
}
