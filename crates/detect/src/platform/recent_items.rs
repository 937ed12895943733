//! The Windows shell "Recent" folder.

use super::powershell::resolve_shortcut;
use crate::error::SourceError;
use crate::source::{RecentItem, RecentItemsSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SHORTCUT_SUFFIX: &str = ".lnk";

/// `%APPDATA%\Microsoft\Windows\Recent`.
pub fn default_recent_folder() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("Microsoft").join("Windows").join("Recent"))
}

/// Lists `.lnk` shortcuts and resolves them through the shell.
#[derive(Debug, Clone)]
pub struct ShellRecentItems {
    folder: Option<PathBuf>,
    timeout: Duration,
}

impl ShellRecentItems {
    pub fn new(timeout: Duration) -> Self {
        Self {
            folder: default_recent_folder(),
            timeout,
        }
    }

    pub fn with_folder(folder: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            folder: Some(folder.into()),
            timeout,
        }
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }
}

fn shortcut_display_name(file_name: &str) -> Option<&str> {
    let split = file_name.len().checked_sub(SHORTCUT_SUFFIX.len())?;
    if !file_name.is_char_boundary(split) {
        return None;
    }
    let (stem, suffix) = file_name.split_at(split);
    (suffix.eq_ignore_ascii_case(SHORTCUT_SUFFIX) && !stem.is_empty()).then_some(stem)
}

#[async_trait]
impl RecentItemsSource for ShellRecentItems {
    fn is_available(&self) -> bool {
        self.folder.as_deref().is_some_and(Path::is_dir)
    }

    async fn list_recent(&self) -> Result<Vec<RecentItem>, SourceError> {
        let Some(folder) = self.folder.as_deref() else {
            return Err(SourceError::Unavailable("no recent items folder".to_string()));
        };
        let io_error = |source| SourceError::Io {
            path: folder.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(folder).await.map_err(io_error)?;
        let mut items = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let os_name = entry.file_name();
            let Some(file_name) = os_name.to_str().and_then(shortcut_display_name) else {
                continue;
            };

            // Entries can vanish between listing and stat.
            let modified_at = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "Skipping recent item");
                    continue;
                }
            };

            items.push(RecentItem {
                link_path: entry.path(),
                file_name: file_name.to_string(),
                modified_at,
            });
        }

        Ok(items)
    }

    async fn resolve_target(&self, link: &Path) -> Result<Option<PathBuf>, SourceError> {
        resolve_shortcut(link, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[test]
    fn test_shortcut_display_name() {
        assert_eq!(shortcut_display_name("report.pdf.lnk"), Some("report.pdf"));
        assert_eq!(shortcut_display_name("Report.PDF.LNK"), Some("Report.PDF"));
        assert_eq!(shortcut_display_name(".lnk"), None);
        assert_eq!(shortcut_display_name("notes.txt"), None);
    }

    #[test]
    fn test_missing_folder_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = ShellRecentItems::with_folder(dir.path().join("Recent"), TIMEOUT);
        assert!(!source.is_available());
        assert!(ShellRecentItems::with_folder(dir.path(), TIMEOUT).is_available());
    }

    #[tokio::test]
    async fn test_list_recent_only_shortcuts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.pdf.lnk"), b"").unwrap();
        std::fs::write(dir.path().join("plan.docx.lnk"), b"").unwrap();
        std::fs::write(dir.path().join("desktop.ini"), b"").unwrap();

        let source = ShellRecentItems::with_folder(dir.path(), TIMEOUT);
        let mut names: Vec<String> = source
            .list_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.file_name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["plan.docx", "report.pdf"]);
    }

    #[tokio::test]
    async fn test_list_recent_missing_folder_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = ShellRecentItems::with_folder(dir.path().join("gone"), TIMEOUT);
        assert!(matches!(
            source.list_recent().await,
            Err(SourceError::Io { .. })
        ));
    }
}
