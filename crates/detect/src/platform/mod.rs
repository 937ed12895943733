//! OS-backed source implementations.

mod notify_source;
mod powershell;
mod recent_items;
mod sysinfo_source;

pub use notify_source::NotifyDirectorySource;
pub use powershell::PowerShellProcessSource;
pub use recent_items::{default_recent_folder, ShellRecentItems};
pub use sysinfo_source::SysinfoProcessSource;

use crate::config::DetectConfig;
use crate::engine::Sources;
use crate::source::ProcessSnapshotSource;
use std::sync::Arc;

#[cfg(windows)]
fn platform_processes(config: &DetectConfig) -> Arc<dyn ProcessSnapshotSource> {
    Arc::new(PowerShellProcessSource::new(config.source_timeout()))
}

#[cfg(not(windows))]
fn platform_processes(_config: &DetectConfig) -> Arc<dyn ProcessSnapshotSource> {
    Arc::new(SysinfoProcessSource::new())
}

impl Sources {
    /// Sources for the current platform.
    ///
    /// Windows gets PowerShell process queries with window titles. Elsewhere
    /// processes come from `sysinfo` and the recent-items strategy finds no
    /// folder and stays off.
    pub fn platform(config: &DetectConfig) -> Self {
        Self {
            processes: platform_processes(config),
            directories: Arc::new(NotifyDirectorySource::new()),
            recent: Arc::new(ShellRecentItems::new(config.source_timeout())),
        }
    }
}
