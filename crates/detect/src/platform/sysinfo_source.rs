//! Portable process snapshots via `sysinfo`.
//!
//! Window titles are not available through `sysinfo`, so title-based
//! queries only ever match on process name.

use crate::error::SourceError;
use crate::source::{ProcessQuery, ProcessRecord, ProcessSnapshotSource};
use async_trait::async_trait;
use std::ffi::OsString;
use std::sync::{Arc, Mutex};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

pub struct SysinfoProcessSource {
    system: Arc<Mutex<System>>,
}

impl SysinfoProcessSource {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SysinfoProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Join argv back into one line, quoting arguments with spaces.
fn join_command_line(args: &[OsString]) -> Option<String> {
    if args.is_empty() {
        return None;
    }

    let joined = args
        .iter()
        .map(|arg| {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') && !arg.starts_with('"') {
                format!("\"{arg}\"")
            } else {
                arg.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(joined)
}

fn collect(system: &Mutex<System>, query: &ProcessQuery) -> Result<Vec<ProcessRecord>, SourceError> {
    let mut system = system
        .lock()
        .map_err(|e| SourceError::ExecutionFailed(format!("process table lock poisoned: {e}")))?;

    let refresh = if query.wants_command_line() {
        ProcessRefreshKind::new().with_cmd(UpdateKind::OnlyIfNotSet)
    } else {
        ProcessRefreshKind::new()
    };
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);

    let records = system
        .processes()
        .iter()
        .map(|(pid, process)| ProcessRecord {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            window_title: None,
            command_line: join_command_line(process.cmd()),
        })
        .filter(|record| query.matches(record))
        .collect();

    Ok(records)
}

#[async_trait]
impl ProcessSnapshotSource for SysinfoProcessSource {
    async fn snapshot(&self, query: &ProcessQuery) -> Result<Vec<ProcessRecord>, SourceError> {
        let system = Arc::clone(&self.system);
        let query = query.clone();

        tokio::task::spawn_blocking(move || collect(&system, &query))
            .await
            .map_err(|e| SourceError::ExecutionFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_command_line_quotes_spaces() {
        let args = vec![
            OsString::from("evince"),
            OsString::from("/home/me/My Files/a.pdf"),
        ];
        assert_eq!(
            join_command_line(&args).as_deref(),
            Some(r#"evince "/home/me/My Files/a.pdf""#)
        );
        assert_eq!(join_command_line(&[]), None);
    }

    #[tokio::test]
    async fn test_snapshot_runs() {
        let source = SysinfoProcessSource::new();
        let records = source
            .snapshot(&ProcessQuery::ReaderCommandLines)
            .await
            .unwrap();
        assert!(records
            .iter()
            .all(|r| ProcessQuery::ReaderCommandLines.matches(r)));
    }
}
