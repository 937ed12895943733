//! Process and command-line scans.
//!
//! Both strategies poll the same source and share `analyze_process`; they
//! differ in query and dedup key. The distinct keys let one process be
//! reported by both.

use super::RunState;
use crate::analyze::analyze_process;
use crate::event::DetectionStrategy;
use crate::source::{ProcessQuery, ProcessRecord};
use std::sync::Arc;

pub(super) async fn scan_processes(state: Arc<RunState>) {
    scan(
        &state,
        DetectionStrategy::ProcessScan,
        ProcessQuery::WindowedReaders,
        process_key,
    )
    .await;
}

pub(super) async fn scan_handles(state: Arc<RunState>) {
    scan(
        &state,
        DetectionStrategy::HandleScan,
        ProcessQuery::ReaderCommandLines,
        handle_key,
    )
    .await;
}

fn process_key(record: &ProcessRecord) -> String {
    format!("{}-{}", record.pid, record.name)
}

fn handle_key(record: &ProcessRecord) -> String {
    format!("handle-{}", record.pid)
}

async fn scan(
    state: &RunState,
    strategy: DetectionStrategy,
    query: ProcessQuery,
    key: fn(&ProcessRecord) -> String,
) {
    let Some(records) = state
        .guarded(strategy, "process snapshot", state.processes.snapshot(&query))
        .await
    else {
        return;
    };

    if !state.is_active() {
        return;
    }

    tracing::trace!(%strategy, count = records.len(), "Process snapshot");

    for record in records {
        if !state.remember(key(&record)) {
            continue;
        }

        tracing::debug!(%strategy, pid = record.pid, name = %record.name, "Analyzing process");
        for event in analyze_process(&record, strategy) {
            state.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_differ_per_strategy() {
        let record = ProcessRecord::new(1234, "WINWORD");
        assert_eq!(process_key(&record), "1234-WINWORD");
        assert_eq!(handle_key(&record), "handle-1234");
    }
}
