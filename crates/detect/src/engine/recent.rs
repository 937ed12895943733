//! Recent-items strategy.

use super::RunState;
use crate::event::{DetectionStrategy, FileOpenEvent};
use crate::source::RecentItem;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(super) async fn scan_recent(state: Arc<RunState>) {
    let strategy = DetectionStrategy::RecentFiles;

    let Some(items) = state
        .guarded(strategy, "list recent items", state.recent.list_recent())
        .await
    else {
        return;
    };

    let now = SystemTime::now();
    let window = state.config.recent_window();

    for item in items {
        if !is_fresh(&item, now, window) {
            continue;
        }

        let key = recent_key(&item);
        if state.has_seen(&key) {
            continue;
        }

        let Some(target) = state
            .guarded(
                strategy,
                "resolve shortcut",
                state.recent.resolve_target(&item.link_path),
            )
            .await
        else {
            continue;
        };

        if !state.is_active() {
            return;
        }
        if !state.remember(key) {
            continue;
        }

        let Some(target) = target else {
            tracing::debug!(link = %item.link_path.display(), "Shortcut has no target");
            continue;
        };

        if let Some(event) = FileOpenEvent::from_recent(&target.to_string_lossy()) {
            state.emit(event);
        }
    }
}

/// Modified within `window` of `now`. Timestamps in the future count as fresh.
fn is_fresh(item: &RecentItem, now: SystemTime, window: Duration) -> bool {
    match now.duration_since(item.modified_at) {
        Ok(age) => age <= window,
        Err(_) => true,
    }
}

/// Same shortcut touched again later gets a new key.
fn recent_key(item: &RecentItem) -> String {
    let modified_ms = item
        .modified_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("recent-{}-{}", item.link_path.display(), modified_ms)
}
