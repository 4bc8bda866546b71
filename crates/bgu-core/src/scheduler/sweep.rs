//! Delayed clearing of aggregate progress.

use std::sync::Arc;

use super::Shared;

/// After the grace delay, clear every progress record if no job is live. A
/// finished job's 100% stays visible meanwhile so the aggregate does not jump
/// while siblings are still running.
pub(super) fn schedule(shared: &Arc<Shared>) {
    let shared = Arc::clone(shared);
    let delay = shared.config.progress_clear_delay();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if shared.table.len() == 0 && !shared.progress.is_empty() {
            shared.progress.clear();
            tracing::debug!("progress cleared");
        }
    });
}
