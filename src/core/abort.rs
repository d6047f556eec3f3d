use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-side cancellation flag shared with a running pipeline.
///
/// Once tripped, no new fetches are issued and the run ends with
/// `HarvestError::Aborted` before anything is written.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Trips `handle` when the process receives Ctrl-C.
pub fn abort_on_ctrl_c(handle: AbortHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Ctrl-C received; finishing in-flight requests and aborting");
            handle.abort();
        }
    });
}
