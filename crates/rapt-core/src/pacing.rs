use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Enforces a minimum gap between outbound list requests.
///
/// The last request time survives across cycles, so the first request of
/// a cycle still waits out the gap left by the previous cycle.
#[derive(Debug)]
pub(crate) struct RequestPacer {
    spacing: Duration,
    last: Option<Instant>,
}

impl RequestPacer {
    pub(crate) fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last: None,
        }
    }

    /// Sleep until the next request is allowed, then claim the slot.
    pub(crate) async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.spacing;
            if ready_at > Instant::now() {
                trace!(wait_ms = (ready_at - Instant::now()).as_millis(), "pacing request");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
