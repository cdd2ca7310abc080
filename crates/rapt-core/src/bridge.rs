// ── Bridge ──
//
// Lifecycle around a poll coordinator: initial poll on start, a periodic
// poll task, publication of every cycle to the display sink, and
// cancellation on stop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::coordinator::{BridgeStatus, PollCoordinator, PollReport};
use crate::error::CoreError;
use crate::model::{DeviceInfo, EntityState};
use crate::sink::DisplaySink;
use crate::source::{ApiSource, TelemetrySource};
use crate::store::BridgeStore;

/// The entry point for hosts.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. A bridge runs once: after
/// [`stop()`](Self::stop) it refuses further cycles.
pub struct Bridge<S> {
    inner: Arc<BridgeInner<S>>,
}

impl<S> Clone for Bridge<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BridgeInner<S> {
    coordinator: PollCoordinator<S>,
    sink: Arc<dyn DisplaySink>,
    poll_interval: Duration,
    /// Last status handed to the sink.
    published: watch::Sender<BridgeStatus>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Bridge<ApiSource> {
    /// Bridge over the live RAPT API.
    pub fn connect(config: &BridgeConfig, sink: Arc<dyn DisplaySink>) -> Result<Self, CoreError> {
        Ok(Self::new(ApiSource::new(config)?, config, sink))
    }
}

impl<S: TelemetrySource + 'static> Bridge<S> {
    pub fn new(source: S, config: &BridgeConfig, sink: Arc<dyn DisplaySink>) -> Self {
        let (published, _) = watch::channel(BridgeStatus::Idle);
        Self {
            inner: Arc::new(BridgeInner {
                coordinator: PollCoordinator::new(source, config),
                sink,
                poll_interval: config.poll_interval,
                published,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the first cycle and spawn the periodic poll task.
    ///
    /// A rejected secret fails here, before anything is scheduled. Any
    /// other first-cycle failure is logged and left to the next tick.
    pub async fn start(&self) -> Result<(), CoreError> {
        match self.poll_now().await {
            Ok(_) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
            Err(err) => warn!(error = %err, "initial poll failed, will retry on schedule"),
        }

        let mut handles = self.inner.task_handles.lock().await;
        let cancel = self.inner.coordinator.cancel_token().clone();
        handles.push(tokio::spawn(poll_task(
            self.clone(),
            self.inner.poll_interval,
            cancel,
        )));
        info!(
            interval_secs = self.inner.poll_interval.as_secs(),
            "bridge started"
        );
        Ok(())
    }

    /// Abandon any in-flight cycle and join the background task.
    pub async fn stop(&self) {
        self.inner.coordinator.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "poll task ended abnormally");
            }
        }
        debug!("bridge stopped");
    }

    /// Resolves once the bridge is stopped, either through
    /// [`stop()`](Self::stop) or because the secret was rejected mid-run.
    pub async fn stopped(&self) {
        self.inner.coordinator.cancel_token().cancelled().await;
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Run one cycle now (waiting for an in-flight one) and publish it.
    pub async fn poll_now(&self) -> Result<PollReport, CoreError> {
        let outcome = self.inner.coordinator.poll_once().await;
        self.publish(outcome.as_ref().ok());
        outcome
    }

    /// Host-triggered discovery. Returns the number of new devices.
    pub async fn discover_devices(&self) -> Result<usize, CoreError> {
        let report = self.poll_now().await?;
        Ok(report.discovered.len())
    }

    /// Scheduled tick: skipped when a cycle is already running.
    async fn scheduled_poll(&self) -> Option<Result<PollReport, CoreError>> {
        let outcome = self.inner.coordinator.try_poll().await?;
        self.publish(outcome.as_ref().ok());
        Some(outcome)
    }

    /// Push a cycle's results to the sink: discovery events first, then
    /// entity upserts, then any status change.
    fn publish(&self, report: Option<&PollReport>) {
        let sink = &self.inner.sink;
        if let Some(report) = report {
            for event in &report.discovered {
                sink.register_device(event);
            }
            let store = self.inner.coordinator.store();
            for entity in &report.updated {
                if let Some(device) = store.device(&entity.device_id) {
                    sink.upsert(&device, entity);
                }
            }
        }

        let status = self.inner.coordinator.status();
        let changed = self.inner.published.send_if_modified(|last| {
            if *last == status {
                false
            } else {
                *last = status;
                true
            }
        });
        if !changed {
            return;
        }
        sink.status_changed(status);
        if status.is_unavailable() {
            self.publish_stale();
        }
    }

    /// Re-send every entity so the sink sees the stale flag.
    fn publish_stale(&self) {
        let store = self.inner.coordinator.store();
        for entity in store.entities_snapshot().iter() {
            if let Some(device) = store.device(&entity.device_id) {
                self.inner.sink.upsert(&device, entity);
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn status(&self) -> BridgeStatus {
        self.inner.coordinator.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<BridgeStatus> {
        self.inner.coordinator.subscribe_status()
    }

    pub fn store(&self) -> &Arc<BridgeStore> {
        self.inner.coordinator.store()
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<DeviceInfo>>> {
        self.store().devices_snapshot()
    }

    pub fn entities_snapshot(&self) -> Arc<Vec<Arc<EntityState>>> {
        self.store().entities_snapshot()
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.store().last_success()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically poll until cancelled or the secret is rejected.
async fn poll_task<S: TelemetrySource + 'static>(
    bridge: Bridge<S>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // start() already ran the first cycle

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match bridge.scheduled_poll().await {
                    None | Some(Ok(_)) => {}
                    Some(Err(CoreError::Cancelled)) => break,
                    Some(Err(err)) if err.is_fatal() => {
                        error!(error = %err, "stopping scheduled polling");
                        bridge.inner.coordinator.cancel();
                        break;
                    }
                    Some(Err(err)) => debug!(error = %err, "scheduled poll failed"),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use pretty_assertions::assert_eq;
    use rapt_api::DeviceCategory;
    use secrecy::SecretString;
    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::coordinator::DiscoveryEvent;
    use crate::test_support::{AuthReply, FakeSource, ListReply, RecordingSink, SinkEvent};

    fn setup() -> (Arc<FakeSource>, Arc<RecordingSink>, Bridge<Arc<FakeSource>>) {
        let source = Arc::new(FakeSource::new());
        let sink = Arc::new(RecordingSink::default());
        let config = BridgeConfig::new("brewer@example.com", SecretString::from("s".to_string()));
        let bridge = Bridge::new(Arc::clone(&source), &config, sink.clone());
        (source, sink, bridge)
    }

    fn pill(id: &str) -> serde_json::Value {
        json!({"id": id, "temperature": 18.5, "gravity": 1.042})
    }

    #[tokio::test(start_paused = true)]
    async fn start_publishes_discovery_before_entities() {
        let (source, sink, bridge) = setup();
        source.script(DeviceCategory::Hydrometer, [ListReply::Records(vec![pill("A1")])]);

        bridge.start().await.unwrap();
        bridge.stop().await;

        let events = sink.events();
        assert_eq!(events[0], SinkEvent::Registered("A1".into()));
        assert_eq!(
            events[1],
            SinkEvent::Upsert {
                key: "A1.temperature".into(),
                stale: false
            }
        );
        assert_eq!(sink.statuses(), vec![BridgeStatus::Available]);
        assert!(bridge.last_success().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_polls_every_interval() {
        let (source, sink, bridge) = setup();
        source.script(DeviceCategory::Hydrometer, [ListReply::Records(vec![pill("A1")])]);

        bridge.start().await.unwrap();
        // First cycle ends at 45s, the next tick runs 105s..150s.
        tokio::time::sleep(Duration::from_secs(115)).await;
        bridge.stop().await;

        assert_eq!(source.list_calls().len(), 8);
        let registrations = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, SinkEvent::Registered(_)))
            .count();
        assert_eq!(registrations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_secret_fails_start() {
        let (source, sink, bridge) = setup();
        source.script_auth([AuthReply::Reject]);

        let err = bridge.start().await.unwrap_err();

        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(bridge.status(), BridgeStatus::Unavailable);
        assert_eq!(sink.statuses(), vec![BridgeStatus::Unavailable]);
    }

    #[tokio::test(start_paused = true)]
    async fn secret_rejected_mid_run_stops_bridge() {
        let (source, sink, bridge) = setup();
        // Due for refresh at 100s, after the first cycle but before the first tick.
        source.script_auth([
            AuthReply::Token(Duration::from_secs(400)),
            AuthReply::Reject,
        ]);

        bridge.start().await.unwrap();
        tokio::time::timeout(Duration::from_secs(600), bridge.stopped())
            .await
            .unwrap();

        assert_eq!(source.auth_calls(), 2);
        assert_eq!(
            sink.statuses(),
            vec![BridgeStatus::Available, BridgeStatus::Unavailable]
        );
        bridge.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_republishes_entities_as_stale() {
        let (source, sink, bridge) = setup();
        source.script_all(&[ListReply::Records(Vec::new()), ListReply::Status(503)]);
        source.script(
            DeviceCategory::Hydrometer,
            [ListReply::Records(vec![pill("A1")]), ListReply::Status(503)],
        );

        bridge.poll_now().await.unwrap();
        for _ in 0..3 {
            assert!(bridge.poll_now().await.is_err());
        }

        assert_eq!(
            sink.statuses(),
            vec![
                BridgeStatus::Available,
                BridgeStatus::PartiallyDegraded,
                BridgeStatus::Unavailable
            ]
        );
        let last = sink.events().pop().unwrap();
        assert!(matches!(last, SinkEvent::Upsert { stale: true, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn discover_devices_counts_new_ids_only() {
        let (source, sink, bridge) = setup();
        source.script(DeviceCategory::Hydrometer, [ListReply::Records(vec![pill("A1")])]);

        assert_eq!(bridge.discover_devices().await.unwrap(), 1);
        assert_eq!(bridge.discover_devices().await.unwrap(), 0);
        assert_eq!(bridge.devices_snapshot().len(), 1);
        assert_eq!(bridge.entities_snapshot().len(), 8);
        let registrations = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, SinkEvent::Registered(_)))
            .count();
        assert_eq!(registrations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_abandons_in_flight_cycle() {
        let (source, _sink, bridge) = setup();
        source.script(
            DeviceCategory::Hydrometer,
            [ListReply::Records(Vec::new()), ListReply::Hang],
        );

        bridge.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(80)).await;
        bridge.stop().await;

        assert!(matches!(bridge.poll_now().await, Err(CoreError::Cancelled)));
    }

    /// Panics on entity upserts once armed.
    #[derive(Default)]
    struct FaultySink {
        armed: AtomicBool,
    }

    impl DisplaySink for FaultySink {
        fn register_device(&self, _event: &DiscoveryEvent) {}

        fn upsert(&self, _device: &DeviceInfo, _entity: &EntityState) {
            assert!(!self.armed.load(Ordering::SeqCst), "display sink failure");
        }

        fn status_changed(&self, _status: BridgeStatus) {}
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_reports_panicked_poll_task() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = Arc::new(FakeSource::new());
        source.script(DeviceCategory::Hydrometer, [ListReply::Records(vec![pill("A1")])]);
        let sink = Arc::new(FaultySink::default());
        let config = BridgeConfig::new("brewer@example.com", SecretString::from("s".to_string()));
        let bridge = Bridge::new(Arc::clone(&source), &config, sink.clone());

        bridge.start().await.unwrap();
        sink.armed.store(true, Ordering::SeqCst);
        // The scheduled cycle at 105s publishes into the failing sink.
        tokio::time::sleep(Duration::from_secs(200)).await;
        bridge.stop().await;

        assert!(logs.contents().contains("poll task ended abnormally"));
    }
}
