// ── Poll coordinator ──
//
// Runs poll cycles: one list request per category, spaced by the request
// pacer, merged into the store. Owns the token manager and the discovery
// set behind a single async mutex, which is also what keeps cycles from
// overlapping.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use rapt_api::DeviceCategory;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::mapping;
use crate::model::{DeviceInfo, DeviceRecord, EntityState};
use crate::pacing::RequestPacer;
use crate::source::TelemetrySource;
use crate::store::{BridgeStore, DeviceUpdate};
use crate::token::TokenManager;

// ── BridgeStatus ─────────────────────────────────────────────────

/// Externally visible coordinator state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIs,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BridgeStatus {
    /// No cycle has completed yet.
    #[default]
    Idle,
    Polling,
    /// Every category succeeded in the last cycle.
    Available,
    /// Some categories failed, or a full failure below the threshold.
    PartiallyDegraded,
    /// Consecutive full failures reached the threshold, or the secret
    /// was rejected.
    Unavailable,
}

// ── Poll results ─────────────────────────────────────────────────

/// A device id seen for the first time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryEvent {
    pub device: DeviceInfo,
    /// Keys of the entities created for the device, in table order.
    pub entity_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryFailure {
    pub category: DeviceCategory,
    #[serde(serialize_with = "serialize_display")]
    pub error: CoreError,
}

/// Outcome of one cycle in which at least one category succeeded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollReport {
    pub discovered: Vec<DiscoveryEvent>,
    /// Every entity state refreshed this cycle.
    pub updated: Vec<EntityState>,
    /// Metadata of every device present in a successful response.
    pub devices: Vec<DeviceInfo>,
    pub failures: Vec<CategoryFailure>,
    pub status: BridgeStatus,
}

fn serialize_display<S: Serializer>(err: &CoreError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

// ── PollCoordinator ──────────────────────────────────────────────

struct PollState {
    tokens: TokenManager,
    pacer: RequestPacer,
    /// Device ids that already produced a discovery event.
    discovered: HashSet<String>,
    consecutive_failures: u32,
}

pub struct PollCoordinator<S> {
    source: S,
    store: Arc<BridgeStore>,
    state: Mutex<PollState>,
    status: watch::Sender<BridgeStatus>,
    cancel: CancellationToken,
    failure_threshold: u32,
}

impl<S: TelemetrySource> PollCoordinator<S> {
    pub fn new(source: S, config: &BridgeConfig) -> Self {
        let (status, _) = watch::channel(BridgeStatus::Idle);
        Self {
            source,
            store: Arc::new(BridgeStore::new()),
            state: Mutex::new(PollState {
                tokens: TokenManager::new(),
                pacer: RequestPacer::new(config.request_spacing),
                discovered: HashSet::new(),
                consecutive_failures: 0,
            }),
            status,
            cancel: CancellationToken::new(),
            failure_threshold: config.failure_threshold.max(1),
        }
    }

    pub fn store(&self) -> &Arc<BridgeStore> {
        &self.store
    }

    pub fn status(&self) -> BridgeStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<BridgeStatus> {
        self.status.subscribe()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Abandon any in-flight cycle and refuse new ones.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run one cycle, waiting for an in-flight cycle to finish first.
    ///
    /// Returns `Err(CycleFailed)` when every category failed,
    /// `Err(AuthenticationFailed)` when the secret was rejected.
    pub async fn poll_once(&self) -> Result<PollReport, CoreError> {
        let mut state = self.state.lock().await;
        self.run_cycle(&mut state).await
    }

    /// Run one cycle unless one is already in flight.
    ///
    /// Scheduled ticks use this: a tick that finds the previous cycle
    /// still running is dropped, not queued.
    pub async fn try_poll(&self) -> Option<Result<PollReport, CoreError>> {
        let Ok(mut state) = self.state.try_lock() else {
            debug!("poll cycle still in flight, skipping tick");
            return None;
        };
        Some(self.run_cycle(&mut state).await)
    }

    /// Force an immediate cycle and return how many devices were new.
    ///
    /// Serialised with scheduled cycles through the same lock, so a
    /// device is never reported twice.
    pub async fn discover_devices(&self) -> Result<usize, CoreError> {
        let report = self.poll_once().await?;
        if report.discovered.is_empty() {
            info!("no new RAPT devices found");
        } else {
            info!(count = report.discovered.len(), "discovered new RAPT devices");
        }
        Ok(report.discovered.len())
    }

    // ── Cycle ────────────────────────────────────────────────────────

    async fn run_cycle(&self, state: &mut PollState) -> Result<PollReport, CoreError> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let previous = self.status.send_replace(BridgeStatus::Polling);

        match self.cycle(state).await {
            Err(CoreError::Cancelled) => {
                debug!("poll cycle abandoned");
                self.status.send_replace(previous);
                Err(CoreError::Cancelled)
            }
            Err(err) => Err(self.fail_cycle(state, err)),
            Ok(mut report) => {
                state.consecutive_failures = 0;
                self.store.record_success();
                report.status = if report.failures.is_empty() {
                    BridgeStatus::Available
                } else {
                    BridgeStatus::PartiallyDegraded
                };
                self.status.send_replace(report.status);
                debug!(
                    updated = report.updated.len(),
                    discovered = report.discovered.len(),
                    failed = report.failures.len(),
                    status = %report.status,
                    "poll cycle complete"
                );
                Ok(report)
            }
        }
    }

    async fn cycle(&self, state: &mut PollState) -> Result<PollReport, CoreError> {
        // Authenticate up front so an auth outage fails the cycle once
        // instead of once per category.
        self.cancellable(state.tokens.get_valid_credential(&self.source))
            .await??;

        let mut report = PollReport::default();
        for category in DeviceCategory::ALL {
            match self.fetch(state, category).await {
                Ok(values) => self.commit(state, category, values, &mut report),
                Err(err @ (CoreError::Cancelled | CoreError::AuthenticationFailed { .. })) => {
                    return Err(err);
                }
                Err(err) => {
                    warn!(%category, error = %err, "category poll failed");
                    report.failures.push(CategoryFailure {
                        category,
                        error: err,
                    });
                }
            }
        }

        if report.failures.len() == DeviceCategory::ALL.len() {
            return Err(CoreError::CycleFailed {
                failed: report.failures.len(),
            });
        }
        Ok(report)
    }

    /// One paced list request. A rejected bearer token is replaced and
    /// the request retried once.
    async fn fetch(
        &self,
        state: &mut PollState,
        category: DeviceCategory,
    ) -> Result<Vec<Value>, CoreError> {
        // Pace first: the wait can outlast a token close to expiry.
        self.cancellable(state.pacer.wait()).await?;
        let credential = self
            .cancellable(state.tokens.get_valid_credential(&self.source))
            .await??;
        debug!(%category, "requesting device list");

        match self
            .cancellable(self.source.list_devices(category, &credential))
            .await?
        {
            Ok(values) => Ok(values),
            Err(err) if err.is_token_rejected() => {
                warn!(%category, "bearer token rejected, re-authenticating");
                state.tokens.invalidate();
                self.cancellable(state.pacer.wait()).await?;
                let credential = self
                    .cancellable(state.tokens.get_valid_credential(&self.source))
                    .await??;
                self.cancellable(self.source.list_devices(category, &credential))
                    .await?
                    .map_err(|e| CoreError::from_list(category, e))
            }
            Err(err) => Err(CoreError::from_list(category, err)),
        }
    }

    /// Merge one category's response. Runs without awaiting, so a
    /// category is either committed in full or not at all.
    fn commit(
        &self,
        state: &mut PollState,
        category: DeviceCategory,
        values: Vec<Value>,
        report: &mut PollReport,
    ) {
        let mut skipped = 0usize;
        let updates: Vec<DeviceUpdate> = values
            .into_iter()
            .filter_map(|value| {
                let record = DeviceRecord::from_json(category, value);
                if record.is_none() {
                    skipped += 1;
                }
                record
            })
            .map(|record| DeviceUpdate {
                info: record.info(),
                entities: mapping::map(&record),
                record,
            })
            .collect();
        if skipped > 0 {
            warn!(%category, skipped, "skipped records without a device id");
        }

        for update in &updates {
            if state.discovered.insert(update.info.device_id.clone()) {
                info!(
                    %category,
                    device_id = %update.info.device_id,
                    name = %update.info.name,
                    "new device discovered"
                );
                report.discovered.push(DiscoveryEvent {
                    device: update.info.clone(),
                    entity_keys: update.entities.iter().map(|e| e.key.clone()).collect(),
                });
            }
            report.devices.push(update.info.clone());
            report.updated.extend(update.entities.iter().cloned());
        }
        self.store.apply(updates);
    }

    /// Record a failed cycle and settle the status it leads to.
    fn fail_cycle(&self, state: &mut PollState, err: CoreError) -> CoreError {
        if matches!(err, CoreError::AuthenticationFailed { .. }) {
            error!(error = %err, "RAPT rejected the configured API secret");
            self.store.mark_stale();
            self.status.send_replace(BridgeStatus::Unavailable);
            return err;
        }

        state.consecutive_failures += 1;
        let status = if state.consecutive_failures >= self.failure_threshold {
            let stale = self.store.mark_stale();
            warn!(
                failures = state.consecutive_failures,
                stale_entities = stale,
                error = %err,
                "RAPT API unavailable"
            );
            BridgeStatus::Unavailable
        } else {
            warn!(
                failures = state.consecutive_failures,
                error = %err,
                "poll cycle failed"
            );
            BridgeStatus::PartiallyDegraded
        };
        self.status.send_replace(status);
        err
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, CoreError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(CoreError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::model::EntityValue;
    use crate::test_support::{AuthReply, FakeSource, ListReply};

    type Coordinator = PollCoordinator<Arc<FakeSource>>;

    fn setup() -> (Arc<FakeSource>, Arc<Coordinator>) {
        let source = Arc::new(FakeSource::new());
        let config = BridgeConfig::new("brewer@example.com", SecretString::from("s".to_string()));
        let coordinator = Arc::new(PollCoordinator::new(Arc::clone(&source), &config));
        (source, coordinator)
    }

    fn pill(id: &str, temperature: f64) -> Value {
        json!({"id": id, "category": "Hydrometer", "temperature": temperature, "gravity": 1.042})
    }

    fn value(coordinator: &Coordinator, key: &str) -> EntityValue {
        coordinator.store().entity(key).unwrap().value.clone()
    }

    // ── Discovery and merge ─────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn first_cycle_discovers_then_updates() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Hydrometer,
            [ListReply::Records(vec![pill("A1", 18.5)])],
        );

        let first = coordinator.poll_once().await.unwrap();
        assert_eq!(first.discovered.len(), 1);
        assert_eq!(first.discovered[0].device.device_id, "A1");
        assert!(first.discovered[0].entity_keys.contains(&"A1.gravity".to_string()));
        assert_eq!(value(&coordinator, "A1.temperature"), EntityValue::Number(18.5));
        assert_eq!(value(&coordinator, "A1.gravity"), EntityValue::Number(1.042));

        let second = coordinator.poll_once().await.unwrap();
        assert!(second.discovered.is_empty());
        assert_eq!(value(&coordinator, "A1.temperature"), EntityValue::Number(18.5));
        assert_eq!(coordinator.store().device_count(), 1);
        assert_eq!(second.updated.len(), first.updated.len());
        assert_eq!(second.status, BridgeStatus::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn discover_twice_reports_zero_second_time() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Hydrometer,
            [ListReply::Records(vec![pill("A1", 18.5), pill("B2", 20.0)])],
        );

        assert_eq!(coordinator.discover_devices().await.unwrap(), 2);
        assert_eq!(coordinator.discover_devices().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_device_keeps_last_state() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Hydrometer,
            [
                ListReply::Records(vec![pill("A1", 18.5), pill("B2", 20.0)]),
                ListReply::Records(vec![pill("A1", 19.0)]),
            ],
        );

        coordinator.poll_once().await.unwrap();
        let report = coordinator.poll_once().await.unwrap();

        assert_eq!(report.devices.len(), 1);
        assert_eq!(value(&coordinator, "A1.temperature"), EntityValue::Number(19.0));
        let b2 = coordinator.store().entity("B2.temperature").unwrap();
        assert_eq!(b2.value, EntityValue::Number(20.0));
        assert!(!b2.stale);
    }

    #[tokio::test(start_paused = true)]
    async fn records_without_id_are_skipped() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Hydrometer,
            [ListReply::Records(vec![json!({"temperature": 4.0}), pill("A1", 18.5)])],
        );

        let report = coordinator.poll_once().await.unwrap();

        assert_eq!(report.discovered.len(), 1);
        assert!(report.failures.is_empty());
    }

    // ── Request discipline ──────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn one_request_per_category_spaced_apart() {
        let (source, coordinator) = setup();

        coordinator.poll_once().await.unwrap();
        coordinator.poll_once().await.unwrap();

        let calls = source.list_calls();
        let categories: Vec<_> = calls.iter().map(|(c, _)| *c).collect();
        let mut expected = DeviceCategory::ALL.to_vec();
        expected.extend(DeviceCategory::ALL);
        assert_eq!(categories, expected);

        for pair in calls.windows(2) {
            assert!(
                pair[1].1 - pair[0].1 >= Duration::from_secs(15),
                "requests {:?} and {:?} too close",
                pair[0].0,
                pair[1].0
            );
        }
        assert_eq!(source.auth_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn credential_is_never_used_after_expiry() {
        let (source, coordinator) = setup();

        // Roughly two and a half hours of one-minute cycles.
        for _ in 0..90 {
            coordinator.poll_once().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        }

        assert_eq!(source.expired_uses(), 0);
        assert!(source.auth_calls() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_outage_never_sends_expired_token() {
        let (source, coordinator) = setup();
        source.script_auth([
            AuthReply::Token(Duration::from_secs(50 * 60)),
            AuthReply::Unavailable,
        ]);

        // Back-to-back cycles straddle the token's expiry while every
        // refresh attempt fails.
        for _ in 0..55 {
            let _ = coordinator.poll_once().await;
        }

        assert_eq!(source.expired_uses(), 0);
        assert!(source.auth_calls() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_token_is_replaced_and_retried_once() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Hydrometer,
            [
                ListReply::Unauthorized,
                ListReply::Records(vec![pill("A1", 18.5)]),
            ],
        );

        let report = coordinator.poll_once().await.unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.discovered.len(), 1);
        assert_eq!(source.auth_calls(), 2);
    }

    // ── Failure handling ────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn failed_category_leaves_others_updating() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Controller,
            [
                ListReply::Records(vec![json!({"id": "C1", "temperature": 4.5})]),
                ListReply::Status(500),
            ],
        );
        source.script(
            DeviceCategory::Hydrometer,
            [
                ListReply::Records(vec![pill("A1", 18.5)]),
                ListReply::Records(vec![pill("A1", 19.5)]),
            ],
        );
        coordinator.poll_once().await.unwrap();
        let version = coordinator.store().entities_version();

        let report = coordinator.poll_once().await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].category, DeviceCategory::Controller);
        assert_eq!(report.status, BridgeStatus::PartiallyDegraded);
        assert_eq!(value(&coordinator, "C1.temperature"), EntityValue::Number(4.5));
        assert_eq!(value(&coordinator, "A1.temperature"), EntityValue::Number(19.5));
        assert_eq!(coordinator.store().entities_version(), version + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn category_commit_publishes_entities_once() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Hydrometer,
            [ListReply::Records(vec![pill("A1", 18.5), pill("A2", 20.0)])],
        );

        let report = coordinator.poll_once().await.unwrap();

        assert_eq!(report.updated.len(), coordinator.store().entities_snapshot().len());
        assert_eq!(coordinator.store().entities_version(), 1);
        assert_eq!(coordinator.store().device_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_skips_only_that_category() {
        let (source, coordinator) = setup();
        source.script(DeviceCategory::Chamber, [ListReply::Malformed]);
        source.script(
            DeviceCategory::Hydrometer,
            [ListReply::Records(vec![pill("A1", 18.5)])],
        );

        let report = coordinator.poll_once().await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            CoreError::MalformedPayload {
                category: DeviceCategory::Chamber,
                ..
            }
        ));
        assert_eq!(report.discovered.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn three_failed_cycles_make_unavailable_then_recover() {
        let (source, coordinator) = setup();
        let down = ListReply::Status(503);
        source.script_all(&[
            ListReply::Records(Vec::new()),
            down.clone(),
            down.clone(),
            down,
            ListReply::Records(Vec::new()),
        ]);
        source.script(
            DeviceCategory::Hydrometer,
            [
                ListReply::Records(vec![pill("A1", 18.5)]),
                ListReply::Status(503),
                ListReply::Status(503),
                ListReply::Status(503),
                ListReply::Records(vec![pill("A1", 18.0)]),
            ],
        );

        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.status(), BridgeStatus::Available);

        for expected in [
            BridgeStatus::PartiallyDegraded,
            BridgeStatus::PartiallyDegraded,
            BridgeStatus::Unavailable,
        ] {
            let err = coordinator.poll_once().await.unwrap_err();
            assert!(matches!(err, CoreError::CycleFailed { failed: 4 }));
            assert_eq!(coordinator.status(), expected);
        }

        let stale = coordinator.store().entity("A1.temperature").unwrap();
        assert!(stale.stale);
        assert_eq!(stale.value, EntityValue::Number(18.5));

        coordinator.poll_once().await.unwrap();
        assert_eq!(coordinator.status(), BridgeStatus::Available);
        let fresh = coordinator.store().entity("A1.temperature").unwrap();
        assert!(!fresh.stale);
        assert_eq!(fresh.value, EntityValue::Number(18.0));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_secret_stops_before_any_list_request() {
        let (source, coordinator) = setup();
        source.script_auth([AuthReply::Reject]);

        let err = coordinator.poll_once().await.unwrap_err();

        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(coordinator.status(), BridgeStatus::Unavailable);
        assert!(source.list_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auth_outage_counts_as_failed_cycle() {
        let (source, coordinator) = setup();
        source.script_auth([AuthReply::Unavailable]);

        let err = coordinator.poll_once().await.unwrap_err();

        assert!(matches!(err, CoreError::TransientAuth { .. }));
        assert_eq!(coordinator.status(), BridgeStatus::PartiallyDegraded);
        assert!(source.list_calls().is_empty());
    }

    // ── Overlap and cancellation ────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn scheduled_tick_is_skipped_while_polling() {
        let (source, coordinator) = setup();
        source.script(DeviceCategory::Controller, [ListReply::Hang]);

        let running = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.poll_once().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(coordinator.status(), BridgeStatus::Polling);
        assert!(coordinator.try_poll().await.is_none());

        coordinator.cancel();
        assert!(matches!(running.await.unwrap(), Err(CoreError::Cancelled)));
        assert_eq!(source.list_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_discovery_waits_for_in_flight_cycle() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Controller,
            [ListReply::Slow(
                Duration::from_secs(10),
                vec![json!({"id": "C1"})],
            )],
        );

        let scheduled = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.poll_once().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        let found = coordinator.discover_devices().await.unwrap();
        let report = scheduled.await.unwrap().unwrap();

        assert_eq!(report.discovered.len(), 1);
        assert_eq!(found, 0);
        assert_eq!(source.list_calls().len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_keeps_committed_categories_only() {
        let (source, coordinator) = setup();
        source.script(
            DeviceCategory::Controller,
            [ListReply::Records(vec![json!({"id": "C1", "temperature": 4.0})])],
        );
        source.script(DeviceCategory::Hydrometer, [ListReply::Hang]);

        let running = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.poll_once().await })
        };
        tokio::time::sleep(Duration::from_secs(20)).await;
        coordinator.cancel();

        assert!(matches!(running.await.unwrap(), Err(CoreError::Cancelled)));
        assert!(coordinator.store().device("C1").is_some());
        assert_eq!(coordinator.store().device_count(), 1);
        assert_eq!(coordinator.status(), BridgeStatus::Idle);
        assert!(coordinator.store().last_success().is_none());
        assert!(matches!(
            coordinator.poll_once().await,
            Err(CoreError::Cancelled)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_takes_at_least_three_spacings() {
        let (_source, coordinator) = setup();
        let start = Instant::now();

        coordinator.poll_once().await.unwrap();

        assert!(Instant::now() - start >= Duration::from_secs(45));
    }
}
