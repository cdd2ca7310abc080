// Scripted telemetry source and recording sink for clock-driven tests.
#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rapt_api::{Credential, DeviceCategory, TokenPolicy};
use secrecy::SecretString;
use serde_json::Value;
use tokio::time::Instant;

use crate::coordinator::{BridgeStatus, DiscoveryEvent};
use crate::model::{DeviceInfo, EntityState};
use crate::sink::DisplaySink;
use crate::source::{Authenticator, TelemetrySource};

#[derive(Debug, Clone)]
pub(crate) enum AuthReply {
    Token(Duration),
    Reject,
    Unavailable,
}

#[derive(Debug, Clone)]
pub(crate) enum ListReply {
    Records(Vec<Value>),
    /// Answer after a delay.
    Slow(Duration, Vec<Value>),
    Status(u16),
    Malformed,
    Unauthorized,
    /// Never answers.
    Hang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Auth,
    List(DeviceCategory),
}

/// Replies are consumed front to back; the last one repeats forever.
#[derive(Default)]
pub(crate) struct FakeSource {
    auth: Mutex<VecDeque<AuthReply>>,
    lists: Mutex<HashMap<DeviceCategory, VecDeque<ListReply>>>,
    calls: Mutex<Vec<(Call, Instant)>>,
    issued: AtomicUsize,
    expired_uses: AtomicUsize,
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script_auth(&self, replies: impl IntoIterator<Item = AuthReply>) {
        *self.auth.lock().unwrap() = replies.into_iter().collect();
    }

    pub(crate) fn script(
        &self,
        category: DeviceCategory,
        replies: impl IntoIterator<Item = ListReply>,
    ) {
        self.lists
            .lock()
            .unwrap()
            .insert(category, replies.into_iter().collect());
    }

    /// Script the same replies for every category.
    pub(crate) fn script_all(&self, replies: &[ListReply]) {
        for category in DeviceCategory::ALL {
            self.script(category, replies.iter().cloned());
        }
    }

    pub(crate) fn calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn auth_calls(&self) -> usize {
        self.auth_times().len()
    }

    pub(crate) fn auth_times(&self) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|(call, _)| *call == Call::Auth)
            .map(|(_, at)| at)
            .collect()
    }

    pub(crate) fn list_calls(&self) -> Vec<(DeviceCategory, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|(call, at)| match call {
                Call::List(category) => Some((category, at)),
                Call::Auth => None,
            })
            .collect()
    }

    /// List requests that carried an already-expired credential.
    pub(crate) fn expired_uses(&self) -> usize {
        self.expired_uses.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }
}

impl Authenticator for FakeSource {
    fn authenticate(&self) -> impl Future<Output = Result<Credential, rapt_api::Error>> + Send {
        self.record(Call::Auth);
        let reply = next(&mut *self.auth.lock().unwrap())
            .unwrap_or(AuthReply::Token(Duration::from_secs(50 * 60)));
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        async move {
            match reply {
                AuthReply::Token(lifetime) => Ok(Credential::new(
                    SecretString::from(format!("tok-{n}")),
                    Instant::now(),
                    lifetime,
                    TokenPolicy::default().refresh_margin,
                )),
                AuthReply::Reject => Err(rapt_api::Error::Authentication {
                    message: "invalid_grant".into(),
                }),
                AuthReply::Unavailable => Err(rapt_api::Error::Http {
                    status: 503,
                    message: "unavailable".into(),
                }),
            }
        }
    }
}

impl TelemetrySource for FakeSource {
    fn list_devices(
        &self,
        category: DeviceCategory,
        credential: &Credential,
    ) -> impl Future<Output = Result<Vec<Value>, rapt_api::Error>> + Send {
        self.record(Call::List(category));
        if credential.is_expired(Instant::now()) {
            self.expired_uses.fetch_add(1, Ordering::SeqCst);
        }
        let reply = self
            .lists
            .lock()
            .unwrap()
            .get_mut(&category)
            .and_then(next)
            .unwrap_or(ListReply::Records(Vec::new()));
        async move {
            match reply {
                ListReply::Records(values) => Ok(values),
                ListReply::Slow(delay, values) => {
                    tokio::time::sleep(delay).await;
                    Ok(values)
                }
                ListReply::Status(status) => Err(rapt_api::Error::Http {
                    status,
                    message: "scripted failure".into(),
                }),
                ListReply::Malformed => Err(rapt_api::Error::Deserialization {
                    message: "expected a JSON array, got an object".into(),
                    body: "{}".into(),
                }),
                ListReply::Unauthorized => Err(rapt_api::Error::Unauthorized),
                ListReply::Hang => std::future::pending().await,
            }
        }
    }
}

// ── Recording sink ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SinkEvent {
    Registered(String),
    Upsert { key: String, stale: bool },
    Status(BridgeStatus),
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn statuses(&self) -> Vec<BridgeStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySink for RecordingSink {
    fn register_device(&self, event: &DiscoveryEvent) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Registered(event.device.device_id.clone()));
    }

    fn upsert(&self, _device: &DeviceInfo, entity: &EntityState) {
        self.events.lock().unwrap().push(SinkEvent::Upsert {
            key: entity.key.clone(),
            stale: entity.stale,
        });
    }

    fn status_changed(&self, status: BridgeStatus) {
        self.events.lock().unwrap().push(SinkEvent::Status(status));
    }
}
