use std::collections::VecDeque;
use std::sync::Arc;

use jiff::Timestamp;
use reqwest::Response;
use tokio::sync::{Mutex, oneshot};
use tracing::warn;

use crate::dispatcher::{ApiRequest, Dispatcher};
use crate::errors::Error;
use crate::telemetry::refresh::RefreshTelemetry;

use super::{Eligibility, SessionPolicy, TokenStore, Verdict};

pub type Completion = Result<Response, Error>;

/// A request parked until the in-flight refresh resolves.
struct Pending {
    request: ApiRequest,
    done: oneshot::Sender<Completion>,
}

enum RefreshState {
    Idle,
    Refreshing {
        queue: VecDeque<Pending>,
        telemetry: RefreshTelemetry,
    },
}

enum Admission {
    Queued(oneshot::Receiver<Completion>),
    /// The token the request was sent with has already been rotated.
    Stale(ApiRequest, String),
}

/// Serializes concurrent authorization failures into a single refresh call.
///
/// The first request to fail starts the refresh on a spawned task; every
/// request failing while it runs joins the same FIFO queue. On success the
/// queue is replayed in order with the new access token, on failure the
/// store is expired and every queued request is rejected with
/// [`Error::Auth`].
///
/// Replays are sent one at a time and each waits for its response, so a
/// stalled replay holds up the requests queued behind it. Configure
/// `timeout_secs` to bound that wait.
pub struct RefreshCoordinator {
    dispatcher: Dispatcher,
    store: Arc<TokenStore>,
    policy: SessionPolicy,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(dispatcher: Dispatcher, store: Arc<TokenStore>, policy: SessionPolicy) -> Self {
        Self {
            dispatcher,
            store,
            policy,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn store(&self) -> Arc<TokenStore> {
        Arc::clone(&self.store)
    }

    pub async fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock().await, RefreshState::Refreshing { .. })
    }

    pub async fn pending(&self) -> usize {
        match &*self.state.lock().await {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { queue, .. } => queue.len(),
        }
    }

    /// Recovers a request that failed with an authorization error.
    ///
    /// `sent_with` is the access token the failed attempt carried.
    pub async fn recover(self: &Arc<Self>, request: ApiRequest, sent_with: Option<String>) -> Completion {
        match self.admit(request, sent_with).await {
            Admission::Stale(request, token) => self.replay(request.into_retry(), &token).await,
            Admission::Queued(rx) => rx
                .await
                .unwrap_or_else(|_| Err(Error::Auth("refresh was abandoned".into()))),
        }
    }

    async fn admit(self: &Arc<Self>, request: ApiRequest, sent_with: Option<String>) -> Admission {
        let mut state = self.state.lock().await;
        if let RefreshState::Refreshing { queue, telemetry } = &mut *state {
            let (tx, rx) = oneshot::channel();
            telemetry.emit_queued(&request.path);
            queue.push_back(Pending { request, done: tx });
            return Admission::Queued(rx);
        }

        if let Some(current) = self.store.access_token().await
            && sent_with.as_deref() != Some(current.as_str())
        {
            return Admission::Stale(request, current);
        }

        let (tx, rx) = oneshot::channel();
        let telemetry = RefreshTelemetry::new("refresh_coordinator");
        *state = RefreshState::Refreshing {
            queue: VecDeque::from([Pending { request, done: tx }]),
            telemetry: telemetry.clone(),
        };
        tokio::spawn(Arc::clone(self).resolve(telemetry));
        Admission::Queued(rx)
    }

    async fn resolve(self: Arc<Self>, telemetry: RefreshTelemetry) {
        let current = self.store.get().await;
        let outcome = match (self.policy.eligibility(current.as_ref(), Timestamp::now()), current) {
            (Eligibility::Ready, Some(pair)) => {
                telemetry.emit_start(self.pending().await);
                self.dispatcher.refresh(&pair).await
            }
            (reason, _) => {
                telemetry.emit_skipped(reason);
                Err(Error::Auth(match reason {
                    Eligibility::RefreshExpired => "refresh token expired".into(),
                    _ => "no refresh token available".into(),
                }))
            }
        };

        match outcome {
            Ok(pair) => {
                let token = pair.access_token().to_string();
                self.store.replace(pair).await;
                let queue = self.drain().await;
                telemetry.emit_success(queue.len());
                for pending in queue {
                    let result = self.replay(pending.request.into_retry(), &token).await;
                    let _ = pending.done.send(result);
                }
            }
            Err(err) => {
                // Expire before draining so late failures queue up and get rejected
                // instead of refreshing with the dead pair.
                self.store.expire().await;
                let queue = self.drain().await;
                telemetry.emit_failure(&err, queue.len());
                warn!(rejected = queue.len(), "session.terminated");
                for pending in queue {
                    let _ = pending
                        .done
                        .send(Err(Error::Auth(format!("session terminated: {err}"))));
                }
            }
        }
    }

    async fn drain(&self) -> VecDeque<Pending> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Refreshing { queue, .. } => queue,
            RefreshState::Idle => VecDeque::new(),
        }
    }

    async fn replay(&self, request: ApiRequest, token: &str) -> Completion {
        let resp = self.dispatcher.send(&request, Some(token)).await?;
        let status = resp.status();
        match self.policy.classify(status, request.is_retry()) {
            Verdict::Reject => {
                warn!(
                    "retried request still unauthorized: status={} path='{}'",
                    status, request.path
                );
                Err(Error::Auth(format!(
                    "{} still unauthorized after refresh (status {})",
                    request.path, status
                )))
            }
            Verdict::Pass | Verdict::Recover => Ok(resp),
        }
    }
}
