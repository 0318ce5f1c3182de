//! Background refresh scheduler
//!
//! Rotates the session on a fixed period so the held access token never
//! expires while the client is running. Runs on its own task; the UI loop
//! consumes [`SessionEvent`]s from the channel and never blocks on I/O.
//!
//! Failure is terminal: the first refresh error emits exactly one
//! [`SessionEvent::RefreshFailed`] and stops the loop. A rotated-away or
//! expired session cannot recover without the user signing in again, so
//! retrying would only hammer the server with guaranteed 401s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::models::TokenPair;

use super::api::ClientError;

/// Refresh endpoint seam, mockable in tests.
#[async_trait]
pub trait RefreshApi: Send + Sync {
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, ClientError>;
}

/// Emitted by the scheduler toward the UI loop.
#[derive(Debug)]
pub enum SessionEvent {
    /// A rotation succeeded; the UI should replace its held pair.
    TokensRefreshed(TokenPair),
    /// A rotation failed; the scheduler has stopped and the session is dead.
    RefreshFailed(ClientError),
}

/// Handle to the background refresh task.
pub struct RefreshScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Spawns the refresh loop. The first rotation happens one full `period`
    /// after spawn; the pair passed in is assumed fresh.
    pub fn spawn(
        api: Arc<dyn RefreshApi>,
        tokens: TokenPair,
        period: Duration,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(api, tokens, period, events, cancel.clone()));
        Self { cancel, handle }
    }

    /// Stops the loop. Idempotent; a second call is a no-op.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels and waits for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn run(
    api: Arc<dyn RefreshApi>,
    mut tokens: TokenPair,
    period: Duration,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick resolves immediately; consume it so the first rotation
    // waits a full period.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Refresh scheduler stopped");
                return;
            }
            _ = interval.tick() => {
                let result = tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = api.refresh_tokens(&tokens.refresh_token) => result,
                };
                match result {
                    Ok(pair) => {
                        tokens = pair.clone();
                        if events.send(SessionEvent::TokensRefreshed(pair)).await.is_err() {
                            // Receiver gone, nobody cares about this session anymore.
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Token refresh failed, stopping scheduler: {}", e);
                        let _ = events.send(SessionEvent::RefreshFailed(e)).await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PERIOD: Duration = Duration::from_secs(25);

    struct RotatingApi {
        calls: AtomicUsize,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl RotatingApi {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen_tokens: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RefreshApi for RotatingApi {
        async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_tokens
                .lock()
                .unwrap()
                .push(refresh_token.to_string());
            Ok(TokenPair {
                access_token: format!("access-{}", n),
                refresh_token: format!("refresh-{}", n),
            })
        }
    }

    struct FailingApi {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RefreshApi for FailingApi {
        async fn refresh_tokens(&self, _refresh_token: &str) -> Result<TokenPair, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Unauthorized)
        }
    }

    fn initial_pair() -> TokenPair {
        TokenPair {
            access_token: "access-initial".to_string(),
            refresh_token: "refresh-initial".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rotation_uses_the_latest_refresh_token() {
        let api = Arc::new(RotatingApi::new());
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = RefreshScheduler::spawn(api.clone(), initial_pair(), PERIOD, tx);

        let first = rx.recv().await.unwrap();
        match first {
            SessionEvent::TokensRefreshed(pair) => assert_eq!(pair.refresh_token, "refresh-0"),
            other => panic!("expected TokensRefreshed, got {:?}", other),
        }
        let second = rx.recv().await.unwrap();
        match second {
            SessionEvent::TokensRefreshed(pair) => assert_eq!(pair.refresh_token, "refresh-1"),
            other => panic!("expected TokensRefreshed, got {:?}", other),
        }

        // The second call must present the token minted by the first rotation,
        // never the original one.
        let seen = api.seen_tokens.lock().unwrap().clone();
        assert_eq!(seen, vec!["refresh-initial", "refresh-0"]);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_emits_exactly_one_event_and_stops() {
        let api = Arc::new(FailingApi {
            calls: AtomicUsize::new(0),
        });
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = RefreshScheduler::spawn(api.clone(), initial_pair(), PERIOD, tx);

        match rx.recv().await.unwrap() {
            SessionEvent::RefreshFailed(ClientError::Unauthorized) => {}
            other => panic!("expected RefreshFailed, got {:?}", other),
        }

        // The task has exited and dropped its sender; the channel closes
        // without a second event and no further calls are made.
        assert!(rx.recv().await.is_none());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_the_first_tick_prevents_any_refresh() {
        let api = Arc::new(RotatingApi::new());
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = RefreshScheduler::spawn(api.clone(), initial_pair(), PERIOD, tx);

        scheduler.cancel();
        scheduler.cancel(); // idempotent
        scheduler.shutdown().await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert!(rx.recv().await.is_none());
    }
}
