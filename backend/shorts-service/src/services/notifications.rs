/// Encoding-state push notifications
///
/// The reconciliation workflow only enqueues notices. Delivery happens on
/// background tasks after the storage write has already succeeded, so a
/// failing notification backend can never undo or block a state change.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::models::{EncodeStateNotice, ShortsState};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification service rejected request with status {0}")]
    Rejected(u16),
}

/// Outbound port to whatever actually pushes to devices.
#[async_trait]
pub trait EncodeStateNotifier: Send + Sync {
    async fn post_encode_state(
        &self,
        upload_key: &str,
        state: ShortsState,
    ) -> Result<(), NotificationError>;
}

/// Where the workflow hands notices off. Must not block and must not fail.
pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, notice: EncodeStateNotice);
}

/// Notifier that calls the notification service over HTTP.
pub struct HttpNotificationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotificationClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}/api/v1/notifications/shorts-encoding",
                base_url.trim_end_matches('/')
            ),
        }
    }
}

#[async_trait]
impl EncodeStateNotifier for HttpNotificationClient {
    async fn post_encode_state(
        &self,
        upload_key: &str,
        state: ShortsState,
    ) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EncodeStateNotice {
                upload_key: upload_key.to_string(),
                state,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

/// Queue in front of an [`EncodeStateNotifier`] with per-notice retries.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<EncodeStateNotice>,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    /// base * 2^attempt, capped at `max_delay`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

impl NotificationDispatcher {
    /// Start the dispatch loop. It ends once every dispatcher clone is dropped.
    pub fn spawn(
        notifier: Arc<dyn EncodeStateNotifier>,
        policy: RetryPolicy,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<EncodeStateNotice>();

        let handle = tokio::spawn(async move {
            info!(max_retries = policy.max_retries, "Notification dispatcher starting");
            let mut in_flight = Vec::new();
            while let Some(notice) = rx.recv().await {
                let notifier = notifier.clone();
                in_flight.retain(|h: &JoinHandle<()>| !h.is_finished());
                in_flight.push(tokio::spawn(deliver(notifier, notice, policy)));
            }
            for handle in in_flight {
                let _ = handle.await;
            }
            debug!("Notification dispatcher stopped");
        });

        (Self { tx }, handle)
    }
}

impl NotificationSink for NotificationDispatcher {
    fn enqueue(&self, notice: EncodeStateNotice) {
        if let Err(err) = self.tx.send(notice) {
            error!(
                upload_key = %err.0.upload_key,
                state = err.0.state.as_str(),
                "Notification dispatcher is closed; dropping notice"
            );
        }
    }
}

async fn deliver(
    notifier: Arc<dyn EncodeStateNotifier>,
    notice: EncodeStateNotice,
    policy: RetryPolicy,
) {
    let mut attempt = 0;
    loop {
        match notifier
            .post_encode_state(&notice.upload_key, notice.state)
            .await
        {
            Ok(()) => {
                debug!(
                    upload_key = %notice.upload_key,
                    state = notice.state.as_str(),
                    attempt,
                    "Encoding state notification sent"
                );
                return;
            }
            Err(err) if attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                warn!(
                    upload_key = %notice.upload_key,
                    state = notice.state.as_str(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Encoding state notification failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    upload_key = %notice.upload_key,
                    state = notice.state.as_str(),
                    attempts = attempt + 1,
                    error = %err,
                    "Giving up on encoding state notification"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FlakyNotifier {
        failures_left: AtomicU32,
        delivered: Mutex<Vec<EncodeStateNotice>>,
    }

    impl FlakyNotifier {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: AtomicU32::new(failures),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EncodeStateNotifier for FlakyNotifier {
        async fn post_encode_state(
            &self,
            upload_key: &str,
            state: ShortsState,
        ) -> Result<(), NotificationError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(NotificationError::Rejected(503));
            }
            self.delivered.lock().unwrap().push(EncodeStateNotice {
                upload_key: upload_key.to_string(),
                state,
            });
            Ok(())
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::new(5);
        assert_eq!(policy.backoff(0).as_secs(), 1);
        assert_eq!(policy.backoff(1).as_secs(), 2);
        assert_eq!(policy.backoff(3).as_secs(), 8);
        assert_eq!(policy.backoff(10).as_secs(), 60); // capped
        assert_eq!(policy.backoff(40).as_secs(), 60);
    }

    #[tokio::test]
    async fn retries_until_delivered() {
        let notifier = Arc::new(FlakyNotifier::new(2));
        let (dispatcher, handle) = NotificationDispatcher::spawn(notifier.clone(), fast_policy(3));

        dispatcher.enqueue(EncodeStateNotice {
            upload_key: "abc123".into(),
            state: ShortsState::Ok,
        });
        drop(dispatcher);
        handle.await.unwrap();

        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].state, ShortsState::Ok);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let notifier = Arc::new(FlakyNotifier::new(10));
        let (dispatcher, handle) = NotificationDispatcher::spawn(notifier.clone(), fast_policy(2));

        dispatcher.enqueue(EncodeStateNotice {
            upload_key: "abc123".into(),
            state: ShortsState::Fail,
        });
        drop(dispatcher);
        handle.await.unwrap();

        assert!(notifier.delivered.lock().unwrap().is_empty());
        // one initial attempt plus two retries
        assert_eq!(notifier.failures_left.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let client = HttpNotificationClient::new("http://notify:8000/");
        assert_eq!(
            client.endpoint,
            "http://notify:8000/api/v1/notifications/shorts-encoding"
        );
    }
}
