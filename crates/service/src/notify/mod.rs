//! Outbound top-up notifications.
//!
//! Sends are spawned and never awaited by the request path; failures are
//! logged and dropped.

pub mod discord;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use discord::DiscordNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(String),
    #[error("channel rejected message: status {0}")]
    Rejected(u16),
}

/// A credited top-up, as reported to the log channel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopupEvent {
    pub user_id: String,
    pub username: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl TopupEvent {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, message: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), username: username.into(), message: message.into(), at: Utc::now() }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &TopupEvent) -> Result<(), NotifyError>;
}

/// Used when no bot token / channel is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, event: &TopupEvent) -> Result<(), NotifyError> {
        debug!(user_id = %event.user_id, message = %event.message, "notifications disabled; event dropped");
        Ok(())
    }
}

/// Fire-and-forget send. The handle is returned for tests; callers drop it.
pub fn dispatch(notifier: Arc<dyn Notifier>, event: TopupEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.send(&event).await {
            warn!(user_id = %event.user_id, message = %event.message, error = %e, "notification_failed");
        }
    })
}

/// Notifier that keeps every event in memory, for tests.
pub mod mock {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingNotifier {
        events: Mutex<Vec<TopupEvent>>,
        fail: bool,
    }

    impl RecordingNotifier {
        /// A notifier whose sends always fail (after recording).
        pub fn failing() -> Self {
            Self { events: Mutex::new(Vec::new()), fail: true }
        }

        pub async fn events(&self) -> Vec<TopupEvent> {
            self.events.lock().await.clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, event: &TopupEvent) -> Result<(), NotifyError> {
            self.events.lock().await.push(event.clone());
            if self.fail {
                return Err(NotifyError::Rejected(500));
            }
            Ok(())
        }
    }
}
