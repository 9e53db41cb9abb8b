//! Notification delivery (Telegram, outbox file)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub mod format;
pub mod outbox;
pub mod telegram;

pub use outbox::OutboxNotifier;
pub use telegram::TelegramNotifier;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("invalid telegram chat id: {0}")]
    InvalidChatId(String),

    #[error("outbox write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no notifier configured")]
    NoNotifier,

    #[error("all notifiers failed: {0}")]
    AllFailed(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;

/// A message for a human
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Delivery target for notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Delivers to every inner notifier; succeeds if at least one does
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(targets: Vec<Arc<dyn Notifier>>) -> Self {
        Self { targets }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name().to_string()).collect()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn notify(&self, notification: &Notification) -> Result<()> {
        if self.targets.is_empty() {
            return Err(ChannelError::NoNotifier);
        }

        let mut failures = Vec::new();
        for target in &self.targets {
            if let Err(e) = target.notify(notification).await {
                warn!("◆ Notifier {} failed: {}", target.name(), e);
                failures.push(format!("{}: {}", target.name(), e));
            }
        }

        if failures.len() == self.targets.len() {
            Err(ChannelError::AllFailed(failures.join("; ")))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        fail: bool,
        hits: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for Counting {
        fn name(&self) -> &str {
            if self.fail {
                "broken"
            } else {
                "counting"
            }
        }

        async fn notify(&self, _notification: &Notification) -> Result<()> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChannelError::InvalidChatId("x".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn counting(fail: bool) -> Arc<Counting> {
        Arc::new(Counting {
            fail,
            hits: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_fanout_partial_failure_is_ok() {
        let ok = counting(false);
        let bad = counting(true);
        let fanout = FanoutNotifier::new(vec![bad.clone(), ok.clone()]);

        assert!(fanout.notify(&Notification::new("s", "b")).await.is_ok());
        assert_eq!(ok.hits.load(Ordering::SeqCst), 1);
        assert_eq!(bad.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fanout_all_failed() {
        let fanout = FanoutNotifier::new(vec![counting(true)]);
        let err = fanout
            .notify(&Notification::new("s", "b"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_fanout_empty() {
        let fanout = FanoutNotifier::new(vec![]);
        assert!(fanout.is_empty());
        assert!(matches!(
            fanout.notify(&Notification::new("s", "b")).await,
            Err(ChannelError::NoNotifier)
        ));
    }
}
