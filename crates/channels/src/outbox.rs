//! Append-only alert log

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::{Notification, Notifier, Result};

/// Writes each notification as a timestamped block to a local file
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn notify(&self, notification: &Notification) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entry = format!(
            "[{}] {}\n{}\n---\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            notification.subject,
            notification.body
        );

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        info!("◆ Alert written to {:?}", self.path);
        Ok(())
    }
}
