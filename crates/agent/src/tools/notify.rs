//! send_notification: hand a message to the configured notifier

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use scout_channels::{Notification, Notifier};

use super::{Tool, ToolError};

pub struct SendNotificationTool {
    notifier: Arc<dyn Notifier>,
}

impl SendNotificationTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendNotificationArgs {
    subject: String,
    #[serde(default)]
    body: String,
}

#[async_trait]
impl Tool for SendNotificationTool {
    type Args = SendNotificationArgs;

    fn name(&self) -> &str {
        "send_notification"
    }

    fn description(&self) -> &str {
        "Send an alert to the user. Args: {\"subject\": \"...\", \"body\": \"...\"}"
    }

    async fn call(&self, args: SendNotificationArgs) -> Result<Value, ToolError> {
        let notification = Notification::new(args.subject, args.body);
        self.notifier.notify(&notification).await?;

        Ok(json!({
            "delivered_via": self.notifier.name(),
            "subject": notification.subject,
        }))
    }
}
