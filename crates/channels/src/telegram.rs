//! Telegram delivery

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, info};

use crate::format::{chunk_message, escape_html, markdown_to_html, TELEGRAM_CHUNK_CHARS};
use crate::{ChannelError, Notification, Notifier, Result};

/// Sends notifications to one Telegram chat as HTML
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: &str) -> Result<Self> {
        let chat_id: i64 = chat_id
            .trim()
            .parse()
            .map_err(|_| ChannelError::InvalidChatId(chat_id.to_string()))?;

        Ok(Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        })
    }

    /// Subject in bold, body rendered from light markdown, split for the API limit
    pub fn render(notification: &Notification) -> Vec<String> {
        let text = format!(
            "<b>{}</b>\n\n{}",
            escape_html(&notification.subject),
            markdown_to_html(&notification.body)
        );
        chunk_message(&text, TELEGRAM_CHUNK_CHARS)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, notification: &Notification) -> Result<()> {
        let chunks = Self::render(notification);
        debug!("Sending {} telegram chunk(s)", chunks.len());

        for chunk in chunks {
            self.bot
                .send_message(self.chat_id, chunk)
                .parse_mode(ParseMode::Html)
                .await?;
        }

        info!("◆ Telegram notification sent: {}", notification.subject);
        Ok(())
    }
}
