// src/output/notify.rs
// =============================================================================
// Delivering results to a chat.
//
// The Notifier trait is what the rest of the program sees: "send this file"
// and "send this message". TelegramNotifier implements it with the Telegram
// Bot API (sendDocument / sendMessage).
//
// A failed delivery is reported to the caller, but by the time we get here
// the results are already on disk, so nothing is lost.
//
// Telegram refuses messages over 4096 characters, so long result lists are
// split into several messages (send_chunked).
// =============================================================================

use crate::config::TelegramConfig;
use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Longest message we send, a little under Telegram's limit.
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[async_trait]
pub trait Notifier {
    async fn send_file(&self, path: &Path, caption: Option<&str>) -> Result<(), NotifyError>;
    async fn send_message(&self, text: &str) -> Result<(), NotifyError>;

    /// Sends `header` followed by `entries`, as few messages as fit.
    /// Stops at the first failed message.
    async fn send_chunked(&self, header: &str, entries: &[String]) -> Result<(), NotifyError> {
        for chunk in chunk_message(header, entries, MAX_MESSAGE_CHARS) {
            self.send_message(&chunk).await?;
        }
        Ok(())
    }
}

/// Packs `header` and `entries` into messages of at most `max_chars`
/// characters each. An entry is only cut when it doesn't fit in a message
/// on its own.
pub fn chunk_message(header: &str, entries: &[String], max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let pieces = std::iter::once(header)
        .chain(entries.iter().map(String::as_str))
        .flat_map(|piece| split_long(piece, max_chars));

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let len = piece.chars().count();
        if current_len + len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(&piece);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// Counts characters, not bytes: Korean text is 3 bytes per character
fn split_long(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return vec![text.to_string()];
    }
    chars
        .chunks(max_chars)
        .map(|part| part.iter().collect())
        .collect()
}

pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(client: Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_file(&self, path: &Path, caption: Option<&str>) -> Result<(), NotifyError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| NotifyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results.csv".to_string());

        let mut form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part("document", Part::bytes(bytes).file_name(file_name));
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        check_response(response).await?;

        info!("Sent {} to Telegram", path.display());
        Ok(())
    }

    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": text,
            }))
            .send()
            .await?;
        check_response(response).await?;

        info!("Sent message to Telegram");
        Ok(())
    }
}

async fn check_response(response: Response) -> Result<(), NotifyError> {
    if response.status() == StatusCode::OK {
        return Ok(());
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Api { status, body })
}
