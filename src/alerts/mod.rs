//! Outgoing messages: rendering, chunking and delivery.
//!
//! A rendered message is split into chunks no longer than the configured
//! limit and sent in order through a `Notifier`. Delivery stops at the
//! first failed chunk; nothing is retried.

pub mod render;
pub mod teams;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::types::CourtsideError;

pub use render::MessageRenderer;

/// Destination for rendered message chunks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// Posts each chunk as `{"content": ...}` to a chat webhook.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: SecretString,
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

impl WebhookNotifier {
    pub fn new(webhook_url: SecretString, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build webhook HTTP client")?;
        info!("Webhook notifications enabled");
        Ok(Self { client, webhook_url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.webhook_url.expose_secret())
            .json(&WebhookMessage { content: text })
            .send()
            .await
            .map_err(|e| CourtsideError::Delivery(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CourtsideError::Delivery(format!("HTTP {status}: {body}")).into());
        }
        debug!(chars = text.chars().count(), "Webhook message sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stdout
// ---------------------------------------------------------------------------

/// Prints chunks to stdout when no webhook is configured.
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chunking and delivery
// ---------------------------------------------------------------------------

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Breaks fall on line boundaries where possible; a single line longer
/// than the limit is split by characters. Concatenating the chunks gives
/// back `text`.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                if piece.len() == max_chars {
                    chunks.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Outcome of sending one message.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub chunks_total: usize,
    pub chunks_sent: usize,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.chunks_sent == self.chunks_total
    }
}

/// Send chunks in order, stopping at the first failure.
pub async fn deliver(notifier: &dyn Notifier, chunks: &[String]) -> DeliveryReport {
    let mut report = DeliveryReport {
        chunks_total: chunks.len(),
        chunks_sent: 0,
        error: None,
    };

    for (index, chunk) in chunks.iter().enumerate() {
        if let Err(e) = notifier.send(chunk).await {
            error!(chunk = index, total = chunks.len(), error = %e, "Message delivery failed");
            report.error = Some(e.to_string());
            return report;
        }
        report.chunks_sent += 1;
    }

    info!(chunks = report.chunks_sent, "Message delivered");
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
