// src/notify/mod.rs
pub mod format;
pub mod telegram;

use anyhow::Result;

pub use format::{format_job_message, truncate_description};
pub use telegram::TelegramNotifier;

/// Outbound message channel for new jobs.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one HTML-formatted message. `Err` means it was not delivered.
    async fn send(&self, html: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Dry-run notifier: logs the message instead of sending it.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, html: &str) -> Result<()> {
        tracing::info!(target: "notify", message = %html, "dry run, message not sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
