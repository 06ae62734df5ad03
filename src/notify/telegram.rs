// src/notify/telegram.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Notifier;
use crate::config::TelegramSecrets;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API `sendMessage` to a single chat. One attempt per message;
/// a failed job stays undelivered and is retried next cycle.
#[derive(Clone)]
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(secrets: &TelegramSecrets) -> Self {
        Self {
            api_base: TELEGRAM_API_BASE.to_string(),
            token: secrets.bot_token.clone(),
            chat_id: secrets.chat_id.clone(),
            client: Client::new(),
        }
    }

    /// Point at another Bot API server (local bot API, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, html: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        // reqwest errors include the URL, which contains the token
        let rsp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("telegram request failed: {}", e.without_url()))?;

        let status = rsp.status();
        let parsed: Option<ApiResponse> = rsp.json().await.ok();
        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiResponse { description, .. }) => Err(anyhow!(
                "telegram rejected message ({status}): {}",
                description.unwrap_or_else(|| "no description".into())
            )),
            None => Err(anyhow!("telegram returned unreadable response ({status})"))
                .context("telegram sendMessage"),
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
