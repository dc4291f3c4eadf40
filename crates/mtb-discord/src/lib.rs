//! Discord adapter (HTTP interactions endpoint).
//!
//! This crate implements the `mtb-core` InteractionResponder over Discord's
//! interaction callbacks and webhook edits, and hosts the command handlers.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::{
    sync::{oneshot, Mutex},
    time::sleep,
};
use tracing::{debug, warn};

pub mod commands;
pub mod handlers;
pub mod router;
pub mod server;
pub mod wire;

use mtb_core::{
    errors::Error,
    messaging::{
        port::InteractionResponder,
        types::{Interaction, InteractionResponse},
    },
    Result,
};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// An edit can reach Discord before the deferred response it follows; the
/// original message then does not exist yet.
const WEBHOOK_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Answers interactions.
///
/// While the HTTP request that carried an interaction is still open, its
/// initial response is handed back through a oneshot channel and becomes the
/// HTTP response body. Once that window has passed, the response is sent
/// through the callback endpoint instead.
#[derive(Debug)]
pub struct DiscordResponder {
    http: reqwest::Client,
    api_base: String,
    application_id: String,
    pending: Mutex<HashMap<String, oneshot::Sender<Value>>>,
}

impl DiscordResponder {
    pub fn new(application_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("discord client build error: {e}")))?;
        Ok(Self {
            http,
            api_base: DISCORD_API_BASE.to_string(),
            application_id: application_id.into(),
            pending: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Claim the initial response of interaction `id` for an open HTTP request.
    pub async fn register(&self, id: &str) -> oneshot::Receiver<Value> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.to_string(), tx);
        rx
    }

    /// Give up on a claimed response; a later `respond` goes out over HTTP.
    pub async fn forget(&self, id: &str) {
        self.pending.lock().await.remove(id);
    }

    fn map_err(e: reqwest::Error) -> Error {
        Error::External(format!("discord error: {e}"))
    }

    /// Send with at most one retry: after `retry-after` on 429, and after a
    /// short pause on 404 when `retry_missing` is set.
    async fn with_retry(
        &self,
        retry_missing: bool,
        mut op: impl FnMut() -> reqwest::RequestBuilder,
    ) -> Result<()> {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            let resp = op().send().await.map_err(Self::map_err)?;
            let status = resp.status();
            if status.is_success() {
                return Ok(());
            }

            let wait = match status {
                reqwest::StatusCode::TOO_MANY_REQUESTS => Some(
                    resp.headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<f64>().ok())
                        .map(|secs| Duration::from_secs_f64(secs.clamp(0.0, 10.0)))
                        .unwrap_or(Duration::from_secs(1)),
                ),
                reqwest::StatusCode::NOT_FOUND if retry_missing => Some(WEBHOOK_RETRY_DELAY),
                _ => None,
            };
            if let Some(wait) = wait.filter(|_| attempts < MAX_RETRIES) {
                attempts += 1;
                debug!(%status, ?wait, "retrying discord request");
                sleep(wait).await;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "discord request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }
    }
}

#[async_trait]
impl InteractionResponder for DiscordResponder {
    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<()> {
        let body = wire::encode_response(&response);

        let waiting = self.pending.lock().await.remove(&interaction.id);
        if let Some(tx) = waiting {
            match tx.send(body) {
                Ok(()) => return Ok(()),
                Err(body) => {
                    debug!(interaction = %interaction.id, "request closed, using callback");
                    return self.send_callback(interaction, body).await;
                }
            }
        }
        self.send_callback(interaction, body).await
    }

    async fn edit_original(&self, interaction: &Interaction, content: &str) -> Result<()> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base, self.application_id, interaction.token
        );
        let payload = json!({ "content": content });
        self.with_retry(true, || self.http.patch(&url).json(&payload))
            .await
    }
}

impl DiscordResponder {
    async fn send_callback(&self, interaction: &Interaction, body: Value) -> Result<()> {
        let url = format!(
            "{}/interactions/{}/{}/callback",
            self.api_base, interaction.id, interaction.token
        );
        self.with_retry(false, || self.http.post(&url).json(&body))
            .await
            .inspect_err(|e| warn!(interaction = %interaction.id, "callback failed: {e}"))
    }
}
