//! Slash command definitions and guild registration.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use tracing::info;

use mtb_core::{errors::Error, Result};

use crate::DISCORD_API_BASE;

const OPTION_STRING: u8 = 3;

fn string_option(name: &str, description: &str, required: bool, autocomplete: bool) -> Value {
    json!({
        "type": OPTION_STRING,
        "name": name,
        "description": description,
        "required": required,
        "autocomplete": autocomplete,
    })
}

/// Every command the bot serves, as Discord application command objects.
pub fn definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "tapsign",
            "description": "Display a short help message in the channel",
        }),
        json!({
            "name": "faq",
            "description": "Frequently Asked Questions",
            "options": [string_option("topic", "Select a FAQ topic", true, true)],
        }),
        json!({
            "name": "bug",
            "description": "Submit a bug report",
            "options": [string_option(
                "title",
                "A short, descriptive title for the bug report",
                true,
                false,
            )],
        }),
        json!({
            "name": "feature",
            "description": "Request a new feature",
            "options": [string_option(
                "title",
                "A short, descriptive title for the feature request",
                true,
                false,
            )],
        }),
        json!({
            "name": "changelog",
            "description": "View changes between two versions",
            "options": [
                string_option("base", "The base version (e.g. v2.6.0)", true, true),
                string_option("head", "The head version (e.g. v2.6.4)", true, true),
            ],
        }),
        json!({
            "name": "repo",
            "description": "Get the GitHub URL for a repository",
            "options": [string_option("name", "Repository name", false, false)],
        }),
    ]
}

/// Registers the command set in one guild.
#[derive(Debug)]
pub struct CommandRegistrar {
    http: reqwest::Client,
    api_base: String,
    application_id: String,
    guild_id: String,
}

impl CommandRegistrar {
    pub fn new(
        bot_token: &str,
        application_id: impl Into<String>,
        guild_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bot {}", bot_token.trim()))
            .map_err(|e| Error::Config(format!("invalid discord token header: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("discord client build error: {e}")))?;
        Ok(Self {
            http,
            api_base: DISCORD_API_BASE.to_string(),
            application_id: application_id.into(),
            guild_id: guild_id.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/applications/{}/guilds/{}/commands",
            self.api_base, self.application_id, self.guild_id
        )
    }

    async fn overwrite(&self, commands: &[Value]) -> Result<Vec<String>> {
        let resp = self
            .http
            .put(self.url())
            .json(commands)
            .send()
            .await
            .map_err(|e| Error::External(format!("discord command registration error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "discord command registration failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let registered: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("discord command registration decode: {e}")))?;
        Ok(registered
            .iter()
            .filter_map(|c| c.get("name").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    /// Replace the guild's commands with [`definitions`].
    pub async fn register_all(&self) -> Result<()> {
        let names = self.overwrite(&definitions()).await?;
        for name in &names {
            info!("Registered command: {name}");
        }
        Ok(())
    }

    pub async fn remove_all(&self) -> Result<()> {
        self.overwrite(&[]).await?;
        info!(guild = %self.guild_id, "removed registered commands");
        Ok(())
    }
}
