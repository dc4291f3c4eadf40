//! Modal configuration: which form a command shows in which channel.
//!
//! Fields come either inline from the YAML file or from a GitHub issue-form
//! template referenced by URL, fetched on demand through a [`TemplateSource`].

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{
    domain::{ChannelId, RepoRef},
    errors::Error,
    ports::{ModalProvider, ResolvedModal, TemplateSource},
    Result,
};

use super::{FieldSpec, InputStyle};

/// Top-level modal YAML document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModalsConfig {
    #[serde(rename = "config", default)]
    pub modals: Vec<ModalConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ModalConfig {
    pub command: String,
    #[serde(rename = "template_url", default)]
    pub template_url_raw: Option<String>,
    #[serde(rename = "channel_id", default)]
    pub channel_ids: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    #[serde(skip)]
    pub template_url: Option<TemplateUrl>,
}

impl ModalsConfig {
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Read and parse the YAML file, resolving template URLs.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut cfg = Self::from_yaml(&text).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.parse_template_urls()?;
        Ok(cfg)
    }

    pub fn parse_template_urls(&mut self) -> Result<()> {
        for modal in &mut self.modals {
            if let Some(raw) = modal.template_url_raw.as_deref().filter(|s| !s.is_empty()) {
                let url = TemplateUrl::parse(raw).map_err(|e| {
                    Error::Config(format!(
                        "failed to parse template URL for command {}: {e}",
                        modal.command
                    ))
                })?;
                modal.template_url = Some(url);
            }
        }
        Ok(())
    }

    /// First entry for `command` that lists `channel`.
    pub fn find(&self, command: &str, channel: &ChannelId) -> Option<&ModalConfig> {
        self.modals
            .iter()
            .find(|m| m.command == command && m.channel_ids.iter().any(|c| *c == channel.0))
    }

    /// Repository of the first entry that names one, explicitly or via its template.
    pub fn first_repository(&self) -> Option<RepoRef> {
        self.modals.iter().find_map(ModalConfig::explicit_repository)
    }
}

impl ModalConfig {
    fn explicit_repository(&self) -> Option<RepoRef> {
        self.repository
            .as_deref()
            .and_then(RepoRef::parse)
            .or_else(|| self.template_url.as_ref().map(TemplateUrl::repo_ref))
    }
}

pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// A parsed `github.com/{owner}/{repo}/{path}` template URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateUrl {
    original: String,
    owner: String,
    repo: String,
    path: String,
}

impl TemplateUrl {
    /// Accepts `https://github.com/o/r/blob/main/x.yml`, with or without the
    /// scheme and host.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::Template("template URL cannot be empty".to_string()));
        }

        let url = raw.strip_prefix("https://").unwrap_or(raw);
        let url = url.strip_prefix("http://").unwrap_or(url);
        let url = url.strip_prefix("github.com/").unwrap_or(url);

        let parts: Vec<&str> = url.split('/').collect();
        if parts.len() < 2 {
            return Err(Error::Template(format!("invalid GitHub URL format: {raw}")));
        }

        Ok(Self {
            original: raw.to_string(),
            owner: parts[0].to_string(),
            repo: parts[1].to_string(),
            path: parts[2..].join("/"),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner, &self.repo)
    }

    /// Raw content URL; the first `blob/` segment is dropped.
    pub fn raw_url(&self) -> String {
        format!("{RAW_CONTENT_BASE}/{}", self.raw_path())
    }

    /// `{owner}/{repo}/{ref}/{file}` relative to the raw content host.
    pub fn raw_path(&self) -> String {
        let path = self.path.replacen("blob/", "", 1);
        format!("{}/{}/{path}", self.owner, self.repo)
    }
}

impl std::fmt::Display for TemplateUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original)
    }
}

/// GitHub issue-form template (`.github/ISSUE_TEMPLATE/*.yml`).
#[derive(Clone, Debug, Deserialize)]
pub struct IssueTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Vec<TemplateField>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TemplateField {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: FieldAttributes,
    #[serde(default)]
    pub validations: FieldValidations,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FieldAttributes {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub options: Vec<TemplateOption>,
    #[serde(default)]
    pub multiple: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FieldValidations {
    #[serde(default)]
    pub required: bool,
}

/// Dropdown options are bare strings; checkbox options are `{label, required}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOption")]
pub struct TemplateOption {
    pub label: String,
    pub required: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Detailed {
        label: String,
        #[serde(default)]
        required: bool,
    },
}

impl From<RawOption> for TemplateOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Plain(label) => Self {
                label,
                required: false,
            },
            RawOption::Detailed { label, required } => Self { label, required },
        }
    }
}

impl IssueTemplate {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| Error::Template(format!("failed to parse template YAML: {e}")))
    }

    pub fn to_field_specs(&self) -> Vec<FieldSpec> {
        self.body
            .iter()
            .enumerate()
            .filter_map(|(idx, f)| f.to_field_spec(idx))
            .collect()
    }
}

impl TemplateField {
    /// `markdown` and `checkboxes` bodies are informational.
    pub fn is_interactive(&self) -> bool {
        self.kind != "markdown" && self.kind != "checkboxes"
    }

    /// Convert to a form field; `None` for non-interactive bodies.
    pub fn to_field_spec(&self, index: usize) -> Option<FieldSpec> {
        if !self.is_interactive() {
            return None;
        }

        let (style, min_length, max_length) = match self.kind.as_str() {
            "textarea" => (InputStyle::Paragraph, Some(1), Some(4000)),
            "input" => (InputStyle::Short, Some(1), Some(100)),
            _ => (InputStyle::Short, None, None),
        };

        let id = if self.id.is_empty() {
            format!("field_{index}")
        } else {
            self.id.clone()
        };

        Some(FieldSpec {
            id,
            label: self.attributes.label.clone(),
            style,
            placeholder: self.attributes.placeholder.clone(),
            required: self.validations.required,
            min_length,
            max_length,
        })
    }
}

/// [`ModalProvider`] backed by the YAML modal config.
pub struct ModalRegistry {
    config: ModalsConfig,
    templates: Arc<dyn TemplateSource>,
    default_repository: Option<RepoRef>,
}

impl ModalRegistry {
    /// `default_repository` overrides the repository derived from the config.
    pub fn new(
        config: ModalsConfig,
        templates: Arc<dyn TemplateSource>,
        default_repository: Option<RepoRef>,
    ) -> Self {
        let default_repository = default_repository.or_else(|| config.first_repository());
        Self {
            config,
            templates,
            default_repository,
        }
    }

    pub fn config(&self) -> &ModalsConfig {
        &self.config
    }
}

#[async_trait]
impl ModalProvider for ModalRegistry {
    async fn resolve(&self, command: &str, channel: &ChannelId) -> Result<ResolvedModal> {
        let modal = self
            .config
            .find(command, channel)
            .ok_or_else(|| Error::NotConfigured {
                command: command.to_string(),
                channel: channel.0.clone(),
            })?;

        let fields = match &modal.template_url {
            Some(url) => {
                debug!(command, template = %url, "fetching issue template");
                let text = self.templates.fetch_template(url).await?;
                IssueTemplate::from_yaml(&text)?.to_field_specs()
            }
            None => modal.fields.clone(),
        };

        let target = modal
            .explicit_repository()
            .or_else(|| self.default_repository.clone())
            .ok_or_else(|| {
                Error::Config(format!("no repository configured for command '{command}'"))
            })?;

        Ok(ResolvedModal {
            command: command.to_string(),
            title: modal.title.clone(),
            fields,
            target,
        })
    }

    fn default_repository(&self) -> Option<RepoRef> {
        self.default_repository.clone()
    }
}
