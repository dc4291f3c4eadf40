use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChannelId, RepoRef},
    modal::{config::TemplateUrl, FieldSpec},
    Result,
};

/// A published release; only the tag is used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

/// Result of comparing two refs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub total_commits: u32,
    pub html_url: String,
    pub commits: Vec<CommitSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub sha: String,
    pub html_url: String,
    pub message: String,
    /// GitHub login, falling back to the git author name.
    pub author: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedIssue {
    pub number: u64,
    pub html_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// GitHub REST operations the bot needs.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn list_releases(&self, repo: &RepoRef, limit: u32) -> Result<Vec<Release>>;

    async fn compare(&self, repo: &RepoRef, base: &str, head: &str) -> Result<Comparison>;

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> Result<CreatedIssue>;

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository>;
}

/// Fetches the raw YAML of an issue-form template.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch_template(&self, url: &TemplateUrl) -> Result<String>;
}

/// A form ready to be shown for one command in one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedModal {
    pub command: String,
    pub title: String,
    pub fields: Vec<FieldSpec>,
    pub target: RepoRef,
}

/// Looks up the form configured for a command in a channel.
#[async_trait]
pub trait ModalProvider: Send + Sync {
    /// `Error::NotConfigured` when the channel has no form for `command`.
    async fn resolve(&self, command: &str, channel: &ChannelId) -> Result<ResolvedModal>;

    fn default_repository(&self) -> Option<RepoRef>;
}
