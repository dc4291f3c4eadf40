//! GitHub adapter: REST v3 client for releases, comparisons, issues and
//! repositories, plus raw issue-template fetching.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Url,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

use mtb_core::{
    domain::RepoRef,
    errors::Error,
    modal::config::{TemplateUrl, RAW_CONTENT_BASE},
    ports::{
        CommitSummary, Comparison, CreatedIssue, GithubApi, NewIssue, Release, Repository,
        TemplateSource,
    },
    Result,
};

const USER_AGENT_VALUE: &str = "meshtastic-discord-bot";
const ERROR_BODY_MAX_CHARS: usize = 200;

#[derive(Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: Url,
    raw_base: String,
    repo_cache: RwLock<HashMap<RepoRef, Repository>>,
}

impl GithubClient {
    pub fn new(token: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| Error::Config(format!("invalid github token header: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let api_base = Url::parse(api_base)
            .map_err(|e| Error::Config(format!("invalid github api url '{api_base}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(Error::Config(format!("invalid github api url '{api_base}'")));
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("github client build error: {e}")))?;

        Ok(Self {
            http,
            api_base,
            raw_base: RAW_CONTENT_BASE.to_string(),
            repo_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Override where raw template files are fetched from.
    pub fn with_raw_base(mut self, raw_base: &str) -> Self {
        self.raw_base = raw_base.trim_end_matches('/').to_string();
        self
    }

    /// `{api_base}/repos/{owner}/{repo}/{segments..}`, each segment percent-encoded.
    fn repo_url(&self, repo: &RepoRef, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("invalid github api url '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, operation: &str, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::External(format!("github {operation} request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "github {operation} failed: {status} {}",
                body.chars().take(ERROR_BODY_MAX_CHARS).collect::<String>()
            )));
        }
        Ok(resp)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<T> {
        self.send(operation, req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| Error::External(format!("github {operation} decode error: {e}")))
    }
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(default)]
    total_commits: u32,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    commits: Vec<CompareCommit>,
}

#[derive(Deserialize)]
struct CompareCommit {
    sha: String,
    #[serde(default)]
    html_url: String,
    commit: CommitDetail,
    #[serde(default)]
    author: Option<GithubUser>,
}

#[derive(Deserialize)]
struct CommitDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    author: Option<GitAuthor>,
}

#[derive(Deserialize)]
struct GitAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct GithubUser {
    #[serde(default)]
    login: String,
}

impl From<CompareCommit> for CommitSummary {
    fn from(c: CompareCommit) -> Self {
        let author = c
            .author
            .map(|u| u.login)
            .filter(|l| !l.is_empty())
            .or_else(|| c.commit.author.map(|a| a.name).filter(|n| !n.is_empty()));
        Self {
            sha: c.sha,
            html_url: c.html_url,
            message: c.commit.message,
            author,
        }
    }
}

#[derive(Deserialize)]
struct IssueResponse {
    number: u64,
    html_url: String,
}

#[derive(Deserialize)]
struct RepositoryResponse {
    full_name: String,
    html_url: String,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn list_releases(&self, repo: &RepoRef, limit: u32) -> Result<Vec<Release>> {
        let req = self
            .http
            .get(self.repo_url(repo, &["releases"])?)
            .query(&[("per_page", limit.to_string())]);
        let releases: Vec<Release> = self.request_json("list releases", req).await?;
        debug!(repo = %repo, count = releases.len(), "listed releases");
        Ok(releases)
    }

    async fn compare(&self, repo: &RepoRef, base: &str, head: &str) -> Result<Comparison> {
        let range = format!("{base}...{head}");
        let req = self.http.get(self.repo_url(repo, &["compare", &range])?);
        let resp: CompareResponse = self.request_json("compare", req).await?;
        Ok(Comparison {
            total_commits: resp.total_commits,
            html_url: resp.html_url,
            commits: resp.commits.into_iter().map(CommitSummary::from).collect(),
        })
    }

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> Result<CreatedIssue> {
        info!(repo = %repo, title = %issue.title, labels = ?issue.labels, "creating issue");
        let mut payload = json!({ "title": issue.title, "body": issue.body });
        if !issue.labels.is_empty() {
            payload["labels"] = json!(issue.labels);
        }
        let req = self.http.post(self.repo_url(repo, &["issues"])?).json(&payload);
        let created: IssueResponse = self.request_json("create issue", req).await?;
        Ok(CreatedIssue {
            number: created.number,
            html_url: created.html_url,
        })
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository> {
        if let Some(cached) = self.repo_cache.read().await.get(repo) {
            return Ok(cached.clone());
        }

        let req = self.http.get(self.repo_url(repo, &[])?);
        let resp: RepositoryResponse = self.request_json("get repository", req).await?;
        let repository = Repository {
            full_name: resp.full_name,
            html_url: resp.html_url,
            description: resp.description,
        };

        self.repo_cache
            .write()
            .await
            .insert(repo.clone(), repository.clone());
        Ok(repository)
    }
}

#[async_trait]
impl TemplateSource for GithubClient {
    async fn fetch_template(&self, url: &TemplateUrl) -> Result<String> {
        let target = format!("{}/{}", self.raw_base, url.raw_path());
        debug!(url = %target, "fetching template");
        self.send("fetch template", self.http.get(target))
            .await?
            .text()
            .await
            .map_err(|e| Error::External(format!("github fetch template read error: {e}")))
    }
}
