use crate::error::{Error, Result};
use crate::models::{CreatedIssue, Issue, Paging, SearchParams, SearchResult, Worklog, WorklogPage};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Response, header};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const API_PREFIX: &str = "/rest/api/2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_WORKLOG_PAGES: u32 = 100;

#[derive(Debug, Clone)]
pub enum Auth {
    Basic { username: String, api_token: String },
    Bearer { token: String },
}

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub auth: Auth,
    /// 1リクエストあたりのタイムアウト
    pub timeout: Duration,
}

impl JiraConfig {
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let base_url = base_url.into();

        // Validate URL
        let _ = Url::parse(&base_url)
            .map_err(|_| Error::InvalidConfiguration("Invalid base URL".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 環境変数から設定を作成
    ///
    /// `JIRA_BEARER_TOKEN` があればBearer認証、なければ `JIRA_USER` と
    /// `JIRA_API_TOKEN` のBasic認証を使う。
    pub fn from_env() -> Result<Self> {
        use std::env;

        let base_url = env::var("JIRA_URL")
            .map_err(|_| Error::ConfigurationMissing("JIRA_URL not found in environment".to_string()))?;

        let auth = match env::var("JIRA_BEARER_TOKEN") {
            Ok(token) if !token.is_empty() => Auth::Bearer { token },
            _ => {
                let username = env::var("JIRA_USER")
                    .map_err(|_| Error::ConfigurationMissing("JIRA_USER not found in environment".to_string()))?;
                let api_token = env::var("JIRA_API_TOKEN").map_err(|_| {
                    Error::ConfigurationMissing("JIRA_API_TOKEN not found in environment".to_string())
                })?;
                Auth::Basic { username, api_token }
            }
        };

        let mut config = Self::new(base_url, auth)?;

        if let Ok(secs) = env::var("JIRA_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::InvalidConfiguration(format!("JIRA_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    pub(crate) client: Client,
    pub(crate) config: Arc<JiraConfig>,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // 認証ヘッダーを追加
        let auth_value = match &config.auth {
            Auth::Basic { username, api_token } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, api_token).as_bytes());
                format!("Basic {}", encoded)
            }
            Auth::Bearer { token } => format!("Bearer {}", token),
        };
        let mut auth_header = header::HeaderValue::from_str(&auth_value)
            .map_err(|_| Error::InvalidConfiguration("Invalid auth header".to_string()))?;
        auth_header.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_header);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::ApiError { status, message });
        }
        Ok(response)
    }

    pub(crate) async fn get<T>(&self, endpoint: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!(endpoint, "GET");
        let response = self.client.get(self.url(endpoint)).send().await?;
        let body = Self::ensure_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        tracing::debug!(endpoint, "POST");
        let response = self.client.post(self.url(endpoint)).json(body).send().await?;
        let body = Self::ensure_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// PUTを送信し、レスポンス本文をそのまま返す（Jiraの更新は通常204で空）
    pub(crate) async fn put<B>(&self, endpoint: &str, body: &B) -> Result<String>
    where
        B: serde::Serialize,
    {
        tracing::debug!(endpoint, "PUT");
        let response = self.client.put(self.url(endpoint)).json(body).send().await?;
        Ok(Self::ensure_success(response).await?.text().await?)
    }

    pub async fn search_issues(&self, jql: &str, params: SearchParams) -> Result<SearchResult> {
        let mut body = serde_json::json!({
            "jql": jql
        });

        // SearchParamsの値をリクエストボディにマージ
        if let Some(start_at) = params.start_at {
            body["startAt"] = start_at.into();
        }
        if let Some(max_results) = params.max_results {
            body["maxResults"] = max_results.into();
        }
        if let Some(fields) = params.fields {
            body["fields"] = fields.into();
        }

        self.post(&format!("{}/search", API_PREFIX), &body).await
    }

    /// JQLに一致する全Issueをページングしながら取得する
    ///
    /// `startAt` はページが報告する `maxResults` ずつ進め、累計取得数が
    /// `total` に達した時点で終了する。`paging.max_pages` を超えた場合は
    /// `Error::PaginationLimit` を返す。
    pub async fn search_all(&self, jql: &str, paging: &Paging) -> Result<Vec<Issue>> {
        let mut issues: Vec<Issue> = Vec::new();
        let mut start_at = 0u32;
        let mut pages = 0u32;
        let mut total = 0u32;

        loop {
            if pages >= paging.max_pages {
                return Err(Error::PaginationLimit {
                    pages,
                    retrieved: issues.len(),
                    total,
                });
            }

            let params = SearchParams::new()
                .start_at(start_at)
                .max_results(paging.page_size);
            let page = self.search_issues(jql, params).await?;
            pages += 1;
            total = page.total;

            let received = page.issues.len() as u32;
            tracing::debug!(start_at, received, total, "search page received");
            issues.extend(page.issues);

            if issues.len() >= total as usize || received == 0 {
                break;
            }

            let step = if page.max_results > 0 { page.max_results } else { received };
            start_at = start_at.saturating_add(step);
        }

        tracing::info!(count = issues.len(), pages, "search completed");
        Ok(issues)
    }

    pub async fn get_issue(&self, issue_key: &str) -> Result<Issue> {
        self.get(&format!("{}/issue/{}", API_PREFIX, urlencoding::encode(issue_key)))
            .await
    }

    /// Issueの全worklogを worklog エンドポイントから取得する
    pub async fn get_worklogs(&self, issue_key: &str) -> Result<Vec<Worklog>> {
        let mut worklogs = Vec::new();
        let mut start_at = 0u32;
        let mut total = 0u32;

        for _ in 0..MAX_WORKLOG_PAGES {
            let endpoint = format!(
                "{}/issue/{}/worklog?startAt={}",
                API_PREFIX,
                urlencoding::encode(issue_key),
                start_at
            );
            let page: WorklogPage = self.get(&endpoint).await?;
            let received = page.worklogs.len() as u32;
            total = page.total;
            worklogs.extend(page.worklogs);

            if worklogs.len() >= total as usize || received == 0 {
                return Ok(worklogs);
            }
            start_at = start_at.saturating_add(received);
        }

        Err(Error::PaginationLimit {
            pages: MAX_WORKLOG_PAGES,
            retrieved: worklogs.len(),
            total,
        })
    }

    pub async fn create_issue(&self, payload: &serde_json::Value) -> Result<CreatedIssue> {
        self.post(&format!("{}/issue", API_PREFIX), payload).await
    }

    pub async fn update_issue(&self, issue_key: &str, payload: &serde_json::Value) -> Result<()> {
        let endpoint = format!("{}/issue/{}", API_PREFIX, urlencoding::encode(issue_key));
        self.put(&endpoint, payload).await?;
        Ok(())
    }
}

/// レポートパイプラインが依存するIssue取得の抽象
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// JQL検索（全ページ）
    async fn search(&self, jql: &str, paging: &Paging) -> Result<Vec<Issue>>;

    /// 単一Issueの取得
    async fn fetch(&self, issue_key: &str) -> Result<Issue>;

    /// Issueの全worklog
    async fn fetch_worklogs(&self, issue_key: &str) -> Result<Vec<Worklog>>;
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn search(&self, jql: &str, paging: &Paging) -> Result<Vec<Issue>> {
        self.search_all(jql, paging).await
    }

    async fn fetch(&self, issue_key: &str) -> Result<Issue> {
        self.get_issue(issue_key).await
    }

    async fn fetch_worklogs(&self, issue_key: &str) -> Result<Vec<Worklog>> {
        self.get_worklogs(issue_key).await
    }
}
