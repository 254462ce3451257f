use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::info;

use crate::error::{FinderError, Result};
use crate::forge::Forge;
use crate::paging::{self, FetchObserver, PageInfo, PageSource, RawPage, PER_PAGE};
use crate::types::{Commit, FileChange, MergeRequest, MrStatus, Project, ReviewNote};

/// Per-request timeout for every GitLab call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

pub struct GitLab {
    client: Client,
    base_url: String,
}

impl GitLab {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(token)
            .map_err(|_| FinderError::Auth("access token contains invalid characters".into()))?;
        headers.insert("private-token", token);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FinderError::Api(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    /// GET `endpoint`; transport errors and non-2xx answers become `FetchFailed`
    async fn send(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response> {
        let response = self
            .client
            .get(self.api_url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|e| FinderError::fetch(endpoint, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(FinderError::fetch(
                endpoint,
                format!("GitLab API {}: {}", status, text),
            ));
        }

        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.send(endpoint, query)
            .await?
            .json()
            .await
            .map_err(|e| FinderError::fetch(endpoint, e))
    }
}

/// Read `x-total-pages` and `x-total`; absent or garbled values fall back to
/// one page and zero items.
pub fn parse_pagination(headers: &HeaderMap) -> PageInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    PageInfo {
        total_pages: header("x-total-pages")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1),
        total: header("x-total")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
    }
}

#[async_trait]
impl PageSource for GitLab {
    async fn fetch_page(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        page: u32,
    ) -> Result<RawPage> {
        let mut query = query.to_vec();
        query.push(("page", page.to_string()));
        query.push(("per_page", PER_PAGE.to_string()));
        let response = self.send(endpoint, &query).await?;

        let info = parse_pagination(response.headers());
        let items = response
            .json()
            .await
            .map_err(|e| FinderError::fetch(endpoint, e))?;

        Ok(RawPage { items, info })
    }
}

#[derive(Deserialize)]
struct GlChanges {
    #[serde(default)]
    changes: Vec<FileChange>,
}

fn merge_request_query(status: MrStatus) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("order_by", "updated_at".to_string()),
        ("sort", "desc".to_string()),
    ];
    if let Some(state) = status.as_api_str() {
        query.push(("state", state.to_string()));
    }
    query
}

#[async_trait]
impl Forge for GitLab {
    fn name(&self) -> &str {
        "GitLab"
    }

    async fn list_projects(&self, observer: &dyn FetchObserver) -> Result<Vec<Project>> {
        let query = [
            ("membership", "true".to_string()),
            ("order_by", "last_activity_at".to_string()),
            ("sort", "desc".to_string()),
        ];
        let projects: Vec<Project> =
            paging::fetch_all(self, "/projects", &query, "Fetching projects", observer).await?;
        info!(count = projects.len(), "fetched projects");
        Ok(projects)
    }

    async fn list_merge_requests(
        &self,
        project_id: u64,
        status: MrStatus,
        observer: &dyn FetchObserver,
    ) -> Result<Vec<MergeRequest>> {
        let endpoint = format!("/projects/{}/merge_requests", project_id);
        let label = format!("Fetching {}", status.noun());
        let query = merge_request_query(status);
        let mrs: Vec<MergeRequest> =
            paging::fetch_all(self, &endpoint, &query, &label, observer).await?;
        info!(project_id, status = %status, count = mrs.len(), "fetched merge requests");
        Ok(mrs)
    }

    async fn mr_commits(&self, project_id: u64, iid: u64) -> Result<Vec<Commit>> {
        let endpoint = format!("/projects/{}/merge_requests/{}/commits", project_id, iid);
        self.get_json(&endpoint, &[("per_page", PER_PAGE.to_string())])
            .await
    }

    async fn mr_changes(&self, project_id: u64, iid: u64) -> Result<Vec<FileChange>> {
        let endpoint = format!("/projects/{}/merge_requests/{}/changes", project_id, iid);
        let changes: GlChanges = self.get_json(&endpoint, &[]).await?;
        Ok(changes.changes)
    }

    async fn mr_notes(&self, project_id: u64, iid: u64) -> Result<Vec<ReviewNote>> {
        let endpoint = format!("/projects/{}/merge_requests/{}/notes", project_id, iid);
        let query = [
            ("per_page", PER_PAGE.to_string()),
            ("order_by", "created_at".to_string()),
            ("sort", "desc".to_string()),
        ];
        self.get_json(&endpoint, &query).await
    }
}
