use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::info;

use crate::config::ANALYSIS_ENDPOINT_ENV;
use crate::error::{FinderError, Result};
use crate::gitlab::REQUEST_TIMEOUT;
use crate::types::{Commit, DetailBundle, FileChange, MergeRequest, Project, ReviewNote};

/// Turns the details of a merge request into a written analysis
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        user_id: &str,
        bundle: &DetailBundle,
        mr: &MergeRequest,
        project: &Project,
    ) -> Result<String>;
}

/// Body of `POST <endpoint>/request`
#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    #[serde(rename = "userID")]
    pub user_id: &'a str,
    /// The MR iid, as a string
    pub payload: String,
    #[serde(rename = "gitLabMR")]
    pub merge_request: &'a MergeRequest,
    #[serde(rename = "gitLabProject")]
    pub project: &'a Project,
    #[serde(rename = "gitLabCommits")]
    pub commits: &'a [Commit],
    #[serde(rename = "gitLabChanges")]
    pub changes: &'a [FileChange],
    #[serde(rename = "gitLabNotes")]
    pub notes: &'a [ReviewNote],
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(
        user_id: &'a str,
        bundle: &'a DetailBundle,
        mr: &'a MergeRequest,
        project: &'a Project,
    ) -> Self {
        Self {
            user_id,
            payload: mr.iid.to_string(),
            merge_request: mr,
            project,
            commits: &bundle.commits,
            changes: &bundle.changes,
            notes: &bundle.notes,
        }
    }
}

/// HTTP client for the analysis queue server
pub struct AnalysisClient {
    client: Client,
    endpoint: Option<String>,
}

impl AnalysisClient {
    pub fn new(endpoint: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FinderError::Api(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    fn request_url(&self) -> Result<String> {
        self.endpoint
            .as_deref()
            .map(|base| format!("{}/request", base))
            .ok_or_else(|| FinderError::ConfigurationMissing(ANALYSIS_ENDPOINT_ENV.to_string()))
    }
}

/// Any 2xx is the analysis text, verbatim; everything else is a failure
pub fn interpret_response(status: StatusCode, body: String) -> Result<String> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(FinderError::AnalysisFailed {
            status: status.as_u16(),
            message: body,
        })
    }
}

/// Whether `err` should be followed by setup instructions
pub fn needs_setup_hint(err: &FinderError) -> bool {
    match err {
        FinderError::ConfigurationMissing(_) => true,
        FinderError::AnalysisFailed { message, .. } => message.contains("API_KEY"),
        _ => false,
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(
        &self,
        user_id: &str,
        bundle: &DetailBundle,
        mr: &MergeRequest,
        project: &Project,
    ) -> Result<String> {
        let url = self.request_url()?;
        let request = AnalysisRequest::new(user_id, bundle, mr, project);
        info!(
            project_id = project.id,
            iid = mr.iid,
            commits = bundle.commits.len(),
            changes = bundle.changes.len(),
            notes = bundle.notes.len(),
            "requesting analysis"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FinderError::Api(format!("analysis request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FinderError::Api(format!("failed to read analysis response: {}", e)))?;
        interpret_response(status, body)
    }
}
