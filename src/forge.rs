use async_trait::async_trait;

use crate::error::Result;
use crate::paging::FetchObserver;
use crate::types::{Commit, FileChange, MergeRequest, MrStatus, Project, ReviewNote};

/// Read access to the code-hosting platform
#[async_trait]
pub trait Forge: Send + Sync {
    fn name(&self) -> &str;

    /// Every project the user is a member of, most recently active first
    async fn list_projects(&self, observer: &dyn FetchObserver) -> Result<Vec<Project>>;

    /// Every merge request of `project_id` in `status`, most recently updated first
    async fn list_merge_requests(
        &self,
        project_id: u64,
        status: MrStatus,
        observer: &dyn FetchObserver,
    ) -> Result<Vec<MergeRequest>>;

    async fn mr_commits(&self, project_id: u64, iid: u64) -> Result<Vec<Commit>>;
    async fn mr_changes(&self, project_id: u64, iid: u64) -> Result<Vec<FileChange>>;

    /// All notes, system notes included
    async fn mr_notes(&self, project_id: u64, iid: u64) -> Result<Vec<ReviewNote>>;
}
