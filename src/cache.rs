use tracing::info;

use crate::error::Result;
use crate::forge::Forge;
use crate::paging::FetchObserver;
use crate::types::Project;

/// In-memory project list, fetched once per process and reused until an
/// explicit refresh. Search and filtering only ever read from it.
#[derive(Debug, Default)]
pub struct ProjectCache {
    projects: Vec<Project>,
}

impl ProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached projects, fetching them first if the cache is empty
    pub async fn get(
        &mut self,
        forge: &dyn Forge,
        observer: &dyn FetchObserver,
    ) -> Result<&[Project]> {
        if self.projects.is_empty() {
            self.refresh(forge, observer).await?;
        }
        Ok(&self.projects)
    }

    /// Refetch unconditionally. On failure the previous list is kept.
    pub async fn refresh(
        &mut self,
        forge: &dyn Forge,
        observer: &dyn FetchObserver,
    ) -> Result<&[Project]> {
        let projects = forge.list_projects(observer).await?;
        info!(count = projects.len(), "project cache replaced");
        self.projects = projects;
        Ok(&self.projects)
    }

    #[cfg(test)]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{project, FakeForge};

    #[tokio::test]
    async fn get_fetches_once_and_reuses() {
        let forge = FakeForge::with_projects(vec![project(1, "alpha"), project(2, "beta")]);
        let mut cache = ProjectCache::new();

        assert_eq!(cache.get(&forge, &()).await.unwrap().len(), 2);
        assert_eq!(cache.get(&forge, &()).await.unwrap().len(), 2);
        assert_eq!(forge.project_fetches(), 1);
    }

    #[tokio::test]
    async fn empty_result_is_refetched_on_next_get() {
        let forge = FakeForge::with_projects(vec![]);
        let mut cache = ProjectCache::new();

        assert!(cache.get(&forge, &()).await.unwrap().is_empty());
        assert!(cache.get(&forge, &()).await.unwrap().is_empty());
        assert_eq!(forge.project_fetches(), 2);
    }

    #[tokio::test]
    async fn refresh_replaces_collection() {
        let forge = FakeForge::with_projects(vec![project(1, "alpha")]);
        let mut cache = ProjectCache::new();
        cache.get(&forge, &()).await.unwrap();

        forge.set_projects(vec![project(1, "alpha"), project(3, "gamma")]);
        let refreshed = cache.refresh(&forge, &()).await.unwrap();

        assert_eq!(refreshed.len(), 2);
        assert_eq!(forge.project_fetches(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_collection() {
        let forge = FakeForge::with_projects(vec![project(1, "alpha")]);
        let mut cache = ProjectCache::new();
        cache.get(&forge, &()).await.unwrap();

        forge.fail_projects(true);
        assert!(cache.refresh(&forge, &()).await.is_err());
        assert_eq!(cache.projects().len(), 1);
        assert_eq!(cache.projects()[0].name, "alpha");
    }
}
