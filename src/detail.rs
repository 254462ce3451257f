//! Detail aggregation for a single merge request.
//!
//! A facet that cannot be fetched degrades to an empty list and is recorded in
//! [`DetailBundle::failed`]; one failing endpoint never hides the other two.

use tracing::{debug, warn};

use crate::error::{FinderError, Result};
use crate::forge::Forge;
use crate::types::{Commit, DetailBundle, Facet, FileChange, ReviewNote};

fn degrade<T>(
    facet: Facet,
    project_id: u64,
    iid: u64,
    result: Result<Vec<T>>,
) -> (Vec<T>, Option<Facet>) {
    match result {
        Ok(items) => {
            debug!(project_id, iid, %facet, count = items.len(), "facet fetched");
            (items, None)
        }
        Err(e) => {
            let err = FinderError::PartialFacetFailure {
                facet,
                cause: e.to_string(),
            };
            warn!(project_id, iid, error = %err, "facet unavailable, continuing without it");
            (Vec::new(), Some(facet))
        }
    }
}

pub async fn commits(
    forge: &dyn Forge,
    project_id: u64,
    iid: u64,
) -> (Vec<Commit>, Option<Facet>) {
    let result = forge.mr_commits(project_id, iid).await;
    degrade(Facet::Commits, project_id, iid, result)
}

pub async fn changes(
    forge: &dyn Forge,
    project_id: u64,
    iid: u64,
) -> (Vec<FileChange>, Option<Facet>) {
    let result = forge.mr_changes(project_id, iid).await;
    degrade(Facet::Changes, project_id, iid, result)
}

/// Human review notes only; system notes are dropped
pub async fn notes(
    forge: &dyn Forge,
    project_id: u64,
    iid: u64,
) -> (Vec<ReviewNote>, Option<Facet>) {
    let result = forge
        .mr_notes(project_id, iid)
        .await
        .map(|notes| notes.into_iter().filter(|n| !n.system).collect());
    degrade(Facet::Notes, project_id, iid, result)
}

/// Fetch all three facets concurrently. Always returns a bundle.
pub async fn aggregate(forge: &dyn Forge, project_id: u64, iid: u64) -> DetailBundle {
    let ((commits, c), (changes, ch), (notes, n)) = tokio::join!(
        commits(forge, project_id, iid),
        changes(forge, project_id, iid),
        notes(forge, project_id, iid),
    );

    DetailBundle {
        project_id,
        mr_iid: iid,
        commits,
        changes,
        notes,
        failed: [c, ch, n].into_iter().flatten().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{change, commit, note, project, FakeForge};

    fn forge() -> FakeForge {
        FakeForge::with_projects(vec![project(1, "app")])
    }

    #[tokio::test]
    async fn aggregate_collects_every_facet() {
        let forge = forge().with_details(
            Some(vec![commit("a1b2c3d4", "Add cache"), commit("e5f6a7b8", "Tests")]),
            Some(vec![change("src/cache.rs")]),
            Some(vec![note(1, "LGTM", false)]),
        );

        let bundle = aggregate(&forge, 1, 7).await;

        assert_eq!(bundle.project_id, 1);
        assert_eq!(bundle.mr_iid, 7);
        assert_eq!(bundle.commits.len(), 2);
        assert_eq!(bundle.changes.len(), 1);
        assert_eq!(bundle.notes.len(), 1);
        assert!(bundle.failed.is_empty());
    }

    #[tokio::test]
    async fn failing_facet_degrades_to_empty() {
        let forge = forge().with_details(
            None,
            Some(vec![change("a.rs"), change("b.rs"), change("c.rs")]),
            Some(vec![note(1, "nit", false), note(2, "ok", false)]),
        );

        let bundle = aggregate(&forge, 1, 7).await;

        assert!(bundle.commits.is_empty());
        assert_eq!(bundle.changes.len(), 3);
        assert_eq!(bundle.notes.len(), 2);
        assert_eq!(bundle.failed, vec![Facet::Commits]);
    }

    #[tokio::test]
    async fn system_notes_are_dropped() {
        let forge = forge().with_details(
            Some(vec![]),
            Some(vec![]),
            Some(vec![
                note(1, "added 1 commit", true),
                note(2, "Please rename this", false),
                note(3, "approved this merge request", true),
            ]),
        );

        let (notes, failed) = notes(&forge, 1, 7).await;

        assert_eq!(failed, None);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].body, "Please rename this");
    }

    #[tokio::test]
    async fn every_facet_failing_still_yields_bundle() {
        let forge = forge().with_details(None, None, None);

        let bundle = aggregate(&forge, 1, 7).await;

        assert!(bundle.commits.is_empty());
        assert!(bundle.changes.is_empty());
        assert!(bundle.notes.is_empty());
        assert_eq!(
            bundle.failed,
            vec![Facet::Commits, Facet::Changes, Facet::Notes]
        );
    }
}
