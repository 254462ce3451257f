use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// GitLab project, as returned by `GET /projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub name_with_namespace: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub star_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    pub last_activity_at: DateTime<Utc>,
    /// Fields not modelled above, forwarded unchanged to the analysis service
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MrState {
    Opened,
    Closed,
    Merged,
    Locked,
    #[serde(other)]
    Unknown,
}

impl MrState {
    pub fn icon(&self) -> &'static str {
        match self {
            MrState::Opened => "●",
            MrState::Merged => "✓",
            MrState::Closed => "✗",
            MrState::Locked | MrState::Unknown => "○",
        }
    }
}

impl fmt::Display for MrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MrState::Opened => write!(f, "opened"),
            MrState::Closed => write!(f, "closed"),
            MrState::Merged => write!(f, "merged"),
            MrState::Locked => write!(f, "locked"),
            MrState::Unknown => write!(f, "unknown"),
        }
    }
}

/// GitLab merge request. `iid` is the number shown in the UI (`!42`) and is
/// only unique within its project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: MrState,
    pub author: Author,
    pub source_branch: String,
    pub target_branch: String,
    #[serde(default)]
    pub web_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_notes_count: u32,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lifecycle filter used when listing merge requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MrStatus {
    Opened,
    Closed,
    Merged,
    All,
}

impl MrStatus {
    pub const ALL: [MrStatus; 4] = [
        MrStatus::Opened,
        MrStatus::Closed,
        MrStatus::Merged,
        MrStatus::All,
    ];

    /// Value of the `state` query parameter; `All` sends none.
    pub fn as_api_str(&self) -> Option<&'static str> {
        match self {
            MrStatus::Opened => Some("opened"),
            MrStatus::Closed => Some("closed"),
            MrStatus::Merged => Some("merged"),
            MrStatus::All => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MrStatus::Opened => "Active merge requests",
            MrStatus::Closed => "Closed without merging",
            MrStatus::Merged => "Successfully merged",
            MrStatus::All => "All merge requests",
        }
    }

    /// "opened merge requests", "merge requests" for `All`
    pub fn noun(&self) -> String {
        match self.as_api_str() {
            Some(state) => format!("{} merge requests", state),
            None => "merge requests".to_string(),
        }
    }
}

impl fmt::Display for MrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MrStatus::Opened => write!(f, "Opened"),
            MrStatus::Closed => write!(f, "Closed"),
            MrStatus::Merged => write!(f, "Merged"),
            MrStatus::All => write!(f, "All"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub author_name: String,
    #[serde(default)]
    pub author_email: Option<String>,
    pub authored_date: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Deleted,
    Renamed,
    Modified,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Added => "+",
            ChangeKind::Deleted => "-",
            ChangeKind::Renamed => "→",
            ChangeKind::Modified => "~",
        }
    }
}

/// One file of `GET /merge_requests/:iid/changes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub old_path: String,
    pub new_path: String,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub diff: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileChange {
    pub fn kind(&self) -> ChangeKind {
        if self.new_file {
            ChangeKind::Added
        } else if self.deleted_file {
            ChangeKind::Deleted
        } else if self.renamed_file {
            ChangeKind::Renamed
        } else {
            ChangeKind::Modified
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewNote {
    pub id: u64,
    pub author: Author,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub system: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The three detail categories of a merge request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Commits,
    Changes,
    Notes,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Commits => write!(f, "commits"),
            Facet::Changes => write!(f, "changes"),
            Facet::Notes => write!(f, "notes"),
        }
    }
}

/// Commits, changes and human review notes of one merge request.
/// Facets whose fetch failed are empty and listed in `failed`.
#[derive(Debug, Clone, Default)]
pub struct DetailBundle {
    pub project_id: u64,
    pub mr_iid: u64,
    pub commits: Vec<Commit>,
    pub changes: Vec<FileChange>,
    pub notes: Vec<ReviewNote>,
    pub failed: Vec<Facet>,
}
