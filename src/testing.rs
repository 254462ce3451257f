//! Fixtures and fakes for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Map;

use crate::analysis::Analyzer;
use crate::error::{FinderError, Result};
use crate::forge::Forge;
use crate::paging::FetchObserver;
use crate::prompt::{Prompt, Tone};
use crate::types::{
    Author, Commit, DetailBundle, FileChange, MergeRequest, MrState, MrStatus, Project, ReviewNote,
};

pub fn timestamp(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap()
}

pub fn project(id: u64, name: &str) -> Project {
    Project {
        id,
        name: name.to_string(),
        name_with_namespace: format!("Group / {}", name),
        description: None,
        web_url: format!("https://gitlab.example.com/group/{}", name),
        star_count: 0,
        forks_count: 0,
        last_activity_at: timestamp(1),
        extra: Map::new(),
    }
}

pub fn merge_request(iid: u64, title: &str) -> MergeRequest {
    MergeRequest {
        id: 1000 + iid,
        iid,
        title: title.to_string(),
        description: None,
        state: MrState::Opened,
        author: Author {
            name: "Grace Hopper".to_string(),
            username: "ghopper".to_string(),
        },
        source_branch: format!("feature/{}", iid),
        target_branch: "main".to_string(),
        web_url: format!("https://gitlab.example.com/group/app/-/merge_requests/{}", iid),
        created_at: timestamp(1),
        updated_at: timestamp(2),
        merged_at: None,
        closed_at: None,
        user_notes_count: 0,
        upvotes: 0,
        downvotes: 0,
        extra: Map::new(),
    }
}

pub fn commit(short_id: &str, title: &str) -> Commit {
    Commit {
        id: format!("{}0000000000", short_id),
        short_id: short_id.to_string(),
        title: title.to_string(),
        message: format!("{}\n", title),
        author_name: "Grace Hopper".to_string(),
        author_email: Some("grace@example.com".to_string()),
        authored_date: timestamp(1),
        extra: Map::new(),
    }
}

pub fn change(path: &str) -> FileChange {
    FileChange {
        old_path: path.to_string(),
        new_path: path.to_string(),
        new_file: false,
        deleted_file: false,
        renamed_file: false,
        diff: "@@ -1 +1 @@\n-old\n+new\n".to_string(),
        extra: Map::new(),
    }
}

pub fn note(id: u64, body: &str, system: bool) -> ReviewNote {
    ReviewNote {
        id,
        author: Author {
            name: "Alan Turing".to_string(),
            username: "aturing".to_string(),
        },
        body: body.to_string(),
        created_at: timestamp(3),
        system,
        extra: Map::new(),
    }
}

/// In-memory [`Forge`]. A facet set to `None` fails when fetched.
#[derive(Default)]
pub struct FakeForge {
    projects: Mutex<Vec<Project>>,
    project_fetches: AtomicUsize,
    fail_projects: AtomicBool,
    merge_requests: Mutex<HashMap<MrStatus, Vec<MergeRequest>>>,
    mr_queries: Mutex<Vec<(u64, MrStatus)>>,
    fail_merge_requests: AtomicBool,
    commits: Mutex<Option<Vec<Commit>>>,
    changes: Mutex<Option<Vec<FileChange>>>,
    notes: Mutex<Option<Vec<ReviewNote>>>,
}

impl FakeForge {
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: Mutex::new(projects),
            commits: Mutex::new(Some(Vec::new())),
            changes: Mutex::new(Some(Vec::new())),
            notes: Mutex::new(Some(Vec::new())),
            ..Default::default()
        }
    }

    pub fn with_merge_requests(self, status: MrStatus, mrs: Vec<MergeRequest>) -> Self {
        self.set_merge_requests(status, mrs);
        self
    }

    pub fn with_details(
        self,
        commits: Option<Vec<Commit>>,
        changes: Option<Vec<FileChange>>,
        notes: Option<Vec<ReviewNote>>,
    ) -> Self {
        *self.commits.lock().unwrap() = commits;
        *self.changes.lock().unwrap() = changes;
        *self.notes.lock().unwrap() = notes;
        self
    }

    pub fn set_projects(&self, projects: Vec<Project>) {
        *self.projects.lock().unwrap() = projects;
    }

    pub fn fail_projects(&self, fail: bool) {
        self.fail_projects.store(fail, Ordering::SeqCst);
    }

    pub fn project_fetches(&self) -> usize {
        self.project_fetches.load(Ordering::SeqCst)
    }

    pub fn set_merge_requests(&self, status: MrStatus, mrs: Vec<MergeRequest>) {
        self.merge_requests.lock().unwrap().insert(status, mrs);
    }

    pub fn fail_merge_requests(&self, fail: bool) {
        self.fail_merge_requests.store(fail, Ordering::SeqCst);
    }

    /// `(project_id, status)` of every merge request listing, in call order
    pub fn mr_queries(&self) -> Vec<(u64, MrStatus)> {
        self.mr_queries.lock().unwrap().clone()
    }
}

fn facet<T: Clone>(slot: &Mutex<Option<Vec<T>>>, endpoint: &str) -> Result<Vec<T>> {
    slot.lock()
        .unwrap()
        .clone()
        .ok_or_else(|| FinderError::fetch(endpoint, "GitLab API 500 Internal Server Error"))
}

#[async_trait]
impl Forge for FakeForge {
    fn name(&self) -> &str {
        "fake"
    }

    async fn list_projects(&self, observer: &dyn FetchObserver) -> Result<Vec<Project>> {
        self.project_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_projects.load(Ordering::SeqCst) {
            observer.finish();
            return Err(FinderError::fetch("/projects", "connection refused"));
        }
        let projects = self.projects.lock().unwrap().clone();
        observer.progress("Fetching projects", projects.len(), projects.len() as u64);
        observer.finish();
        Ok(projects)
    }

    async fn list_merge_requests(
        &self,
        project_id: u64,
        status: MrStatus,
        observer: &dyn FetchObserver,
    ) -> Result<Vec<MergeRequest>> {
        self.mr_queries.lock().unwrap().push((project_id, status));
        observer.finish();
        if self.fail_merge_requests.load(Ordering::SeqCst) {
            return Err(FinderError::fetch(
                &format!("/projects/{}/merge_requests", project_id),
                "connection reset",
            ));
        }
        Ok(self
            .merge_requests
            .lock()
            .unwrap()
            .get(&status)
            .cloned()
            .unwrap_or_default())
    }

    async fn mr_commits(&self, _project_id: u64, _iid: u64) -> Result<Vec<Commit>> {
        facet(&self.commits, "commits")
    }

    async fn mr_changes(&self, _project_id: u64, _iid: u64) -> Result<Vec<FileChange>> {
        facet(&self.changes, "changes")
    }

    async fn mr_notes(&self, _project_id: u64, _iid: u64) -> Result<Vec<ReviewNote>> {
        facet(&self.notes, "notes")
    }
}

/// [`Analyzer`] returning a canned reply, or a failure with the given status
pub struct FakeAnalyzer {
    reply: std::result::Result<String, (u16, String)>,
    calls: Mutex<Vec<(String, u64, usize)>>,
}

impl FakeAnalyzer {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            reply: Err((status, message.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(user_id, mr_iid, commit_count)` per call
    pub fn calls(&self) -> Vec<(String, u64, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        user_id: &str,
        bundle: &DetailBundle,
        mr: &MergeRequest,
        _project: &Project,
    ) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((user_id.to_string(), mr.iid, bundle.commits.len()));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err((status, message)) => Err(FinderError::AnalysisFailed {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Answer {
    /// Pick the first choice containing this text
    Choose(&'static str),
    Input(&'static str),
    Confirm(bool),
}

/// [`Prompt`] that replays a fixed list of answers. Running out of answers
/// behaves like a closed stdin.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Answer>,
    pub shown: Vec<(Tone, String)>,
    pub menus: Vec<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            ..Default::default()
        }
    }

    fn next(&mut self, message: &str) -> Result<Answer> {
        self.answers.pop_front().ok_or_else(|| {
            FinderError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("script exhausted at {:?}", message),
            ))
        })
    }

    /// Whether any shown line contains `needle`
    pub fn saw(&self, needle: &str) -> bool {
        self.shown.iter().any(|(_, text)| text.contains(needle))
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn select(&mut self, message: &str, choices: &[String]) -> Result<usize> {
        self.menus.push(choices.to_vec());
        match self.next(message)? {
            Answer::Choose(text) => Ok(choices
                .iter()
                .position(|c| c.contains(text))
                .unwrap_or_else(|| panic!("no choice containing {:?} in {:?}", text, choices))),
            other => panic!("expected a choice for {:?}, script had {:?}", message, other),
        }
    }

    async fn input(&mut self, message: &str) -> Result<String> {
        match self.next(message)? {
            Answer::Input(text) => Ok(text.trim().to_string()),
            other => panic!("expected input for {:?}, script had {:?}", message, other),
        }
    }

    async fn confirm(&mut self, message: &str, _default: bool) -> Result<bool> {
        match self.next(message)? {
            Answer::Confirm(yes) => Ok(yes),
            other => panic!("expected confirmation for {:?}, script had {:?}", message, other),
        }
    }

    fn show(&mut self, tone: Tone, text: &str) {
        self.shown.push((tone, text.to_string()));
    }
}
