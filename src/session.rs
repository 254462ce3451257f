//! The interactive loop: project, status, merge request, details.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::analysis::{needs_setup_hint, Analyzer};
use crate::cache::ProjectCache;
use crate::config::{normalize_base_url, Config, Credentials, ANALYSIS_ENDPOINT_ENV};
use crate::desktop;
use crate::detail;
use crate::display::{self, Line};
use crate::error::Result;
use crate::forge::Forge;
use crate::navigator::{browse, ItemSource, Navigator, Outcome};
use crate::paging::FetchObserver;
use crate::prompt::{Prompt, Tone};
use crate::types::{Facet, MergeRequest, MrStatus, Project};

/// Ask for the GitLab URL and access token until both are given
pub async fn ask_credentials(prompt: &mut dyn Prompt, config: &Config) -> Result<Credentials> {
    prompt.show(Tone::Info, "GitLab configuration");
    prompt.show(Tone::Muted, "Please enter your GitLab information:");

    let default_url = config.gitlab.url.as_deref().filter(|u| !u.trim().is_empty());
    let url_message = match default_url {
        Some(url) => format!("GitLab URL [{}]:", url),
        None => "GitLab URL:".to_string(),
    };
    let base_url = loop {
        let input = prompt.input(&url_message).await?;
        match (input.is_empty(), default_url) {
            (false, _) => break normalize_base_url(&input),
            (true, Some(url)) => break normalize_base_url(url),
            (true, None) => prompt.show(Tone::Error, "GitLab URL is required"),
        }
    };

    let token = loop {
        let input = prompt.input("GitLab Personal Access Token:").await?;
        if !input.is_empty() {
            break input;
        }
        prompt.show(Tone::Error, "Personal access token is required");
    };

    Ok(Credentials { base_url, token })
}

struct ProjectSource<'a> {
    cache: &'a mut ProjectCache,
    forge: &'a dyn Forge,
    observer: &'a dyn FetchObserver,
}

#[async_trait]
impl ItemSource<Project> for ProjectSource<'_> {
    async fn reload(&mut self) -> Result<Vec<Project>> {
        Ok(self.cache.refresh(self.forge, self.observer).await?.to_vec())
    }
}

struct MrSource<'a> {
    forge: &'a dyn Forge,
    observer: &'a dyn FetchObserver,
    project_id: u64,
    status: MrStatus,
}

#[async_trait]
impl ItemSource<MergeRequest> for MrSource<'_> {
    async fn reload(&mut self) -> Result<Vec<MergeRequest>> {
        self.forge
            .list_merge_requests(self.project_id, self.status, self.observer)
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterCancel {
    AnotherProject,
    Retry,
    Exit,
}

impl AfterCancel {
    const ALL: [AfterCancel; 3] = [
        AfterCancel::AnotherProject,
        AfterCancel::Retry,
        AfterCancel::Exit,
    ];

    fn label(&self) -> &'static str {
        match self {
            AfterCancel::AnotherProject => "Select another project",
            AfterCancel::Retry => "Try selecting a merge request again for this project",
            AfterCancel::Exit => "Exit application",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailChoice {
    Analysis,
    All,
    Commits,
    Changes,
    Reviews,
    Browser,
    Done,
}

impl DetailChoice {
    const ALL: [DetailChoice; 7] = [
        DetailChoice::Analysis,
        DetailChoice::All,
        DetailChoice::Commits,
        DetailChoice::Changes,
        DetailChoice::Reviews,
        DetailChoice::Browser,
        DetailChoice::Done,
    ];

    fn label(&self) -> &'static str {
        match self {
            DetailChoice::Analysis => "AI analysis of this merge request",
            DetailChoice::All => "All information (commits + changes + reviews)",
            DetailChoice::Commits => "Commit history",
            DetailChoice::Changes => "File changes",
            DetailChoice::Reviews => "Code reviews & comments",
            DetailChoice::Browser => "Open in browser",
            DetailChoice::Done => "Done",
        }
    }
}

pub struct Session<P> {
    forge: Arc<dyn Forge>,
    analyzer: Arc<dyn Analyzer>,
    prompt: P,
    observer: Arc<dyn FetchObserver>,
    cache: ProjectCache,
    user_id: String,
}

impl<P: Prompt> Session<P> {
    pub fn new(
        forge: Arc<dyn Forge>,
        analyzer: Arc<dyn Analyzer>,
        prompt: P,
        observer: Arc<dyn FetchObserver>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            forge,
            analyzer,
            prompt,
            observer,
            cache: ProjectCache::new(),
            user_id: user_id.into(),
        }
    }

    fn show_lines(&mut self, lines: Vec<Line>) {
        for (tone, text) in lines {
            self.prompt.show(tone, &text);
        }
    }

    /// Run until the user chooses to exit. Only prompt I/O errors end the
    /// session early.
    pub async fn run(&mut self) -> Result<()> {
        info!(forge = self.forge.name(), "session started");
        let mut retry: Option<Project> = None;

        loop {
            let project = match retry.take() {
                Some(project) => project,
                None => match self.select_project().await? {
                    Some(project) => project,
                    None => {
                        if self
                            .prompt
                            .confirm("Do you want to exit the application?", false)
                            .await?
                        {
                            return Ok(());
                        }
                        continue;
                    }
                },
            };

            let Some(mr) = self.select_merge_request(&project).await? else {
                match self.after_cancel().await? {
                    AfterCancel::AnotherProject => {}
                    AfterCancel::Retry => retry = Some(project),
                    AfterCancel::Exit => return Ok(()),
                }
                continue;
            };

            self.show_lines(display::mr_summary(&mr));
            if self
                .prompt
                .confirm(
                    "Would you like to see detailed information (commits, changes, reviews)?",
                    true,
                )
                .await?
            {
                self.show_details(&project, &mr).await?;
            }

            if !self
                .prompt
                .confirm("Would you like to select another MR or project?", true)
                .await?
            {
                return Ok(());
            }
        }
    }

    async fn select_project(&mut self) -> Result<Option<Project>> {
        self.prompt.show(Tone::Plain, "");
        self.prompt.show(Tone::Heading, "Select a project");

        let projects = match self.cache.get(&*self.forge, &*self.observer).await {
            Ok(projects) => projects.to_vec(),
            Err(e) => {
                warn!(error = %e, "could not load projects");
                self.prompt.show(Tone::Error, &e.to_string());
                return Ok(None);
            }
        };
        if projects.is_empty() {
            self.prompt.show(Tone::Warning, "No projects found.");
            return Ok(None);
        }
        self.prompt.show(
            Tone::Success,
            &format!("[INFO] Found {} projects", projects.len()),
        );

        let mut nav = Navigator::new(projects, "Project list");
        let mut source = ProjectSource {
            cache: &mut self.cache,
            forge: &*self.forge,
            observer: &*self.observer,
        };
        match browse(&mut nav, &mut source, &mut self.prompt).await? {
            Outcome::Selected(project) => {
                self.show_lines(display::project_summary(&project));
                Ok(Some(project))
            }
            Outcome::Cancelled | Outcome::ChangeStatus => Ok(None),
        }
    }

    async fn select_status(&mut self) -> Result<Option<MrStatus>> {
        self.prompt.show(Tone::Plain, "");
        self.prompt.show(Tone::Heading, "Select merge request status");

        let mut choices: Vec<String> = MrStatus::ALL
            .iter()
            .map(|s| format!("{} - {}", s, s.description()))
            .collect();
        choices.push("Cancel".to_string());

        let index = self
            .prompt
            .select("Which merge requests would you like to view?", &choices)
            .await?;
        Ok(MrStatus::ALL.get(index).copied())
    }

    async fn select_merge_request(&mut self, project: &Project) -> Result<Option<MergeRequest>> {
        self.prompt.show(
            Tone::Success,
            &format!("[INFO] Selected project: {}", project.name_with_namespace),
        );

        loop {
            let Some(status) = self.select_status().await? else {
                return Ok(None);
            };

            let mrs = match self
                .forge
                .list_merge_requests(project.id, status, &*self.observer)
                .await
            {
                Ok(mrs) => mrs,
                Err(e) => {
                    warn!(project_id = project.id, %status, error = %e, "could not load merge requests");
                    self.prompt.show(Tone::Error, &e.to_string());
                    return Ok(None);
                }
            };

            if mrs.is_empty() {
                self.prompt.show(
                    Tone::Warning,
                    &format!("No {} found in this project.", status.noun()),
                );
                if self
                    .prompt
                    .confirm("Would you like to try a different status?", true)
                    .await?
                {
                    continue;
                }
                return Ok(None);
            }
            self.prompt.show(
                Tone::Success,
                &format!("[INFO] Found {} {}", mrs.len(), status.noun()),
            );

            let title = format!(
                "{} Merge Requests - {}",
                status, project.name_with_namespace
            );
            let mut nav = Navigator::new(mrs, title).with_status_filter(status);
            let mut source = MrSource {
                forge: &*self.forge,
                observer: &*self.observer,
                project_id: project.id,
                status,
            };
            match browse(&mut nav, &mut source, &mut self.prompt).await? {
                Outcome::Selected(mr) => return Ok(Some(mr)),
                Outcome::Cancelled => return Ok(None),
                Outcome::ChangeStatus => continue,
            }
        }
    }

    async fn after_cancel(&mut self) -> Result<AfterCancel> {
        let choices: Vec<String> = AfterCancel::ALL
            .iter()
            .map(|c| c.label().to_string())
            .collect();
        let index = self
            .prompt
            .select("What would you like to do?", &choices)
            .await?;
        Ok(AfterCancel::ALL
            .get(index)
            .copied()
            .unwrap_or(AfterCancel::AnotherProject))
    }

    fn report_failed(&mut self, failed: &[Facet]) {
        for facet in failed {
            self.prompt
                .show(Tone::Error, &format!("Failed to fetch {}", facet));
        }
    }

    async fn show_details(&mut self, project: &Project, mr: &MergeRequest) -> Result<()> {
        self.prompt.show(
            Tone::Success,
            &format!("[DETAILED INFO] MR !{} - {}", mr.iid, mr.title),
        );
        let choices: Vec<String> = DetailChoice::ALL
            .iter()
            .map(|c| c.label().to_string())
            .collect();

        loop {
            let index = self
                .prompt
                .select("What detailed information would you like to see?", &choices)
                .await?;
            let choice = DetailChoice::ALL
                .get(index)
                .copied()
                .unwrap_or(DetailChoice::Done);

            let forge = &*self.forge;
            match choice {
                DetailChoice::Analysis => self.run_analysis(project, mr).await?,
                DetailChoice::All => {
                    let bundle = detail::aggregate(forge, project.id, mr.iid).await;
                    self.report_failed(&bundle.failed);
                    self.show_lines(display::commits(&bundle.commits));
                    self.show_lines(display::changes(&bundle.changes));
                    self.show_lines(display::reviews(&bundle.notes));
                    self.prompt
                        .show(Tone::Info, "[INFO] Detailed information display complete");
                }
                DetailChoice::Commits => {
                    let (commits, failed) = detail::commits(forge, project.id, mr.iid).await;
                    self.report_failed(failed.as_slice());
                    self.show_lines(display::commits(&commits));
                }
                DetailChoice::Changes => {
                    let (changes, failed) = detail::changes(forge, project.id, mr.iid).await;
                    self.report_failed(failed.as_slice());
                    self.show_lines(display::changes(&changes));
                }
                DetailChoice::Reviews => {
                    let (notes, failed) = detail::notes(forge, project.id, mr.iid).await;
                    self.report_failed(failed.as_slice());
                    self.show_lines(display::reviews(&notes));
                }
                DetailChoice::Browser => match desktop::open_in_browser(&mr.web_url) {
                    Ok(()) => self
                        .prompt
                        .show(Tone::Info, &format!("Opened {}", mr.web_url)),
                    Err(e) => self
                        .prompt
                        .show(Tone::Error, &format!("Could not open browser: {}", e)),
                },
                DetailChoice::Done => return Ok(()),
            }
        }
    }

    async fn run_analysis(&mut self, project: &Project, mr: &MergeRequest) -> Result<()> {
        self.prompt.show(Tone::Plain, "");
        self.prompt.show(Tone::Heading, "=== AI-Powered MR Analysis ===");
        self.prompt
            .show(Tone::Muted, "Collecting merge request data...");

        let bundle = detail::aggregate(&*self.forge, project.id, mr.iid).await;
        if !bundle.failed.is_empty() {
            let missing: Vec<String> = bundle.failed.iter().map(Facet::to_string).collect();
            self.prompt.show(
                Tone::Warning,
                &format!("Continuing without {}", missing.join(", ")),
            );
        }

        self.prompt.show(Tone::Muted, "Generating analysis...");
        let analysis = match self
            .analyzer
            .analyze(&self.user_id, &bundle, mr, project)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(iid = mr.iid, error = %e, "analysis failed");
                self.prompt
                    .show(Tone::Error, "Failed to generate AI analysis");
                if needs_setup_hint(&e) {
                    self.show_lines(display::analysis_setup_hint(ANALYSIS_ENDPOINT_ENV));
                } else {
                    self.prompt.show(Tone::Error, &format!("Error: {}", e));
                }
                return Ok(());
            }
        };

        self.prompt.show(Tone::Success, "AI analysis completed!");
        self.show_lines(display::analysis(mr, &analysis));

        if self
            .prompt
            .confirm("Copy the analysis to the clipboard?", false)
            .await?
        {
            match desktop::copy_to_clipboard(&analysis) {
                Ok(()) => self.prompt.show(Tone::Success, "Copied to clipboard"),
                Err(e) => self.prompt.show(Tone::Error, &e.to_string()),
            }
        }
        Ok(())
    }
}
