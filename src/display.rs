//! Text for menus and detail views. Everything here builds lines; writing
//! them out is left to the [`Prompt`](crate::prompt::Prompt).

use chrono::{DateTime, Local, Utc};

use crate::prompt::Tone;
use crate::types::{ChangeKind, Commit, FileChange, MergeRequest, Project, ReviewNote};

pub type Line = (Tone, String);

const RULE_WIDTH: usize = 80;
const SHOWN_FILES: usize = 20;
const SHOWN_NOTES: usize = 10;
const COMMIT_BODY_CHARS: usize = 100;
const MR_DESCRIPTION_CHARS: usize = 100;
const NOTE_BODY_CHARS: usize = 200;

fn format_age(dt: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

fn format_date(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// First `max` characters of `text`, with "..." when something was cut
pub fn truncate(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn rule() -> Line {
    (Tone::Muted, "─".repeat(RULE_WIDTH))
}

fn heading(title: &str) -> Vec<Line> {
    vec![
        (Tone::Plain, String::new()),
        (Tone::Heading, format!("=== {} ===", title)),
        rule(),
    ]
}

pub fn project_label(project: &Project) -> String {
    let mut label = format!(
        "{} ({})",
        project.name_with_namespace,
        format_date(project.last_activity_at)
    );
    if project.star_count > 0 {
        label.push_str(&format!(" ★ {}", project.star_count));
    }
    if project.forks_count > 0 {
        label.push_str(&format!(" ψ {}", project.forks_count));
    }
    label
}

pub fn mr_label(mr: &MergeRequest) -> String {
    let mut label = format!(
        "{} !{} {} by {} ({})",
        mr.state.icon(),
        mr.iid,
        mr.title,
        mr.author.name,
        format_age(mr.updated_at)
    );
    if mr.user_notes_count > 0 {
        label.push_str(&format!(" 💬 {}", mr.user_notes_count));
    }
    if mr.upvotes > 0 {
        label.push_str(&format!(" 👍 {}", mr.upvotes));
    }
    label
}

pub fn project_summary(project: &Project) -> Vec<Line> {
    let mut lines = vec![
        (Tone::Success, "[INFO] Selected project:".to_string()),
        (Tone::Info, format!("   {}", project.name_with_namespace)),
        (Tone::Muted, format!("   ID: {}", project.id)),
    ];
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push((Tone::Muted, format!("   {}", description)));
    }
    lines.push((
        Tone::Muted,
        format!(
            "   Last activity: {}",
            format_datetime(project.last_activity_at)
        ),
    ));
    if project.star_count > 0 {
        lines.push((Tone::Warning, format!("   Stars: {}", project.star_count)));
    }
    if project.forks_count > 0 {
        lines.push((Tone::Warning, format!("   Forks: {}", project.forks_count)));
    }
    lines
}

pub fn mr_summary(mr: &MergeRequest) -> Vec<Line> {
    let mut lines = vec![
        (Tone::Success, "[INFO] Selected merge request:".to_string()),
        (Tone::Info, format!("   !{} {}", mr.iid, mr.title)),
        (
            Tone::Muted,
            format!("   Author: {} (@{})", mr.author.name, mr.author.username),
        ),
        (Tone::Muted, format!("   Status: {}", mr.state)),
        (
            Tone::Muted,
            format!("   Source: {} → {}", mr.source_branch, mr.target_branch),
        ),
        (Tone::Muted, format!("   Created: {}", format_datetime(mr.created_at))),
        (Tone::Muted, format!("   Updated: {}", format_datetime(mr.updated_at))),
    ];
    if let Some(merged_at) = mr.merged_at {
        lines.push((Tone::Muted, format!("   Merged: {}", format_datetime(merged_at))));
    }
    if let Some(description) = mr.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push((
            Tone::Muted,
            format!(
                "   Description: {}",
                truncate(description, MR_DESCRIPTION_CHARS)
            ),
        ));
    }
    if !mr.web_url.is_empty() {
        lines.push((Tone::Info, format!("   URL: {}", mr.web_url)));
    }
    lines
}

pub fn commits(commits: &[Commit]) -> Vec<Line> {
    let mut lines = heading("Commit History");
    if commits.is_empty() {
        lines.push((Tone::Warning, "No commits found".to_string()));
        return lines;
    }

    for (index, commit) in commits.iter().enumerate() {
        lines.push((Tone::Plain, format!("{}. {}", index + 1, commit.title)));
        lines.push((
            Tone::Muted,
            format!(
                "   {} by {} ({})",
                commit.short_id,
                commit.author_name,
                format_date(commit.authored_date)
            ),
        ));

        let body = commit.message.replacen(&commit.title, "", 1);
        let body = body.trim();
        if !body.is_empty() {
            lines.push((
                Tone::Muted,
                format!("   {}", truncate(body, COMMIT_BODY_CHARS)),
            ));
        }
        lines.push((Tone::Plain, String::new()));
    }
    lines
}

fn change_tone(kind: ChangeKind) -> Tone {
    match kind {
        ChangeKind::Added => Tone::Success,
        ChangeKind::Deleted => Tone::Error,
        ChangeKind::Renamed => Tone::Info,
        ChangeKind::Modified => Tone::Warning,
    }
}

pub fn changes(changes: &[FileChange]) -> Vec<Line> {
    let mut lines = heading("File Changes Summary");
    if changes.is_empty() {
        lines.push((Tone::Warning, "No file changes found".to_string()));
        return lines;
    }

    let count = |kind: ChangeKind| changes.iter().filter(|c| c.kind() == kind).count();
    lines.push((
        Tone::Plain,
        format!(
            "+{} added ~{} modified -{} deleted →{} renamed",
            count(ChangeKind::Added),
            count(ChangeKind::Modified),
            count(ChangeKind::Deleted),
            count(ChangeKind::Renamed)
        ),
    ));
    lines.push((Tone::Plain, String::new()));

    for change in changes.iter().take(SHOWN_FILES) {
        let kind = change.kind();
        let path = if kind == ChangeKind::Renamed {
            format!("{} → {}", change.old_path, change.new_path)
        } else {
            change.new_path.clone()
        };
        lines.push((change_tone(kind), format!("{} {}", kind.symbol(), path)));
    }

    if changes.len() > SHOWN_FILES {
        lines.push((
            Tone::Muted,
            format!("... and {} more files", changes.len() - SHOWN_FILES),
        ));
    }
    lines
}

pub fn reviews(notes: &[ReviewNote]) -> Vec<Line> {
    let mut lines = heading("Code Reviews & Comments");
    if notes.is_empty() {
        lines.push((Tone::Warning, "No reviews or comments found".to_string()));
        return lines;
    }

    for (index, note) in notes.iter().take(SHOWN_NOTES).enumerate() {
        lines.push((
            Tone::Plain,
            format!(
                "{}. {} (@{}) - {}",
                index + 1,
                note.author.name,
                note.author.username,
                format_date(note.created_at)
            ),
        ));
        let body = note.body.replace('\n', " ");
        lines.push((Tone::Muted, format!("   {}", truncate(&body, NOTE_BODY_CHARS))));
        lines.push((Tone::Plain, String::new()));
    }

    if notes.len() > SHOWN_NOTES {
        lines.push((
            Tone::Muted,
            format!("... and {} more comments", notes.len() - SHOWN_NOTES),
        ));
    }
    lines
}

pub fn analysis(mr: &MergeRequest, text: &str) -> Vec<Line> {
    let banner = "=".repeat(RULE_WIDTH);
    vec![
        (Tone::Plain, String::new()),
        (Tone::Heading, banner.clone()),
        (Tone::Heading, format!("   AI ANALYSIS: !{} {}", mr.iid, mr.title)),
        (Tone::Heading, banner),
        (Tone::Plain, String::new()),
        (Tone::Plain, text.to_string()),
        (Tone::Plain, String::new()),
        rule(),
    ]
}

/// Steps to configure the analysis service
pub fn analysis_setup_hint(env_var: &str) -> Vec<Line> {
    vec![
        (Tone::Warning, "[SETUP] The analysis service is not configured".to_string()),
        (
            Tone::Muted,
            format!("1. Set {} to the analysis server base URL", env_var),
        ),
        (
            Tone::Muted,
            "2. Or add `endpoint = \"...\"` under [analysis] in config.toml".to_string(),
        ),
        (
            Tone::Muted,
            "3. Make sure the server itself has its API key configured".to_string(),
        ),
    ]
}
