//! Paginated selection menus.
//!
//! [`Navigator`] holds the browsing state (collection, active search, page) and
//! applies navigation actions to it without doing any I/O. [`browse`] drives a
//! navigator through a [`Prompt`] until the user picks an item or leaves.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::display;
use crate::error::{FinderError, Result};
use crate::prompt::{Prompt, Tone};
use crate::types::{MergeRequest, MrStatus, Project};

/// Items shown per menu page
pub const PAGE_SIZE: usize = 10;

/// Shortest accepted search term, after trimming
pub const MIN_SEARCH_LEN: usize = 2;

/// What the navigator needs to know about the things it lists
pub trait Selectable: Clone + Send + Sync {
    const NOUN: &'static str;
    const PLURAL: &'static str;
    const SEARCH_HINT: &'static str;

    fn id(&self) -> u64;
    fn label(&self) -> String;

    /// Case-insensitive match; `needle` is already lowercase
    fn matches(&self, needle: &str) -> bool;
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Selectable for Project {
    const NOUN: &'static str = "project";
    const PLURAL: &'static str = "projects";
    const SEARCH_HINT: &'static str = "project name, namespace, or description";

    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> String {
        display::project_label(self)
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.name, needle)
            || contains(&self.name_with_namespace, needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| contains(d, needle))
    }
}

impl Selectable for MergeRequest {
    const NOUN: &'static str = "merge request";
    const PLURAL: &'static str = "merge requests";
    const SEARCH_HINT: &'static str = "title, author, branch, or !number";

    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> String {
        display::mr_label(self)
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| contains(d, needle))
            || contains(&self.author.name, needle)
            || contains(&self.author.username, needle)
            || contains(&self.source_branch, needle)
            || contains(&self.target_branch, needle)
            || format!("!{}", self.iid) == needle
    }
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size)
}

/// Trim and check a search term
pub fn validate_search_term(raw: &str) -> Result<&str> {
    let term = raw.trim();
    if term.is_empty() {
        return Err(FinderError::Validation(
            "Search term cannot be empty".to_string(),
        ));
    }
    if term.chars().count() < MIN_SEARCH_LEN {
        return Err(FinderError::Validation(format!(
            "Search term must be at least {} characters",
            MIN_SEARCH_LEN
        )));
    }
    Ok(term)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    PrevPage,
    NextPage,
    GotoPage,
    Search,
    Refresh,
    BackToAll,
    ChangeStatus,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Matched(usize),
    NoMatches,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Selected(T),
    Cancelled,
    ChangeStatus,
}

/// One page of the collection being browsed
#[derive(Debug)]
pub struct PageView<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
struct Filter<T> {
    term: String,
    items: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct Navigator<T> {
    items: Vec<T>,
    filter: Option<Filter<T>>,
    page: usize,
    page_size: usize,
    title: String,
    status: Option<MrStatus>,
}

impl<T: Selectable> Navigator<T> {
    pub fn new(items: Vec<T>, title: impl Into<String>) -> Self {
        Self {
            items,
            filter: None,
            page: 1,
            page_size: PAGE_SIZE,
            title: title.into(),
            status: None,
        }
    }

    /// Adds the "change status filter" action
    pub fn with_status_filter(mut self, status: MrStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[cfg(test)]
    fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The collection currently browsed: search results, or everything
    pub fn visible(&self) -> &[T] {
        match &self.filter {
            Some(filter) => &filter.items,
            None => &self.items,
        }
    }

    /// The unfiltered collection
    #[cfg(test)]
    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.visible().len(), self.page_size)
    }

    pub fn filter_term(&self) -> Option<&str> {
        self.filter.as_ref().map(|f| f.term.as_str())
    }

    fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages().max(1))
    }

    pub fn page_view(&self) -> PageView<'_, T> {
        let visible = self.visible();
        let page = self.clamp(self.page);
        let start = ((page - 1) * self.page_size).min(visible.len());
        let end = (start + self.page_size).min(visible.len());
        PageView {
            items: &visible[start..end],
            page,
            total_pages: self.total_pages(),
            total: visible.len(),
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.clamp(self.page.saturating_sub(1));
    }

    pub fn next_page(&mut self) {
        self.page = self.clamp(self.page + 1);
    }

    pub fn goto_page(&mut self, page: usize) -> Result<()> {
        let total = self.total_pages();
        if page < 1 || page > total {
            return Err(FinderError::Validation(format!(
                "Page number must be between 1 and {}",
                total
            )));
        }
        self.page = page;
        Ok(())
    }

    /// Parse a typed page number and jump to it
    pub fn goto_input(&mut self, input: &str) -> Result<()> {
        let page = input.trim().parse::<usize>().map_err(|_| {
            FinderError::Validation(format!(
                "Page number must be between 1 and {}",
                self.total_pages()
            ))
        })?;
        self.goto_page(page)
    }

    /// Filter the full collection by `raw`. With no matches the search is
    /// dropped and browsing restarts on the full collection.
    pub fn search(&mut self, raw: &str) -> Result<SearchOutcome> {
        let term = validate_search_term(raw)?;
        let needle = term.to_lowercase();
        let matched: Vec<T> = self
            .items
            .iter()
            .filter(|item| item.matches(&needle))
            .cloned()
            .collect();

        self.page = 1;
        if matched.is_empty() {
            self.filter = None;
            return Ok(SearchOutcome::NoMatches);
        }

        let count = matched.len();
        self.filter = Some(Filter {
            term: term.to_string(),
            items: matched,
        });
        Ok(SearchOutcome::Matched(count))
    }

    pub fn back_to_all(&mut self) {
        self.filter = None;
        self.page = 1;
    }

    /// Swap in a freshly fetched collection
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.filter = None;
        self.page = 1;
    }

    /// Actions available on the current page, in menu order
    pub fn actions(&self) -> Vec<NavAction> {
        let total = self.total_pages();
        let page = self.clamp(self.page);
        let mut actions = Vec::new();

        if page > 1 {
            actions.push(NavAction::PrevPage);
        }
        if page < total {
            actions.push(NavAction::NextPage);
        }
        if total > 2 {
            actions.push(NavAction::GotoPage);
        }
        actions.push(NavAction::Search);
        if self.status.is_some() {
            actions.push(NavAction::ChangeStatus);
        }
        actions.push(NavAction::Refresh);
        if self.filter.is_some() {
            actions.push(NavAction::BackToAll);
        }
        actions.push(NavAction::Cancel);
        actions
    }

    pub fn action_label(&self, action: NavAction) -> String {
        let total = self.total_pages();
        let page = self.clamp(self.page);
        match action {
            NavAction::PrevPage => format!("Previous page ({}/{})", page - 1, total),
            NavAction::NextPage => format!("Next page ({}/{})", page + 1, total),
            NavAction::GotoPage => format!("Go to specific page (1-{})", total),
            NavAction::Search => format!("Search {}", T::PLURAL),
            NavAction::Refresh => format!("Refresh {} list", T::NOUN),
            NavAction::BackToAll => format!("Back to all {}", T::PLURAL),
            NavAction::ChangeStatus => "Change status filter".to_string(),
            NavAction::Cancel if self.status.is_some() => "Back to project selection".to_string(),
            NavAction::Cancel => "Cancel".to_string(),
        }
    }

    pub fn header(&self) -> String {
        let view = self.page_view();
        let position = format!(
            "Page {}/{} ({} total)",
            view.page,
            view.total_pages.max(1),
            view.total
        );
        match self.filter_term() {
            Some(term) => format!("Search results for \"{}\" - {}", term, position),
            None => format!("{} - {}", self.title, position),
        }
    }
}

/// Where a navigator gets a fresh collection on "refresh"
#[async_trait]
pub trait ItemSource<T: Send>: Send {
    async fn reload(&mut self) -> Result<Vec<T>>;
}

/// Run the selection menu until an item is chosen or the user leaves.
///
/// Validation problems re-prompt in place and a failed refresh keeps the
/// current collection; only prompt I/O errors are returned.
pub async fn browse<T, S>(
    nav: &mut Navigator<T>,
    source: &mut S,
    prompt: &mut dyn Prompt,
) -> Result<Outcome<T>>
where
    T: Selectable,
    S: ItemSource<T> + ?Sized,
{
    loop {
        prompt.show(Tone::Plain, "");
        prompt.show(Tone::Heading, &nav.header());

        let view = nav.page_view();
        let item_count = view.items.len();
        let actions = nav.actions();
        let mut choices: Vec<String> = view.items.iter().map(Selectable::label).collect();
        choices.extend(actions.iter().map(|action| nav.action_label(*action)));

        let message = format!("Select a {} or choose an option:", T::NOUN);
        let choice = prompt.select(&message, &choices).await?;

        if choice < item_count {
            let item = view.items[choice].clone();
            debug!(kind = T::NOUN, id = item.id(), "selected");
            return Ok(Outcome::Selected(item));
        }
        let Some(action) = actions.get(choice - item_count).copied() else {
            continue;
        };

        match action {
            NavAction::PrevPage => nav.prev_page(),
            NavAction::NextPage => nav.next_page(),
            NavAction::GotoPage => loop {
                let message = format!("Enter page number (1-{}):", nav.total_pages());
                let input = prompt.input(&message).await?;
                match nav.goto_input(&input) {
                    Ok(()) => break,
                    Err(FinderError::Validation(msg)) => prompt.show(Tone::Error, &msg),
                    Err(e) => return Err(e),
                }
            },
            NavAction::Search => loop {
                let message = format!("Enter search term ({}):", T::SEARCH_HINT);
                let input = prompt.input(&message).await?;
                match nav.search(&input) {
                    Ok(SearchOutcome::Matched(count)) => {
                        prompt.show(
                            Tone::Success,
                            &format!(
                                "[SEARCH] Found {} {} matching \"{}\"",
                                count,
                                T::PLURAL,
                                input.trim()
                            ),
                        );
                        break;
                    }
                    Ok(SearchOutcome::NoMatches) => {
                        prompt.show(
                            Tone::Warning,
                            &format!(
                                "[SEARCH] No results found. Returning to all {}.",
                                T::PLURAL
                            ),
                        );
                        break;
                    }
                    Err(FinderError::Validation(msg)) => prompt.show(Tone::Error, &msg),
                    Err(e) => return Err(e),
                }
            },
            NavAction::Refresh => match source.reload().await {
                Ok(items) => {
                    let count = items.len();
                    nav.replace_items(items);
                    prompt.show(
                        Tone::Success,
                        &format!("[REFRESH] {} list updated ({} total)", T::NOUN, count),
                    );
                }
                Err(e) => {
                    warn!(error = %e, "refresh failed, keeping current list");
                    prompt.show(
                        Tone::Error,
                        &format!("[REFRESH] {}. Keeping the current list.", e),
                    );
                }
            },
            NavAction::BackToAll => nav.back_to_all(),
            NavAction::ChangeStatus => return Ok(Outcome::ChangeStatus),
            NavAction::Cancel => return Ok(Outcome::Cancelled),
        }
    }
}
