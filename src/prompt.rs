use async_trait::async_trait;

use crate::error::Result;

/// How a line of output should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Info,
    Success,
    Warning,
    Error,
    Muted,
    Plain,
}

/// Line-oriented interaction with the user
#[async_trait]
pub trait Prompt: Send {
    /// Ask the user to pick one of `choices`; returns its index
    async fn select(&mut self, message: &str, choices: &[String]) -> Result<usize>;

    /// Free-form input, trimmed
    async fn input(&mut self, message: &str) -> Result<String>;

    async fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;

    fn show(&mut self, tone: Tone, text: &str);
}
