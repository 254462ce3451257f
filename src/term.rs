use std::io::{self, Write};

use async_trait::async_trait;
use crossterm::{
    cursor::MoveToColumn,
    execute,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::{FinderError, Result};
use crate::paging::FetchObserver;
use crate::prompt::{Prompt, Tone};

/// [`Prompt`] on stdin/stdout, one numbered menu per question
pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read_line(&mut self, message: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{} ", message.cyan().bold())?;
        stdout.flush()?;

        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(FinderError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed",
            ))),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

/// 1-based menu number to index
fn parse_choice(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

fn parse_confirm(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl Prompt for Terminal {
    async fn select(&mut self, message: &str, choices: &[String]) -> Result<usize> {
        if choices.is_empty() {
            return Err(FinderError::Validation("Nothing to choose from".to_string()));
        }
        let width = choices.len().to_string().len();
        for (index, choice) in choices.iter().enumerate() {
            println!(
                "  {} {}",
                format!("{:>width$})", index + 1, width = width).dark_grey(),
                choice
            );
        }

        loop {
            let input = self.read_line(&format!("{} [1-{}]", message, choices.len())).await?;
            match parse_choice(&input, choices.len()) {
                Some(index) => return Ok(index),
                None => self.show(
                    Tone::Error,
                    &format!("Please enter a number between 1 and {}", choices.len()),
                ),
            }
        }
    }

    async fn input(&mut self, message: &str) -> Result<String> {
        self.read_line(message).await
    }

    async fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        loop {
            let input = self.read_line(&format!("{} {}", message, hint)).await?;
            match parse_confirm(&input, default) {
                Some(answer) => return Ok(answer),
                None => self.show(Tone::Error, "Please answer y or n"),
            }
        }
    }

    fn show(&mut self, tone: Tone, text: &str) {
        match tone {
            Tone::Heading => println!("{}", text.blue().bold()),
            Tone::Info => println!("{}", text.cyan()),
            Tone::Success => println!("{}", text.green()),
            Tone::Warning => println!("{}", text.yellow()),
            Tone::Error => println!("{}", text.red()),
            Tone::Muted => println!("{}", text.dark_grey()),
            Tone::Plain => println!("{}", text),
        }
    }
}

/// Single-line fetch progress on stderr
#[derive(Debug, Default)]
pub struct TerminalProgress;

impl FetchObserver for TerminalProgress {
    fn progress(&self, label: &str, fetched: usize, total: u64) {
        let line = if total > 0 {
            format!("{}... ({}/{})", label, fetched, total)
        } else {
            format!("{}... ({})", label, fetched)
        };
        let _ = execute!(
            io::stderr(),
            Clear(ClearType::CurrentLine),
            MoveToColumn(0),
            Print(line.dark_grey())
        );
    }

    fn finish(&self) {
        let _ = execute!(io::stderr(), Clear(ClearType::CurrentLine), MoveToColumn(0));
    }
}

pub fn banner() {
    println!();
    println!("{}", "GitLab Merge Request Finder".blue().bold());
    println!("{}", "Browse projects and merge requests, and ask for an AI review.".dark_grey());
    println!("{}", "─".repeat(60).dark_grey());
}

pub fn goodbye() {
    println!();
    println!("{}", "Goodbye!".green());
}
