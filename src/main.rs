mod analysis;
mod cache;
mod config;
mod desktop;
mod detail;
mod display;
mod error;
mod forge;
mod gitlab;
mod navigator;
mod paging;
mod prompt;
mod session;
mod term;
mod types;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::AnalysisClient;
use crate::config::{Config, ANALYSIS_ENDPOINT_ENV};
use crate::gitlab::GitLab;
use crate::prompt::{Prompt, Tone};
use crate::session::Session;
use crate::term::{Terminal, TerminalProgress};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load();
    term::banner();

    let task = tokio::spawn(async move {
        let mut terminal = Terminal::new();
        let credentials = session::ask_credentials(&mut terminal, &config).await?;

        let gitlab = GitLab::new(&credentials.base_url, &credentials.token)?;
        let analyzer = AnalysisClient::new(config.analysis_endpoint())?;
        if !analyzer.is_configured() {
            warn!("{} is not set, AI analysis is unavailable", ANALYSIS_ENDPOINT_ENV);
            terminal.show(
                Tone::Warning,
                &format!(
                    "[WARN] {} is not set. AI analysis will not be available.",
                    ANALYSIS_ENDPOINT_ENV
                ),
            );
        }

        let mut session = Session::new(
            Arc::new(gitlab),
            Arc::new(analyzer),
            terminal,
            Arc::new(TerminalProgress),
            credentials.token,
        );
        session.run().await
    });

    tokio::select! {
        joined = task => {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "session ended with an error");
                    eprintln!("Application error: {}", e);
                }
                Err(e) => {
                    error!(error = %e, "session task failed");
                    eprintln!("Application error: {}", e);
                }
            }
            term::goodbye();
        }
        _ = shutdown_signal() => {
            term::goodbye();
            std::process::exit(0);
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
