//! CLI commands, one per `--mode`.
//!
//! [`run`] validates the resolved settings, builds the client and dispatches.
//! Output goes to the supplied writer so every mode can be driven from tests.

pub mod args;
pub mod chat;
pub mod server;
pub mod session;
pub mod settings;

use std::future::Future;
use std::io::Write;
use std::process::ExitCode;

use tokio::io::AsyncBufRead;

use crate::inference::LlamaClient;

pub use args::{Cli, Mode};
pub use settings::RunSettings;

/// Process outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    /// Health check failed or a required flag was missing.
    Failure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Failure => ExitCode::FAILURE,
        }
    }
}

/// Run the selected mode.
///
/// `input` feeds the interactive session; `interrupt` resolving ends it.
/// Transport failures on chat and completion are returned as errors.
pub async fn run<R, W, F>(
    settings: &RunSettings,
    input: R,
    out: &mut W,
    interrupt: F,
) -> anyhow::Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = ()>,
{
    let prompt = settings.prompt.as_deref().filter(|p| !p.is_empty());

    if let Some(message) = missing_prompt_error(settings, prompt) {
        writeln!(out, "{message}")?;
        return Ok(Exit::Failure);
    }

    let client = LlamaClient::new(settings.client.clone())?;
    tracing::debug!(mode = ?settings.mode, server = %client.config().base_url, "dispatching");

    match (settings.mode, prompt) {
        (Mode::Health, _) => server::health(&client, out).await,
        (Mode::Models, _) => server::models(&client, out).await,
        (Mode::Completion, Some(prompt)) => {
            server::completion(&client, settings, prompt, out).await
        }
        (Mode::Chat, _) if settings.interactive => {
            session::run_session(&client, settings, input, out, interrupt).await
        }
        (Mode::Chat, Some(prompt)) => chat::run_once(&client, settings, prompt, out).await,
        (Mode::Completion | Mode::Chat, None) => Ok(Exit::Failure),
    }
}

/// Usage error for modes that need `--prompt`, checked before any request.
fn missing_prompt_error(settings: &RunSettings, prompt: Option<&str>) -> Option<&'static str> {
    if prompt.is_some() {
        return None;
    }
    match settings.mode {
        Mode::Completion => Some("Error: --prompt is required for completion mode"),
        Mode::Chat if !settings.interactive => {
            Some("Error: --prompt is required for chat mode (or use --interactive)")
        }
        _ => None,
    }
}
