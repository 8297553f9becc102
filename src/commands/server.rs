//! `health`, `models` and `completion` modes.

use std::io::Write;

use crate::inference::LlamaClient;

use super::settings::RunSettings;
use super::Exit;

/// Print the liveness verdict; failure exits non-zero.
pub async fn health<W: Write>(client: &LlamaClient, out: &mut W) -> anyhow::Result<Exit> {
    if client.health_check().await {
        writeln!(out, "✅ Server is healthy")?;
        Ok(Exit::Success)
    } else {
        writeln!(out, "❌ Server is not responding")?;
        Ok(Exit::Failure)
    }
}

/// Print the model list as pretty JSON. An unreachable server prints `[]`.
pub async fn models<W: Write>(client: &LlamaClient, out: &mut W) -> anyhow::Result<Exit> {
    let models = client.list_models().await;
    writeln!(out, "Available models:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&models)?)?;
    Ok(Exit::Success)
}

/// Run a raw prompt completion and print the generated text.
pub async fn completion<W: Write>(
    client: &LlamaClient,
    settings: &RunSettings,
    prompt: &str,
    out: &mut W,
) -> anyhow::Result<Exit> {
    let content = client.completion(prompt, settings.sampling).await?;
    writeln!(out, "{content}")?;
    Ok(Exit::Success)
}
