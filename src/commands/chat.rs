//! Single-shot chat and the shared stream printer.

use std::io::Write;

use futures::StreamExt;

use crate::inference::{ChatReply, Conversation, LlamaClient, TokenStream};

use super::settings::RunSettings;
use super::Exit;

/// Send `[system, user]` once and print the reply.
pub async fn run_once<W: Write>(
    client: &LlamaClient,
    settings: &RunSettings,
    prompt: &str,
    out: &mut W,
) -> anyhow::Result<Exit> {
    let mut conversation = Conversation::with_system(settings.system_prompt.as_str());
    conversation.push_user(prompt);

    match client
        .chat(conversation.messages(), settings.sampling, settings.stream)
        .await?
    {
        ChatReply::Complete(content) => writeln!(out, "{content}")?,
        ChatReply::Stream(tokens) => {
            print_stream(tokens, out).await?;
        }
    }

    Ok(Exit::Success)
}

/// Write fragments as they arrive, then a newline. Returns the full text.
pub async fn print_stream<W: Write>(
    mut tokens: TokenStream,
    out: &mut W,
) -> std::io::Result<String> {
    let mut text = String::new();
    while let Some(token) = tokens.next().await {
        out.write_all(token.as_bytes())?;
        out.flush()?;
        text.push_str(&token);
    }
    writeln!(out)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_print_stream_writes_fragments_in_order() {
        let tokens: TokenStream = Box::pin(futures::stream::iter(vec![
            "Hel".to_string(),
            "lo".to_string(),
            "!".to_string(),
        ]));
        let mut out = Vec::new();
        let text = print_stream(tokens, &mut out).await.unwrap();
        assert_eq!(text, "Hello!");
        assert_eq!(String::from_utf8(out).unwrap(), "Hello!\n");
    }

    #[tokio::test]
    async fn test_print_empty_stream() {
        let tokens: TokenStream = Box::pin(futures::stream::empty());
        let mut out = Vec::new();
        assert_eq!(print_stream(tokens, &mut out).await.unwrap(), "");
        assert_eq!(out, b"\n");
    }
}
