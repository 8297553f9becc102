//! Interactive chat session.
//!
//! Reads one user turn per input line, sends the whole conversation each
//! turn, and appends the reply. Streamed replies are accumulated from the
//! printed fragments so the history carries the real assistant text.

use std::future::Future;
use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::inference::{ChatReply, Conversation, LlamaClient};

use super::chat::print_stream;
use super::settings::RunSettings;
use super::Exit;

/// Whether an input line ends the session.
pub fn is_exit_command(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Run the read/send/print loop until `exit`, end of input, or `interrupt`
/// resolves. The interrupt is honoured while waiting for input and while a
/// reply is in flight.
pub async fn run_session<R, W, F>(
    client: &LlamaClient,
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
    let mut lines = input.lines();
    let mut conversation = Conversation::with_system(settings.system_prompt.as_str());
    tokio::pin!(interrupt);

    writeln!(out, "Interactive chat mode. Type 'exit' to quit.")?;

    loop {
        write!(out, "\n> ")?;
        out.flush()?;

        let read = tokio::select! {
            line = lines.next_line() => Some(line),
            () = &mut interrupt => None,
        };
        let Some(line) = read else {
            writeln!(out, "\nExiting...")?;
            break;
        };
        let Some(line) = line? else {
            tracing::debug!("input closed");
            writeln!(out)?;
            break;
        };

        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        conversation.push_user(line);
        tracing::debug!(turns = conversation.len(), "sending turn");

        let turn = tokio::select! {
            reply = take_turn(client, &conversation, settings, out) => Some(reply),
            () = &mut interrupt => None,
        };
        let Some(reply) = turn else {
            writeln!(out, "\nExiting...")?;
            break;
        };
        conversation.push_assistant(reply?);
    }

    Ok(Exit::Success)
}

async fn take_turn<W: Write>(
    client: &LlamaClient,
    conversation: &Conversation,
    settings: &RunSettings,
    out: &mut W,
) -> anyhow::Result<String> {
    match client
        .chat(conversation.messages(), settings.sampling, settings.stream)
        .await?
    {
        ChatReply::Complete(content) => {
            writeln!(out, "Assistant: {content}")?;
            Ok(content)
        }
        ChatReply::Stream(tokens) => {
            write!(out, "Assistant: ")?;
            out.flush()?;
            Ok(print_stream(tokens, out).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands_are_case_insensitive() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("QUIT"));
        assert!(is_exit_command("Exit"));
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command(""));
    }

    #[tokio::test]
    async fn test_exit_before_any_request() {
        // Port 9 (discard) is never contacted: the session ends on "exit".
        let settings = RunSettings::resolve(
            crate::commands::Cli {
                server: Some("http://127.0.0.1:9".into()),
                interactive: true,
                ..Default::default()
            },
            Default::default(),
        );
        let client = LlamaClient::new(settings.client.clone()).unwrap();
        let mut out = Vec::new();

        let exit = run_session(
            &client,
            &settings,
            &b"exit\n"[..],
            &mut out,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(exit, Exit::Success);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Interactive chat mode. Type 'exit' to quit.\n"));
        assert!(!printed.contains("Assistant:"));
    }

    #[tokio::test]
    async fn test_interrupt_ends_session() {
        let settings = RunSettings::resolve(Default::default(), Default::default());
        let client = LlamaClient::new(settings.client.clone()).unwrap();
        let mut out = Vec::new();

        // Input never yields a line; the ready interrupt wins.
        let (_keep_open, reader) = tokio::io::duplex(64);
        let exit = run_session(
            &client,
            &settings,
            tokio::io::BufReader::new(reader),
            &mut out,
            std::future::ready(()),
        )
        .await
        .unwrap();

        assert_eq!(exit, Exit::Success);
        assert!(String::from_utf8(out).unwrap().ends_with("\nExiting...\n"));
    }

    #[tokio::test]
    async fn test_end_of_input_ends_session() {
        let settings = RunSettings::resolve(Default::default(), Default::default());
        let client = LlamaClient::new(settings.client.clone()).unwrap();
        let mut out = Vec::new();

        let exit = run_session(&client, &settings, &b""[..], &mut out, std::future::pending())
            .await
            .unwrap();
        assert_eq!(exit, Exit::Success);
    }
}
