//! SSE streaming response decoder for OpenAI-compatible chat completions.
//!
//! Reads a response body as a stream of byte chunks, reassembles complete
//! lines, decodes each `data: …` line as a `ChatCompletionChunk`, and yields
//! the non-empty `delta.content` fragments in arrival order.
//!
//! Decoding never fails: malformed lines, heartbeats, foreign event types and
//! mid-stream read errors are logged and skipped or end the stream quietly.

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use super::errors::InferenceError;
use super::types::{ChatCompletionChunk, ChatCompletionResponse, CompletionResponse};

/// Prefix every payload-carrying line starts with.
const DATA_PREFIX: &str = "data: ";

/// End-of-stream sentinel payload.
const DONE_SENTINEL: &str = "[DONE]";

/// Lazy, single-use sequence of text fragments from a streaming response.
pub type TokenStream = Pin<Box<dyn Stream<Item = String> + Send>>;

// ─── Line reassembly ─────────────────────────────────────────────────────────

/// Incremental line reassembler over arbitrary byte chunks.
///
/// Holds only bytes not yet returned as a line. Lines are split on `\n`, a
/// trailing `\r` is dropped, and UTF-8 decoding happens per complete line so a
/// multi-byte character split across reads is reassembled intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Start of the bytes not yet returned. Consumed bytes are dropped on the
    /// next `push`, not per line.
    start: usize,
    /// Bytes after `start` already known to contain no `\n`.
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the underlying stream.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.start > 0 {
            self.pending.drain(..self.start);
            self.start = 0;
        }
        self.pending.extend_from_slice(bytes);
    }

    /// Pop the next complete line, if a terminator has arrived.
    pub fn next_line(&mut self) -> Option<String> {
        let from = self.start + self.scanned;
        match self.pending[from..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let end = from + offset;
                let line = self.pending[self.start..end].to_vec();
                self.start = end + 1;
                self.scanned = 0;
                Some(decode_line_bytes(line))
            }
            None => {
                self.scanned = self.pending.len() - self.start;
                None
            }
        }
    }

    /// Take whatever is left once the stream has ended (an unterminated last line).
    pub fn finish(&mut self) -> Option<String> {
        let rest = self.pending.split_off(self.start);
        self.pending.clear();
        self.start = 0;
        self.scanned = 0;
        if rest.is_empty() {
            return None;
        }
        Some(decode_line_bytes(rest))
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn pending_len(&self) -> usize {
        self.pending.len() - self.start
    }
}

fn decode_line_bytes(mut line: Vec<u8>) -> String {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    match String::from_utf8(line) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

// ─── Line decoding ───────────────────────────────────────────────────────────

/// What a single stream line means to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Nothing to emit: blank separator, foreign line, heartbeat or bad JSON.
    Skip,
    /// A text fragment to display.
    Fragment(String),
    /// The `[DONE]` sentinel.
    Done,
}

/// Decode one complete line of the event stream.
pub fn decode_line(line: &str) -> LineEvent {
    if line.is_empty() {
        return LineEvent::Skip;
    }

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        tracing::trace!(line, "ignoring non-data line");
        return LineEvent::Skip;
    };

    if payload == DONE_SENTINEL {
        return LineEvent::Done;
    }

    let chunk: ChatCompletionChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::debug!(error = %e, payload, "skipping malformed SSE chunk");
            return LineEvent::Skip;
        }
    };

    chunk
        .first_delta_content()
        .filter(|content| !content.is_empty())
        .map_or(LineEvent::Skip, LineEvent::Fragment)
}

// ─── SSE stream ──────────────────────────────────────────────────────────────

/// Turn a body byte stream into the lazy sequence of text fragments.
///
/// The sequence ends on `[DONE]`, at end of body, or on a read error; none of
/// these surface as errors. Anything buffered after `[DONE]` is discarded.
pub fn parse_sse_stream<S, B, E>(byte_stream: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    stream::unfold(
        Some((byte_stream, LineBuffer::new())),
        |state| async move {
            let (mut byte_stream, mut buffer) = state?;
            loop {
                while let Some(line) = buffer.next_line() {
                    match decode_line(&line) {
                        LineEvent::Fragment(token) => {
                            return Some((token, Some((byte_stream, buffer))));
                        }
                        LineEvent::Done => {
                            tracing::debug!(
                                discarded_bytes = buffer.pending_len(),
                                "stream complete"
                            );
                            return None;
                        }
                        LineEvent::Skip => {}
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(bytes)) => buffer.push(bytes.as_ref()),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "stream read error, ending response");
                        return None;
                    }
                    None => {
                        tracing::debug!("connection closed without [DONE]");
                        let line = buffer.finish()?;
                        return match decode_line(&line) {
                            LineEvent::Fragment(token) => Some((token, None)),
                            LineEvent::Skip | LineEvent::Done => None,
                        };
                    }
                }
            }
        },
    )
}

/// Box a decoded stream so it can be handed across the client boundary.
pub fn into_token_stream<S, B, E>(byte_stream: S) -> TokenStream
where
    S: Stream<Item = Result<B, E>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(parse_sse_stream(byte_stream))
}

// ─── Non-streaming bodies ────────────────────────────────────────────────────

/// Extract `choices[0].message.content` from a chat completion body.
pub fn parse_chat_response(body: &str) -> Result<String, InferenceError> {
    let resp: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::ResponseFormat {
            reason: format!("failed to parse chat response: {e}"),
        })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| InferenceError::ResponseFormat {
            reason: "empty choices array".into(),
        })?;

    choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| InferenceError::ResponseFormat {
            reason: "choices[0].message.content is missing".into(),
        })
}

/// Extract `content` from a `/completion` body; empty when absent or unparsable.
pub fn parse_completion_response(body: &str) -> String {
    match serde_json::from_str::<CompletionResponse>(body) {
        Ok(resp) => resp.content.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "completion response was not JSON");
            String::new()
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
