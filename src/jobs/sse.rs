//! Server-Sent Events framing.
//!
//! Turns a raw byte stream into the `data` payloads of dispatched events:
//!
//! ```text
//! data: {"message":"Fetching sources"}
//!
//! : keep-alive comment
//! data: {"status":"completed"}
//!
//! ```
//!
//! Multi-line `data` fields are joined with `\n`. Comments, `event:`, `id:`
//! and `retry:` fields are ignored. A line longer than [`MAX_LINE_BYTES`] is
//! dropped without ending the stream.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::warn;

use crate::error::{JobError, JobResult};

/// Longest line the decoder buffers; longer lines are discarded whole.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental SSE decoder.
///
/// Lines end with `\n`, `\r\n` or a lone `\r`, and a `\r\n` pair may be split
/// across chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
    after_cr: bool,
    discarding: bool,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the payloads of every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &byte in chunk {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\n' | b'\r' => {
                    self.after_cr = byte == b'\r';
                    if let Some(event) = self.end_line() {
                        events.push(event);
                    }
                }
                _ if self.discarding => {}
                _ if self.line.len() >= MAX_LINE_BYTES => {
                    warn!(limit = MAX_LINE_BYTES, "Discarding oversized event stream line");
                    self.line = Vec::new();
                    self.discarding = true;
                }
                _ => self.line.push(byte),
            }
        }
        events
    }

    /// Flush a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        self.after_cr = false;
        if !self.line.is_empty() || self.discarding {
            if let Some(event) = self.end_line() {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn end_line(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.line);
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        self.process_line(&String::from_utf8_lossy(&line))
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}

struct DecoderState<S> {
    inner: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Decode a response byte stream into event payloads.
///
/// A read error is yielded as [`JobError::StreamTransport`] and ends the stream.
pub fn decode_event_stream<S, E>(byte_stream: S) -> impl Stream<Item = JobResult<String>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = DecoderState {
        inner: Box::pin(byte_stream),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.done {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    state.pending.extend(state.decoder.push(&chunk));
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((
                        Err(JobError::StreamTransport {
                            message: format!("Stream read error: {}", e),
                        }),
                        state,
                    ));
                }
                None => {
                    state.done = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"message\":\"hi\"}\n\n");
        assert_eq!(events, vec![r#"{"message":"hi"}"#.to_string()]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"mess").is_empty());
        assert!(decoder.push(b"age\":\"hi\"}\n").is_empty());
        assert_eq!(decoder.push(b"\n"), vec![r#"{"message":"hi"}"#.to_string()]);
    }

    #[test]
    fn test_crlf_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: line one\r\ndata: line two\r\n\r\n");
        assert_eq!(events, vec!["line one\nline two".to_string()]);
    }

    #[test]
    fn test_bare_cr_line_endings() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"status\":\"completed\"}\r\r");
        assert_eq!(events, vec![r#"{"status":"completed"}"#.to_string()]);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: a\r").is_empty());
        // the LF completes the CRLF pair and must not end a second, empty line
        assert!(decoder.push(b"\ndata: b\r").is_empty());
        assert_eq!(decoder.push(b"\n\r\n"), vec!["a\nb".to_string()]);
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut decoder = SseDecoder::new();
        let mut long = b"data: ".to_vec();
        long.extend(std::iter::repeat(b'x').take(MAX_LINE_BYTES + 10));
        assert!(decoder.push(&long).is_empty());
        assert!(decoder.push(b"\n\n").is_empty());
        assert_eq!(decoder.push(b"data: next\n\n"), vec!["next".to_string()]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": ping\n\nevent: update\nid: 7\nretry: 100\ndata:x\n\n");
        assert_eq!(events, vec!["x".to_string()]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: café\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec!["café".to_string()]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[tokio::test]
    async fn test_decode_event_stream_yields_in_order() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"data: a\n\ndata: b\n")),
            Ok(Bytes::from_static(b"\ndata: c\n\n")),
        ];
        let events: Vec<_> = decode_event_stream(stream::iter(chunks)).collect().await;
        let events: Vec<String> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(events, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_decode_event_stream_surfaces_read_error_last() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"data: a\n\n")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"data: never\n\n")),
        ];
        let events: Vec<_> = decode_event_stream(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap(), "a");
        assert!(matches!(events[1], Err(JobError::StreamTransport { .. })));
    }
}
