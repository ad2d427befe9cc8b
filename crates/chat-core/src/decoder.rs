//! Streaming response decoder.
//!
//! Turns raw body chunks of `/chat/stream` into `StreamEvent`s. Records are
//! JSON objects separated by the literal `data: ` token; a record may be cut
//! anywhere by chunk boundaries, including inside a multi-byte character.
//!
//! One decoder serves exactly one stream. Once a terminal event (`Done` or
//! `Error`) has been produced, all further input is ignored.

use std::collections::VecDeque;

use futures::stream::{self, Stream, StreamExt};
use chat_types::{
    Result,
    config::AbruptClosePolicy,
    event::{StreamEvent, StreamRecord},
};

/// Token that precedes every record in the body
pub const RECORD_DELIMITER: &str = "data: ";

/// Incremental UTF-8 decoder. Bytes of a character split across chunks are
/// held back until the rest arrives; invalid sequences become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);

        let mut out = String::with_capacity(bytes.len());
        let mut start = 0;
        while start < bytes.len() {
            match std::str::from_utf8(&bytes[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = bytes.len();
                }
                Err(e) => {
                    let end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&bytes[start..end]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = end + len;
                        }
                        None => {
                            // incomplete sequence at the end: wait for more bytes
                            start = end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = bytes[start..].to_vec();
        out
    }

    /// End of input. A dangling partial character can never complete.
    fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Push-based decoder: feed chunks, collect the events they complete.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    utf8: Utf8Carry,
    buffer: String,
    finished: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk. Returns the events completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        let text = self.utf8.decode(chunk);
        self.buffer.push_str(&text);
        self.drain_records(false)
    }

    /// The body ended. Whatever is still buffered is treated as a final record.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        self.drain_records(true)
    }

    /// A `Done` or `Error` event has been produced
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn drain_records(&mut self, flush: bool) -> Vec<StreamEvent> {
        let buffer = std::mem::take(&mut self.buffer);
        let mut segments: Vec<&str> = buffer.split(RECORD_DELIMITER).collect();
        let remainder = segments.pop().unwrap_or("");

        let mut events = Vec::new();
        for segment in segments {
            if self.finished {
                break;
            }
            self.accept(segment, &mut events);
        }

        if self.finished {
            return events;
        }

        // A newline-terminated remainder that already parses is a complete
        // record; the server may keep the connection open after it.
        let remainder_complete = remainder.ends_with('\n')
            && serde_json::from_str::<StreamRecord>(remainder.trim()).is_ok();

        if flush || remainder_complete {
            self.accept(remainder, &mut events);
        } else {
            self.buffer = remainder.to_string();
        }
        events
    }

    fn accept(&mut self, segment: &str, events: &mut Vec<StreamEvent>) {
        let candidate = segment.trim();
        if candidate.is_empty() {
            return;
        }
        match serde_json::from_str::<StreamRecord>(candidate) {
            Ok(record) => {
                if let Some(event) = record.into_event() {
                    if event.is_terminal() {
                        self.finished = true;
                    }
                    events.push(event);
                }
            }
            Err(e) => {
                log::warn!("Failed to parse stream record {:?}: {}", candidate, e);
            }
        }
    }
}

/// Running full text of a streamed message. The reducer always receives the
/// whole value, never a bare increment.
#[derive(Debug, Default, Clone)]
pub struct ContentAccumulator {
    content: String,
}

impl ContentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an increment and return the full text so far
    pub fn push(&mut self, delta: &str) -> &str {
        self.content.push_str(delta);
        &self.content
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

struct DecodeState<S> {
    chunks: S,
    decoder: StreamDecoder,
    queued: VecDeque<StreamEvent>,
    policy: AbruptClosePolicy,
    closed: bool,
}

/// Decode a whole response body into a lazy sequence of events.
///
/// The sequence always ends with exactly one terminal event: the server's
/// `done`/`error`, an `Error` for a transport failure, or the event chosen by
/// `policy` when the body closes without either.
pub fn decode_stream<S>(chunks: S, policy: AbruptClosePolicy) -> impl Stream<Item = StreamEvent>
where
    S: Stream<Item = Result<Vec<u8>>> + Unpin,
{
    let state = DecodeState {
        chunks,
        decoder: StreamDecoder::new(),
        queued: VecDeque::new(),
        policy,
        closed: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.queued.pop_front() {
                return Some((event, st));
            }
            if st.closed || st.decoder.is_finished() {
                return None;
            }
            match st.chunks.next().await {
                Some(Ok(bytes)) => {
                    let events = st.decoder.push(&bytes);
                    st.queued.extend(events);
                }
                Some(Err(e)) => {
                    log::error!("Stream read failed: {}", e);
                    st.closed = true;
                    st.queued.push_back(StreamEvent::Error(e.to_string()));
                }
                None => {
                    st.closed = true;
                    let events = st.decoder.finish();
                    st.queued.extend(events);
                    if !st.decoder.is_finished() {
                        st.queued.push_back(abrupt_close_event(st.policy));
                    }
                }
            }
        }
    })
}

fn abrupt_close_event(policy: AbruptClosePolicy) -> StreamEvent {
    match policy {
        AbruptClosePolicy::Complete => {
            log::warn!("Stream closed without a done record; treating as complete");
            StreamEvent::Done
        }
        AbruptClosePolicy::Fail => {
            StreamEvent::Error("Stream closed before the response was complete".to_string())
        }
    }
}
