//! SSE frame parsing
//!
//! [`parse_frames`] is a pure function over `buffer + chunk`: it never fails,
//! it only emits frames that were terminated by a blank line, and it hands the
//! unterminated tail back to the caller. [`SseParser`] wraps it for callers
//! that would rather not thread the buffer themselves and that read raw bytes.

use super::events::{ParseResult, SseEvent, DEFAULT_EVENT_TYPE};

/// Frame boundary after `\r\n` has been folded into `\n`.
const FRAME_BOUNDARY: &str = "\n\n";

/// Parse `buffer + chunk` into complete events plus the carry-over buffer.
///
/// Both `\n\n` and `\r\n\r\n` (and mixtures such as `\r\n\n`) terminate a
/// frame. The last segment after the final boundary is never a frame; it is
/// returned as `remaining_buffer`, possibly empty.
pub fn parse_frames(chunk: &str, buffer: &str) -> ParseResult {
    let mut text = String::with_capacity(buffer.len() + chunk.len());
    text.push_str(buffer);
    text.push_str(chunk);

    // A trailing lone '\r' stays in the tail and is folded once its '\n' arrives.
    let text = text.replace("\r\n", "\n");

    let mut segments: Vec<&str> = text.split(FRAME_BOUNDARY).collect();
    let remaining_buffer = segments.pop().unwrap_or_default().to_string();

    let events = segments.into_iter().filter_map(parse_frame).collect();

    ParseResult {
        events,
        remaining_buffer,
    }
}

/// Fields accumulated while scanning one frame.
#[derive(Debug, Default)]
struct FrameFields {
    event_type: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl FrameFields {
    fn apply(&mut self, name: &str, value: &str) {
        match name {
            "event" => self.event_type = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => {
                if !value.contains('\0') {
                    self.id = Some(value.to_string());
                }
            }
            "retry" => {
                if let Some(ms) = parse_retry(value) {
                    self.retry = Some(ms);
                }
            }
            _ => {}
        }
    }

    fn into_event(self) -> Option<SseEvent> {
        // Frames without any data field never reach the caller.
        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type: self
                .event_type
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            data: self.data.join("\n"),
            id: self.id,
            retry: self.retry,
        })
    }
}

/// Parse one complete frame (text between two boundaries).
fn parse_frame(segment: &str) -> Option<SseEvent> {
    let mut fields = FrameFields::default();

    for line in segment.split(&['\n', '\r'][..]) {
        if line.starts_with(':') {
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);

        fields.apply(name, value);
    }

    fields.into_event()
}

/// `retry` must be ASCII digits only; anything else is ignored.
fn parse_retry(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Stateful SSE parser that owns the carry-over buffer.
///
/// Also accepts raw bytes: a UTF-8 sequence split across two network chunks
/// is held back until it is complete instead of being mangled.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Unterminated text from previous chunks
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending_bytes: Vec<u8>,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text chunk, returning every event it completes.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        let ParseResult {
            events,
            remaining_buffer,
        } = parse_frames(chunk, &self.buffer);
        self.buffer = remaining_buffer;
        events
    }

    /// Feed a raw byte chunk, returning every event it completes.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        let text = self.decode_utf8(bytes);
        self.feed(&text)
    }

    /// Text waiting for a frame boundary.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Drop all carried state, e.g. before reading a fresh connection.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pending_bytes.clear();
    }

    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        self.pending_bytes.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending_bytes.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending_bytes[..valid]));
                    match e.error_len() {
                        // Incomplete sequence at the end: keep it for the next chunk
                        None => {
                            self.pending_bytes.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid + len);
                        }
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(input: &str) -> SseEvent {
        let result = parse_frames(input, "");
        assert_eq!(result.events.len(), 1, "expected one event from {:?}", input);
        result.events.into_iter().next().unwrap()
    }

    #[test]
    fn test_simple_data_frame() {
        let event = single("data: hello\n\n");
        assert_eq!(event.event_type, "message");
        assert_eq!(event.data, "hello");
    }

    #[test]
    fn test_crlf_boundary() {
        let result = parse_frames("event: progress\r\ndata: x\r\n\r\n", "");
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].event_type, "progress");
        assert_eq!(result.events[0].data, "x");
        assert_eq!(result.remaining_buffer, "");
    }

    #[test]
    fn test_mixed_line_endings_boundary() {
        let result = parse_frames("data: a\r\n\ndata: b\n\r\n", "");
        let data: Vec<_> = result.events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["a", "b"]);
    }

    #[test]
    fn test_incomplete_frame_stays_in_buffer() {
        let result = parse_frames("data: partial", "");
        assert!(result.events.is_empty());
        assert_eq!(result.remaining_buffer, "data: partial");

        let result = parse_frames("\n\n", &result.remaining_buffer);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].data, "partial");
        assert_eq!(result.remaining_buffer, "");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let first = parse_frames("data: x\r\n\r", "");
        assert!(first.events.is_empty());

        let second = parse_frames("\n", &first.remaining_buffer);
        assert_eq!(second.events.len(), 1);
        assert_eq!(second.events[0].data, "x");
    }

    #[test]
    fn test_multiline_data_join() {
        assert_eq!(single("data: a\ndata: b\ndata: c\n\n").data, "a\nb\nc");
    }

    #[test]
    fn test_empty_data_line_keeps_its_newline() {
        assert_eq!(
            single("data: first\ndata:\ndata: third\n\n").data,
            "first\n\nthird"
        );
    }

    #[test]
    fn test_single_space_stripping() {
        assert_eq!(single("data: x\n\n").data, "x");
        assert_eq!(single("data:  x\n\n").data, " x");
        assert_eq!(single("data:x\n\n").data, "x");
    }

    #[test]
    fn test_value_keeps_later_colons() {
        assert_eq!(single("data: {\"a\":1}\n\n").data, "{\"a\":1}");
    }

    #[test]
    fn test_last_event_field_wins() {
        let event = single("event: first\nevent: second\ndata: x\n\n");
        assert_eq!(event.event_type, "second");
    }

    #[test]
    fn test_id_with_null_is_ignored() {
        let event = single("id: a\0b\ndata: x\n\n");
        assert_eq!(event.id, None);

        let event = single("id: abc\ndata: x\n\n");
        assert_eq!(event.id, Some("abc".to_string()));
    }

    #[test]
    fn test_retry_must_be_digits() {
        assert_eq!(single("retry: 12ms\ndata: x\n\n").retry, None);
        assert_eq!(single("retry: -5\ndata: x\n\n").retry, None);
        assert_eq!(single("retry: 1.5\ndata: x\n\n").retry, None);
        assert_eq!(single("retry:\ndata: x\n\n").retry, None);
        assert_eq!(single("retry: 5000\ndata: x\n\n").retry, Some(5000));
    }

    #[test]
    fn test_comment_only_frames_yield_nothing() {
        let result = parse_frames(": keepalive\n\n:another\n: third one\n\n", "");
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_comments_inside_data_frame_are_skipped() {
        let event = single(": ping\ndata: x\n: pong\n\n");
        assert_eq!(event.data, "x");
    }

    #[test]
    fn test_no_data_no_event() {
        assert!(parse_frames("event: ping\n\n", "").events.is_empty());
        assert!(parse_frames("id: 7\nretry: 100\n\n", "").events.is_empty());
    }

    #[test]
    fn test_explicit_empty_data_yields_event() {
        assert_eq!(single("data:\n\n").data, "");
    }

    #[test]
    fn test_line_without_colon_is_ignored() {
        let event = single("data\ndata: x\n\n");
        assert_eq!(event.data, "x");
        assert!(parse_frames("data\n\n", "").events.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let event = single("foo: bar\ndata: x\n\n");
        assert_eq!(event, SseEvent::message("x"));
    }

    #[test]
    fn test_reassembly_matches_single_parse() {
        let input = "event: progress\nid: 1\ndata: {\"p\":1}\n\n\
                     : keepalive\n\n\
                     data: a\r\ndata: b\r\n\r\n\
                     retry: 250\ndata: last\n\n";
        let whole = parse_frames(input, "");
        assert_eq!(whole.events.len(), 3);

        for size in 1..=input.len() {
            let mut buffer = String::new();
            let mut events = Vec::new();
            let bytes = input.as_bytes();
            for piece in bytes.chunks(size) {
                let chunk = std::str::from_utf8(piece).unwrap();
                let result = parse_frames(chunk, &buffer);
                events.extend(result.events);
                buffer = result.remaining_buffer;
            }
            assert_eq!(events, whole.events, "chunk size {}", size);
        }
    }

    #[test]
    fn test_parser_threads_buffer() {
        let mut parser = SseParser::new();
        assert!(parser.feed("data: hel").is_empty());
        assert_eq!(parser.buffered(), "data: hel");

        let events = parser.feed("lo\n\ndata: next");
        assert_eq!(events, vec![SseEvent::message("hello")]);
        assert_eq!(parser.buffered(), "data: next");

        parser.reset();
        assert_eq!(parser.buffered(), "");
        assert!(parser.feed("\n\n").is_empty());
    }

    #[test]
    fn test_feed_bytes_handles_split_utf8() {
        let mut parser = SseParser::new();
        let input = "data: caf\u{e9} \u{1f600}\n\n".as_bytes();

        let mut events = Vec::new();
        for byte in input {
            events.extend(parser.feed_bytes(std::slice::from_ref(byte)));
        }

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "caf\u{e9} \u{1f600}");
    }

    #[test]
    fn test_feed_bytes_replaces_invalid_sequences() {
        let mut parser = SseParser::new();
        let events = parser.feed_bytes(b"data: a\xffb\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a\u{fffd}b");
    }
}
