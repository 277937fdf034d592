//! SSE event types
//!
//! Contains the parsed frame record and the result of a parser invocation.

/// Event type used when a frame carries no `event:` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One parsed SSE frame.
///
/// Produced by [`parse_frames`](super::parse_frames) for every complete frame
/// that contained at least one `data` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the last `event:` field, or `"message"`
    pub event_type: String,
    /// All `data:` fields joined with `\n`
    pub data: String,
    /// Value of the `id:` field, if present and free of NUL characters
    pub id: Option<String>,
    /// Reconnection time in milliseconds from a purely numeric `retry:` field
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Create a default-typed event carrying `data`.
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }
}

/// Output of a single [`parse_frames`](super::parse_frames) call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseResult {
    /// Events completed by this call, in stream order
    pub events: Vec<SseEvent>,
    /// Unterminated tail to pass back in with the next chunk
    pub remaining_buffer: String,
}
