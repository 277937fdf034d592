//! SSE (Server-Sent Events) stream parser
//!
//! Parses the `text/event-stream` body of the analysis progress endpoint.
//! SSE format consists of:
//! - `event: <type>` - event type line
//! - `data: <payload>` - data payload line, repeatable
//! - `id: <id>` / `retry: <ms>` - optional metadata
//! - Empty line - signals end of event
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `events` - Frame record types (SseEvent, ParseResult)
//! - `frame` - Parsing logic (parse_frames, SseParser)
//! - `payloads` - Payload decoding and progress shape classification

mod events;
mod frame;
mod payloads;

// Re-export public types
pub use events::{ParseResult, SseEvent, DEFAULT_EVENT_TYPE};
pub use frame::{parse_frames, SseParser};
pub use payloads::{
    decode, decode_progress, is_progress_update, AnalysisStatus, DecodeOptions, ProgressUpdate,
};
