//! Scrubline Core Library
//!
//! Pairs a video with its transcript: normalizes transcript JSON from
//! different generators, renders and searches segments, and answers
//! questions through a chat-completions API with clickable timestamp
//! citations.

pub mod citation;
pub mod error;
pub mod format;
pub mod loader;
pub mod normalize;
pub mod playback;
pub mod provider;
pub mod qa;
pub mod scroll;
pub mod search;
pub mod session;
pub mod status;
pub mod store;
pub mod timestamp;
pub mod transcript;
pub mod types;

// Re-export commonly used items at crate root
pub use citation::{AnswerFragment, linkify};
pub use error::{Result, ScrublineError};
pub use format::{format_context, format_position};
pub use loader::{MediaBundle, extract_transcription, load_transcript};
pub use normalize::normalize;
pub use playback::Playback;
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use qa::{AskConfig, CompletionBackend, HttpBackend, ask};
pub use session::{AskOutcome, LoadedMedia, Navigation, PendingAsk, Viewer, read_bundle};
pub use status::{StatusKind, StatusMessage};
pub use store::{CredentialStore, resolve_credential};
pub use timestamp::{TimeValue, TimeWindow, format_seconds, parse_precise, parse_timestamp};
pub use transcript::{Inline, RenderedSegment, TranscriptView, render_markup, segment_list};
pub use types::{RawRecord, RecordFields, Segment, TranscriptSource};
