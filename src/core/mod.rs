//! Core types: tracks, the playback queue, and request parsing.

pub mod queue;
pub mod request;
pub mod track;

pub use queue::TrackQueue;
pub use request::{parse_command, ChannelRef, ParsedCommand, PlaybackRequest, PLAY_COMMANDS};
pub use track::{format_duration, Track};
