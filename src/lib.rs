//! tunecast library root.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod media;
pub mod player;
pub mod storage;
pub mod telegram;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use core::{Track, TrackQueue};
pub use error::{Error, Result};
pub use handlers::{handle_channelplay, handle_play, AppContext};
pub use telegram::run_bot;
