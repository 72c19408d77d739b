//! Telegram bot integration.

pub mod adapter;
pub mod client;
pub mod edit;
pub mod platform;
pub mod texts;

pub use client::run_bot;
