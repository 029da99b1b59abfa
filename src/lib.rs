//! Anonsbot — a conversational announcement builder for Telegram.
//!
//! Walks a user through assembling an event announcement step by step,
//! submits the result to a moderation chat, and publishes approved
//! announcements to a public channel.
//!
//! The conversation engine, moderation workflow, formatter, and validators
//! are transport-agnostic; `telegram` adapts them to the Bot API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod callback;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod format;
pub mod health;
pub mod keyboards;
pub mod logging;
pub mod moderation;
pub mod store;
pub mod telegram;
pub mod types;
pub mod validate;
