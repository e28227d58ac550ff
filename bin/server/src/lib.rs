//! posh-support webhook server.
//!
//! Receives marketplace chat messages, runs them through the conversation
//! dispatcher and delivers the replies.

pub mod config;
pub mod error;
pub mod webhook;
