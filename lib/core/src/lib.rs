//! Core domain types and utilities for the posh-support assistant.
//!
//! This crate provides the foundational types and error handling shared by
//! the conversation core, its integrations and the webhook server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationId, OrderId, ParseIdError};
