//! Scripted support conversations for the posh-support assistant.
//!
//! This crate provides:
//!
//! - **Rule Store**: canned store responses loaded from a text resource
//! - **Session Store**: per-conversation handoff flags and flow memory
//! - **Flows**: name and photo customization, model lookup, refunds, FAQ
//! - **Handoff**: giving the conversation to a human operator and back
//! - **Dispatcher**: the single entry point for inbound messages
//!
//! Everything here is synchronous. Callers on an async runtime should run
//! [`Dispatcher::handle_message`] on a blocking thread.

pub mod dispatcher;
pub mod error;
pub mod flow;
pub mod handoff;
pub mod input;
pub mod menu;
pub mod order;
pub mod rules;
pub mod session;

pub use dispatcher::{Dispatcher, Reply};
pub use error::{OrderSinkError, RuleStoreError};
pub use order::{Customization, NameItem, OrderIdGenerator, OrderKind, OrderSink, PhotoItem};
pub use rules::{RuleKey, RuleSet};
pub use session::{ActiveFlow, InMemorySessionStore, Scratch, Session, SessionStore};
