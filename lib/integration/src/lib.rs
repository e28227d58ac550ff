//! External collaborators of the posh-support assistant.
//!
//! This crate provides:
//!
//! - **Message channel**: replies and unread flags through the marketplace chat API
//! - **Request signing**: HMAC-SHA256 signatures for shop-level API calls
//! - **File order sink**: one text record per customized case

pub mod channel;
pub mod error;
pub mod file_sink;
pub mod signature;

pub use channel::{MessageChannel, ShopeeChannel, ShopeeConfig};
pub use error::ChannelError;
pub use file_sink::{FileOrderSink, OrderDirs};
