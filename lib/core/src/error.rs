//! Shared error plumbing.
//!
//! Every crate in the workspace reports failures as a rootcause `Report`
//! whose context is that crate's own error enum (`RuleStoreError`,
//! `OrderSinkError`, `ChannelError`, ...). Outer layers attach their own
//! context with `.context()` instead of flattening the chain to a string.

use rootcause::Report;

/// Result carrying a rootcause report with context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
