//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `RuleStoreError`: reading the canned-response resource
//! - `OrderSinkError`: handing confirmed items to the order sink
//!
//! Neither is ever surfaced to the customer. The rule store falls back to
//! its built-in rules and a failed sink write is logged.

use std::fmt;

/// Errors from loading the rule resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleStoreError {
    /// The resource could not be read.
    Read { path: String, reason: String },
}

impl fmt::Display for RuleStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, reason } => {
                write!(f, "failed to read rules from '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for RuleStoreError {}

/// Errors from persisting a confirmed customization item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSinkError {
    /// Storage operation failed.
    StorageFailed { reason: String },
}

impl fmt::Display for OrderSinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageFailed { reason } => write!(f, "order storage failed: {reason}"),
        }
    }
}

impl std::error::Error for OrderSinkError {}
