//! Error types for the integration crate.
//!
//! `ChannelError` covers talking to the marketplace chat API. Delivery is
//! best effort: callers log these and carry on.

use std::fmt;

/// Errors from the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The request signature could not be computed.
    Signing { reason: String },
    /// The request never got a response.
    RequestFailed { endpoint: String, reason: String },
    /// The API answered with a non-success status.
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// No access token is configured for the shop.
    MissingAccessToken,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signing { reason } => write!(f, "failed to sign request: {reason}"),
            Self::RequestFailed { endpoint, reason } => {
                write!(f, "request to '{endpoint}' failed: {reason}")
            }
            Self::Rejected {
                endpoint,
                status,
                body,
            } => {
                write!(f, "'{endpoint}' rejected the request with {status}: {body}")
            }
            Self::MissingAccessToken => write!(f, "no access token configured"),
        }
    }
}

impl std::error::Error for ChannelError {}
