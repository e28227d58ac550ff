//! Refund and return requests.
//!
//! Refunds go through the marketplace, so the assistant only points the
//! customer there and offers the two follow-up options.

use super::POST_FLOW_OPTIONS;
use crate::rules::{RuleKey, RuleSet};
use crate::session::ActiveFlow;

/// The refund notice followed by the follow-up options.
#[must_use]
pub fn notice(rules: &RuleSet) -> String {
    format!(
        "{}\n{POST_FLOW_OPTIONS}",
        rules.get(RuleKey::StoreScriptError)
    )
}

/// Enters the refund flow.
#[must_use]
pub fn start(rules: &RuleSet) -> (ActiveFlow, String) {
    (ActiveFlow::Refund, notice(rules))
}
