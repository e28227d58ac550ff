//! Human handoff.
//!
//! A conversation is handed to an operator when the customer asks for one
//! or a flow cannot go further on its own. While the operator owns the
//! conversation the assistant stays silent. The operator ends the handoff
//! by sending [`OPERATOR_CLOSING_PHRASE`]; the customer can end it with
//! [`CANCEL_PHRASE`].

use crate::rules::{RuleKey, RuleSet};
use crate::session::Session;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

/// Sentence operators send to give the conversation back. Matched exactly
/// after trimming.
pub const OPERATOR_CLOSING_PHRASE: &str =
    "Estou finalizando meu atendimento por aqui, se precisar de mais alguma coisa é só chamar";

/// Customer phrases asking for an operator, compared after normalizing.
pub const REQUEST_PHRASES: [&str; 2] = ["falar com atendimento humano", "falar com atendente"];

/// Customer phrase ending the handoff, compared after normalizing.
pub const CANCEL_PHRASE: &str = "cancelar atendimento humano";

/// Hours after an operator closes before the timestamp is reset.
pub const RESUME_AFTER_HOURS: i64 = 24;

/// Returns true if `text` is the operator closing phrase.
#[must_use]
pub fn is_operator_closing(text: &str) -> bool {
    text.trim() == OPERATOR_CLOSING_PHRASE
}

/// Returns true if the customer asked for an operator.
#[must_use]
pub fn is_request(normalized: &str) -> bool {
    REQUEST_PHRASES.contains(&normalized)
}

/// Returns true if the customer asked to end the handoff.
#[must_use]
pub fn is_cancel(normalized: &str) -> bool {
    normalized == CANCEL_PHRASE
}

/// Hands the conversation to an operator. Flow memory is dropped.
pub fn begin(session: &mut Session) {
    session.human_active = true;
    session.forwarded = true;
    session.scratch.clear();
    info!(conversation_id = %session.id, "conversation handed to an operator");
}

/// Applies the operator closing phrase.
///
/// Returns false, leaving the session untouched, when no operator is active.
pub fn operator_close(session: &mut Session, now: DateTime<Utc>) -> bool {
    if !session.human_active {
        return false;
    }
    session.human_active = false;
    session.forwarded = false;
    session.last_human_interaction = Some(now);
    info!(conversation_id = %session.id, "operator closed the handoff");
    true
}

/// Ends the handoff at the customer's request and returns the reply.
pub fn cancel(session: &mut Session, rules: &RuleSet) -> String {
    session.human_active = false;
    session.forwarded = false;
    session.scratch.clear();
    info!(conversation_id = %session.id, "customer cancelled the handoff");
    format!(
        "{}\n{}",
        rules.get(RuleKey::HumanCancelled),
        rules.get(RuleKey::MainMenu)
    )
}

/// Resets the operator timestamp once it is older than a day.
///
/// Returns true if it was reset. Handling is never blocked by the timer.
pub fn auto_resume(session: &mut Session, now: DateTime<Utc>) -> bool {
    let Some(closed_at) = session.last_human_interaction else {
        return false;
    };
    if session.human_active || now - closed_at <= TimeDelta::hours(RESUME_AFTER_HOURS) {
        return false;
    }
    session.last_human_interaction = None;
    debug!(conversation_id = %session.id, "operator timer expired");
    true
}
