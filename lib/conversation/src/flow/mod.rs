//! Flow engines.
//!
//! Each flow is a small state machine owned by the session's scratch
//! memory. A step consumes the current state and returns a [`Step`]
//! telling the dispatcher what to keep and what to say.

pub mod faq;
pub mod lookup;
pub mod name;
pub mod photo;
pub mod refund;

use crate::order::{Customization, OrderIdGenerator, OrderKind, OrderSink};
use crate::rules::RuleSet;
use crate::session::ActiveFlow;
use chrono::{DateTime, Utc};
use posh_support_core::OrderId;
use tracing::{error, info};

/// Reminder appended to most prompts.
pub const BACK_HINT: &str = "(Ou digite 'Voltar' para o menu principal)";

/// Prefix of the reply when leaving a flow for the main menu.
pub const BACK_TO_MENU: &str = "Entendido. Voltando ao menu principal.";

/// Options offered after an order or the refund notice.
pub const POST_FLOW_OPTIONS: &str = "O que você gostaria de fazer agora?\n\
1 - Voltar ao menu principal\n\
2 - Sair do atendimento";

/// Collaborators a flow step may use.
pub struct FlowContext<'a> {
    pub rules: &'a RuleSet,
    pub orders: &'a OrderIdGenerator,
    pub sink: &'a dyn OrderSink,
    pub now: DateTime<Utc>,
}

/// Outcome of one flow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Stay in the flow with the given state.
    Continue(ActiveFlow, String),
    /// Leave the flow and clear scratch memory.
    Finish(String),
    /// An order was stored. Scratch is replaced by the post-order menu.
    OrderPlaced { kind: OrderKind, reply: String },
    /// Hand the conversation to a human. `retain` stays in scratch while
    /// the operator is active.
    Handoff {
        reply: String,
        retain: Option<ActiveFlow>,
    },
    /// Leave the flow and treat the input as a main-menu message.
    Release,
}

impl Step {
    pub(crate) fn stay(state: impl Into<ActiveFlow>, reply: impl Into<String>) -> Self {
        Self::Continue(state.into(), reply.into())
    }
}

/// The "back to main menu" reply.
#[must_use]
pub fn back_to_menu(rules: &RuleSet) -> String {
    format!(
        "{BACK_TO_MENU}\n{}",
        rules.get(crate::rules::RuleKey::MainMenu)
    )
}

/// Allocates an order id and hands every item to the sink.
///
/// A failed write is logged and does not stop the remaining items.
pub(crate) fn place_order<I>(ctx: &FlowContext<'_>, items: I) -> OrderId
where
    I: IntoIterator<Item = Customization>,
{
    let order_id = ctx.orders.next(ctx.now);
    let mut stored = 0usize;
    for item in items {
        match ctx.sink.record(&order_id, &item) {
            Ok(()) => stored += 1,
            Err(report) => {
                error!(
                    order_id = %order_id,
                    kind = ?item.kind(),
                    error = %report,
                    "failed to store order item"
                );
            }
        }
    }
    info!(order_id = %order_id, items = stored, "order placed");
    order_id
}
