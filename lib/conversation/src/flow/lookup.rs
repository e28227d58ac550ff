//! Model or theme availability questions.
//!
//! Stock is not known to the assistant, so any query is handed to a human.

use super::{BACK_HINT, FlowContext, Step};
use crate::rules::RuleKey;
use crate::session::ActiveFlow;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum LookupFlow {
    AwaitingQuery,
    /// The query went to an operator. Kept while the operator is active.
    Forwarded { query: String },
}

impl From<LookupFlow> for ActiveFlow {
    fn from(flow: LookupFlow) -> Self {
        Self::Lookup(flow)
    }
}

impl LookupFlow {
    #[must_use]
    pub fn start() -> (Self, String) {
        (
            Self::AwaitingQuery,
            format!(
                "Certo! Qual o modelo de celular ou tema de desenho específico que você gostaria \
                 de consultar? {BACK_HINT}"
            ),
        )
    }

    pub(crate) fn step(self, text: &str, ctx: &FlowContext<'_>) -> Step {
        match self {
            Self::AwaitingQuery => {
                let query = text.trim().to_string();
                info!(query = %query, "forwarding model lookup to an operator");
                Step::Handoff {
                    reply: ctx.rules.get(RuleKey::TransferOffer).to_string(),
                    retain: Some(Self::Forwarded { query }.into()),
                }
            }
            // The operator has gone; the customer is talking to the menu again.
            Self::Forwarded { .. } => Step::Release,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderIdGenerator;
    use crate::order::testing::RecordingSink;
    use crate::rules::RuleSet;
    use chrono::Utc;

    #[test]
    fn query_is_forwarded_and_remembered() {
        let rules = RuleSet::parse("✔ TRANSFERENCIA_OFERECER\nRESPOSTA:\nVou te transferir.\n");
        let orders = OrderIdGenerator::new();
        let sink = RecordingSink::default();
        let ctx = FlowContext {
            rules: &rules,
            orders: &orders,
            sink: &sink,
            now: Utc::now(),
        };

        let (flow, prompt) = LookupFlow::start();
        assert!(prompt.contains("gostaria de consultar"));

        let step = flow.step("  Galaxy A54 ", &ctx);
        assert_eq!(
            step,
            Step::Handoff {
                reply: "Vou te transferir.".to_string(),
                retain: Some(ActiveFlow::Lookup(LookupFlow::Forwarded {
                    query: "Galaxy A54".to_string()
                })),
            }
        );
    }

    #[test]
    fn forwarded_state_releases_input() {
        let rules = RuleSet::builtin();
        let orders = OrderIdGenerator::new();
        let sink = RecordingSink::default();
        let ctx = FlowContext {
            rules: &rules,
            orders: &orders,
            sink: &sink,
            now: Utc::now(),
        };

        let flow = LookupFlow::Forwarded {
            query: "iPhone 15".to_string(),
        };
        assert_eq!(flow.step("2", &ctx), Step::Release);
    }
}
