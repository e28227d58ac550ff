//! Questions submenu.
//!
//! Ten numbered topics answered from the store rules, plus "back to menu"
//! and "talk to a human". After an answer the customer can go back to the
//! main menu, ask another question or leave.

use super::{BACK_HINT, FlowContext, Step, back_to_menu};
use crate::rules::{RuleKey, RuleSet};
use crate::session::ActiveFlow;
use serde::{Deserialize, Serialize};

const AFTER_ANSWER_OPTIONS: &str = "1 - Voltar ao menu principal\n\
2 - Fazer outra pergunta (voltar ao submenu de dúvidas)\n\
3 - Sair do atendimento";

/// Topics of the questions submenu, in menu order.
pub const TOPICS: [RuleKey; 10] = [
    RuleKey::ShippingDelay,
    RuleKey::WrongPurchase,
    RuleKey::Payment,
    RuleKey::CaseApproval,
    RuleKey::IllustrativeImages,
    RuleKey::UnknownModel,
    RuleKey::FontChange,
    RuleKey::CaseProtection,
    RuleKey::YellowingCase,
    RuleKey::DiscountCoupon,
];

const BACK_OPTION: usize = 11;
const HUMAN_OPTION: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaqFlow {
    AwaitingOption,
    AfterAnswer,
}

impl From<FaqFlow> for ActiveFlow {
    fn from(flow: FaqFlow) -> Self {
        Self::Faq(flow)
    }
}

impl FaqFlow {
    /// Shows the submenu.
    #[must_use]
    pub fn start(rules: &RuleSet) -> (Self, String) {
        (Self::AwaitingOption, submenu(rules))
    }

    pub(crate) fn step(self, text: &str, ctx: &FlowContext<'_>) -> Step {
        let choice = text.trim().parse::<usize>().ok();
        match self {
            Self::AwaitingOption => match choice {
                Some(n @ 1..=10) => {
                    let answer = ctx.rules.get(TOPICS[n - 1]);
                    Step::stay(
                        Self::AfterAnswer,
                        format!(
                            "{answer}\n\nO que você gostaria de fazer agora?\n{AFTER_ANSWER_OPTIONS}"
                        ),
                    )
                }
                Some(BACK_OPTION) => Step::Finish(back_to_menu(ctx.rules)),
                Some(HUMAN_OPTION) => Step::Handoff {
                    reply: ctx.rules.get(RuleKey::TransferOffer).to_string(),
                    retain: None,
                },
                _ => Step::Finish(format!(
                    "{}\n{}",
                    ctx.rules.get(RuleKey::OutOfMenu),
                    ctx.rules.get(RuleKey::MainMenu)
                )),
            },
            Self::AfterAnswer => match choice {
                Some(1) => Step::Finish(back_to_menu(ctx.rules)),
                Some(2) => Step::stay(Self::AwaitingOption, submenu(ctx.rules)),
                Some(3) => Step::Finish(ctx.rules.get(RuleKey::Farewell).to_string()),
                _ => Step::stay(
                    Self::AfterAnswer,
                    format!(
                        "Desculpe, não entendi sua escolha. Por favor, selecione uma das opções \
                         numeradas:\n{AFTER_ANSWER_OPTIONS}"
                    ),
                ),
            },
        }
    }
}

fn submenu(rules: &RuleSet) -> String {
    format!("{} {BACK_HINT}", rules.get(RuleKey::FaqMenu))
}
