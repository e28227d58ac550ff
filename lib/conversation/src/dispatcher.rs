//! Message dispatcher.
//!
//! Every inbound message goes through [`Dispatcher::handle_message`], which
//! holds the conversation's session for the whole message and decides, in
//! order: greeting, operator handoff, the active flow, then the main menu.

use crate::flow::faq::FaqFlow;
use crate::flow::lookup::LookupFlow;
use crate::flow::name::NameFlow;
use crate::flow::photo::PhotoFlow;
use crate::flow::{self, FlowContext, POST_FLOW_OPTIONS, Step, refund};
use crate::handoff;
use crate::input;
use crate::menu::{self, MenuChoice, THANKS_REPLY};
use crate::order::{OrderIdGenerator, OrderKind, OrderSink};
use crate::rules::{RuleKey, RuleSet};
use crate::session::{ActiveFlow, Session, SessionStore};
use chrono::{DateTime, Utc};
use posh_support_core::ConversationId;
use std::sync::{Arc, PoisonError};
use tracing::{debug, instrument};

/// What to send back for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text for the customer. `None` means stay silent.
    pub text: Option<String>,
    /// The conversation is with a human operator.
    pub forwarded_to_human: bool,
}

impl Reply {
    /// A normal automated reply.
    pub fn say(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            forwarded_to_human: false,
        }
    }

    /// No reply at all.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            text: None,
            forwarded_to_human: false,
        }
    }

    fn handed_off(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            forwarded_to_human: true,
        }
    }

    fn with_operator() -> Self {
        Self {
            text: None,
            forwarded_to_human: true,
        }
    }
}

/// Routes customer messages through sessions, flows and the main menu.
pub struct Dispatcher {
    rules: Arc<RuleSet>,
    sessions: Arc<dyn SessionStore>,
    orders: OrderIdGenerator,
    sink: Arc<dyn OrderSink>,
}

impl Dispatcher {
    /// Creates a dispatcher with a fresh order id sequence.
    pub fn new(
        rules: Arc<RuleSet>,
        sessions: Arc<dyn SessionStore>,
        sink: Arc<dyn OrderSink>,
    ) -> Self {
        Self {
            rules,
            sessions,
            orders: OrderIdGenerator::new(),
            sink,
        }
    }

    /// Replaces the order id generator.
    #[must_use]
    pub fn with_order_ids(mut self, orders: OrderIdGenerator) -> Self {
        self.orders = orders;
        self
    }

    /// Handles one inbound message at the current time.
    #[instrument(skip_all, fields(conversation_id = %conversation_id))]
    pub fn handle_message(&self, conversation_id: &ConversationId, text: &str) -> Reply {
        self.handle_message_at(conversation_id, text, Utc::now())
    }

    /// Handles one inbound message as if received at `now`.
    pub fn handle_message_at(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Reply {
        let shared = self.sessions.get_or_create(conversation_id);
        let mut session = shared.lock().unwrap_or_else(PoisonError::into_inner);
        self.respond(&mut session, text, now)
    }

    fn respond(&self, session: &mut Session, text: &str, now: DateTime<Utc>) -> Reply {
        if !session.first_message_received {
            session.first_message_received = true;
            return Reply::say(format!(
                "{}\n{}",
                self.rules.get(RuleKey::Greeting),
                self.main_menu_text()
            ));
        }

        let normalized = input::normalize(text);

        if session.human_active {
            if handoff::is_operator_closing(text) {
                handoff::operator_close(session, now);
                return Reply::silent();
            }
            if handoff::is_cancel(&normalized) {
                return Reply::say(handoff::cancel(session, &self.rules));
            }
            if session.forwarded {
                debug!("operator is handling the conversation");
                return Reply::with_operator();
            }
        } else if handoff::is_operator_closing(text) {
            debug!("closing phrase with no operator active");
            return Reply::silent();
        }

        handoff::auto_resume(session, now);

        if handoff::is_request(&normalized) {
            handoff::begin(session);
            return Reply::handed_off(self.rules.get(RuleKey::TransferOffer));
        }

        if let Some(active) = session.scratch.flow.take() {
            if let Some(reply) = self.continue_flow(session, active, text, &normalized, now) {
                return reply;
            }
        }

        self.main_menu(session, &normalized)
    }

    /// Feeds the message to the active flow. Returns `None` when the flow
    /// lets go of the message.
    fn continue_flow(
        &self,
        session: &mut Session,
        active: ActiveFlow,
        text: &str,
        normalized: &str,
        now: DateTime<Utc>,
    ) -> Option<Reply> {
        if input::is_go_back(normalized) {
            debug!(flow = active.label(), "back to main menu");
            session.scratch.clear();
            return Some(Reply::say(flow::back_to_menu(&self.rules)));
        }

        let ctx = FlowContext {
            rules: &self.rules,
            orders: &self.orders,
            sink: self.sink.as_ref(),
            now,
        };
        let step = match active {
            ActiveFlow::NameCustomization(state) => state.step(text, &ctx),
            ActiveFlow::PhotoCustomization(state) => state.step(text, &ctx),
            ActiveFlow::Lookup(state) => state.step(text, &ctx),
            ActiveFlow::Faq(state) => state.step(text, &ctx),
            ActiveFlow::Refund => return Some(self.refund_options(session, normalized)),
            ActiveFlow::OrderPlaced { kind } => {
                return Some(self.post_order_options(session, kind, normalized));
            }
        };

        match step {
            Step::Continue(state, reply) => {
                session.scratch.flow = Some(state);
                Some(Reply::say(reply))
            }
            Step::Finish(reply) => {
                session.scratch.clear();
                Some(Reply::say(reply))
            }
            Step::OrderPlaced { kind, reply } => {
                session.scratch.clear();
                session.scratch.name_order_locked = kind == OrderKind::Name;
                session.scratch.flow = Some(ActiveFlow::OrderPlaced { kind });
                Some(Reply::say(reply))
            }
            Step::Handoff { reply, retain } => {
                handoff::begin(session);
                session.scratch.flow = retain;
                Some(Reply::handed_off(reply))
            }
            Step::Release => {
                session.scratch.clear();
                None
            }
        }
    }

    /// Menu shown after an order. Returning to the main menu keeps the
    /// name-order lock.
    fn post_order_options(&self, session: &mut Session, kind: OrderKind, normalized: &str) -> Reply {
        match normalized {
            "1" => Reply::say(self.main_menu_text()),
            "2" => {
                session.scratch.clear();
                Reply::say(self.rules.get(RuleKey::Farewell))
            }
            _ => {
                session.scratch.flow = Some(ActiveFlow::OrderPlaced { kind });
                Reply::say(format!(
                    "Desculpe, não entendi sua escolha. Por favor, selecione uma das opções \
                     numeradas:\n{}",
                    post_flow_choices()
                ))
            }
        }
    }

    fn refund_options(&self, session: &mut Session, normalized: &str) -> Reply {
        match normalized {
            "1" => {
                session.scratch.clear();
                Reply::say(self.main_menu_text())
            }
            "2" => {
                session.scratch.clear();
                Reply::say(self.rules.get(RuleKey::Farewell))
            }
            _ => {
                session.scratch.flow = Some(ActiveFlow::Refund);
                Reply::say(refund::notice(&self.rules))
            }
        }
    }

    fn main_menu(&self, session: &mut Session, normalized: &str) -> Reply {
        let rules = &self.rules;
        match menu::route(normalized) {
            MenuChoice::NameCustomization if session.scratch.name_order_locked => {
                debug!("name order already placed");
                Reply::say(rules.get(RuleKey::NameOrderAlreadySent))
            }
            MenuChoice::NameCustomization => enter(session, NameFlow::start()),
            MenuChoice::PhotoCustomization => enter(session, PhotoFlow::start()),
            MenuChoice::Lookup => enter(session, LookupFlow::start()),
            MenuChoice::Refund => enter(session, refund::start(rules)),
            MenuChoice::Faq => enter(session, FaqFlow::start(rules)),
            MenuChoice::Exit => {
                session.scratch.clear();
                Reply::say(rules.get(RuleKey::Farewell))
            }
            MenuChoice::ShowMenu => Reply::say(self.main_menu_text()),
            MenuChoice::Thanks => Reply::say(THANKS_REPLY),
            MenuChoice::Topic(key) => {
                Reply::say(format!("{}\n{}", rules.get(key), self.main_menu_text()))
            }
            MenuChoice::OutOfMenu => {
                session.scratch.clear();
                Reply::say(format!(
                    "{}\n{}",
                    rules.get(RuleKey::OutOfMenu),
                    self.main_menu_text()
                ))
            }
        }
    }

    fn main_menu_text(&self) -> &str {
        self.rules.get(RuleKey::MainMenu)
    }
}

fn enter<F: Into<ActiveFlow>>(session: &mut Session, (state, reply): (F, String)) -> Reply {
    let state = state.into();
    debug!(flow = state.label(), "entering flow");
    session.scratch.clear();
    session.scratch.flow = Some(state);
    Reply::say(reply)
}

/// The numbered lines of [`POST_FLOW_OPTIONS`] without the question.
fn post_flow_choices() -> &'static str {
    POST_FLOW_OPTIONS
        .split_once('\n')
        .map_or(POST_FLOW_OPTIONS, |(_, choices)| choices)
}
