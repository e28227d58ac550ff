//! Conversation sessions.
//!
//! A session is created the first time a conversation id is seen and lives
//! for the rest of the process. Flow progress is kept in [`Scratch`], which
//! holds at most one [`ActiveFlow`].

use crate::flow::faq::FaqFlow;
use crate::flow::lookup::LookupFlow;
use crate::flow::name::NameFlow;
use crate::flow::photo::PhotoFlow;
use crate::order::OrderKind;
use chrono::{DateTime, Utc};
use posh_support_core::ConversationId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// The flow a conversation is currently in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", content = "state", rename_all = "snake_case")]
pub enum ActiveFlow {
    /// Collecting cases engraved with a name.
    NameCustomization(NameFlow),
    /// Collecting cases printed with a photo.
    PhotoCustomization(PhotoFlow),
    /// Model or theme availability question.
    Lookup(LookupFlow),
    /// Refund notice shown, waiting for the two-option menu answer.
    Refund,
    /// Questions submenu.
    Faq(FaqFlow),
    /// Order placed, waiting for the two-option menu answer.
    OrderPlaced { kind: OrderKind },
}

impl ActiveFlow {
    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NameCustomization(_) => "name_customization",
            Self::PhotoCustomization(_) => "photo_customization",
            Self::Lookup(_) => "lookup",
            Self::Refund => "refund",
            Self::Faq(_) => "faq",
            Self::OrderPlaced { .. } => "order_placed",
        }
    }
}

/// Working memory of the flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scratch {
    /// The flow in progress, if any.
    pub flow: Option<ActiveFlow>,
    /// Set when a name order has been placed. While set, the name flow
    /// cannot be started again from the main menu.
    pub name_order_locked: bool,
}

impl Scratch {
    /// Forgets the active flow and the name-order lock.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flow.is_none() && !self.name_order_locked
    }
}

/// Per-conversation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Conversation this session belongs to.
    pub id: ConversationId,
    /// A human operator currently owns the conversation.
    pub human_active: bool,
    /// The handoff has been signaled to the messaging channel.
    pub forwarded: bool,
    /// When the operator last closed a handoff.
    pub last_human_interaction: Option<DateTime<Utc>>,
    /// The greeting has been sent.
    pub first_message_received: bool,
    /// Flow working memory.
    pub scratch: Scratch,
}

impl Session {
    /// Creates a fresh session.
    #[must_use]
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            human_active: false,
            forwarded: false,
            last_human_interaction: None,
            first_message_received: false,
            scratch: Scratch::default(),
        }
    }

    /// Returns true while a human operator is handling the conversation
    /// and the assistant must stay silent.
    #[must_use]
    pub fn is_with_human(&self) -> bool {
        self.human_active && self.forwarded
    }
}

/// A session guarded for exclusive use by one message at a time.
pub type SharedSession = Arc<Mutex<Session>>;

/// Storage for sessions.
pub trait SessionStore: Send + Sync {
    /// Returns the session for `id`, creating it if needed.
    fn get_or_create(&self, id: &ConversationId) -> SharedSession;

    /// Returns the session for `id` if it exists.
    fn get(&self, id: &ConversationId) -> Option<SharedSession>;

    /// Returns the number of sessions.
    fn len(&self) -> usize;

    /// Returns true if there are no sessions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local session store. Sessions are never evicted.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ConversationId, SharedSession>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, id: &ConversationId) -> SharedSession {
        if let Some(session) = self.get(id) {
            return session;
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let session = sessions.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(conversation_id = %id, "creating session");
            Arc::new(Mutex::new(Session::new(id.clone())))
        });
        Arc::clone(session)
    }

    fn get(&self, id: &ConversationId) -> Option<SharedSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
