//! Loads the user's session, runs the engine under the user's lock, stores
//! the result and hands confirmed briefs to the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::engine::ConversationEngine;
use super::event::InboundEvent;
use super::instruction::{DeliveryMode, PromptInstruction};
use super::state::FlowState;
use crate::dispatch::{Confirmation, Dispatcher};
use crate::error::EngineError;
use crate::session::{Session, SessionLocks, SessionStore, SummarySnapshot};

pub const GREETING: &str = "🐾 Hi! I'm the *Brief Assistant*. I'll help you put together a project \
brief in a couple of minutes.\nKeep answers short and we'll structure everything for you. Let's go! 🚀";

pub const THANK_YOU: &str = "✅ Done! Thank you, we have received your brief. \
Our manager will contact you shortly. 🙌";

pub const USE_BUTTONS: &str = "Please use the buttons below.";

pub const USE_CURRENT_CONTROLS: &str =
    "That button is no longer active. Please use the latest message.";

pub const ANSWER_ALL_FIRST: &str = "Please answer all the questions before confirming.";

/// What to show the user in response to one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// Sent as its own message before the instruction.
    pub preamble: Option<String>,
    pub instruction: PromptInstruction,
    pub delivery: DeliveryMode,
}

impl Reply {
    fn new(instruction: PromptInstruction, delivery: DeliveryMode) -> Self {
        Self {
            preamble: None,
            instruction,
            delivery,
        }
    }

    /// A short notice sent as a new message, leaving the current controls
    /// on screen.
    fn notice(text: &str) -> Self {
        Self::new(PromptInstruction::plain(text), DeliveryMode::SendNew)
    }
}

pub struct ConversationService {
    engine: ConversationEngine,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    dispatcher: Arc<Dispatcher>,
    /// Last snapshot dispatched per user; repeat confirms of the same brief
    /// are not dispatched again.
    confirmed: RwLock<HashMap<String, SummarySnapshot>>,
}

impl ConversationService {
    pub fn new(
        engine: ConversationEngine,
        store: Arc<dyn SessionStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            engine,
            store,
            locks: SessionLocks::new(),
            dispatcher,
            confirmed: RwLock::new(HashMap::new()),
        }
    }

    /// Handle one event. Events for the same user are processed one at a
    /// time.
    pub async fn handle(&self, event: InboundEvent) -> Reply {
        let user = event.user().to_string();
        let _guard = self.locks.acquire(&user).await;

        let mut session = self.store.get(&user).await.unwrap_or_default();
        let delivery = event.delivery_mode();
        info!(user = %user, event = event.kind(), "Handling event");

        let outcome = match event {
            InboundEvent::Start { .. } => {
                self.forget_confirmation(&user).await;
                let instruction = self.engine.start_session(&mut session);
                Ok(Reply {
                    preamble: Some(GREETING.to_string()),
                    instruction,
                    delivery,
                })
            }
            InboundEvent::Reset { .. } => {
                self.forget_confirmation(&user).await;
                Ok(Reply::new(self.engine.reset(&mut session), delivery))
            }
            InboundEvent::Choice {
                question_id,
                choice_index,
                ..
            } => self
                .engine
                .handle_choice(&mut session, &question_id, choice_index)
                .map(|i| Reply::new(i, delivery)),
            InboundEvent::MultiCommit { question_id, .. } => self
                .engine
                .handle_multi_commit(&mut session, &question_id)
                .map(|i| Reply::new(i, delivery)),
            InboundEvent::Text { text, .. } => self
                .engine
                .handle_free_text(&mut session, &text)
                .map(|i| Reply::new(i, delivery)),
            InboundEvent::EditRequest { question_id, .. } => self
                .engine
                .begin_edit(&mut session, &question_id)
                .map(|i| Reply::new(i, delivery)),
            InboundEvent::Confirm { .. } => match self.engine.confirm(&session) {
                Ok(snapshot) => {
                    self.dispatch_once(&user, snapshot).await;
                    Ok(Reply::new(PromptInstruction::plain(THANK_YOU), delivery))
                }
                Err(e) => Err(e),
            },
        };

        match outcome {
            Ok(reply) => {
                debug!(
                    user = %user,
                    state = %FlowState::of(&session, self.engine.catalog()),
                    "Session updated"
                );
                self.store.put(&user, session).await;
                reply
            }
            Err(e) => {
                warn!(user = %user, "Rejected event: {e}");
                Reply::notice(notice_for(&e))
            }
        }
    }

    /// Current session for `user`, if any.
    pub async fn session(&self, user: &str) -> Option<Session> {
        self.store.get(user).await
    }

    pub async fn flow_state(&self, user: &str) -> Option<FlowState> {
        self.store
            .get(user)
            .await
            .map(|s| FlowState::of(&s, self.engine.catalog()))
    }

    async fn dispatch_once(&self, user: &str, snapshot: SummarySnapshot) {
        {
            let confirmed = self.confirmed.read().await;
            if confirmed.get(user) == Some(&snapshot) {
                info!(user = %user, "Brief already dispatched; ignoring repeat confirm");
                return;
            }
        }

        let confirmation = Confirmation::new(user, snapshot);
        let report = self.dispatcher.dispatch(&confirmation).await;
        if !report.is_clean() {
            warn!(
                user = %user,
                confirmation_id = %report.confirmation_id,
                errors = report.errors.len(),
                "Brief dispatched with errors"
            );
        }
        // A brief the operator never received stays eligible for another
        // confirm.
        if report.notified || !self.dispatcher.has_notifier() {
            self.confirmed
                .write()
                .await
                .insert(user.to_string(), confirmation.snapshot);
        }
    }

    async fn forget_confirmation(&self, user: &str) {
        self.confirmed.write().await.remove(user);
    }
}

fn notice_for(error: &EngineError) -> &'static str {
    match error {
        EngineError::NoActiveQuestion => USE_BUTTONS,
        EngineError::IncompleteFlow { .. } => ANSWER_ALL_FIRST,
        EngineError::UnknownQuestion { .. }
        | EngineError::IndexOutOfRange { .. }
        | EngineError::NotMultiSelect { .. } => USE_CURRENT_CONTROLS,
    }
}
