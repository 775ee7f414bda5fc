//! Questionnaire engine, its events and instructions, and the service that
//! runs it per user.

pub mod engine;
pub mod event;
pub mod instruction;
pub mod service;
pub mod state;

pub use engine::ConversationEngine;
pub use event::InboundEvent;
pub use instruction::{
    BUTTONS_PER_ROW, ChoiceButton, ChoiceLayout, ConfirmAffordance, DeliveryMode, PromptInstruction,
};
pub use service::{ConversationService, Reply};
pub use state::FlowState;
