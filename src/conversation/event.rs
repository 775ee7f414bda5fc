//! Inbound events from the transport layer.

use serde::{Deserialize, Serialize};

use super::instruction::DeliveryMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Start {
        user: String,
    },
    Choice {
        user: String,
        question_id: String,
        choice_index: usize,
    },
    MultiCommit {
        user: String,
        question_id: String,
    },
    Text {
        user: String,
        text: String,
    },
    EditRequest {
        user: String,
        question_id: String,
    },
    Confirm {
        user: String,
    },
    Reset {
        user: String,
    },
}

impl InboundEvent {
    pub fn user(&self) -> &str {
        match self {
            Self::Start { user }
            | Self::Choice { user, .. }
            | Self::MultiCommit { user, .. }
            | Self::Text { user, .. }
            | Self::EditRequest { user, .. }
            | Self::Confirm { user }
            | Self::Reset { user } => user,
        }
    }

    /// Button-originated events edit the message they came from; typed
    /// messages and commands get a fresh message.
    pub fn delivery_mode(&self) -> DeliveryMode {
        match self {
            Self::Start { .. } | Self::Text { .. } => DeliveryMode::SendNew,
            Self::Choice { .. }
            | Self::MultiCommit { .. }
            | Self::EditRequest { .. }
            | Self::Confirm { .. }
            | Self::Reset { .. } => DeliveryMode::EditInPlace,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Choice { .. } => "choice",
            Self::MultiCommit { .. } => "multi_commit",
            Self::Text { .. } => "text",
            Self::EditRequest { .. } => "edit_request",
            Self::Confirm { .. } => "confirm",
            Self::Reset { .. } => "reset",
        }
    }
}
