//! What the transport should show next.

use serde::Serialize;

use crate::catalog::QuestionDef;
use crate::summary::EditTarget;

/// Choice buttons per keyboard row.
pub const BUTTONS_PER_ROW: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceButton {
    pub label: String,
    pub index: usize,
    /// Toggled on in the pending multi-select buffer.
    pub selected: bool,
}

/// Button grid for a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceLayout {
    pub question_id: String,
    pub rows: Vec<Vec<ChoiceButton>>,
    /// Multi-select questions get a trailing "next" button that commits.
    pub commit_button: bool,
}

impl ChoiceLayout {
    /// Layout for `question`, or `None` for free-text questions.
    pub fn for_question(question: &QuestionDef, selected: &[String]) -> Option<Self> {
        let choices = question.choices.as_ref()?;
        let buttons: Vec<ChoiceButton> = choices
            .iter()
            .enumerate()
            .map(|(index, label)| ChoiceButton {
                label: label.clone(),
                index,
                selected: question.multi && selected.contains(label),
            })
            .collect();

        Some(Self {
            question_id: question.id.clone(),
            rows: buttons
                .chunks(BUTTONS_PER_ROW)
                .map(<[ChoiceButton]>::to_vec)
                .collect(),
            commit_button: question.multi,
        })
    }
}

/// Confirm / start-over buttons under the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmAffordance {
    pub confirm_label: String,
    pub reset_label: String,
}

impl Default for ConfirmAffordance {
    fn default() -> Self {
        Self {
            confirm_label: "✅ Confirm".to_string(),
            reset_label: "↩️ Reset".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptInstruction {
    ShowQuestion {
        question_id: String,
        prompt: String,
        layout: Option<ChoiceLayout>,
    },
    ShowSummary {
        text: String,
        edit_targets: Vec<EditTarget>,
        confirm: ConfirmAffordance,
    },
    ShowPlainMessage {
        text: String,
    },
}

impl PromptInstruction {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::ShowPlainMessage { text: text.into() }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, Self::ShowSummary { .. })
    }

    /// Question id when this asks a question.
    pub fn question_id(&self) -> Option<&str> {
        match self {
            Self::ShowQuestion { question_id, .. } => Some(question_id),
            _ => None,
        }
    }
}

/// Whether the reply replaces the message that triggered it or is sent as a
/// new message. Button presses edit in place; typed messages get a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    EditInPlace,
    SendNew,
}
