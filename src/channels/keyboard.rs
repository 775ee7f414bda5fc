//! Instruction → Telegram message text and inline keyboard.

use serde_json::{Value, json};

use super::callback::CallbackAction;
use crate::conversation::{BUTTONS_PER_ROW, ChoiceLayout, ConfirmAffordance, PromptInstruction};
use crate::summary::EditTarget;

pub const NEXT_LABEL: &str = "Next ▶️";
pub const SELECTED_MARK: &str = "✅ ";
pub const EDIT_MARK: &str = "✏️ ";

/// Text plus optional `reply_markup` for an instruction.
pub fn render(instruction: &PromptInstruction) -> (String, Option<Value>) {
    match instruction {
        PromptInstruction::ShowQuestion { prompt, layout, .. } => {
            (prompt.clone(), layout.as_ref().map(choice_keyboard))
        }
        PromptInstruction::ShowSummary {
            text,
            edit_targets,
            confirm,
        } => (text.clone(), Some(summary_keyboard(edit_targets, confirm))),
        PromptInstruction::ShowPlainMessage { text } => (text.clone(), None),
    }
}

fn button(text: impl Into<String>, action: CallbackAction) -> Value {
    json!({ "text": text.into(), "callback_data": action.encode() })
}

fn choice_keyboard(layout: &ChoiceLayout) -> Value {
    let mut rows: Vec<Vec<Value>> = layout
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| {
                    let label = if b.selected {
                        format!("{SELECTED_MARK}{}", b.label)
                    } else {
                        b.label.clone()
                    };
                    button(
                        label,
                        CallbackAction::Choice {
                            question_id: layout.question_id.clone(),
                            index: b.index,
                        },
                    )
                })
                .collect()
        })
        .collect();

    if layout.commit_button {
        rows.push(vec![button(
            NEXT_LABEL,
            CallbackAction::Commit {
                question_id: layout.question_id.clone(),
            },
        )]);
    }

    json!({ "inline_keyboard": rows })
}

fn summary_keyboard(edit_targets: &[EditTarget], confirm: &ConfirmAffordance) -> Value {
    let edit_buttons: Vec<Value> = edit_targets
        .iter()
        .map(|t| {
            button(
                format!("{EDIT_MARK}{}", t.label),
                CallbackAction::Edit {
                    question_id: t.question_id.clone(),
                },
            )
        })
        .collect();

    let mut rows: Vec<Vec<Value>> = edit_buttons
        .chunks(BUTTONS_PER_ROW)
        .map(<[Value]>::to_vec)
        .collect();
    rows.push(vec![
        button(confirm.confirm_label.clone(), CallbackAction::Confirm),
        button(confirm.reset_label.clone(), CallbackAction::Reset),
    ]);

    json!({ "inline_keyboard": rows })
}
