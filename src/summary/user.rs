//! End-user summary shown before confirmation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{Catalog, QuestionDef};
use crate::session::Answer;

/// An "edit this question" affordance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditTarget {
    pub question_id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub text: String,
    /// One entry per catalog question, in catalog order.
    pub edit_targets: Vec<EditTarget>,
}

/// Render the answered questions in catalog order. Unanswered questions are
/// skipped.
pub fn render_for_user(catalog: &Catalog, answers: &BTreeMap<String, Answer>) -> UserSummary {
    let mut blocks = vec![format!(
        "🐾 Let's check everything and make it perfect!\n\n*Project type:* {}",
        catalog.title()
    )];

    for q in catalog.questions() {
        let Some(answer) = answers.get(&q.id) else {
            continue;
        };
        blocks.push(format!(
            "{} *{}*\n— _{}_",
            q.label(),
            prompt_body(q),
            answer
        ));
    }

    UserSummary {
        text: blocks.join("\n\n"),
        edit_targets: edit_targets(catalog),
    }
}

/// Question id → short label for every question in the catalog.
pub fn edit_targets(catalog: &Catalog) -> Vec<EditTarget> {
    catalog
        .questions()
        .iter()
        .map(|q| EditTarget {
            question_id: q.id.clone(),
            label: q.label().to_string(),
        })
        .collect()
}

/// Prompt text without its leading label, or the whole prompt when it is a
/// single word.
fn prompt_body(q: &QuestionDef) -> &str {
    let prompt = q.prompt.trim();
    match prompt.split_once(char::is_whitespace) {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim_start(),
        _ => prompt,
    }
}
