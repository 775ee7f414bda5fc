//! Per-user questionnaire progress.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator used when a multi-select answer is shown as one line.
pub const MULTI_SEPARATOR: &str = ", ";

/// A committed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// A single choice or free text.
    Single(String),
    /// An ordered set of choices, in the order they were toggled on.
    Multi(Vec<String>),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.write_str(value),
            Self::Multi(values) => f.write_str(&values.join(MULTI_SEPARATOR)),
        }
    }
}

/// Mutable progress record for one user.
///
/// `cursor` points at the next unanswered question and equals the catalog
/// length once everything is answered. While `editing_target` is set the
/// cursor sits on that question's index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub answers: BTreeMap<String, Answer>,
    pub cursor: usize,
    /// Toggled but not yet committed choices, per multi-select question.
    pub pending_selections: HashMap<String, Vec<String>>,
    pub editing_target: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the state of a freshly started session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Toggle `choice` in the pending buffer for `question_id`.
    ///
    /// Returns whether the choice is selected after the toggle. Re-selecting
    /// a choice appends it at the end.
    pub fn toggle_pending(&mut self, question_id: &str, choice: &str) -> bool {
        let selected = self
            .pending_selections
            .entry(question_id.to_string())
            .or_default();
        if let Some(pos) = selected.iter().position(|c| c == choice) {
            selected.remove(pos);
            false
        } else {
            selected.push(choice.to_string());
            true
        }
    }

    pub fn pending_for(&self, question_id: &str) -> &[String] {
        self.pending_selections
            .get(question_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Move the pending buffer into `answers`, replacing any earlier answer.
    pub fn commit_pending(&mut self, question_id: &str) {
        let selected = self
            .pending_selections
            .remove(question_id)
            .unwrap_or_default();
        self.answers
            .insert(question_id.to_string(), Answer::Multi(selected));
    }

    pub fn record(&mut self, question_id: &str, value: impl Into<String>) {
        self.answers
            .insert(question_id.to_string(), Answer::Single(value.into()));
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// Immutable copy of the committed answers.
    pub fn snapshot(&self) -> SummarySnapshot {
        SummarySnapshot {
            answers: self.answers.clone(),
        }
    }
}

/// Answers frozen at confirmation time, fed to the renderers and dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySnapshot {
    pub answers: BTreeMap<String, Answer>,
}

impl SummarySnapshot {
    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
