//! Conversation engine — the questionnaire state machine.
//!
//! Every operation takes the user's `Session` by `&mut` and returns the next
//! instruction. Lookups and range checks happen before any mutation, so an
//! `Err` leaves the session untouched.

use std::sync::Arc;

use tracing::debug;

use super::instruction::{ChoiceLayout, ConfirmAffordance, PromptInstruction};
use crate::catalog::{Catalog, QuestionDef};
use crate::error::EngineError;
use crate::session::{Session, SummarySnapshot};
use crate::summary::render_for_user;

/// Drives sessions through a fixed catalog.
#[derive(Debug, Clone)]
pub struct ConversationEngine {
    catalog: Arc<Catalog>,
}

impl ConversationEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Reset the session and ask the first question.
    pub fn start_session(&self, session: &mut Session) -> PromptInstruction {
        session.reset();
        self.prompt_at_cursor(session)
    }

    /// Single-select: record the choice and advance. Multi-select: toggle
    /// the choice in the pending buffer and redraw the same question.
    pub fn handle_choice(
        &self,
        session: &mut Session,
        question_id: &str,
        choice_index: usize,
    ) -> Result<PromptInstruction, EngineError> {
        let (index, question) = self.lookup(question_id)?;
        let choice = question
            .choice(choice_index)
            .ok_or_else(|| EngineError::IndexOutOfRange {
                question_id: question.id.clone(),
                index: choice_index,
                len: question.choice_count(),
            })?;

        if question.multi {
            let selected = session.toggle_pending(&question.id, choice);
            debug!(question_id, choice, selected, "Multi-select toggled");
            return Ok(self.question_prompt(question, session));
        }

        session.record(&question.id, choice);
        Ok(self.advance(session, index))
    }

    /// Commit the pending selections (possibly none) and advance.
    pub fn handle_multi_commit(
        &self,
        session: &mut Session,
        question_id: &str,
    ) -> Result<PromptInstruction, EngineError> {
        let (index, question) = self.lookup(question_id)?;
        if !question.multi {
            return Err(EngineError::NotMultiSelect {
                id: question.id.clone(),
            });
        }

        session.commit_pending(&question.id);
        Ok(self.advance(session, index))
    }

    /// Record typed text for the current question (the edit target when
    /// editing) and advance.
    pub fn handle_free_text(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<PromptInstruction, EngineError> {
        let (index, question) = match &session.editing_target {
            Some(target) => self.lookup(target)?,
            None => {
                let question = self
                    .catalog
                    .get(session.cursor)
                    .ok_or(EngineError::NoActiveQuestion)?;
                (session.cursor, question)
            }
        };

        session.pending_selections.remove(&question.id);
        session.record(&question.id, text.trim());
        Ok(self.advance(session, index))
    }

    /// Enter edit mode for `question_id` and re-ask it.
    pub fn begin_edit(
        &self,
        session: &mut Session,
        question_id: &str,
    ) -> Result<PromptInstruction, EngineError> {
        let (index, question) = self.lookup(question_id)?;
        session.editing_target = Some(question.id.clone());
        session.cursor = index;
        session.pending_selections.remove(&question.id);
        Ok(self.question_prompt(question, session))
    }

    /// Snapshot the answers once every question has been answered.
    pub fn confirm(&self, session: &Session) -> Result<SummarySnapshot, EngineError> {
        if session.cursor < self.catalog.len() {
            return Err(EngineError::IncompleteFlow {
                cursor: session.cursor,
                total: self.catalog.len(),
            });
        }
        Ok(session.snapshot())
    }

    /// Discard all progress and ask the first question again.
    pub fn reset(&self, session: &mut Session) -> PromptInstruction {
        session.reset();
        self.prompt_at_cursor(session)
    }

    /// Summary of the answers so far, with edit and confirm buttons.
    pub fn summary(&self, session: &Session) -> PromptInstruction {
        let summary = render_for_user(&self.catalog, &session.answers);
        PromptInstruction::ShowSummary {
            text: summary.text,
            edit_targets: summary.edit_targets,
            confirm: ConfirmAffordance::default(),
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn lookup(&self, question_id: &str) -> Result<(usize, &QuestionDef), EngineError> {
        self.catalog
            .find(question_id)
            .ok_or_else(|| EngineError::UnknownQuestion {
                id: question_id.to_string(),
            })
    }

    /// Move past the question at `answered` once its answer is recorded.
    ///
    /// Only an answer to the question under the cursor moves the cursor; an
    /// answer from an older message is kept but the flow stays where it is.
    fn advance(&self, session: &mut Session, answered: usize) -> PromptInstruction {
        if let Some(target) = session.editing_target.clone() {
            if self.catalog.get(answered).is_some_and(|q| q.id == target) {
                session.editing_target = None;
                session.cursor = self.first_unanswered(session);
            }
            return self.prompt_at_cursor(session);
        }

        if answered == session.cursor {
            session.cursor += 1;
        }
        self.prompt_at_cursor(session)
    }

    /// Index of the first question without an answer, or the catalog length.
    fn first_unanswered(&self, session: &Session) -> usize {
        self.catalog
            .questions()
            .iter()
            .position(|q| !session.answers.contains_key(&q.id))
            .unwrap_or(self.catalog.len())
    }

    fn prompt_at_cursor(&self, session: &Session) -> PromptInstruction {
        match self.catalog.get(session.cursor) {
            Some(question) => self.question_prompt(question, session),
            None => self.summary(session),
        }
    }

    fn question_prompt(&self, question: &QuestionDef, session: &Session) -> PromptInstruction {
        PromptInstruction::ShowQuestion {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            layout: ChoiceLayout::for_question(question, session.pending_for(&question.id)),
        }
    }
}
