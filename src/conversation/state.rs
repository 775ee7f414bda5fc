//! Where a session stands in the questionnaire.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::session::Session;

/// Derived view of a session's position.
///
/// Collecting → (AwaitingMultiCommit) → … → Complete. `Complete` is not
/// terminal: an edit request moves to `Editing`, a reset back to
/// `Collecting(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "at", rename_all = "snake_case")]
pub enum FlowState {
    Collecting(usize),
    /// A multi-select question at this index has toggled choices waiting for
    /// "next".
    AwaitingMultiCommit(usize),
    Editing(String),
    Complete,
}

impl FlowState {
    pub fn of(session: &Session, catalog: &Catalog) -> Self {
        if let Some(target) = &session.editing_target {
            return Self::Editing(target.clone());
        }
        match catalog.get(session.cursor) {
            None => Self::Complete,
            Some(q) if q.multi && session.pending_selections.contains_key(&q.id) => {
                Self::AwaitingMultiCommit(session.cursor)
            }
            Some(_) => Self::Collecting(session.cursor),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collecting(i) => write!(f, "collecting({i})"),
            Self::AwaitingMultiCommit(i) => write!(f, "awaiting_multi_commit({i})"),
            Self::Editing(id) => write!(f, "editing({id})"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestionDef;

    fn catalog() -> Catalog {
        Catalog::new(
            "t",
            vec![
                QuestionDef::free_text("name", "Name?"),
                QuestionDef::multi("colors", "Colors?", ["Red", "Blue"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn fresh_session_is_collecting() {
        assert_eq!(
            FlowState::of(&Session::new(), &catalog()),
            FlowState::Collecting(0)
        );
    }

    #[test]
    fn pending_multi_is_awaiting_commit() {
        let mut s = Session::new();
        s.cursor = 1;
        assert_eq!(FlowState::of(&s, &catalog()), FlowState::Collecting(1));
        s.toggle_pending("colors", "Red");
        assert_eq!(
            FlowState::of(&s, &catalog()),
            FlowState::AwaitingMultiCommit(1)
        );
    }

    #[test]
    fn end_of_catalog_is_complete() {
        let s = Session {
            cursor: 2,
            ..Default::default()
        };
        assert!(FlowState::of(&s, &catalog()).is_complete());
    }

    #[test]
    fn editing_wins() {
        let s = Session {
            cursor: 0,
            editing_target: Some("name".into()),
            ..Default::default()
        };
        assert_eq!(
            FlowState::of(&s, &catalog()),
            FlowState::Editing("name".into())
        );
        assert_eq!(FlowState::of(&s, &catalog()).to_string(), "editing(name)");
    }
}
