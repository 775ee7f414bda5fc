//! Inline-button callback data.
//!
//! Wire format (Telegram allows 64 bytes):
//! `opt:{question}:{index}`, `next:{question}`, `edit:{question}`,
//! `confirm:yes`, `confirm:reset`.

use crate::conversation::InboundEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Choice { question_id: String, index: usize },
    Commit { question_id: String },
    Edit { question_id: String },
    Confirm,
    Reset,
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            Self::Choice { question_id, index } => format!("opt:{question_id}:{index}"),
            Self::Commit { question_id } => format!("next:{question_id}"),
            Self::Edit { question_id } => format!("edit:{question_id}"),
            Self::Confirm => "confirm:yes".to_string(),
            Self::Reset => "confirm:reset".to_string(),
        }
    }

    /// `None` for anything that is not one of ours.
    pub fn parse(data: &str) -> Option<Self> {
        let (prefix, rest) = data.split_once(':')?;
        match prefix {
            "opt" => {
                let (question_id, index) = rest.rsplit_once(':')?;
                Some(Self::Choice {
                    question_id: non_empty(question_id)?,
                    index: index.parse().ok()?,
                })
            }
            "next" => Some(Self::Commit {
                question_id: non_empty(rest)?,
            }),
            "edit" => Some(Self::Edit {
                question_id: non_empty(rest)?,
            }),
            "confirm" => match rest {
                "yes" => Some(Self::Confirm),
                "reset" => Some(Self::Reset),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn into_event(self, user: impl Into<String>) -> InboundEvent {
        let user = user.into();
        match self {
            Self::Choice { question_id, index } => InboundEvent::Choice {
                user,
                question_id,
                choice_index: index,
            },
            Self::Commit { question_id } => InboundEvent::MultiCommit { user, question_id },
            Self::Edit { question_id } => InboundEvent::EditRequest { user, question_id },
            Self::Confirm => InboundEvent::Confirm { user },
            Self::Reset => InboundEvent::Reset { user },
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action() {
        assert_eq!(
            CallbackAction::parse("opt:payments:3"),
            Some(CallbackAction::Choice {
                question_id: "payments".into(),
                index: 3
            })
        );
        assert_eq!(
            CallbackAction::parse("next:payments"),
            Some(CallbackAction::Commit {
                question_id: "payments".into()
            })
        );
        assert_eq!(
            CallbackAction::parse("edit:deadline"),
            Some(CallbackAction::Edit {
                question_id: "deadline".into()
            })
        );
        assert_eq!(CallbackAction::parse("confirm:yes"), Some(CallbackAction::Confirm));
        assert_eq!(CallbackAction::parse("confirm:reset"), Some(CallbackAction::Reset));
    }

    #[test]
    fn encode_matches_wire_format() {
        let action = CallbackAction::Choice {
            question_id: "region".into(),
            index: 0,
        };
        assert_eq!(action.encode(), "opt:region:0");
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
        assert_eq!(CallbackAction::Reset.encode(), "confirm:reset");
    }

    #[test]
    fn rejects_garbage() {
        for data in [
            "",
            "opt",
            "opt:payments",
            "opt:payments:x",
            "opt:payments:-1",
            "opt::1",
            "next:",
            "confirm:maybe",
            "vote:1",
        ] {
            assert_eq!(CallbackAction::parse(data), None, "{data:?} should not parse");
        }
    }

    #[test]
    fn into_event_carries_user() {
        let ev = CallbackAction::Edit {
            question_id: "name".into(),
        }
        .into_event("42");
        assert_eq!(
            ev,
            InboundEvent::EditRequest {
                user: "42".into(),
                question_id: "name".into()
            }
        );
    }
}
