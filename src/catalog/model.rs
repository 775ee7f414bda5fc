//! Question definitions and the validated catalog.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Telegram's limit on inline-button callback data.
pub const MAX_CALLBACK_DATA_BYTES: usize = 64;

/// A single question as it appears in the catalog file.
///
/// `text` and `options` are the catalog file's field names; in code they are
/// `prompt` and `choices`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionDef {
    pub id: String,
    #[serde(rename = "text")]
    pub prompt: String,
    /// Absent means the question expects free text.
    #[serde(default, rename = "options", skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub multi: bool,
}

impl QuestionDef {
    pub fn free_text(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            choices: None,
            multi: false,
        }
    }

    pub fn single<S: Into<String>>(
        id: impl Into<String>,
        prompt: impl Into<String>,
        choices: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            choices: Some(choices.into_iter().map(Into::into).collect()),
            multi: false,
        }
    }

    pub fn multi<S: Into<String>>(
        id: impl Into<String>,
        prompt: impl Into<String>,
        choices: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            multi: true,
            ..Self::single(id, prompt, choices)
        }
    }

    /// Short label used on edit buttons: the prompt's leading glyph or word.
    pub fn label(&self) -> &str {
        self.prompt.split_whitespace().next().unwrap_or(&self.id)
    }

    pub fn is_free_text(&self) -> bool {
        self.choices.is_none()
    }

    pub fn choice(&self, index: usize) -> Option<&str> {
        self.choices.as_ref()?.get(index).map(String::as_str)
    }

    pub fn choice_count(&self) -> usize {
        self.choices.as_ref().map_or(0, Vec::len)
    }

    /// Length of the longest button payload this question produces: the
    /// last option's `opt:` data, or `edit:` for free text.
    fn longest_callback_data(&self) -> usize {
        match self.choice_count() {
            0 => format!("edit:{}", self.id).len(),
            n => format!("opt:{}:{}", self.id, n - 1).len(),
        }
    }
}

/// One line of the operator report: which answer to show and under what label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatorField {
    pub id: String,
    pub label: String,
}

impl OperatorField {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// An ordered, validated set of questions.
///
/// Catalog order is the question sequence and never changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    title: String,
    questions: Vec<QuestionDef>,
    operator_fields: Option<Vec<OperatorField>>,
}

impl Catalog {
    /// Build a catalog, rejecting empty lists, duplicate ids, ids too long
    /// for button data and malformed choice definitions.
    pub fn new(title: impl Into<String>, questions: Vec<QuestionDef>) -> Result<Self, CatalogError> {
        let title = title.into();
        if questions.is_empty() {
            return Err(CatalogError::Empty { name: title });
        }

        let mut seen = HashSet::new();
        for q in &questions {
            if q.id.trim().is_empty() {
                return Err(CatalogError::InvalidQuestion {
                    id: q.id.clone(),
                    reason: "empty id".into(),
                });
            }
            if !seen.insert(q.id.as_str()) {
                return Err(CatalogError::DuplicateId { id: q.id.clone() });
            }
            let data_len = q.longest_callback_data();
            if data_len > MAX_CALLBACK_DATA_BYTES {
                return Err(CatalogError::InvalidQuestion {
                    id: q.id.clone(),
                    reason: format!(
                        "button data needs {data_len} bytes, Telegram allows {MAX_CALLBACK_DATA_BYTES}"
                    ),
                });
            }
            match &q.choices {
                Some(choices) if choices.is_empty() => {
                    return Err(CatalogError::InvalidQuestion {
                        id: q.id.clone(),
                        reason: "options list is empty".into(),
                    });
                }
                None if q.multi => {
                    return Err(CatalogError::InvalidQuestion {
                        id: q.id.clone(),
                        reason: "multi-select question has no options".into(),
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            title,
            questions,
            operator_fields: None,
        })
    }

    /// Override the operator report layout for this catalog.
    pub fn with_operator_fields(mut self, fields: Vec<OperatorField>) -> Self {
        self.operator_fields = Some(fields);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[QuestionDef] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionDef> {
        self.questions.get(index)
    }

    /// Look up a question and its position in the sequence.
    pub fn find(&self, id: &str) -> Option<(usize, &QuestionDef)> {
        self.questions.iter().enumerate().find(|(_, q)| q.id == id)
    }

    pub fn operator_fields(&self) -> Option<&[OperatorField]> {
        self.operator_fields.as_deref()
    }
}
