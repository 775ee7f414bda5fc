//! Summary rendering — pure functions over session answers.

pub mod operator;
pub mod user;

pub use operator::{OperatorLayout, PLACEHOLDER, default_operator_fields, render_for_operator};
pub use user::{EditTarget, UserSummary, edit_targets, render_for_user};
