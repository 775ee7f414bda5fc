//! The fixed, ordered question list driving a conversation.

pub mod loader;
pub mod model;

pub use loader::{load_catalog, parse_catalog};
pub use model::{Catalog, OperatorField, QuestionDef};
