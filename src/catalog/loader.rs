//! YAML catalog loading.
//!
//! A catalog file maps collection names to question sets:
//!
//! ```yaml
//! ecommerce:
//!   title: E-commerce store
//!   questions:
//!     - id: company_name
//!       text: "🏷️ What is your brand called?"
//!     - id: payments
//!       text: "💳 Which payment methods?"
//!       options: [Cards, PayPal]
//!       multi: true
//!   operator_fields:          # optional
//!     - { id: company_name, label: "Brand" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::model::{Catalog, OperatorField, QuestionDef};
use crate::error::CatalogError;

#[derive(Debug, Deserialize)]
struct CollectionDoc {
    title: String,
    questions: Vec<QuestionDef>,
    #[serde(default)]
    operator_fields: Option<Vec<OperatorField>>,
}

/// Parse the named collection out of a YAML catalog document.
pub fn parse_catalog(yaml: &str, name: &str) -> Result<Catalog, CatalogError> {
    let mut doc: BTreeMap<String, CollectionDoc> = serde_yaml::from_str(yaml)?;

    let Some(collection) = doc.remove(name) else {
        return Err(CatalogError::MissingCollection {
            name: name.to_string(),
            available: doc.keys().cloned().collect::<Vec<_>>().join(", "),
        });
    };

    let catalog = Catalog::new(collection.title, collection.questions)?;
    Ok(match collection.operator_fields {
        Some(fields) => catalog.with_operator_fields(fields),
        None => catalog,
    })
}

/// Read and parse a catalog file from disk.
pub async fn load_catalog(path: &Path, name: &str) -> Result<Catalog, CatalogError> {
    let yaml = tokio::fs::read_to_string(path).await?;
    let catalog = parse_catalog(&yaml, name)?;
    info!(
        path = %path.display(),
        collection = name,
        questions = catalog.len(),
        "Question catalog loaded"
    );
    Ok(catalog)
}
