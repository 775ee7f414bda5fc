//! Operator report sent to the admin chat on confirmation.
//!
//! The report is a fixed layout over a list of `(question id, label)` pairs.
//! The default list below is tied to the e-commerce catalog's question ids:
//! renaming or removing one of those questions silently turns its line into
//! a placeholder, so a catalog with a different schema should ship its own
//! `operator_fields`.

use serde::Serialize;

use crate::catalog::{Catalog, OperatorField};
use crate::session::SummarySnapshot;

/// Shown for fields with no (or an empty) answer.
pub const PLACEHOLDER: &str = "—";

/// Business fields of the e-commerce brief, in report order.
const ECOMMERCE_FIELDS: &[(&str, &str)] = &[
    ("company_name", "🏷️ *Brand*"),
    ("region", "🌍 *Regions*"),
    ("catalog_size", "🛒 *Catalog*"),
    ("platform", "🧱 *Platform*"),
    ("payments", "💳 *Payments*"),
    ("currencies", "💱 *Currencies*"),
    ("shipping", "🚚 *Logistics*"),
    ("languages", "🗣️ *Languages*"),
    ("deadline", "📅 *Deadline*"),
    ("budget_range", "💰 *Budget*"),
    ("categories", "🏷️ Categories"),
    ("attributes", "🧵 Attributes/filters"),
    ("shipping_rules", "📦 Shipping rules"),
    ("taxes", "🧾 Taxes"),
    ("legal", "⚖️ Legal"),
    ("marketing", "📈 Marketing"),
    ("brand_assets", "🎨 Brand assets"),
    ("content", "📷 Content"),
    ("discount_logic", "🏷️ Discounts"),
    ("return_policy", "🔁 Returns"),
];

pub fn default_operator_fields() -> Vec<OperatorField> {
    ECOMMERCE_FIELDS
        .iter()
        .map(|(id, label)| OperatorField::new(*id, *label))
        .collect()
}

/// Heading plus ordered field list for the operator report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorLayout {
    pub heading: String,
    pub fields: Vec<OperatorField>,
}

impl OperatorLayout {
    /// Use the catalog's own field list when it has one, the e-commerce
    /// defaults otherwise.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self {
            heading: format!("🐾 *New project: {}*", catalog.title()),
            fields: catalog
                .operator_fields()
                .map(<[OperatorField]>::to_vec)
                .unwrap_or_else(default_operator_fields),
        }
    }
}

/// Render the report. Same snapshot in, same bytes out.
pub fn render_for_operator(layout: &OperatorLayout, snapshot: &SummarySnapshot) -> String {
    let mut out = String::with_capacity(64 * (layout.fields.len() + 1));
    out.push_str(&layout.heading);
    out.push_str("\n\n");

    for field in &layout.fields {
        let value = snapshot
            .get(&field.id)
            .map(ToString::to_string)
            .filter(|v| !v.trim().is_empty());
        out.push_str(&field.label);
        out.push_str(": ");
        out.push_str(value.as_deref().unwrap_or(PLACEHOLDER));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestionDef;
    use crate::session::Answer;

    fn snapshot(pairs: &[(&str, Answer)]) -> SummarySnapshot {
        SummarySnapshot {
            answers: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn shop_catalog() -> Catalog {
        Catalog::new(
            "E-commerce",
            vec![QuestionDef::free_text("company_name", "🏷️ Brand?")],
        )
        .unwrap()
    }

    #[test]
    fn default_layout_covers_business_fields() {
        let layout = OperatorLayout::for_catalog(&shop_catalog());
        assert_eq!(layout.fields.len(), 20);
        assert_eq!(layout.fields[0].id, "company_name");
        assert_eq!(layout.fields[19].id, "return_policy");
        assert_eq!(layout.heading, "🐾 *New project: E-commerce*");
    }

    #[test]
    fn missing_fields_use_placeholder() {
        let layout = OperatorLayout::for_catalog(&shop_catalog());
        let text = render_for_operator(
            &layout,
            &snapshot(&[
                ("company_name", Answer::Single("Acme".into())),
                (
                    "payments",
                    Answer::Multi(vec!["Cards".into(), "PayPal".into()]),
                ),
            ]),
        );

        assert!(text.contains("🏷️ *Brand*: Acme\n"));
        assert!(text.contains("💳 *Payments*: Cards, PayPal\n"));
        assert!(text.contains("🌍 *Regions*: —\n"));
        assert!(text.contains("🔁 Returns: —\n"));
    }

    #[test]
    fn empty_multi_answer_uses_placeholder() {
        let layout = OperatorLayout::for_catalog(&shop_catalog());
        let text = render_for_operator(&layout, &snapshot(&[("payments", Answer::Multi(vec![]))]));
        assert!(text.contains("💳 *Payments*: —\n"));
    }

    #[test]
    fn catalog_fields_override_defaults() {
        let catalog = shop_catalog().with_operator_fields(vec![
            OperatorField::new("company_name", "Company"),
            OperatorField::new("phone", "Phone"),
        ]);
        let layout = OperatorLayout::for_catalog(&catalog);
        let text = render_for_operator(
            &layout,
            &snapshot(&[("company_name", Answer::Single("Acme".into()))]),
        );
        assert_eq!(
            text,
            "🐾 *New project: E-commerce*\n\nCompany: Acme\nPhone: —\n"
        );
    }

    #[test]
    fn rendering_is_reproducible() {
        let layout = OperatorLayout::for_catalog(&shop_catalog());
        let snap = snapshot(&[("deadline", Answer::Single("Q3".into()))]);
        assert_eq!(
            render_for_operator(&layout, &snap),
            render_for_operator(&layout, &snap)
        );
    }
}
