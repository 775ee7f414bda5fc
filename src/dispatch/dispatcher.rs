//! Dispatcher — renders the operator report and fans it out once per
//! confirmation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use super::{Confirmation, LeadId, LeadSink, NoopLeadSink, Notifier};
use crate::error::DispatchError;
use crate::summary::{OperatorLayout, render_for_operator};

/// Default bound on each external call.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Outcome of one dispatch, for logs and tests.
#[derive(Debug)]
pub struct DispatchReport {
    pub confirmation_id: Uuid,
    /// Exactly what was (or would have been) sent to the operator.
    pub operator_text: String,
    pub notified: bool,
    pub lead_id: Option<LeadId>,
    pub errors: Vec<DispatchError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Dispatcher {
    notifier: Option<Arc<dyn Notifier>>,
    lead_sink: Arc<dyn LeadSink>,
    layout: OperatorLayout,
    timeout: Duration,
}

impl Dispatcher {
    /// A dispatcher with no destination and no CRM. Reports are rendered and
    /// logged only.
    pub fn new(layout: OperatorLayout) -> Self {
        Self {
            notifier: None,
            lead_sink: Arc::new(NoopLeadSink),
            layout,
            timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_lead_sink(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.lead_sink = sink;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether reports have somewhere to go.
    pub fn has_notifier(&self) -> bool {
        self.notifier.is_some()
    }

    /// Create the CRM lead, then notify the operator with the report and a
    /// note about the lead. One attempt each, no retries.
    pub async fn dispatch(&self, confirmation: &Confirmation) -> DispatchReport {
        let report_text = render_for_operator(&self.layout, &confirmation.snapshot);
        let mut errors = Vec::new();

        let lead = bounded(
            self.timeout,
            "CRM lead creation",
            self.lead_sink
                .create_lead(&confirmation.snapshot, &report_text),
        )
        .await;

        let mut operator_text = report_text;
        let lead_id = match lead {
            Ok(Some(id)) => {
                info!(
                    confirmation_id = %confirmation.id,
                    sink = self.lead_sink.name(),
                    lead_id = %id,
                    "CRM lead created"
                );
                operator_text.push_str(&format!("\n🔗 CRM lead: {id}"));
                Some(id)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    confirmation_id = %confirmation.id,
                    sink = self.lead_sink.name(),
                    "CRM lead creation failed: {e}"
                );
                operator_text.push_str(&format!("\n⚠️ CRM: {e}"));
                errors.push(e);
                None
            }
        };

        let notified = match &self.notifier {
            Some(notifier) => {
                match bounded(self.timeout, "Operator notification", notifier.notify(&operator_text))
                    .await
                {
                    Ok(()) => {
                        info!(
                            confirmation_id = %confirmation.id,
                            user = %confirmation.user,
                            destination = %notifier.destination(),
                            "Brief delivered to operator"
                        );
                        true
                    }
                    Err(e) => {
                        warn!(
                            confirmation_id = %confirmation.id,
                            destination = %notifier.destination(),
                            "Operator notification failed: {e}"
                        );
                        errors.push(e);
                        false
                    }
                }
            }
            None => {
                warn!(
                    confirmation_id = %confirmation.id,
                    "No operator destination configured; brief not delivered"
                );
                false
            }
        };

        DispatchReport {
            confirmation_id: confirmation.id,
            operator_text,
            notified,
            lead_id,
            errors,
        }
    }
}

/// Run `fut`, failing with `DispatchError::Timeout` after `timeout`.
async fn bounded<T>(
    timeout: Duration,
    target: &str,
    fut: impl Future<Output = Result<T, DispatchError>>,
) -> Result<T, DispatchError> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| DispatchError::Timeout {
            target: target.to_string(),
            timeout,
        })?
}
