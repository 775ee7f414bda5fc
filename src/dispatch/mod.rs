//! Operator report delivery and optional CRM lead creation.
//!
//! Both collaborators are best effort: failures are logged and reported,
//! never rolled back into the user's confirmed flow.

pub mod dispatcher;
pub mod zoho;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::session::SummarySnapshot;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use zoho::{ZohoConfig, ZohoLeadSink};

/// Identifier of a record created in the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One confirm event, as handed to the dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub id: Uuid,
    pub user: String,
    pub confirmed_at: DateTime<Utc>,
    pub snapshot: SummarySnapshot,
}

impl Confirmation {
    pub fn new(user: impl Into<String>, snapshot: SummarySnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: user.into(),
            confirmed_at: Utc::now(),
            snapshot,
        }
    }
}

/// Delivers the rendered operator report somewhere a human will read it.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Where reports go, for logs.
    fn destination(&self) -> String;

    async fn notify(&self, text: &str) -> Result<(), DispatchError>;
}

/// Creates a CRM record from a confirmed brief.
#[async_trait]
pub trait LeadSink: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means nothing was created and that is not an error.
    async fn create_lead(
        &self,
        snapshot: &SummarySnapshot,
        summary_text: &str,
    ) -> Result<Option<LeadId>, DispatchError>;
}

/// Default sink when no CRM is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLeadSink;

#[async_trait]
impl LeadSink for NoopLeadSink {
    fn name(&self) -> &str {
        "none"
    }

    async fn create_lead(
        &self,
        _snapshot: &SummarySnapshot,
        _summary_text: &str,
    ) -> Result<Option<LeadId>, DispatchError> {
        Ok(None)
    }
}
