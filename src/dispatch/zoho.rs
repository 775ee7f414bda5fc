//! Zoho CRM lead sink.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{LeadId, LeadSink};
use crate::error::DispatchError;
use crate::session::SummarySnapshot;

/// Where and how to create leads.
#[derive(Debug, Clone)]
pub struct ZohoConfig {
    /// e.g. `https://www.zohoapis.com` (or the `.eu` / `.in` data centre).
    pub api_base: String,
    /// Target record type, `Leads` unless configured otherwise.
    pub module: String,
    pub access_token: SecretString,
    /// Question whose answer becomes the lead's company and last name.
    pub name_field: String,
}

pub struct ZohoLeadSink {
    config: ZohoConfig,
    client: reqwest::Client,
}

impl ZohoLeadSink {
    pub fn new(config: ZohoConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn records_url(&self) -> String {
        format!(
            "{}/crm/v2/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.module
        )
    }
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    #[serde(default)]
    data: Vec<InsertResult>,
}

#[derive(Debug, Deserialize)]
struct InsertResult {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<InsertDetails>,
}

#[derive(Debug, Deserialize)]
struct InsertDetails {
    id: Option<String>,
}

/// Request body for one lead.
fn lead_payload(snapshot: &SummarySnapshot, summary_text: &str, name_field: &str) -> serde_json::Value {
    let company = snapshot
        .get(name_field)
        .map(ToString::to_string)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unnamed brief".to_string());

    serde_json::json!({
        "data": [{
            "Last_Name": company,
            "Company": company,
            "Lead_Source": "Telegram bot",
            "Description": summary_text,
        }]
    })
}

fn parse_insert_response(body: &str) -> Result<Option<LeadId>, DispatchError> {
    let parsed: InsertResponse =
        serde_json::from_str(body).map_err(|e| DispatchError::CrmFailure {
            reason: format!("unreadable response: {e}"),
        })?;

    let Some(first) = parsed.data.into_iter().next() else {
        return Ok(None);
    };

    if first.status != "success" {
        return Err(DispatchError::CrmFailure {
            reason: format!("{}: {}", first.status, first.message),
        });
    }

    Ok(first.details.and_then(|d| d.id).map(LeadId))
}

#[async_trait]
impl LeadSink for ZohoLeadSink {
    fn name(&self) -> &str {
        "zoho"
    }

    async fn create_lead(
        &self,
        snapshot: &SummarySnapshot,
        summary_text: &str,
    ) -> Result<Option<LeadId>, DispatchError> {
        let body = lead_payload(snapshot, summary_text, &self.config.name_field);
        debug!(url = %self.records_url(), "Creating CRM lead");

        let resp = self
            .client
            .post(self.records_url())
            .header(
                "Authorization",
                format!("Zoho-oauthtoken {}", self.config.access_token.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError::CrmFailure {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DispatchError::CrmFailure {
                reason: format!("{status}: {text}"),
            });
        }

        parse_insert_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Answer;

    fn config() -> ZohoConfig {
        ZohoConfig {
            api_base: "https://www.zohoapis.eu/".into(),
            module: "Leads".into(),
            access_token: SecretString::from("token".to_string()),
            name_field: "company_name".into(),
        }
    }

    #[test]
    fn records_url_trims_slash() {
        let sink = ZohoLeadSink::new(config());
        assert_eq!(sink.records_url(), "https://www.zohoapis.eu/crm/v2/Leads");
        assert_eq!(sink.name(), "zoho");
    }

    #[test]
    fn payload_uses_company_answer() {
        let mut snapshot = SummarySnapshot::default();
        snapshot
            .answers
            .insert("company_name".into(), Answer::Single("Acme".into()));

        let body = lead_payload(&snapshot, "report", "company_name");
        assert_eq!(body["data"][0]["Company"], "Acme");
        assert_eq!(body["data"][0]["Last_Name"], "Acme");
        assert_eq!(body["data"][0]["Description"], "report");
    }

    #[test]
    fn payload_falls_back_without_company() {
        let body = lead_payload(&SummarySnapshot::default(), "report", "company_name");
        assert_eq!(body["data"][0]["Company"], "Unnamed brief");
    }

    #[test]
    fn parses_success_response() {
        let body = r#"{"data":[{"code":"SUCCESS","details":{"id":"4150868000000225013"},"message":"record added","status":"success"}]}"#;
        assert_eq!(
            parse_insert_response(body).unwrap(),
            Some(LeadId("4150868000000225013".into()))
        );
    }

    #[test]
    fn parses_error_response() {
        let body = r#"{"data":[{"code":"MANDATORY_NOT_FOUND","details":{},"message":"required field not found","status":"error"}]}"#;
        let err = parse_insert_response(body).unwrap_err();
        assert!(err.to_string().contains("required field not found"));
    }

    #[test]
    fn garbage_response_is_crm_failure() {
        assert!(matches!(
            parse_insert_response("<html>"),
            Err(DispatchError::CrmFailure { .. })
        ));
    }
}
