//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::dispatch::ZohoConfig;
use crate::dispatch::dispatcher::DEFAULT_DISPATCH_TIMEOUT;
use crate::error::ConfigError;

const DEFAULT_CATALOG_PATH: &str = "questions.yaml";
const DEFAULT_CATALOG_NAME: &str = "ecommerce";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_CRM_MODULE: &str = "Leads";
const DEFAULT_CRM_API_BASE: &str = "https://www.zohoapis.com";
const DEFAULT_CRM_NAME_FIELD: &str = "company_name";

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Without a token only the health endpoints run.
    pub bot_token: Option<SecretString>,
    /// Telegram usernames or numeric ids; `*` allows everyone.
    pub allowed_users: Vec<String>,
    pub catalog_path: PathBuf,
    /// Top-level collection to load from the catalog file.
    pub catalog_name: String,
    /// Port for the health endpoints.
    pub http_port: u16,
    pub dispatch: DispatchConfig,
}

/// Where confirmed briefs go.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Chat (user, group or channel) receiving operator reports.
    pub operator_chat_id: Option<String>,
    pub timeout: Duration,
    pub crm: Option<ZohoConfig>,
}

impl BotConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = var("TELEGRAM_BOT_TOKEN").map(SecretString::from);

        let allowed_users: Vec<String> = var("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let catalog_path = var("BRIEF_CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
        let catalog_name =
            var("BRIEF_CATALOG_NAME").unwrap_or_else(|| DEFAULT_CATALOG_NAME.to_string());

        let http_port = match var("BRIEF_HTTP_PORT") {
            Some(v) => parse_value("BRIEF_HTTP_PORT", &v)?,
            None => DEFAULT_HTTP_PORT,
        };

        let timeout = match var("BRIEF_DISPATCH_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_value("BRIEF_DISPATCH_TIMEOUT_SECS", &v)?),
            None => DEFAULT_DISPATCH_TIMEOUT,
        };

        let crm_enabled = match var("CRM_ENABLED") {
            Some(v) => parse_bool("CRM_ENABLED", &v)?,
            None => false,
        };
        let crm = if crm_enabled {
            let access_token = var("CRM_ACCESS_TOKEN")
                .map(SecretString::from)
                .ok_or_else(|| ConfigError::MissingEnvVar("CRM_ACCESS_TOKEN".to_string()))?;
            Some(ZohoConfig {
                api_base: var("CRM_API_BASE").unwrap_or_else(|| DEFAULT_CRM_API_BASE.to_string()),
                module: var("CRM_MODULE").unwrap_or_else(|| DEFAULT_CRM_MODULE.to_string()),
                access_token,
                name_field: var("CRM_NAME_FIELD")
                    .unwrap_or_else(|| DEFAULT_CRM_NAME_FIELD.to_string()),
            })
        } else {
            None
        };

        Ok(Self {
            bot_token,
            allowed_users,
            catalog_path,
            catalog_name,
            http_port,
            dispatch: DispatchConfig {
                operator_chat_id: var("ADMIN_CHAT_ID"),
                timeout,
                crm,
            },
        })
    }

    pub fn allows_everyone(&self) -> bool {
        self.allowed_users.iter().any(|u| u == "*")
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{value:?}: {e}"),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value:?} is not a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_with_only_token() {
        let cfg = config(&[("TELEGRAM_BOT_TOKEN", "123:ABC")]).unwrap();
        let token = cfg.bot_token.as_ref().unwrap();
        assert_eq!(token.expose_secret(), "123:ABC");
        assert_eq!(cfg.allowed_users, vec!["*"]);
        assert!(cfg.allows_everyone());
        assert_eq!(cfg.catalog_path, PathBuf::from("questions.yaml"));
        assert_eq!(cfg.catalog_name, "ecommerce");
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.dispatch.timeout, Duration::from_secs(20));
        assert!(cfg.dispatch.operator_chat_id.is_none());
        assert!(cfg.dispatch.crm.is_none());
    }

    #[test]
    fn missing_token_still_loads() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.bot_token.is_none());
        assert_eq!(cfg.http_port, 8080);

        let cfg = config(&[("TELEGRAM_BOT_TOKEN", "   "), ("BRIEF_HTTP_PORT", "9000")]).unwrap();
        assert!(cfg.bot_token.is_none());
        assert_eq!(cfg.http_port, 9000);
    }

    #[test]
    fn allowed_users_are_split_and_trimmed() {
        let cfg = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_ALLOWED_USERS", " alice, 12345 ,,"),
        ])
        .unwrap();
        assert_eq!(cfg.allowed_users, vec!["alice", "12345"]);
        assert!(!cfg.allows_everyone());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config(&[("TELEGRAM_BOT_TOKEN", "t"), ("BRIEF_HTTP_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "BRIEF_HTTP_PORT"));

        let err = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("BRIEF_DISPATCH_TIMEOUT_SECS", "-1"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn operator_chat_and_timeout() {
        let cfg = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ADMIN_CHAT_ID", "-100123"),
            ("BRIEF_DISPATCH_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.dispatch.operator_chat_id.as_deref(), Some("-100123"));
        assert_eq!(cfg.dispatch.timeout, Duration::from_secs(5));
    }

    #[test]
    fn crm_requires_token_when_enabled() {
        let err = config(&[("TELEGRAM_BOT_TOKEN", "t"), ("CRM_ENABLED", "true")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "CRM_ACCESS_TOKEN"));

        let cfg = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("CRM_ENABLED", "yes"),
            ("CRM_ACCESS_TOKEN", "zoho"),
            ("CRM_API_BASE", "https://www.zohoapis.eu"),
        ])
        .unwrap();
        let crm = cfg.dispatch.crm.unwrap();
        assert_eq!(crm.api_base, "https://www.zohoapis.eu");
        assert_eq!(crm.module, "Leads");
        assert_eq!(crm.name_field, "company_name");
        assert_eq!(crm.access_token.expose_secret(), "zoho");
    }

    #[test]
    fn crm_disabled_ignores_token() {
        let cfg = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("CRM_ENABLED", "0"),
            ("CRM_ACCESS_TOKEN", "zoho"),
        ])
        .unwrap();
        assert!(cfg.dispatch.crm.is_none());
    }

    #[test]
    fn bad_bool_is_rejected() {
        let err = config(&[("TELEGRAM_BOT_TOKEN", "t"), ("CRM_ENABLED", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
