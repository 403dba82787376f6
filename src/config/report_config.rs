use crate::adapters::cloudflare::DEFAULT_API_BASE;
use crate::adapters::telegram::{DEFAULT_TELEGRAM_API, DEFAULT_TELEGRAM_TIMEOUT};
use crate::core::aggregator::{
    AggregatorOptions, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_RECORD_PAGE_SIZE,
    DEFAULT_TENANT_TIMEOUT, DEFAULT_ZONE_PAGE_SIZE,
};
use crate::domain::model::Tenant;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_unique,
    validate_url, Validate,
};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub cloudflare_accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub telegram_config: TelegramConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Clone, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub api_token: String,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("name", &self.name)
            .field("api_token", &"***")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    #[serde(default = "default_telegram_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_telegram_api(),
            timeout_seconds: default_telegram_timeout_seconds(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"***")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl TelegramConfig {
    pub fn is_complete(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_zone_page_size")]
    pub zone_page_size: u32,
    #[serde(default = "default_record_page_size")]
    pub record_page_size: u32,
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            timeout_seconds: default_timeout_seconds(),
            zone_page_size: default_zone_page_size(),
            record_page_size: default_record_page_size(),
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_telegram_api() -> String {
    DEFAULT_TELEGRAM_API.to_string()
}

fn default_telegram_timeout_seconds() -> u64 {
    DEFAULT_TELEGRAM_TIMEOUT.as_secs()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TENANT_TIMEOUT.as_secs()
}

fn default_zone_page_size() -> u32 {
    DEFAULT_ZONE_PAGE_SIZE
}

fn default_record_page_size() -> u32 {
    DEFAULT_RECORD_PAGE_SIZE
}

fn default_concurrent_requests() -> usize {
    DEFAULT_CONCURRENT_REQUESTS
}

impl ReportConfig {
    /// 從檔案載入配置，`.toml` 副檔名使用 TOML，其餘視為 JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        serde_json::from_str(&processed).map_err(|e| EtlError::ConfigError {
            message: format!("JSON parsing error: {}", e),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        toml::from_str(&processed).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CF_API_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn tenants(&self) -> Vec<Tenant> {
        self.cloudflare_accounts
            .iter()
            .map(|account| Tenant::new(account.name.clone(), account.api_token.clone()))
            .collect()
    }

    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            zone_page_size: self.api.zone_page_size,
            record_page_size: self.api.record_page_size,
            timeout: Duration::from_secs(self.api.timeout_seconds),
            concurrent_requests: self.api.concurrent_requests,
        }
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        if self.cloudflare_accounts.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "cloudflare_accounts".to_string(),
            });
        }

        for account in &self.cloudflare_accounts {
            validate_non_empty_string("cloudflare_accounts.name", &account.name)?;
            validate_non_empty_string(
                &format!("cloudflare_accounts[{}].api_token", account.name),
                &account.api_token,
            )?;
        }
        validate_unique(
            "cloudflare_accounts.name",
            self.cloudflare_accounts.iter().map(|a| a.name.as_str()),
        )?;

        validate_url("api.base_url", &self.api.base_url)?;
        validate_positive_number("api.timeout_seconds", self.api.timeout_seconds as usize, 1)?;
        validate_range("api.zone_page_size", self.api.zone_page_size, 5, 50)?;
        validate_range("api.record_page_size", self.api.record_page_size, 5, 5000)?;
        validate_positive_number("api.concurrent_requests", self.api.concurrent_requests, 1)?;

        if self.telegram_config.is_complete() {
            validate_url("telegram_config.api_base", &self.telegram_config.api_base)?;
            validate_positive_number(
                "telegram_config.timeout_seconds",
                self.telegram_config.timeout_seconds as usize,
                1,
            )?;
            if self.telegram_config.chat_id.trim().parse::<i64>().is_err() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "telegram_config.chat_id".to_string(),
                    value: self.telegram_config.chat_id.clone(),
                    reason: "Chat id must be an integer".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorSeverity;
    use std::io::Write;
    use tempfile::Builder;

    const JSON_CONFIG: &str = r#"{
        "cloudflare_accounts": [
            {"name": "main", "api_token": "token-main"},
            {"name": "legacy", "api_token": "token-legacy"}
        ],
        "telegram_config": {"bot_token": "123:abc", "chat_id": "-100200300"}
    }"#;

    #[test]
    fn test_json_config_with_defaults() {
        let config = ReportConfig::from_json_str(JSON_CONFIG).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "https://api.cloudflare.com/client/v4");
        assert_eq!(config.api.zone_page_size, 50);
        assert_eq!(config.api.record_page_size, 100);
        assert!(config.telegram_config.is_complete());
        assert_eq!(config.telegram_config.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram_config.timeout_seconds, 30);

        let tenants = config.tenants();
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].tenant_id, "main");
        assert_eq!(tenants[1].credentials.token(), "token-legacy");

        let options = config.aggregator_options();
        assert_eq!(options.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_toml_config_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[cloudflare_accounts]]
name = "main"
api_token = "token-main"

[api]
base_url = "http://127.0.0.1:9000"
timeout_seconds = 15
concurrent_requests = 2
"#
        )
        .unwrap();

        let config = ReportConfig::from_file(file.path()).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_seconds, 15);
        assert_eq!(config.api.concurrent_requests, 2);
        assert!(!config.telegram_config.is_complete());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ZONE_ETL_TEST_TOKEN", "from-env");
        let config = ReportConfig::from_json_str(
            r#"{"cloudflare_accounts": [
                {"name": "a", "api_token": "${ZONE_ETL_TEST_TOKEN}"},
                {"name": "b", "api_token": "${ZONE_ETL_TEST_UNSET_VAR}"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(config.cloudflare_accounts[0].api_token, "from-env");
        assert_eq!(config.cloudflare_accounts[1].api_token, "${ZONE_ETL_TEST_UNSET_VAR}");
    }

    #[test]
    fn test_duplicate_account_names_rejected() {
        let config = ReportConfig::from_json_str(
            r#"{"cloudflare_accounts": [
                {"name": "same", "api_token": "a"},
                {"name": "same", "api_token": "b"}
            ]}"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfigValueError { ref field, .. }) if field == "cloudflare_accounts.name"
        ));
    }

    #[test]
    fn test_validation_failures() {
        let empty = ReportConfig::from_json_str(r#"{"cloudflare_accounts": []}"#).unwrap();
        assert!(matches!(empty.validate(), Err(EtlError::MissingConfigError { .. })));

        let mut config = ReportConfig::from_json_str(JSON_CONFIG).unwrap();
        config.api.zone_page_size = 500;
        assert!(config.validate().is_err());

        let mut config = ReportConfig::from_json_str(JSON_CONFIG).unwrap();
        config.telegram_config.chat_id = "@channel".to_string();
        assert!(config.validate().is_err());

        let mut config = ReportConfig::from_json_str(JSON_CONFIG).unwrap();
        config.cloudflare_accounts[0].api_token = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_critical_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ReportConfig::from_file(dir.path().join("absent.json")).unwrap_err();

        assert!(matches!(err, EtlError::IoError(_)));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = ReportConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, EtlError::ConfigError { .. }));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let config = ReportConfig::from_json_str(JSON_CONFIG).unwrap();
        let rendered = format!("{:?}", config.cloudflare_accounts);
        assert!(!rendered.contains("token-main"));
    }
}
