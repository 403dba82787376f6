use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned an error (HTTP {status}): {message}")]
    ApiResponseError { status: u16, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Authentication failed for tenant '{tenant_id}': {source}")]
    AuthenticationError {
        tenant_id: String,
        source: Box<EtlError>,
    },

    #[error("Enumeration failed for tenant '{tenant_id}' at page {page}: {cause}")]
    EnumerationError {
        tenant_id: String,
        page: u32,
        #[source]
        cause: Box<EtlError>,
    },

    #[error("Operation timed out after {seconds}s")]
    TimeoutError { seconds: u64 },

    #[error("No tenants were processed successfully ({configured} configured)")]
    NoTenantsProcessedError { configured: usize },

    #[error("Notification delivery failed: {message}")]
    NotificationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Enumeration,
    Data,
    Configuration,
    Io,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::ApiResponseError { .. } | EtlError::TimeoutError { .. } => {
                ErrorCategory::Network
            }
            EtlError::AuthenticationError { .. } => ErrorCategory::Authentication,
            EtlError::EnumerationError { .. } | EtlError::NoTenantsProcessedError { .. } => {
                ErrorCategory::Enumeration
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::NotificationError { .. } => ErrorCategory::Notification,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::NotificationError { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_)
            | EtlError::ApiResponseError { .. }
            | EtlError::TimeoutError { .. }
            | EtlError::AuthenticationError { .. }
            | EtlError::EnumerationError { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::NoTenantsProcessedError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 是否為逾時造成的錯誤（含被包裝在 EnumerationError 內的情況）
    pub fn is_timeout(&self) -> bool {
        match self {
            EtlError::TimeoutError { .. } => true,
            EtlError::ApiError(e) => e.is_timeout(),
            EtlError::EnumerationError { cause, .. } => cause.is_timeout(),
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the API base URL, then retry",
            ErrorCategory::Authentication => {
                "Verify the account's API token is active and has Zone:Read and DNS:Read permissions"
            }
            ErrorCategory::Enumeration => {
                "Check the account tokens and API availability; consider raising api.timeout_seconds"
            }
            ErrorCategory::Data => "Inspect the API response or output data for malformed values",
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::Io => "Check that the output path exists and is writable",
            ErrorCategory::Notification => {
                "Verify telegram_config.bot_token and chat_id; the CSV report was still written"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::NoTenantsProcessedError { configured } => format!(
                "None of the {} configured accounts could be processed. Check the configuration and API tokens.",
                configured
            ),
            EtlError::AuthenticationError { tenant_id, .. } => {
                format!("Account '{}' could not be authenticated.", tenant_id)
            }
            EtlError::EnumerationError { tenant_id, page, .. } => format!(
                "Listing zones for account '{}' failed on page {}.",
                tenant_id, page
            ),
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            EtlError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required.", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
