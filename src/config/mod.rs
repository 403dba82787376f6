#[cfg(feature = "cli")]
pub mod cli;
pub mod report_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use report_config::{AccountConfig, ApiConfig, ReportConfig, TelegramConfig};
