pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::cloudflare::CloudflareConnector;
pub use adapters::storage::LocalStorage;
pub use adapters::telegram::TelegramNotifier;
pub use app::report::ReportSink;
pub use config::ReportConfig;
pub use core::aggregator::{AggregatorOptions, TenantAggregator};
pub use core::etl::{CompletedRun, EtlEngine};
pub use core::orchestrator::RunOrchestrator;
pub use utils::error::{EtlError, Result};
