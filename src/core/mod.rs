pub mod aggregator;
pub mod etl;
pub mod flatten;
pub mod orchestrator;
pub mod pagination;

pub use crate::domain::model::{FlattenedRecord, RunReport, TenantSummary};
pub use crate::domain::ports::{ApiConnector, Notifier, ResultSink, Storage, ZoneApi};
pub use crate::utils::error::Result;
