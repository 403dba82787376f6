use crate::core::orchestrator::RunOrchestrator;
use crate::domain::model::{RunReport, Tenant};
use crate::domain::ports::{ApiConnector, ResultSink};
use crate::utils::error::Result;

#[derive(Debug)]
pub struct CompletedRun {
    pub report: RunReport,
    pub output_path: String,
}

pub struct EtlEngine<C: ApiConnector, K: ResultSink> {
    orchestrator: RunOrchestrator<C>,
    sink: K,
}

impl<C: ApiConnector, K: ResultSink> EtlEngine<C, K> {
    pub fn new(orchestrator: RunOrchestrator<C>, sink: K) -> Self {
        Self { orchestrator, sink }
    }

    /// Extract and merge every tenant, then hand the merged report to the sink.
    /// Nothing reaches the sink when no tenant could be processed.
    pub async fn run(&self, tenants: &[Tenant]) -> Result<CompletedRun> {
        tracing::info!("🚀 Starting inventory run for {} accounts", tenants.len());

        let report = self.orchestrator.run(tenants).await?;
        if report.rows.is_empty() {
            tracing::info!("No DNS records found; the CSV will only contain the header");
        } else {
            tracing::info!("Found {} DNS records in total", report.rows.len());
        }

        let output_path = self.sink.consume(&report).await?;
        tracing::info!("📁 Report written to: {}", output_path);

        Ok(CompletedRun {
            report,
            output_path,
        })
    }
}
