use crate::domain::model::{DnsRecord, Page, RunReport, Tenant, Zone};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Page-fetch capability for one authenticated tenant.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    async fn list_zones(&self, page: u32, per_page: u32) -> Result<Page<Zone>>;

    async fn list_dns_records(
        &self,
        zone_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<DnsRecord>>;
}

/// Exchanges a tenant's credentials for a ready-to-use API client.
#[async_trait]
pub trait ApiConnector: Send + Sync {
    type Api: ZoneApi + 'static;

    async fn connect(&self, tenant: &Tenant) -> Result<Self::Api>;
}

pub trait Storage: Send + Sync {
    /// Returns the full location the data was written to.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<()>;

    async fn send_document(&self, file_name: &str, data: Vec<u8>, caption: &str) -> Result<()>;
}

/// Consumes the merged results of a run. Returns where the report was written.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn consume(&self, report: &RunReport) -> Result<String>;
}
