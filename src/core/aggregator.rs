use crate::core::flatten::flatten;
use crate::core::pagination::{PageCursor, FIRST_PAGE};
use crate::domain::model::{ChildEnumerationWarning, DnsRecord, Tenant, TenantOutcome, Zone};
use crate::domain::ports::{ApiConnector, ZoneApi};
use crate::utils::error::{EtlError, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_ZONE_PAGE_SIZE: u32 = 50;
pub const DEFAULT_RECORD_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TENANT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 4;

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub zone_page_size: u32,
    pub record_page_size: u32,
    /// Deadline for one tenant's whole enumeration, credential exchange included.
    pub timeout: Duration,
    /// Upper bound on zones whose DNS records are fetched at the same time.
    pub concurrent_requests: usize,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            zone_page_size: DEFAULT_ZONE_PAGE_SIZE,
            record_page_size: DEFAULT_RECORD_PAGE_SIZE,
            timeout: DEFAULT_TENANT_TIMEOUT,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
        }
    }
}

/// Enumerates every zone of one tenant together with its DNS records.
pub struct TenantAggregator<C: ApiConnector> {
    connector: C,
    options: AggregatorOptions,
}

impl<C: ApiConnector> TenantAggregator<C> {
    pub fn new(connector: C, options: AggregatorOptions) -> Self {
        Self { connector, options }
    }

    pub async fn aggregate(&self, tenant: &Tenant) -> Result<TenantOutcome> {
        let current_page = AtomicU32::new(FIRST_PAGE);

        match tokio::time::timeout(self.options.timeout, self.enumerate(tenant, &current_page)).await
        {
            Ok(result) => result,
            Err(_) => Err(EtlError::EnumerationError {
                tenant_id: tenant.tenant_id.clone(),
                page: current_page.load(Ordering::Relaxed),
                cause: Box::new(EtlError::TimeoutError {
                    seconds: self.options.timeout.as_secs(),
                }),
            }),
        }
    }

    async fn enumerate(&self, tenant: &Tenant, current_page: &AtomicU32) -> Result<TenantOutcome> {
        let api = self
            .connector
            .connect(tenant)
            .await
            .map_err(|e| EtlError::AuthenticationError {
                tenant_id: tenant.tenant_id.clone(),
                source: Box::new(e),
            })?;
        let api = Arc::new(api);
        tracing::debug!("🔑 Credentials accepted for tenant '{}'", tenant.tenant_id);

        let per_page = self.options.zone_page_size;
        let zone_api: &C::Api = api.as_ref();
        let mut zones = PageCursor::new(move |page| {
            current_page.store(page, Ordering::Relaxed);
            zone_api.list_zones(page, per_page)
        });

        let mut outcome = TenantOutcome::default();

        while let Some(batch) = zones.next_batch().await {
            let batch = batch.map_err(|cause| EtlError::EnumerationError {
                tenant_id: tenant.tenant_id.clone(),
                page: zones.page(),
                cause: Box::new(cause),
            })?;
            tracing::debug!(
                "📄 Zone page {} returned {} zones",
                zones.page(),
                batch.len()
            );

            let children = self.fetch_children(&api, &batch).await;

            // 單一寫入者：依 zone 原始順序合併結果與統計
            for (zone, records) in batch.iter().zip(children) {
                let records = match records {
                    Ok(records) => records,
                    Err(cause) => {
                        tracing::warn!(
                            "⚠️ Could not list DNS records for zone '{}' ({}) of tenant '{}': {}",
                            zone.name,
                            zone.id,
                            tenant.tenant_id,
                            cause
                        );
                        outcome.warnings.push(ChildEnumerationWarning {
                            tenant_id: tenant.tenant_id.clone(),
                            parent_key: zone.name.clone(),
                            parent_id: zone.id.clone(),
                            cause: cause.to_string(),
                        });
                        Vec::new()
                    }
                };

                outcome.summary.record_parent(&zone.status, !records.is_empty());
                outcome
                    .rows
                    .extend(flatten(&tenant.tenant_id, zone, &records));
            }
        }

        Ok(outcome)
    }

    /// Fetches DNS records for a batch of zones with at most
    /// `concurrent_requests` zones in flight. Results keep the batch order.
    async fn fetch_children(
        &self,
        api: &Arc<C::Api>,
        zones: &[Zone],
    ) -> Vec<Result<Vec<DnsRecord>>> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrent_requests.max(1)));
        let mut tasks = JoinSet::new();

        for (index, zone) in zones.iter().enumerate() {
            let api = Arc::clone(api);
            let semaphore = Arc::clone(&semaphore);
            let zone_id = zone.id.clone();
            let per_page = self.options.record_page_size;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, collect_dns_records(api.as_ref(), &zone_id, per_page).await)
            });
        }

        let mut results: Vec<Option<Result<Vec<DnsRecord>>>> = zones.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!("❌ DNS record task did not complete: {}", e),
            }
        }

        results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|| {
                    Err(EtlError::ProcessingError {
                        message: "DNS record task did not complete".to_string(),
                    })
                })
            })
            .collect()
    }
}

async fn collect_dns_records<A: ZoneApi + ?Sized>(
    api: &A,
    zone_id: &str,
    per_page: u32,
) -> Result<Vec<DnsRecord>> {
    PageCursor::new(move |page| api.list_dns_records(zone_id, page, per_page))
        .try_collect()
        .await
}
