use crate::core::aggregator::TenantAggregator;
use crate::domain::model::{RunReport, Tenant, TenantFailure};
use crate::domain::ports::ApiConnector;
use crate::utils::error::{EtlError, Result};
use tracing::Instrument;

/// Runs the aggregator over every configured tenant, isolating failures.
pub struct RunOrchestrator<C: ApiConnector> {
    aggregator: TenantAggregator<C>,
}

impl<C: ApiConnector> RunOrchestrator<C> {
    pub fn new(aggregator: TenantAggregator<C>) -> Self {
        Self { aggregator }
    }

    /// Tenants are processed in the given order. A failed tenant contributes
    /// neither rows nor a summary; the run only fails when no tenant succeeds.
    pub async fn run(&self, tenants: &[Tenant]) -> Result<RunReport> {
        let mut report = RunReport {
            configured_count: tenants.len(),
            ..RunReport::default()
        };

        for tenant in tenants {
            tracing::info!(
                "🌐 Fetching zones from Cloudflare account '{}'...",
                tenant.tenant_id
            );
            let span = tracing::info_span!("tenant", tenant_id = %tenant.tenant_id);

            match self.aggregator.aggregate(tenant).instrument(span).await {
                Ok(outcome) => {
                    tracing::info!(
                        "✅ Account '{}' done: {} zones, {} with DNS records, {} rows",
                        tenant.tenant_id,
                        outcome.summary.total_parents,
                        outcome.summary.parents_with_children,
                        outcome.rows.len()
                    );
                    report.rows.extend(outcome.rows);
                    report.warnings.extend(outcome.warnings);
                    if report
                        .summaries
                        .insert(tenant.tenant_id.clone(), outcome.summary)
                        .is_some()
                    {
                        tracing::warn!(
                            "⚠️ Account '{}' appears more than once; keeping the latest summary",
                            tenant.tenant_id
                        );
                    }
                    report.processed_count += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Skipping account '{}': {}",
                        tenant.tenant_id,
                        e
                    );
                    report.failures.push(TenantFailure {
                        tenant_id: tenant.tenant_id.clone(),
                        cause: e.to_string(),
                    });
                }
            }
        }

        if report.processed_count == 0 {
            return Err(EtlError::NoTenantsProcessedError {
                configured: report.configured_count,
            });
        }

        tracing::info!(
            "📊 Processed {} of {} accounts ({} rows, {} zone warnings)",
            report.processed_count,
            report.configured_count,
            report.rows.len(),
            report.warnings.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::tests::{two_zone_account, zone, FakeAccount, FakeConnector};
    use crate::core::aggregator::AggregatorOptions;

    fn orchestrator(connector: FakeConnector) -> RunOrchestrator<FakeConnector> {
        RunOrchestrator::new(TenantAggregator::new(
            connector,
            AggregatorOptions::default(),
        ))
    }

    fn failing_zone_listing() -> FakeAccount {
        let mut account = two_zone_account();
        account.zone_pages.push(Err("rate limited".to_string()));
        account
    }

    #[tokio::test]
    async fn test_failed_tenant_contributes_nothing() {
        let connector = FakeConnector::default()
            .with_account("a-token", two_zone_account())
            .with_account("b-token", failing_zone_listing());

        let report = orchestrator(connector)
            .run(&[Tenant::new("A", "a-token"), Tenant::new("B", "b-token")])
            .await
            .unwrap();

        assert_eq!(report.processed_count, 1);
        assert_eq!(report.configured_count, 2);
        assert!(report.is_degraded());
        assert!(report.summaries.contains_key("A"));
        assert!(!report.summaries.contains_key("B"));
        assert!(report.rows.iter().all(|r| r.tenant_id == "A"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tenant_id, "B");
    }

    #[tokio::test]
    async fn test_authentication_failure_is_skipped() {
        let connector = FakeConnector::default().with_account("t1-token", two_zone_account());

        let report = orchestrator(connector)
            .run(&[Tenant::new("T1", "t1-token"), Tenant::new("T2", "bad-token")])
            .await
            .unwrap();

        assert_eq!(report.processed_count, 1);
        assert!(!report.summaries.contains_key("T2"));
        assert!(report.failures[0].cause.contains("Authentication failed"));
    }

    #[tokio::test]
    async fn test_all_tenants_failing_is_fatal() {
        let connector = FakeConnector::default().with_account("b-token", failing_zone_listing());

        let err = orchestrator(connector)
            .run(&[Tenant::new("A", "missing"), Tenant::new("B", "b-token")])
            .await
            .unwrap_err();

        assert!(matches!(err, EtlError::NoTenantsProcessedError { configured: 2 }));
    }

    #[tokio::test]
    async fn test_empty_tenant_list_is_fatal() {
        let err = orchestrator(FakeConnector::default())
            .run(&[])
            .await
            .unwrap_err();

        assert!(matches!(err, EtlError::NoTenantsProcessedError { configured: 0 }));
    }

    #[tokio::test]
    async fn test_rows_follow_tenant_order() {
        let mut second = two_zone_account();
        second.zone_pages = vec![Ok(vec![zone("p1", "Q1", "active")])];
        let connector = FakeConnector::default()
            .with_account("one", two_zone_account())
            .with_account("two", second);

        let report = orchestrator(connector)
            .run(&[Tenant::new("second", "two"), Tenant::new("first", "one")])
            .await
            .unwrap();

        let tenants: Vec<&str> = report.rows.iter().map(|r| r.tenant_id.as_str()).collect();
        assert_eq!(tenants, vec!["second", "second", "first", "first"]);
        assert_eq!(report.total_parents(), 3);
    }

    #[tokio::test]
    async fn test_rerun_is_identical() {
        let connector = FakeConnector::default()
            .with_account("one", two_zone_account())
            .with_account("two", failing_zone_listing());
        let tenants = [Tenant::new("T1", "one"), Tenant::new("T2", "two")];
        let orchestrator = orchestrator(connector);

        let first = orchestrator.run(&tenants).await.unwrap();
        let second = orchestrator.run(&tenants).await.unwrap();

        assert_eq!(first.rows, second.rows);
        assert_eq!(first.summaries, second.summaries);
        assert_eq!(first.failures, second.failures);
    }
}
