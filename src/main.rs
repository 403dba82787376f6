use clap::Parser;
use std::time::Duration;
use zone_inventory_etl::utils::error::ErrorSeverity;
use zone_inventory_etl::utils::{logger, validation::Validate};
use zone_inventory_etl::{
    CliConfig, CloudflareConnector, EtlEngine, EtlError, LocalStorage, ReportConfig, ReportSink,
    RunOrchestrator, TelegramNotifier, TenantAggregator,
};

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(exit_code(e));
}

fn exit_code(e: &EtlError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

async fn build_notifier(config: &ReportConfig) -> Option<TelegramNotifier> {
    let telegram = &config.telegram_config;
    if !telegram.is_complete() {
        tracing::info!("Telegram configuration incomplete (bot_token or chat_id missing), skipping notification");
        return None;
    }

    let timeout = Duration::from_secs(telegram.timeout_seconds);
    let notifier = match TelegramNotifier::new(&telegram.api_base, &telegram.bot_token, &telegram.chat_id)
        .and_then(|notifier| notifier.with_timeout(timeout))
    {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::warn!("⚠️ Telegram notifier unavailable: {}", e);
            return None;
        }
    };

    match notifier.authorize().await {
        Ok(username) => {
            tracing::info!("🤖 Telegram bot authorized as @{}", username);
            Some(notifier)
        }
        Err(e) => {
            tracing::warn!("⚠️ Telegram bot authorization failed: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting zone-inventory-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        exit_with(&e);
    }

    let config = match ReportConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config file '{}'", cli.config);
            exit_with(&e)
        }
    };

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    tracing::info!(
        "✅ Loaded configuration '{}' with {} accounts",
        cli.config,
        config.cloudflare_accounts.len()
    );

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No API calls will be made");
        for account in &config.cloudflare_accounts {
            println!("  • {}", account.name);
        }
        println!(
            "API: {} (timeout {}s, {} zones/page, {} records/page, {} concurrent)",
            config.api.base_url,
            config.api.timeout_seconds,
            config.api.zone_page_size,
            config.api.record_page_size,
            config.api.concurrent_requests
        );
        println!("Output: {}", cli.output);
        return Ok(());
    }

    let connector = CloudflareConnector::new(config.api.base_url.clone());
    let orchestrator =
        RunOrchestrator::new(TenantAggregator::new(connector, config.aggregator_options()));

    let mut sink = ReportSink::new(LocalStorage::new("."), cli.output.clone());
    if cli.skip_notify {
        tracing::info!("Notification disabled by --skip-notify");
    } else if let Some(notifier) = build_notifier(&config).await {
        sink = sink.with_notifier(notifier);
    }

    let engine = EtlEngine::new(orchestrator, sink);

    match engine.run(&config.tenants()).await {
        Ok(done) => {
            let report = &done.report;
            if report.is_degraded() {
                tracing::warn!(
                    "⚠️ Completed with {} failed accounts",
                    report.failures.len()
                );
            }
            println!(
                "✅ Processed {}/{} accounts, {} zones, {} DNS records",
                report.processed_count,
                report.configured_count,
                report.total_parents(),
                report.rows.len()
            );
            println!("📁 Output saved to: {}", done.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
