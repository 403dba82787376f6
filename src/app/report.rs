use crate::adapters::csv_report::render_csv;
use crate::adapters::telegram::{escape_code_block, escape_markdown_v2};
use crate::domain::model::RunReport;
use crate::domain::ports::{Notifier, ResultSink, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fmt::Write;
use std::path::Path;

pub const REPORT_TITLE: &str = "Cloudflare DNS inventory daily report";
pub const ATTACHMENT_CAPTION: &str = "Cloudflare zone and DNS record export";

/// Formats the per-account summary as a Telegram MarkdownV2 message.
pub fn build_summary_message(title: &str, report: &RunReport, generated_at: &DateTime<Local>) -> String {
    let mut body = String::new();
    let mut total_zones = 0;

    // BTreeMap 迭代順序固定，帳戶與狀態皆依名稱排序
    for (account, summary) in &report.summaries {
        let _ = writeln!(body, "Account: {}", account);
        let _ = writeln!(body, "  Total zones: {}", summary.total_parents);
        let _ = writeln!(body, "  By status:");
        for (status, count) in &summary.status_counts {
            let _ = writeln!(body, "    - {}: {}", status, count);
        }
        let _ = writeln!(body, "  Zones with DNS records: {}", summary.parents_with_children);
        body.push('\n');
        total_zones += summary.total_parents;
    }

    for failure in &report.failures {
        let _ = writeln!(body, "Failed account: {} ({})", failure.tenant_id, failure.cause);
    }
    if !report.failures.is_empty() {
        body.push('\n');
    }

    let _ = writeln!(
        body,
        "Accounts processed: {}/{}",
        report.processed_count, report.configured_count
    );
    let _ = writeln!(body, "Total zones across all accounts: {}", total_zones);

    format!(
        "*{}*\n\n{}\n```\n{}```\n",
        escape_markdown_v2(title),
        escape_markdown_v2(&format!(
            "Cloudflare zone statistics ({})",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        )),
        escape_code_block(&body)
    )
}

/// Writes the CSV report and, when a notifier is configured, sends the
/// summary with the CSV attached. Notification failures are logged only.
pub struct ReportSink<S: Storage, N: Notifier> {
    storage: S,
    notifier: Option<N>,
    output_file: String,
}

impl<S: Storage, N: Notifier> ReportSink<S, N> {
    pub fn new(storage: S, output_file: impl Into<String>) -> Self {
        Self {
            storage,
            notifier: None,
            output_file: output_file.into(),
        }
    }

    pub fn with_notifier(mut self, notifier: N) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn attachment_name(&self) -> String {
        Path::new(&self.output_file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("report.csv")
            .to_string()
    }

    async fn notify(&self, notifier: &N, report: &RunReport, csv: Vec<u8>) -> Result<()> {
        let message = build_summary_message(REPORT_TITLE, report, &Local::now());
        notifier.send_message(&message).await?;
        notifier
            .send_document(&self.attachment_name(), csv, ATTACHMENT_CAPTION)
            .await
    }
}

#[async_trait]
impl<S: Storage, N: Notifier> ResultSink for ReportSink<S, N> {
    async fn consume(&self, report: &RunReport) -> Result<String> {
        tracing::info!("📝 Writing CSV report: '{}'", self.output_file);
        let csv = render_csv(&report.rows)?;
        let location = self.storage.write_file(&self.output_file, &csv).await?;

        match &self.notifier {
            Some(notifier) => {
                tracing::info!("📨 Sending Telegram notification...");
                if let Err(e) = self.notify(notifier, report, csv).await {
                    tracing::warn!("⚠️ Could not send Telegram notification: {}", e);
                    tracing::warn!("💡 {}", e.recovery_suggestion());
                }
            }
            None => tracing::info!("Notification not configured, skipping"),
        }

        Ok(location)
    }
}
