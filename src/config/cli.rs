use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "zone-inventory-etl")]
#[command(about = "Export zones and DNS records from multiple Cloudflare accounts to CSV")]
pub struct CliConfig {
    /// Path to the JSON or TOML configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: String,

    /// Path of the CSV report to write
    #[arg(short, long, default_value = "cloudflare_domains.csv")]
    pub output: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Write the CSV but do not send the Telegram notification")]
    pub skip_notify: bool,

    /// Load and validate the configuration, then exit without calling any API
    #[arg(long)]
    pub dry_run: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("config", &self.config)?;
        validate_path("output", &self.output)
    }
}
