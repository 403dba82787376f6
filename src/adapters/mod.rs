// Adapters layer: concrete implementations for external systems (Cloudflare API, Telegram, CSV, filesystem).

pub mod cloudflare;
pub mod csv_report;
pub mod storage;
pub mod telegram;
