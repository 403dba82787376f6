use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

pub const TLS_MODE_UNKNOWN: &str = "unknown";
pub const NAME_SERVERS_NONE: &str = "none provided";

/// API token，Debug 輸出時遮蔽內容避免寫入日誌
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Tenant {
    pub tenant_id: String,
    pub credentials: Credentials,
}

impl Tenant {
    pub fn new(tenant_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            credentials: Credentials::new(token),
        }
    }
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, false)
    }
}

/// Parent resource (a zone).
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub status: String,
    pub name_servers: Vec<String>,
    pub tls_mode: Option<String>,
}

impl Zone {
    pub fn tls_mode_or_sentinel(&self) -> String {
        match self.tls_mode.as_deref() {
            Some(mode) if !mode.is_empty() => mode.to_string(),
            _ => TLS_MODE_UNKNOWN.to_string(),
        }
    }

    pub fn name_server_info(&self) -> String {
        if self.name_servers.is_empty() {
            NAME_SERVERS_NONE.to_string()
        } else {
            self.name_servers.join(", ")
        }
    }
}

/// Child record (a DNS record) of a zone.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default)]
    pub proxied: Option<bool>,
}

/// Tri-state proxy indicator. An absent source value means "not applicable"
/// and renders the same as `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyFlag {
    On,
    Off,
    NotApplicable,
}

impl ProxyFlag {
    pub fn from_source(proxied: Option<bool>) -> Self {
        match proxied {
            Some(true) => ProxyFlag::On,
            Some(false) => ProxyFlag::Off,
            None => ProxyFlag::NotApplicable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyFlag::On => "true",
            ProxyFlag::Off | ProxyFlag::NotApplicable => "false",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedRecord {
    pub tenant_id: String,
    pub parent_key: String,
    pub parent_status: String,
    pub child_name: String,
    pub child_kind: String,
    pub child_value: String,
    pub notes: String,
    pub proxy_flag: ProxyFlag,
    pub tls_mode: String,
    pub parent_ns_info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantSummary {
    pub total_parents: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub parents_with_children: usize,
}

impl TenantSummary {
    pub fn record_parent(&mut self, status: &str, has_children: bool) {
        self.total_parents += 1;
        *self.status_counts.entry(status.to_string()).or_insert(0) += 1;
        if has_children {
            self.parents_with_children += 1;
        }
    }
}

/// A child-record enumeration failure that was recovered by treating the
/// zone as childless.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildEnumerationWarning {
    pub tenant_id: String,
    pub parent_key: String,
    pub parent_id: String,
    pub cause: String,
}

/// Everything one tenant contributes to a run.
#[derive(Debug, Clone, Default)]
pub struct TenantOutcome {
    pub rows: Vec<FlattenedRecord>,
    pub summary: TenantSummary,
    pub warnings: Vec<ChildEnumerationWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TenantFailure {
    pub tenant_id: String,
    pub cause: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub rows: Vec<FlattenedRecord>,
    pub summaries: BTreeMap<String, TenantSummary>,
    pub processed_count: usize,
    pub configured_count: usize,
    pub failures: Vec<TenantFailure>,
    pub warnings: Vec<ChildEnumerationWarning>,
}

impl RunReport {
    pub fn is_degraded(&self) -> bool {
        self.processed_count < self.configured_count
    }

    pub fn total_parents(&self) -> usize {
        self.summaries.values().map(|s| s.total_parents).sum()
    }
}
