use crate::domain::model::{Credentials, DnsRecord, Page, Tenant, Zone};
use crate::domain::ports::{ApiConnector, ZoneApi};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

impl<T> ApiEnvelope<T> {
    fn error_message(&self) -> String {
        if self.errors.is_empty() {
            return "unknown error".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

impl ResultInfo {
    fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Deserialize)]
struct TokenStatus {
    status: String,
}

/// Zone as returned by `GET /zones`. `ssl` is only present on some API versions.
#[derive(Debug, Deserialize)]
struct ZonePayload {
    id: String,
    name: String,
    status: String,
    #[serde(default)]
    name_servers: Vec<String>,
    #[serde(default)]
    ssl: Option<String>,
}

impl From<ZonePayload> for Zone {
    fn from(payload: ZonePayload) -> Self {
        Zone {
            id: payload.id,
            name: payload.name,
            status: payload.status,
            name_servers: payload.name_servers,
            tls_mode: payload.ssl,
        }
    }
}

/// Verifies API tokens and hands out per-account clients.
#[derive(Debug, Clone)]
pub struct CloudflareConnector {
    client: Client,
    base_url: String,
}

impl CloudflareConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for CloudflareConnector {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

#[async_trait]
impl ApiConnector for CloudflareConnector {
    type Api = CloudflareClient;

    async fn connect(&self, tenant: &Tenant) -> Result<CloudflareClient> {
        let client = CloudflareClient {
            http: self.client.clone(),
            base_url: self.base_url.clone(),
            credentials: tenant.credentials.clone(),
        };

        let (status, _): (TokenStatus, _) = client.get("/user/tokens/verify", &[]).await?;
        if status.status != "active" {
            return Err(EtlError::ApiResponseError {
                status: 403,
                message: format!("API token is not active (status: {})", status.status),
            });
        }

        Ok(client)
    }
}

pub struct CloudflareClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl CloudflareClient {
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(T, Option<ResultInfo>)> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.credentials.token())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(EtlError::ApiResponseError {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                })
            }
        };

        if !status.is_success() || !envelope.success {
            return Err(EtlError::ApiResponseError {
                status: status.as_u16(),
                message: envelope.error_message(),
            });
        }

        let result_info = envelope.result_info;
        let result = envelope.result.ok_or_else(|| EtlError::ApiResponseError {
            status: status.as_u16(),
            message: "response contained no result".to_string(),
        })?;

        Ok((result, result_info))
    }

    fn page_query(page: u32, per_page: u32) -> [(&'static str, String); 2] {
        [("page", page.to_string()), ("per_page", per_page.to_string())]
    }
}

#[async_trait]
impl ZoneApi for CloudflareClient {
    async fn list_zones(&self, page: u32, per_page: u32) -> Result<Page<Zone>> {
        let (zones, info): (Vec<ZonePayload>, _) =
            self.get("/zones", &Self::page_query(page, per_page)).await?;

        Ok(Page::new(
            zones.into_iter().map(Zone::from).collect(),
            info.is_some_and(|i| i.has_more()),
        ))
    }

    async fn list_dns_records(
        &self,
        zone_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<DnsRecord>> {
        let path = format!("/zones/{}/dns_records", zone_id);
        let (records, info): (Vec<DnsRecord>, _) =
            self.get(&path, &Self::page_query(page, per_page)).await?;

        Ok(Page::new(records, info.is_some_and(|i| i.has_more())))
    }
}
