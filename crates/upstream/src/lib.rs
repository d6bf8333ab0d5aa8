//! Client for the third-party internship-vacancy listing API.
//!
//! The upstream caps page size and exposes the total page count only in
//! the first page's pagination metadata, so callers fetch page 1 before
//! they know how many more round trips a full pull takes.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str =
    "https://maganghub.kemnaker.go.id/be/v1/api/list/vacancies-aktif";

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Bearer credential for the upstream API. `None` means the server is
    /// misconfigured; no request is attempted without it.
    pub access_token: Option<String>,
    pub page_limit: u32,
    pub request_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            access_token: None,
            page_limit: 100,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream returned status {status} for page {page}")]
    Status { page: u32, status: StatusCode },
    #[error("upstream request for page {page} failed: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// HTTP status reported by the upstream, when it got as far as
    /// responding at all.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { .. } => None,
        }
    }
}

/// One page of the upstream listing. Records stay opaque; only the
/// pagination metadata is interpreted, and every level of it is optional.
#[derive(Debug, Default, Deserialize)]
pub struct VacancyPage {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub last_page: Option<u32>,
}

impl VacancyPage {
    /// Total page count advertised by this page; a listing without
    /// pagination metadata is treated as single-page.
    pub fn last_page(&self) -> u32 {
        self.meta
            .as_ref()
            .and_then(|meta| meta.pagination.as_ref())
            .and_then(|pagination| pagination.last_page)
            .unwrap_or(1)
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    pub async fn fetch_page(&self, token: &str, page: u32) -> Result<VacancyPage, FetchError> {
        debug!(page, "fetching upstream listing page");
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("order_direction", "ASC".to_string()),
                ("page", page.to_string()),
                ("limit", self.config.page_limit.to_string()),
            ])
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { page, status });
        }

        response
            .json()
            .await
            .map_err(|source| FetchError::Transport { page, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_defaults_to_one_without_metadata() {
        let page: VacancyPage = serde_json::from_str(r#"{"data": []}"#).expect("json");
        assert_eq!(page.last_page(), 1);

        let partial: VacancyPage = serde_json::from_str(r#"{"meta": {}}"#).expect("json");
        assert_eq!(partial.last_page(), 1);
    }

    #[test]
    fn last_page_reads_nested_pagination() {
        let page: VacancyPage = serde_json::from_str(
            r#"{"data": [{"id_posisi": 1}], "meta": {"pagination": {"last_page": 17}}}"#,
        )
        .expect("json");
        assert_eq!(page.last_page(), 17);
        assert_eq!(page.data.len(), 1);
    }

    #[test]
    fn missing_data_defaults_to_empty() {
        let page: VacancyPage =
            serde_json::from_str(r#"{"meta": {"pagination": {"last_page": 2}}}"#).expect("json");
        assert!(page.data.is_empty());
    }

    #[test]
    fn status_errors_expose_the_upstream_code() {
        let err = FetchError::Status {
            page: 3,
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        assert_eq!(err.upstream_status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(err.to_string().contains("page 3"));
    }
}
