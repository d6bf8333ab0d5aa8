//! Bounded concurrent pagination over the upstream vacancy listing.
//!
//! Page 1 is fetched alone because the total page count only exists in its
//! metadata. The remaining pages fan out through a capped stream and are
//! joined settle-all: every request runs to success or failure, a failed
//! page is dropped (and counted) rather than failing the pull, and the
//! final concatenation is stable page order regardless of completion
//! order. Only a page-1 failure or a missing credential aborts the whole
//! aggregation.

use futures::{stream, StreamExt};
use shared::{error::ErrorCode, protocol::AggregatedListing};
use tracing::{info, warn};
use upstream::{FetchError, UpstreamClient};

pub const DEFAULT_FAN_OUT_LIMIT: usize = 8;

#[derive(Clone)]
pub struct AggregatorContext {
    pub upstream: UpstreamClient,
    /// Maximum in-flight subsequent-page requests.
    pub fan_out_limit: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("access token not configured")]
    MissingToken,
    #[error("failed to fetch initial listing page: {0}")]
    FirstPage(#[from] FetchError),
}

impl AggregateError {
    /// Status served to the caller: the upstream's own status when page 1
    /// answered with an HTTP error, 500 for everything else.
    pub fn http_status(&self) -> u16 {
        match self {
            AggregateError::MissingToken => 500,
            AggregateError::FirstPage(err) => err
                .upstream_status()
                .map(|status| status.as_u16())
                .unwrap_or(500),
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            AggregateError::MissingToken => ErrorCode::Configuration,
            AggregateError::FirstPage(FetchError::Status { .. }) => ErrorCode::Upstream,
            AggregateError::FirstPage(FetchError::Transport { .. }) => ErrorCode::Internal,
        }
    }
}

pub async fn aggregate(ctx: &AggregatorContext) -> Result<AggregatedListing, AggregateError> {
    let token = ctx
        .upstream
        .config()
        .access_token
        .clone()
        .ok_or(AggregateError::MissingToken)?;

    let first = ctx.upstream.fetch_page(&token, 1).await?;
    let last_page = first.last_page();
    let mut records = first.data;

    if last_page <= 1 {
        info!(total = records.len(), "aggregated single-page listing");
        return Ok(AggregatedListing::new(records, 0));
    }

    // One slot per remaining page, indexed by page number, so the output
    // order does not depend on which request settles first.
    let mut slots: Vec<Option<Vec<serde_json::Value>>> = vec![None; (last_page - 1) as usize];
    let mut dropped_pages = 0usize;

    let token = token.as_str();
    let mut fetches = stream::iter(2..=last_page)
        .map(|page| {
            let upstream = &ctx.upstream;
            async move { (page, upstream.fetch_page(token, page).await) }
        })
        .buffer_unordered(ctx.fan_out_limit.max(1));

    while let Some((page, result)) = fetches.next().await {
        match result {
            Ok(body) => slots[(page - 2) as usize] = Some(body.data),
            Err(error) => {
                warn!(page, %error, "dropping listing page after upstream failure");
                dropped_pages += 1;
            }
        }
    }

    for slot in slots {
        if let Some(mut data) = slot {
            records.append(&mut data);
        }
    }

    info!(
        total = records.len(),
        last_page, dropped_pages, "aggregated vacancy listing"
    );
    Ok(AggregatedListing::new(records, dropped_pages))
}

#[cfg(test)]
#[path = "tests/aggregate_tests.rs"]
mod tests;
