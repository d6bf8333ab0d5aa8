use serde::{Deserialize, Serialize};

/// Body of a successful `GET /api/vacancies` response.
///
/// Records stay opaque JSON all the way through the aggregator: the
/// server forwards whatever the upstream published, field for field.
/// `dropped_pages` tells the caller whether the listing is complete or a
/// degraded best-effort subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedListing {
    pub success: bool,
    pub total: usize,
    pub dropped_pages: usize,
    pub data: Vec<serde_json::Value>,
}

impl AggregatedListing {
    pub fn new(data: Vec<serde_json::Value>, dropped_pages: usize) -> Self {
        Self {
            success: true,
            total: data.len(),
            dropped_pages,
            data,
        }
    }
}
