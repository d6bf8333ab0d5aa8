use reqwest::Client;
use serde::Deserialize;
use shared::domain::Vacancy;
use tracing::error;

/// Fetches the aggregated listing from the server once per load.
#[derive(Clone)]
pub struct ListingClient {
    http: Client,
    server_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListingBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Vec<Vacancy>>,
}

impl ListingClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }

    /// Loads the full record set. Any failure — transport, HTTP status,
    /// an error-shaped body, undecodable JSON — degrades to an empty
    /// listing; the view renders "no results" rather than an error.
    pub async fn load(&self) -> Vec<Vacancy> {
        match self.try_load().await {
            Ok(records) => records,
            Err(err) => {
                error!(%err, "failed to load vacancy listing, rendering empty");
                Vec::new()
            }
        }
    }

    async fn try_load(&self) -> anyhow::Result<Vec<Vacancy>> {
        let body: ListingBody = self
            .http
            .get(format!("{}/api/vacancies", self.server_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(message) = body.error {
            anyhow::bail!("server reported an error: {message}");
        }
        Ok(body.data.unwrap_or_default())
    }
}
