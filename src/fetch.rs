// src/fetch.rs

use chrono::Utc;
use reqwest::Client;
use std::{
    future::Future,
    sync::{Arc, RwLock},
    time::Duration,
};
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// The packaged offline dataset.
pub const DEMO_CSV: &str = include_str!("../assets/mock-data.csv");

/// Where a poll cycle gets its raw CSV from.
pub trait Source {
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Short label shown on the board.
    fn mode(&self) -> &'static str;
}

/// Live spreadsheet export over HTTP.
#[derive(Clone, Debug)]
pub struct LiveSource {
    client: Client,
    url: Url,
}

impl LiveSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// The export URL with a fresh `cacheBust` parameter so no cache in
    /// between hands back a stale row.
    fn busted_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("cacheBust", &Utc::now().timestamp_millis().to_string());
        url
    }
}

impl Source for LiveSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let url = self.busted_url();
        debug!(%url, "fetching sheet");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        resp.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }

    fn mode(&self) -> &'static str {
        "Live"
    }
}

/// In-memory CSV for offline/demo runs and tests.
#[derive(Clone, Debug)]
pub struct MockSource {
    data: Arc<RwLock<String>>,
}

/// Override hook for the mock data; cheap to clone and hand to a harness.
#[derive(Clone, Debug)]
pub struct MockHandle {
    data: Arc<RwLock<String>>,
}

impl MockSource {
    pub fn new(csv: impl Into<String>) -> Self {
        Self {
            data: Arc::new(RwLock::new(csv.into())),
        }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_CSV)
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            data: Arc::clone(&self.data),
        }
    }
}

impl MockHandle {
    /// Replace the CSV served from the next cycle on.
    pub fn set(&self, csv: impl Into<String>) {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        *data = csv.into();
    }
}

impl Source for MockSource {
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner()).clone();
        async move { Ok(data) }
    }

    fn mode(&self) -> &'static str {
        "Offline Demo"
    }
}
