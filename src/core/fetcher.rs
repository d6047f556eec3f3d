use crate::domain::model::FetchOutcome;
use crate::domain::ports::{Diagnostics, Fetcher};
use crate::utils::error::Result;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Single-shot HTTP GET; every failure is folded into a [`FetchOutcome`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    diagnostics: Arc<dyn Diagnostics>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            diagnostics,
        })
    }

    async fn get(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportError(describe_transport_error(&e)),
        };

        let status = response.status();
        tracing::debug!("GET {} -> {}", url, status);

        if status == StatusCode::NOT_FOUND {
            return FetchOutcome::NotFound;
        }
        if !status.is_success() {
            return FetchOutcome::HttpError(status.as_u16());
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::Success(body.to_vec()),
            Err(e) => FetchOutcome::TransportError(describe_transport_error(&e)),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let outcome = self.get(url).await;

        match &outcome {
            FetchOutcome::Success(body) => self.diagnostics.record(
                Level::DEBUG,
                &format!("Fetched {} ({} bytes)", url, body.len()),
            ),
            FetchOutcome::NotFound => self
                .diagnostics
                .record(Level::ERROR, &format!("404 Not Found: {}", url)),
            FetchOutcome::HttpError(status) => self.diagnostics.record(
                Level::ERROR,
                &format!("HTTP error {} while fetching {}", status, url),
            ),
            FetchOutcome::TransportError(cause) => self.diagnostics.record(
                Level::ERROR,
                &format!("Transport error while fetching {}: {}", url, cause),
            ),
        }

        outcome
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_redirect() {
        "redirect loop"
    } else if e.is_body() || e.is_decode() {
        "body read failed"
    } else {
        "request failed"
    };
    format!("{}: {}", kind, e)
}
