use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace};

use crate::config::HttpConfig;
use crate::error::EngineError;
use crate::fetch::{FetchError, FetchRequest, FetchResponse, Transport};

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &HttpConfig, cookie_store: bool) -> Result<Client, EngineError> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(5)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .cookie_store(cookie_store);

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(EngineError::from)
}

/// [`Transport`] over reqwest.
///
/// Requests flagged `with_credentials` go through a client with a cookie
/// store, the others through one without.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    credentialed: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, EngineError> {
        Ok(Self {
            client: create_client(config, false)?,
            credentialed: create_client(config, true)?,
        })
    }

    fn client_for(&self, request: &FetchRequest) -> &Client {
        if request.with_credentials {
            &self.credentialed
        } else {
            &self.client
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        trace!(id = %request.id, url = %request.url, kind = ?request.kind, "Sending request");

        let mut builder = self.client_for(request).get(&request.url);
        if !request.timeout.is_zero() {
            builder = builder.timeout(request.timeout);
        }

        let response = builder.send().await.map_err(|e| {
            FetchError::new(
                e.status().map(|s| s.as_u16()).unwrap_or(0),
                e.to_string(),
                &request.url,
            )
        })?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        if status >= 400 || status == 0 {
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("request failed");
            return Err(FetchError::new(status, reason, url));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(0, e.to_string(), &url))?;
        let elapsed = start.elapsed();

        debug!(
            id = %request.id,
            url = %url,
            status,
            bytes = body.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Request complete"
        );

        Ok(FetchResponse {
            id: request.id,
            url,
            status,
            body,
            elapsed,
        })
    }
}
