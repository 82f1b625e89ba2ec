use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{KlinesRequest, MarketClient, MarketConnector, RawKline, SourceError};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::Credentials;

/// Spot testnet REST root. Paths below are relative to it (`/v3/ping`).
pub const BINANCE_TESTNET_API_URL: &str = "https://testnet.binance.vision/api";

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Binance spot REST client restricted to the public market-data calls.
#[derive(Clone)]
pub struct BinanceClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    auth: HttpAuth,
    timeout_ms: u64,
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl BinanceClient {
    pub fn new(
        credentials: &Credentials,
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, SourceError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SourceError::invalid_request(format!(
                "base url must start with http:// or https://, got '{base_url}'"
            )));
        }
        if credentials.api_key().trim().is_empty() {
            return Err(SourceError::invalid_request("api key must not be blank"));
        }

        Ok(Self {
            http_client,
            base_url,
            auth: HttpAuth::ApiKeyHeader {
                name: String::from(API_KEY_HEADER),
                value: credentials.api_key().to_owned(),
            },
            timeout_ms,
        })
    }

    fn request(&self, path: &str) -> HttpRequest {
        HttpRequest::get(format!("{}{path}", self.base_url))
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SourceError> {
        debug!(url = %request.full_url(), "binance request");
        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.timed_out() {
                SourceError::unavailable(format!("binance request timed out: {}", error.message()))
            } else {
                SourceError::unavailable(format!("binance transport error: {}", error.message()))
            }
        })?;

        if !response.is_success() {
            return Err(SourceError::unavailable(upstream_status_message(&response)));
        }

        Ok(response)
    }
}

impl MarketClient for BinanceClient {
    fn ping<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        Box::pin(async move {
            self.send(self.request("/v3/ping")).await?;
            Ok(())
        })
    }

    fn klines<'a>(
        &'a self,
        req: KlinesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawKline>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let request = self
                .request("/v3/klines")
                .with_query("symbol", req.symbol.as_str())
                .with_query("interval", req.interval.as_str())
                .with_query("limit", req.limit.to_string());

            let response = self.send(request).await?;
            let rows: Vec<RawKline> = serde_json::from_str(&response.body).map_err(|e| {
                SourceError::malformed_response(format!("failed to parse binance klines: {e}"))
            })?;

            debug!(rows = rows.len(), symbol = %req.symbol, "binance klines received");
            Ok(rows)
        })
    }
}

/// Connector that binds every client to one base URL and transport.
#[derive(Clone)]
pub struct BinanceConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl BinanceConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            timeout_ms,
        }
    }

    pub fn testnet(http_client: Arc<dyn HttpClient>, timeout_ms: u64) -> Self {
        Self::new(http_client, BINANCE_TESTNET_API_URL, timeout_ms)
    }
}

impl MarketConnector for BinanceConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn MarketClient>, SourceError> {
        let client = BinanceClient::new(
            credentials,
            Arc::clone(&self.http_client),
            self.base_url.as_str(),
            self.timeout_ms,
        )?;
        Ok(Arc::new(client))
    }
}

#[derive(Debug, Deserialize)]
struct BinanceErrorBody {
    code: i64,
    msg: String,
}

fn upstream_status_message(response: &HttpResponse) -> String {
    match serde_json::from_str::<BinanceErrorBody>(&response.body) {
        Ok(body) => format!(
            "binance returned status {} (code {}: {})",
            response.status, body.code, body.msg
        ),
        Err(_) => format!("binance returned status {}", response.status),
    }
}
