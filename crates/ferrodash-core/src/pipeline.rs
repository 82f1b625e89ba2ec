//! The fetch → normalize → enrich pipeline behind one dashboard render.
//!
//! Each stage returns a `Result`; the first failure stops the run and is
//! reported as a tagged [`DashboardError`]. Nothing is retried.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::exchange::{KlinesRequest, MarketClient, MarketConnector};
use crate::indicators::enrich;
use crate::normalize::normalize_klines;
use crate::secrets::{load_credentials, SecretStore};
use crate::{CoreError, Credentials, DashboardConfig, EnrichedTable, Interval, MarketTable, Symbol};

pub const CONNECTED_BANNER: &str = "✅ Connected to Binance Testnet API";

/// Stage at which a run halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardErrorKind {
    Configuration,
    Connectivity,
    Fetch,
}

/// Terminal failure of a dashboard run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("fetch error: {0}")]
    Fetch(String),
}

impl DashboardError {
    pub const fn kind(&self) -> DashboardErrorKind {
        match self {
            Self::Configuration(_) => DashboardErrorKind::Configuration,
            Self::Connectivity(_) => DashboardErrorKind::Connectivity,
            Self::Fetch(_) => DashboardErrorKind::Fetch,
        }
    }

    /// Detailed cause, suitable for logs.
    pub fn detail(&self) -> &str {
        match self {
            Self::Configuration(detail) | Self::Connectivity(detail) | Self::Fetch(detail) => {
                detail
            }
        }
    }

    /// Banner text shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => String::from(
                "🔒 API credentials are missing. Please set BINANCE_API_KEY and \
                 BINANCE_API_SECRET in your secrets store.",
            ),
            Self::Connectivity(detail) => format!("❌ Binance API connection failed: {detail}"),
            Self::Fetch(_) => String::from("⚠️ Failed to fetch data from Binance."),
        }
    }
}

/// Result of one successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub run_id: Uuid,
    pub symbol: Symbol,
    pub interval: Interval,
    /// Rows in the normalized table, before warm-up rows were dropped.
    pub fetched_rows: usize,
    pub table: EnrichedTable,
    pub warnings: Vec<String>,
    pub banner: String,
}

impl DashboardSnapshot {
    pub fn to_json_value(&self) -> Result<Value, CoreError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Stage 1: read the API key pair.
pub fn load_stage(store: &dyn SecretStore) -> Result<Credentials, DashboardError> {
    load_credentials(store).map_err(|error| DashboardError::Configuration(error.to_string()))
}

/// Stage 2: construct the client and ping it once.
pub async fn connect_stage(
    connector: &dyn MarketConnector,
    credentials: &Credentials,
) -> Result<Arc<dyn MarketClient>, DashboardError> {
    let client = connector
        .connect(credentials)
        .map_err(|error| DashboardError::Connectivity(error.message().to_owned()))?;

    client
        .ping()
        .await
        .map_err(|error| DashboardError::Connectivity(error.message().to_owned()))?;

    Ok(client)
}

/// Stage 3: fetch raw klines and normalize them.
pub async fn fetch_stage(
    client: &dyn MarketClient,
    config: &DashboardConfig,
) -> Result<MarketTable, DashboardError> {
    let request = KlinesRequest::new(config.symbol.clone(), config.interval, config.limit)
        .map_err(|error| DashboardError::Fetch(error.to_string()))?;
    let raw = client
        .klines(request)
        .await
        .map_err(|error| DashboardError::Fetch(error.to_string()))?;

    normalize_klines(&raw).map_err(|error| DashboardError::Fetch(error.to_string()))
}

/// Runs every stage once, in order.
pub async fn run_dashboard(
    config: &DashboardConfig,
    secrets: &dyn SecretStore,
    connector: &dyn MarketConnector,
) -> Result<DashboardSnapshot, DashboardError> {
    let run_id = Uuid::new_v4();
    let outcome = match load_stage(secrets) {
        Ok(credentials) => run_stages(config, credentials, connector, run_id).await,
        Err(error) => Err(error),
    };
    report_halt(run_id, outcome)
}

/// Same as [`run_dashboard`], with the secret lookup moved to the blocking
/// thread pool. For async hosts whose stores read files.
pub async fn run_dashboard_shared(
    config: &DashboardConfig,
    secrets: Arc<dyn SecretStore>,
    connector: &dyn MarketConnector,
) -> Result<DashboardSnapshot, DashboardError> {
    let run_id = Uuid::new_v4();
    let loaded = tokio::task::spawn_blocking(move || load_stage(secrets.as_ref()))
        .await
        .unwrap_or_else(|error| {
            Err(DashboardError::Configuration(format!(
                "secret lookup task failed: {error}"
            )))
        });
    let outcome = match loaded {
        Ok(credentials) => run_stages(config, credentials, connector, run_id).await,
        Err(error) => Err(error),
    };
    report_halt(run_id, outcome)
}

fn report_halt(
    run_id: Uuid,
    outcome: Result<DashboardSnapshot, DashboardError>,
) -> Result<DashboardSnapshot, DashboardError> {
    if let Err(error) = &outcome {
        warn!(%run_id, kind = ?error.kind(), detail = error.detail(), "dashboard run halted");
    }
    outcome
}

async fn run_stages(
    config: &DashboardConfig,
    credentials: Credentials,
    connector: &dyn MarketConnector,
    run_id: Uuid,
) -> Result<DashboardSnapshot, DashboardError> {
    info!(%run_id, "credentials loaded");
    let settings = config
        .indicators
        .validate()
        .map_err(|error| DashboardError::Configuration(error.to_string()))?;

    let client = connect_stage(connector, &credentials).await?;
    info!(%run_id, "exchange reachable");

    let market = fetch_stage(client.as_ref(), config).await?;
    info!(%run_id, rows = market.len(), symbol = %config.symbol, interval = %config.interval, "klines normalized");

    let table = enrich(&market, settings)
        .map_err(|error| DashboardError::Configuration(error.to_string()))?;

    let mut warnings = Vec::new();
    let needed = settings.warmup_rows() + 1;
    if market.len() < needed {
        warnings.push(format!(
            "only {} candles returned; indicators need at least {needed}",
            market.len()
        ));
    }
    info!(%run_id, rows = table.len(), "indicators applied");

    Ok(DashboardSnapshot {
        run_id,
        symbol: config.symbol.clone(),
        interval: config.interval,
        fetched_rows: market.len(),
        table,
        warnings,
        banner: String::from(CONNECTED_BANNER),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banners_follow_error_kind() {
        let configuration = DashboardError::Configuration(String::from("secret missing"));
        assert!(configuration.user_message().contains("credentials are missing"));
        assert_eq!(configuration.kind(), DashboardErrorKind::Configuration);

        let connectivity = DashboardError::Connectivity(String::from("timeout"));
        assert!(connectivity.user_message().ends_with("connection failed: timeout"));

        let fetch = DashboardError::Fetch(String::from("bad json"));
        assert_eq!(fetch.user_message(), "⚠️ Failed to fetch data from Binance.");
        assert_eq!(fetch.detail(), "bad json");
    }
}
