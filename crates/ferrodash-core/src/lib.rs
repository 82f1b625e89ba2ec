//! # Ferrodash Core
//!
//! Market data pipeline behind the Ferrodash crypto dashboard.
//!
//! ## Overview
//!
//! One dashboard render runs four stages in order and stops at the first
//! failure:
//!
//! 1. **Load** the exchange API key pair from a [`SecretStore`]
//! 2. **Connect** through a [`MarketConnector`] and `ping` the exchange once
//! 3. **Fetch** raw klines and normalize them into a [`MarketTable`]
//! 4. **Enrich** the table with RSI and MACD, dropping warm-up rows
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Fixed market window and indicator settings |
//! | [`domain`] | Domain models (Candle, MarketTable, EnrichedTable, Symbol) |
//! | [`error`] | Core error types |
//! | [`exchange`] | Exchange client traits and the Binance adapter |
//! | [`http_client`] | HTTP client abstraction |
//! | [`indicators`] | RSI and MACD computation |
//! | [`normalize`] | Raw kline rows to typed candles |
//! | [`pipeline`] | Stage orchestration and dashboard errors |
//! | [`secrets`] | Credential stores |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ferrodash_core::{
//!     run_dashboard, BinanceConnector, DashboardConfig, EnvSecretStore, ReqwestHttpClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::default();
//!     let connector = BinanceConnector::testnet(Arc::new(ReqwestHttpClient::new()), config.timeout_ms);
//!
//!     let snapshot = run_dashboard(&config, &EnvSecretStore, &connector).await?;
//!     for row in snapshot.table.tail(config.tail_rows) {
//!         println!("{} close={:.2} rsi={:.1}", row.candle.ts, row.candle.close, row.rsi);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Web / Caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  run_dashboard  │────▶│  SecretStore     │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ MarketConnector │────▶│ HTTP Client      │
//! │ / MarketClient  │     │ (reqwest/fake)   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ normalize +     │
//! │ indicators      │
//! └─────────────────┘
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod http_client;
pub mod indicators;
pub mod normalize;
pub mod pipeline;
pub mod secrets;

pub use config::{DashboardConfig, DEFAULT_SYMBOL};
pub use domain::{
    Candle, EnrichedRow, EnrichedTable, Interval, MarketTable, PassthroughFields, Symbol,
    UtcDateTime,
};
pub use error::{CoreError, ValidationError};
pub use exchange::{
    BinanceClient, BinanceConnector, KlinesRequest, MarketClient, MarketConnector, RawKline,
    SourceError, SourceErrorKind, SyntheticHttpClient, BINANCE_TESTNET_API_URL,
    KLINE_FIELD_COUNT, MAX_KLINES_LIMIT,
};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use indicators::{enrich, IndicatorColumns, IndicatorSettings};
pub use normalize::{normalize_klines, NormalizeError};
pub use pipeline::{
    connect_stage, fetch_stage, load_stage, run_dashboard, run_dashboard_shared, DashboardError,
    DashboardErrorKind, DashboardSnapshot, CONNECTED_BANNER,
};
pub use secrets::{
    load_credentials, Credentials, CredentialsError, EnvSecretStore, LayeredSecretStore,
    MapSecretStore, SecretStore, SecretStoreError, TomlSecretStore, API_KEY_SECRET,
    API_SECRET_SECRET,
};
