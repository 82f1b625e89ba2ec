//! Command-line flags for the `ferrodash` binary.
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--bind` | `FERRODASH_BIND` | `127.0.0.1` |
//! | `--port` | `FERRODASH_PORT` | `8501` |
//! | `--secrets` | `FERRODASH_SECRETS` | `.streamlit/secrets.toml` |
//! | `--mock` | | off |
//! | `--timeout-ms` | | `10000` |
//!
//! ```bash
//! # Serve against the Binance spot testnet
//! ferrodash --secrets ~/.config/ferrodash/secrets.toml
//!
//! # Offline demo with synthetic candles
//! ferrodash --mock --port 9000
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::error::WebError;

/// 🦀 Ferrodash - crypto market dashboard
///
/// Shows BTCUSDT hourly candles from the Binance spot testnet with RSI(14)
/// and MACD(12, 26, 9).
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ferrodash",
    author,
    version,
    about = "Crypto market dashboard for the Binance spot testnet"
)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arg(long, env = "FERRODASH_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, env = "FERRODASH_PORT", default_value_t = 8501)]
    pub port: u16,

    /// TOML file holding BINANCE_API_KEY and BINANCE_API_SECRET.
    ///
    /// Environment variables of the same names are consulted when the file
    /// does not define them.
    #[arg(long, env = "FERRODASH_SECRETS", default_value = ".streamlit/secrets.toml")]
    pub secrets: PathBuf,

    /// Serve synthetic candles instead of calling the exchange.
    #[arg(long)]
    pub mock: bool,

    /// Per-request exchange timeout in milliseconds.
    #[arg(long, default_value_t = 10_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: u64,
}

impl ServerArgs {
    pub fn socket_addr(&self) -> Result<SocketAddr, WebError> {
        let ip = self
            .bind
            .trim()
            .parse::<IpAddr>()
            .map_err(|source| WebError::InvalidBind {
                value: self.bind.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
