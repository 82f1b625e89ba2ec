use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

/// Startup and serve failures mapped to exit codes.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("invalid bind address '{value}': {source}")]
    InvalidBind {
        value: String,
        #[source]
        source: AddrParseError,
    },

    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl WebError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidBind { .. } => 2,
            Self::Bind { .. } => 10,
            Self::Serve(_) => 11,
        }
    }
}
