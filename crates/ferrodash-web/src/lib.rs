//! # Ferrodash Web
//!
//! axum host for the Ferrodash dashboard. Every page load runs the
//! [`ferrodash_core`] pipeline once and renders the outcome.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | HTML dashboard (charts + latest rows) or the halt banner |
//! | `GET /api/snapshot` | Same run as JSON |
//! | `GET /health` | `{ "status": "ok" }` |

pub mod cli;
pub mod error;
pub mod presenter;
pub mod routes;
pub mod state;

pub use cli::ServerArgs;
pub use error::WebError;
pub use routes::router;
pub use state::AppState;
