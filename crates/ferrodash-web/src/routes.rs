use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use ferrodash_core::{DashboardError, DashboardErrorKind};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::presenter;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api/snapshot", get(snapshot_json))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dashboard_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let outcome = state.run().await;
    Html(presenter::render_page(&outcome, state.config.tail_rows))
}

async fn snapshot_json(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = match state.run().await {
        Ok(snapshot) => snapshot,
        Err(error) => return ApiError::from(error).into_response(),
    };

    match snapshot.to_json_value() {
        Ok(body) => Json(body).into_response(),
        Err(source) => {
            error!(error = %source, "snapshot serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": { "kind": "internal", "message": source.to_string() } })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// JSON body for a halted run.
#[derive(Debug, Serialize)]
struct ApiError {
    kind: DashboardErrorKind,
    message: String,
}

impl From<DashboardError> for ApiError {
    fn from(error: DashboardError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            DashboardErrorKind::Configuration => StatusCode::SERVICE_UNAVAILABLE,
            DashboardErrorKind::Connectivity | DashboardErrorKind::Fetch => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use ferrodash_core::{
        BinanceConnector, DashboardConfig, HttpClient, HttpError, HttpRequest, HttpResponse,
        MapSecretStore, SyntheticHttpClient, API_KEY_SECRET, API_SECRET_SECRET,
    };
    use serde_json::Value;
    use std::future::Future;
    use std::pin::Pin;
    use tower::ServiceExt;

    /// Answers the ping but returns an object where the klines array belongs.
    struct MalformedKlinesClient;

    impl HttpClient for MalformedKlinesClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async { Ok(HttpResponse::ok_json("{}")) })
        }
    }

    fn app(secrets: MapSecretStore) -> Router {
        app_with(
            secrets,
            Arc::new(SyntheticHttpClient::anchored_at(1_704_067_200_000)),
            DashboardConfig::default().base_url,
        )
    }

    fn app_with(secrets: MapSecretStore, http: Arc<dyn HttpClient>, base_url: String) -> Router {
        let config = DashboardConfig::default();
        let connector = BinanceConnector::new(http, base_url, config.timeout_ms);
        router(AppState::new(config, Arc::new(secrets), Arc::new(connector)))
    }

    fn with_credentials() -> MapSecretStore {
        MapSecretStore::new()
            .with(API_KEY_SECRET, "key")
            .with(API_SECRET_SECRET, "secret")
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_body(app(MapSecretStore::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn dashboard_renders_charts_and_latest_rows() {
        let (status, body) = get_body(app(with_credentials()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Connected to Binance Testnet API"));
        assert!(body.contains("Price Chart"));
        assert!(body.contains("RSI &amp; MACD Indicators"));
        assert!(body.contains("Latest Market Data"));
        assert_eq!(body.matches("<polyline").count(), 4);
        assert_eq!(body.matches("<tr><td>").count(), 10);
    }

    #[tokio::test]
    async fn dashboard_without_credentials_shows_only_the_banner() {
        let (status, body) = get_body(app(MapSecretStore::new()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("API credentials are missing"));
        assert!(!body.contains("Price Chart"));
    }

    #[tokio::test]
    async fn snapshot_returns_enriched_rows() {
        let (status, body) = get_body(app(with_credentials()), "/api/snapshot").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["symbol"], "BTCUSDT");
        assert_eq!(json["interval"], "1h");
        assert_eq!(json["fetched_rows"], 100);

        let rows = json["table"]["rows"].as_array().expect("rows array");
        assert_eq!(rows.len(), 66);
        assert!(rows[0]["rsi"].is_number());
        assert!(rows[0]["close_time"].is_number());
        assert_eq!(rows[65]["ts"], "2023-12-31T23:00:00Z");
    }

    #[tokio::test]
    async fn snapshot_maps_configuration_halt_to_503() {
        let (status, body) = get_body(app(MapSecretStore::new()), "/api/snapshot").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let json: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["error"]["kind"], "configuration");
    }

    #[tokio::test]
    async fn snapshot_maps_connectivity_halt_to_502() {
        let app = app_with(
            with_credentials(),
            Arc::new(SyntheticHttpClient::anchored_at(1_704_067_200_000)),
            String::from("not-a-url"),
        );

        let (status, body) = get_body(app, "/api/snapshot").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let json: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["error"]["kind"], "connectivity");
    }

    #[tokio::test]
    async fn snapshot_maps_fetch_halt_to_502() {
        let app = app_with(
            with_credentials(),
            Arc::new(MalformedKlinesClient),
            DashboardConfig::default().base_url,
        );

        let (status, body) = get_body(app, "/api/snapshot").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let json: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["error"]["kind"], "fetch");
        assert!(json["error"]["message"].is_string());
    }
}
