use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::{Interval, UtcDateTime};

/// Offline transport that answers ping and klines with deterministic data.
///
/// Used by `--mock` so the dashboard can be exercised without network access.
/// Candles end at `anchor_millis` (exclusive) and follow a seeded wave.
#[derive(Debug, Clone)]
pub struct SyntheticHttpClient {
    anchor_millis: i64,
}

impl SyntheticHttpClient {
    pub fn new() -> Self {
        Self::anchored_at(UtcDateTime::now().unix_millis())
    }

    pub fn anchored_at(anchor_millis: i64) -> Self {
        Self { anchor_millis }
    }

    fn klines_body(&self, request: &HttpRequest) -> Result<String, HttpError> {
        let param = |name: &str| {
            request
                .query
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let symbol = param("symbol").unwrap_or("BTCUSDT");
        let interval = param("interval")
            .map(Interval::from_str)
            .transpose()
            .map_err(|e| HttpError::new(e.to_string()))?
            .unwrap_or(Interval::OneHour);
        let limit = param("limit")
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| HttpError::new(format!("invalid limit: {e}")))?
            .unwrap_or(500);

        let step = interval.duration_millis();
        let last_open = self.anchor_millis - self.anchor_millis.rem_euclid(step) - step;
        let seed = symbol
            .bytes()
            .fold(13_u64, |acc, byte| acc.wrapping_mul(29).wrapping_add(u64::from(byte)));
        let base = 20_000.0 + (seed % 40_000) as f64;

        let rows: Vec<Value> = (0..limit)
            .map(|index| {
                let open_time = last_open - step * (limit - 1 - index) as i64;
                let phase = index as f64 / 7.0;
                let open = base * (1.0 + 0.01 * phase.sin() + 0.0004 * index as f64);
                let close = base * (1.0 + 0.01 * (phase + 0.14).sin() + 0.0004 * (index + 1) as f64);
                let high = open.max(close) * 1.002;
                let low = open.min(close) * 0.998;
                let volume = 10.0 + (seed.wrapping_add(index as u64) % 50) as f64;
                json!([
                    open_time,
                    format!("{open:.2}"),
                    format!("{high:.2}"),
                    format!("{low:.2}"),
                    format!("{close:.2}"),
                    format!("{volume:.4}"),
                    open_time + step - 1,
                    format!("{:.2}", volume * close),
                    40 + index,
                    format!("{:.4}", volume / 2.0),
                    format!("{:.2}", volume * close / 2.0),
                    "0"
                ])
            })
            .collect();

        serde_json::to_string(&rows).map_err(|e| HttpError::new(e.to_string()))
    }
}

impl Default for SyntheticHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for SyntheticHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let path = request.path();
            if path.ends_with("/v3/ping") {
                Ok(HttpResponse::ok_json("{}"))
            } else if path.ends_with("/v3/klines") {
                self.klines_body(&request).map(HttpResponse::ok_json)
            } else {
                Ok(HttpResponse::with_status(
                    404,
                    r#"{"code":-1,"msg":"unknown synthetic endpoint"}"#,
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn klines_are_ascending_and_aligned_to_interval() {
        let client = SyntheticHttpClient::anchored_at(1_704_067_200_000 + 1_234);
        let request = HttpRequest::get("https://testnet.example/api/v3/klines")
            .with_query("symbol", "BTCUSDT")
            .with_query("interval", "1h")
            .with_query("limit", "5");

        let response = client.execute(request).await.expect("synthetic answers");
        let rows: Vec<Vec<Value>> = serde_json::from_str(&response.body).expect("json array");

        assert_eq!(rows.len(), 5);
        let times: Vec<i64> = rows
            .iter()
            .map(|row| row[0].as_i64().expect("open time"))
            .collect();
        assert!(times.windows(2).all(|pair| pair[1] - pair[0] == 3_600_000));
        assert_eq!(*times.last().expect("last"), 1_704_067_200_000 - 3_600_000);
    }

    #[tokio::test]
    async fn unknown_path_returns_not_found() {
        let client = SyntheticHttpClient::anchored_at(0);
        let response = client
            .execute(HttpRequest::get("https://testnet.example/api/v3/order"))
            .await
            .expect("synthetic answers");
        assert_eq!(response.status, 404);
    }
}
