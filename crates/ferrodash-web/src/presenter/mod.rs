//! HTML rendering of a dashboard run.
//!
//! A successful run shows the connected banner, the close-price chart, the
//! indicator chart and the latest rows. A halted run shows only the title and
//! the banner for the stage that failed.

mod chart;

use std::fmt::Write as _;

use ferrodash_core::{DashboardError, DashboardSnapshot, EnrichedRow, PassthroughFields};
use serde_json::Value;

pub use chart::{line_chart, Series};

pub const PAGE_TITLE: &str = "Crypto AI Bot Dashboard";

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:1040px;color:#1d2330}\
.banner{padding:.75rem 1rem;border-radius:6px;margin:1rem 0}\
.ok{background:#e6f4ea}.error{background:#fdecea}.warn{background:#fff4e5}\
.chart{width:100%;height:auto}\
table{border-collapse:collapse;font-size:12px;display:block;overflow-x:auto}\
th,td{border:1px solid #d0d4dc;padding:4px 6px;text-align:right;white-space:nowrap}";

/// Renders the page for one run outcome.
pub fn render_page(outcome: &Result<DashboardSnapshot, DashboardError>, tail_rows: usize) -> String {
    match outcome {
        Ok(snapshot) => render_dashboard(snapshot, tail_rows),
        Err(error) => render_halt(error),
    }
}

pub fn render_dashboard(snapshot: &DashboardSnapshot, tail_rows: usize) -> String {
    let rows = snapshot.table.rows();
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<div class="banner ok">{}</div>"#,
        escape_html(&snapshot.banner)
    );
    for warning in &snapshot.warnings {
        let _ = write!(body, r#"<div class="banner warn">{}</div>"#, escape_html(warning));
    }
    let _ = write!(
        body,
        "<p>{} · {} · {} candles fetched, {} with indicators</p>",
        snapshot.symbol,
        snapshot.interval,
        snapshot.fetched_rows,
        rows.len()
    );

    body.push_str("<h2>💹 Price Chart</h2>");
    body.push_str(&line_chart(
        "Price Chart",
        &[Series::new(
            "close",
            "#1f77b4",
            rows.iter().map(|row| row.candle.close).collect(),
        )],
    ));

    body.push_str("<h2>📈 RSI &amp; MACD Indicators</h2>");
    body.push_str(&line_chart(
        "RSI and MACD Indicators",
        &[
            Series::new("rsi", "#9467bd", rows.iter().map(|row| row.rsi).collect()),
            Series::new("macd", "#d62728", rows.iter().map(|row| row.macd).collect()),
            Series::new(
                "macd_signal",
                "#2ca02c",
                rows.iter().map(|row| row.macd_signal).collect(),
            ),
        ],
    ));

    body.push_str("<h2>🧾 Latest Market Data</h2>");
    body.push_str(&latest_rows_table(snapshot.table.tail(tail_rows)));

    page(&body)
}

pub fn render_halt(error: &DashboardError) -> String {
    page(&format!(
        r#"<div class="banner error">{}</div>"#,
        escape_html(&error.user_message())
    ))
}

fn latest_rows_table(rows: &[EnrichedRow]) -> String {
    let mut html = String::from("<table><thead><tr>");
    for column in ["timestamp", "open", "high", "low", "close", "volume"]
        .into_iter()
        .chain(PassthroughFields::COLUMNS)
        .chain(["rsi", "macd", "macd_signal"])
    {
        let _ = write!(html, "<th>{column}</th>");
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows {
        let candle = &row.candle;
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.4}</td>",
            candle.ts, candle.open, candle.high, candle.low, candle.close, candle.volume
        );
        for value in candle.passthrough.values() {
            let _ = write!(html, "<td>{}</td>", escape_html(&cell_text(value)));
        }
        let _ = write!(
            html,
            "<td>{:.2}</td><td>{:.4}</td><td>{:.4}</td></tr>",
            row.rsi, row.macd, row.macd_signal
        );
    }

    html.push_str("</tbody></table>");
    html
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{PAGE_TITLE}</title><style>{STYLE}</style></head>\
         <body><h1>{PAGE_TITLE}</h1>{body}</body></html>"
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_page_shows_only_title_and_banner() {
        let html = render_halt(&DashboardError::Connectivity(String::from("<timeout>")));
        assert!(html.contains("<title>Crypto AI Bot Dashboard</title>"));
        assert!(html.contains("Binance API connection failed: &lt;timeout&gt;"));
        assert!(!html.contains("Price Chart"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn fetch_halt_hides_the_cause() {
        let html = render_halt(&DashboardError::Fetch(String::from("row 3 is broken")));
        assert!(html.contains("Failed to fetch data from Binance."));
        assert!(!html.contains("row 3"));
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn passthrough_cells_drop_json_quoting() {
        assert_eq!(cell_text(&Value::String(String::from("1.5"))), "1.5");
        assert_eq!(cell_text(&serde_json::json!(42)), "42");
        assert_eq!(cell_text(&Value::Null), "");
    }
}
