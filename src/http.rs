//! HTTP server: scrape endpoint, status pages and health probes.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Json, Router};
use axum::routing::get;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::HttpConfig;
use crate::status::{SharedStatus, StatusSnapshot, TableStatus, now_unix};

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    registry: Arc<Registry>,
    status: SharedStatus,
    client: reqwest::Client,
    source_url: String,
}

/// Create the HTTP router.
fn create_router(state: AppState, config: &HttpConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(index_handler))
        .route(&config.metrics_path, get(metrics_handler))
        .route("/status.html", get(modem_page_handler))
        .route("/api/status", get(api_status_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler));

    if let Some(dir) = &config.static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// Handler for the metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", OPENMETRICS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encoding failed: {e}\n"),
        )
            .into_response(),
    }
}

/// Handler for the human-readable status page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.status.read().clone();
    Html(render_status_page(&snapshot))
}

/// Handler for the JSON snapshot.
async fn api_status_handler(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.status.read().clone())
}

/// Raw passthrough of the modem's own status page.
async fn modem_page_handler(State(state): State<AppState>) -> Response {
    let result = async {
        state
            .client
            .get(&state.source_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
    .await;

    match result {
        Ok(body) => Html(body).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, format!("{e}\n")).into_response(),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// Handler for the /ready endpoint.
async fn ready_handler(State(state): State<AppState>) -> Response {
    if state.status.read().ready() {
        (StatusCode::OK, "ready\n").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready - no poll cycle completed yet\n",
        )
            .into_response()
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_table(page: &mut String, title: &str, table: &TableStatus) {
    let _ = write!(page, "<h2>{}</h2>", escape_html(title));
    if table.channels.is_empty() {
        page.push_str("<p>No channels reported.</p>");
        return;
    }
    page.push_str("<table><tr>");
    for field in &table.header {
        let _ = write!(page, "<th>{}</th>", escape_html(field));
    }
    page.push_str("</tr>");
    for channel in &table.channels {
        page.push_str("<tr>");
        for cell in channel {
            let _ = write!(page, "<td>{}</td>", escape_html(cell));
        }
        page.push_str("</tr>");
    }
    page.push_str("</table>");
}

/// Render the status snapshot as a small self-contained HTML page.
fn render_status_page(snapshot: &StatusSnapshot) -> String {
    let mut page = String::with_capacity(2048);
    page.push_str(
        "<!doctype html><html><head><title>arris-mon</title><style>\
         body{font-family:sans-serif;margin:2em}\
         table{border-collapse:collapse}\
         td,th{border:1px solid #aaa;padding:2px 8px;text-align:left}\
         .error{color:#b00}\
         </style></head><body><h1>Cable Modem Status</h1>",
    );

    match snapshot.last_poll_unix {
        Some(at) => {
            let age = now_unix().saturating_sub(at);
            let _ = write!(
                page,
                "<p>Source: {} &middot; cycles: {} &middot; last poll: {}s ago</p>",
                escape_html(&snapshot.source_url),
                snapshot.cycles,
                age
            );
        }
        None => {
            let _ = write!(
                page,
                "<p>Source: {} &middot; no poll cycle completed yet</p>",
                escape_html(&snapshot.source_url)
            );
        }
    }

    if let Some(error) = &snapshot.last_error {
        let _ = write!(page, "<p class=\"error\">Last error: {}</p>", escape_html(error));
    }

    write_table(&mut page, "Downstream", &snapshot.downstream);
    write_table(&mut page, "Upstream", &snapshot.upstream);

    page.push_str("</body></html>");
    page
}

/// HTTP server for the exporter.
pub struct HttpServer {
    state: AppState,
    listen_addr: SocketAddr,
    config: HttpConfig,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(
        registry: Arc<Registry>,
        status: SharedStatus,
        listen_addr: SocketAddr,
        config: HttpConfig,
        source_url: String,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            state: AppState {
                registry,
                status,
                client,
                source_url,
            },
            listen_addr,
            config,
        })
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.state, &self.config);

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        info!(
            addr = %self.listen_addr,
            path = %self.config.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ModemMetrics;
    use crate::status;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn make_router(status: SharedStatus) -> Router {
        let mut registry = Registry::default();
        let _metrics = ModemMetrics::new(&mut registry);
        let state = AppState {
            registry: Arc::new(registry),
            status,
            client: reqwest::Client::new(),
            source_url: "http://modem/status_cgi".to_string(),
        };
        create_router(state, &HttpConfig::default())
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let router = make_router(status::shared("http://modem/status_cgi"));

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("openmetrics"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("downstream_freq"));
        assert!(text.contains("upstream_power"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = make_router(status::shared("http://modem/status_cgi"));

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint_follows_poll_state() {
        let shared = status::shared("http://modem/status_cgi");
        let router = make_router(shared.clone());

        let response = router
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        shared.write().last_poll_unix = Some(now_unix());

        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_renders_channels() {
        let shared = status::shared("http://modem/status_cgi");
        {
            let mut snapshot = shared.write();
            snapshot.last_poll_unix = Some(now_unix());
            snapshot.cycles = 3;
            snapshot.downstream = TableStatus {
                header: vec!["".into(), "DCID".into(), "Freq".into()],
                channels: vec![vec![
                    "Downstream 1".into(),
                    "73".into(),
                    "114.00 MHz".into(),
                ]],
            };
        }
        let router = make_router(shared);

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Downstream 1"));
        assert!(text.contains("114.00 MHz"));
        assert!(text.contains("No channels reported."), "upstream is empty");
    }

    #[tokio::test]
    async fn test_api_status_returns_json() {
        let shared = status::shared("http://modem/status_cgi");
        shared.write().cycles = 7;
        let router = make_router(shared);

        let response = router
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["cycles"], 7);
        assert_eq!(value["source_url"], "http://modem/status_cgi");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
