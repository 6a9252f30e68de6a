use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    client::Seriesly,
    config::Config,
    metrics,
    models::{DbInfo, SeriesResponse},
    source::SerieslySource,
    timelib,
    window::Window,
    Result, SerieslyError,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub source: SerieslySource,
    pub store: Seriesly,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self {
            source: SerieslySource::with_client(&config.seriesly_url, client.clone()),
            store: Seriesly::with_client(&config.seriesly_url, client)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    pub ptr: String,
    pub reducer: String,
    pub start: String,
    pub stop: String,
    pub step: i64,
    pub label: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .route("/dbs", get(list_dbs))
        .route("/dbs/:db", get(db_info))
        .route("/dbs/:db/compact", post(compact_db))
        .route("/series/:db", get(get_series))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn prometheus_metrics() -> Result<impl IntoResponse> {
    let body = metrics::gather_text()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

async fn list_dbs(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.store.list().await?))
}

async fn db_info(State(state): State<AppState>, Path(db): Path<String>) -> Result<Json<DbInfo>> {
    Ok(Json(state.store.db(&db).info().await?))
}

async fn compact_db(State(state): State<AppState>, Path(db): Path<String>) -> Result<StatusCode> {
    info!("Compacting database: {}", db);
    state.store.db(&db).compact().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_series(
    State(state): State<AppState>,
    Path(db): Path<String>,
    Query(params): Query<SeriesParams>,
) -> Result<Json<SeriesResponse>> {
    let window = Window::new(
        parse_instant(&params.start)?,
        parse_instant(&params.stop)?,
        params.step,
    )?;

    let metric = state
        .source
        .metric(&db, &params.ptr, &params.reducer, params.label.as_deref());
    info!("Getting series: {} over {:?}", metric.label(), window);

    let values = metric.fetch(&window).await?;

    Ok(Json(SeriesResponse::new(
        metric.label().to_string(),
        window.start(),
        window.stop(),
        window.step(),
        &values,
    )))
}

/// Bare integers are epoch milliseconds; anything else goes through timelib.
fn parse_instant(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(ms) => Ok(ms),
        Err(_) => Ok(timelib::parse_time(raw)?.timestamp_millis()),
    }
}

pub async fn start_server(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Serving {} on {}", config.seriesly_url, addr);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        SerieslyError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SerieslyError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(AppState::from_config(&Config::default()).unwrap())
    }

    #[test]
    fn test_parse_instant() {
        assert_eq!(parse_instant("1346189075000").unwrap(), 1_346_189_075_000);
        assert_eq!(parse_instant("0").unwrap(), 0);
        assert_eq!(parse_instant("2012-08-28T21:24:35Z").unwrap(), 1_346_189_075_000);
        assert!(parse_instant("later").is_err());
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_series_rejects_zero_step() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/series/metrics?ptr=cpu&reducer=avg&start=0&stop=3&step=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid window: step must be > 0, was 0");
    }

    #[tokio::test]
    async fn test_series_rejects_oversized_window() {
        for uri in [
            "/series/metrics?ptr=cpu&reducer=avg&start=0&stop=9223372036854775807&step=1",
            "/series/metrics?ptr=cpu&reducer=avg&start=0&stop=10000000000000&step=1",
        ] {
            let response = test_router()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert!(json["error"].as_str().unwrap().contains("at most 100000 allowed"));
        }
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        metrics::init_metrics();
        let response = test_router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("seriesly_empty_responses_total"));
    }
}
