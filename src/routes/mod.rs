// HTTP routes: snapshot data and chart series as JSON

mod http;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

use crate::dashboard::SharedDashboard;
use crate::models::ColumnMap;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) dashboard: SharedDashboard,
    pub(crate) sync_tx: mpsc::Sender<()>,
    pub(crate) columns: ColumnMap,
}

pub fn app(dashboard: SharedDashboard, sync_tx: mpsc::Sender<()>, columns: ColumnMap) -> Router {
    let state = AppState {
        dashboard,
        sync_tx,
        columns,
    };
    Router::new()
        .route("/", get(|| async { "Processos dashboard" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/metadata", get(http::metadata_handler)) // GET /api/metadata
        .route("/api/processos", get(http::processos_handler)) // GET /api/processos?unique=
        .route("/api/processos.csv", get(http::processos_csv_handler)) // GET /api/processos.csv
        .route("/api/analysis", get(http::analysis_handler)) // GET /api/analysis
        .route("/api/charts/status", get(http::status_chart_handler)) // GET /api/charts/status
        .route("/api/charts/temporal", get(http::temporal_chart_handler)) // GET temporal series
        .route("/api/sync", post(http::sync_handler)) // POST /api/sync
        .route("/data/processos.json", get(http::document_handler)) // GET /data/processos.json
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
