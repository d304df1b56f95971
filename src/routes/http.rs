// GET handlers: version, snapshot data, chart series; POST /api/sync

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;

use super::AppState;
use crate::aggregator;
use crate::charts::MonthLabelStyle;
use crate::csv_parser;
use crate::models::{Metadata, Processo, Row, SnapshotOrigin};
use crate::version::{NAME, VERSION};

/// 503 body for every data route while nothing has been loaded.
fn no_data() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "error": "no snapshot loaded" })),
    )
        .into_response()
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataView {
    #[serde(flatten)]
    metadata: Metadata,
    origin: SnapshotOrigin,
    built_at: DateTime<Utc>,
}

/// GET /api/metadata: snapshot metadata plus where it came from.
pub(super) async fn metadata_handler(State(state): State<AppState>) -> Response {
    let guard = state.dashboard.read().await;
    let Some(dashboard) = guard.as_ref() else {
        return no_data();
    };
    Json(MetadataView {
        metadata: dashboard.snapshot.metadata.clone(),
        origin: dashboard.snapshot.origin,
        built_at: dashboard.built_at,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub(super) struct ProcessosQuery {
    #[serde(default)]
    unique: bool,
}

/// Rows as loaded, or one per (protocol, name) with `unique=true`.
fn selected_rows(rows: &[Row], unique: bool, state: &AppState) -> Vec<Row> {
    if !unique {
        return rows.to_vec();
    }
    let processos: Vec<Processo> = rows
        .iter()
        .cloned()
        .map(|r| Processo::from_row(r, &state.columns))
        .collect();
    aggregator::unique_processos(&processos)
        .into_iter()
        .map(|p| p.row)
        .collect()
}

/// GET /api/processos: raw rows.
pub(super) async fn processos_handler(
    State(state): State<AppState>,
    Query(query): Query<ProcessosQuery>,
) -> Response {
    let guard = state.dashboard.read().await;
    let Some(dashboard) = guard.as_ref() else {
        return no_data();
    };
    Json(selected_rows(&dashboard.snapshot.rows, query.unique, &state)).into_response()
}

/// GET /api/processos.csv: raw rows as CSV, columns in first-seen order.
pub(super) async fn processos_csv_handler(
    State(state): State<AppState>,
    Query(query): Query<ProcessosQuery>,
) -> Response {
    let guard = state.dashboard.read().await;
    let Some(dashboard) = guard.as_ref() else {
        return no_data();
    };
    let rows = selected_rows(&dashboard.snapshot.rows, query.unique, &state);
    let mut headers: Vec<String> = Vec::new();
    for column in rows.iter().flat_map(Row::columns) {
        if !headers.iter().any(|h| h == column) {
            headers.push(column.to_string());
        }
    }
    match csv_parser::format_csv(&headers, &rows) {
        Ok(body) => ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "format_csv", "CSV export failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/analysis: aggregated statistics.
pub(super) async fn analysis_handler(State(state): State<AppState>) -> Response {
    let guard = state.dashboard.read().await;
    let Some(dashboard) = guard.as_ref() else {
        return no_data();
    };
    Json(dashboard.snapshot.analysis.clone()).into_response()
}

/// GET /api/charts/status: pie series; 204 when the dataset is empty.
pub(super) async fn status_chart_handler(State(state): State<AppState>) -> Response {
    let guard = state.dashboard.read().await;
    let Some(dashboard) = guard.as_ref() else {
        return no_data();
    };
    match &dashboard.status_chart {
        Some(chart) => Json(chart.clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TemporalQuery {
    #[serde(default)]
    with_year: bool,
}

/// GET /api/charts/temporal: monthly series; 204 when the dataset is empty.
pub(super) async fn temporal_chart_handler(
    State(state): State<AppState>,
    Query(query): Query<TemporalQuery>,
) -> Response {
    let guard = state.dashboard.read().await;
    let Some(dashboard) = guard.as_ref() else {
        return no_data();
    };
    let style = if query.with_year {
        MonthLabelStyle::WithYear
    } else {
        MonthLabelStyle::Abbreviated
    };
    match dashboard.temporal(style) {
        Some(chart) => Json(chart.clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /data/processos.json: the current snapshot in document form.
pub(super) async fn document_handler(State(state): State<AppState>) -> Response {
    let guard = state.dashboard.read().await;
    let Some(dashboard) = guard.as_ref() else {
        return no_data();
    };
    Json(dashboard.snapshot.to_document()).into_response()
}

/// POST /api/sync: queues a sync on the background worker.
pub(super) async fn sync_handler(State(state): State<AppState>) -> Response {
    match state.sync_tx.try_send(()) {
        Ok(()) | Err(TrySendError::Full(())) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "queued": true })),
        )
            .into_response(),
        Err(TrySendError::Closed(())) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "sync worker not running" })),
        )
            .into_response(),
    }
}
