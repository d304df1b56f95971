// Shared test helpers
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use processos_dashboard::data_source::snapshot_from_document;
use processos_dashboard::error::SourceError;
use processos_dashboard::models::*;
use processos_dashboard::sync_poller::SnapshotFetcher;

pub fn row(status: &str, dias: &str, data_sincronismo: &str) -> Row {
    [
        ("Status", status),
        ("Dias", dias),
        ("Data Sincronismo", data_sincronismo),
    ]
    .into_iter()
    .collect()
}

pub fn processo(status: &str, dias: &str, data_sincronismo: &str) -> Processo {
    Processo::from_row(row(status, dias, data_sincronismo), &ColumnMap::default())
}

pub fn sample_rows() -> Vec<Row> {
    vec![
        row("Concluído", "5", "10/01/2024"),
        row("Em análise", "10", "15/01/2024"),
        row("Concluído", "3", "02/02/2024"),
        row("Cancelado", "8", "20/02/2024"),
    ]
}

/// Snapshot built from `sample_rows` whose metadata carries `timestamp`.
pub fn snapshot_at(timestamp: &str) -> Snapshot {
    let rows = sample_rows();
    snapshot_from_document(
        SnapshotDocument {
            metadata: Metadata {
                total_processos: rows.len() as u64,
                ultima_atualizacao: Some(timestamp.to_string()),
                fonte: Some("Google Sheets - Todos processos".to_string()),
            },
            processos: rows,
            analysis: None,
        },
        &ColumnMap::default(),
        SnapshotOrigin::Json,
    )
}

pub fn transport_error() -> SourceError {
    SourceError::Http {
        url: "http://upstream.test/data/processos.json".to_string(),
        status: reqwest::StatusCode::BAD_GATEWAY,
    }
}

/// Fetcher returning queued results in order; an exhausted script yields errors.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Snapshot, SourceError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Snapshot, SourceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(transport_error()))
    }
}

/// Serves `router` on an ephemeral local port; returns its base URL ("http://127.0.0.1:port/").
pub async fn spawn_upstream(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/", addr)
}
