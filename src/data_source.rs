// Snapshot loading: precomputed JSON document first, live spreadsheet CSV export as fallback.
// Both paths produce the same Snapshot so consumers never care where the data came from.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{info, instrument, warn};
use url::Url;

use crate::aggregator;
use crate::config::SourceConfig;
use crate::csv_parser;
use crate::error::SourceError;
use crate::models::{ColumnMap, Metadata, Snapshot, SnapshotDocument, SnapshotOrigin};
use crate::sync_poller::SnapshotFetcher;
use crate::version;

/// `fonte` of snapshots built from the spreadsheet export.
pub const FALLBACK_SOURCE_LABEL: &str = "Google Sheets (fallback)";

/// HTTP client shared by the data source and the sync poller.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(version::user_agent()).build()
}

/// A sheet of a Google spreadsheet, exported as CSV through the gviz endpoint.
#[derive(Debug, Clone)]
pub struct SheetLocation {
    base_url: Url,
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl SheetLocation {
    /// `base_url` is the spreadsheets root (`https://docs.google.com/spreadsheets/d/`).
    pub fn new(
        base_url: &str,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Self, SourceError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            base_url: Url::parse(&base)?,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
        })
    }

    /// `{base}/{id}/gviz/tq?tqx=out:csv&sheet={sheet}` with the sheet name URL-encoded.
    pub fn export_url(&self) -> Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join(&format!("{}/gviz/tq", self.spreadsheet_id))?;
        url.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("sheet", &self.sheet_name);
        Ok(url)
    }
}

pub struct DataSource {
    client: Client,
    snapshot_url: Url,
    sheet: SheetLocation,
    columns: ColumnMap,
}

impl DataSource {
    pub fn new(
        client: Client,
        snapshot_url: Url,
        sheet: SheetLocation,
        columns: ColumnMap,
    ) -> Self {
        Self {
            client,
            snapshot_url,
            sheet,
            columns,
        }
    }

    pub fn from_config(
        client: Client,
        source: &SourceConfig,
        columns: &ColumnMap,
    ) -> Result<Self, SourceError> {
        let sheet = SheetLocation::new(
            &source.sheets_base_url,
            &source.spreadsheet_id,
            &source.sheet_name,
        )?;
        Ok(Self::new(
            client,
            source.snapshot_url()?,
            sheet,
            columns.clone(),
        ))
    }

    pub fn snapshot_url(&self) -> &Url {
        &self.snapshot_url
    }

    pub fn sheet(&self) -> &SheetLocation {
        &self.sheet
    }

    /// Snapshot document, or the spreadsheet export when the document cannot be loaded.
    /// Fails only when both sources fail.
    #[instrument(skip(self), fields(source = "data_source", operation = "load"))]
    pub async fn load(&self) -> Result<Snapshot, SourceError> {
        let primary = match self.load_snapshot().await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) => e,
        };
        warn!(
            error = %primary,
            url = %self.snapshot_url,
            "snapshot unavailable; falling back to spreadsheet export"
        );
        self.load_spreadsheet()
            .await
            .map_err(|fallback| SourceError::Unavailable {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            })
    }

    /// Precomputed document at `data/processos.json`.
    pub async fn load_snapshot(&self) -> Result<Snapshot, SourceError> {
        let request = self
            .client
            .get(self.snapshot_url.clone())
            .header(ACCEPT, "application/json");
        let body = fetch_text(request, &self.snapshot_url).await?;
        let document: SnapshotDocument = serde_json::from_str(&body)?;
        let snapshot = snapshot_from_document(document, &self.columns, SnapshotOrigin::Json);
        info!(
            total_processos = snapshot.metadata.total_processos,
            ultima_atualizacao = snapshot.last_update().unwrap_or("-"),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Live CSV export of the configured sheet, aggregated locally.
    pub async fn load_spreadsheet(&self) -> Result<Snapshot, SourceError> {
        let url = self.sheet.export_url()?;
        let body = fetch_text(self.client.get(url.clone()), &url).await?;
        let snapshot = snapshot_from_csv(&body, &self.columns, FALLBACK_SOURCE_LABEL, Utc::now());
        info!(
            rows = snapshot.rows.len(),
            sheet = %self.sheet.sheet_name,
            "spreadsheet export loaded"
        );
        Ok(snapshot)
    }
}

impl SnapshotFetcher for DataSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
        self.load().await
    }
}

/// Sends `request`; non-2xx answers become [`SourceError::Http`].
pub(crate) async fn fetch_text(
    request: reqwest::RequestBuilder,
    url: &Url,
) -> Result<String, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Http {
            url: url.to_string(),
            status,
        });
    }
    Ok(response.text().await?)
}

/// Snapshot from a decoded document. The document's analysis is used as-is; a document
/// without one is aggregated from its rows.
pub fn snapshot_from_document(
    document: SnapshotDocument,
    columns: &ColumnMap,
    origin: SnapshotOrigin,
) -> Snapshot {
    let SnapshotDocument {
        metadata,
        processos,
        analysis,
    } = document;
    let analysis = analysis.unwrap_or_else(|| {
        let mut analysis = aggregator::analyze_rows(&processos, columns);
        analysis.ultima_atualizacao = metadata.ultima_atualizacao.clone();
        analysis
    });
    Snapshot {
        metadata,
        rows: processos,
        analysis,
        origin,
    }
}

/// Snapshot from spreadsheet CSV text, stamped with `now` as its last update.
pub fn snapshot_from_csv(
    text: &str,
    columns: &ColumnMap,
    source_label: &str,
    now: DateTime<Utc>,
) -> Snapshot {
    let parsed = csv_parser::parse_csv(text);
    let missing = columns.missing_from(&parsed.headers);
    if !missing.is_empty() && !parsed.headers.is_empty() {
        warn!(?missing, "spreadsheet export lacks expected columns; cells default");
    }

    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut analysis = aggregator::analyze_rows(&parsed.rows, columns);
    analysis.ultima_atualizacao = Some(timestamp.clone());

    Snapshot {
        metadata: Metadata {
            total_processos: parsed.rows.len() as u64,
            ultima_atualizacao: Some(timestamp),
            fonte: Some(source_label.to_string()),
        },
        rows: parsed.rows,
        analysis,
        origin: SnapshotOrigin::Spreadsheet,
    }
}
