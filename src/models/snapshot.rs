// Snapshot document (`data/processos.json`) and the in-memory snapshot built from it.

use serde::{Deserialize, Serialize};

use super::lenient::de;
use super::{Analysis, Row};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "de::count")]
    pub total_processos: u64,
    /// ISO-8601 timestamp of the last spreadsheet sync.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub ultima_atualizacao: Option<String>,
    #[serde(
        default,
        deserialize_with = "de::null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub fonte: Option<String>,
}

/// Wire shape of the snapshot JSON. Every field is optional on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub processos: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    /// Precomputed JSON document.
    Json,
    /// Live CSV export of the spreadsheet.
    Spreadsheet,
}

/// One self-consistent bundle of metadata, rows and analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub metadata: Metadata,
    pub rows: Vec<Row>,
    pub analysis: Analysis,
    pub origin: SnapshotOrigin,
}

impl Snapshot {
    /// Embedded last-update timestamp, used to detect fresher data.
    pub fn last_update(&self) -> Option<&str> {
        self.metadata.ultima_atualizacao.as_deref()
    }

    pub fn to_document(&self) -> SnapshotDocument {
        SnapshotDocument {
            metadata: self.metadata.clone(),
            processos: self.rows.clone(),
            analysis: Some(self.analysis.clone()),
        }
    }
}
