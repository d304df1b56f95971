// Snapshot document decoding tests: lenient fields, row order, analysis fallback

mod common;

use common::*;
use processos_dashboard::data_source::snapshot_from_document;
use processos_dashboard::models::*;
use serde_json::json;

#[test]
fn test_decodes_full_document() {
    let doc: SnapshotDocument = serde_json::from_value(json!({
        "metadata": {
            "total_processos": 2,
            "ultima_atualizacao": "2024-03-01T12:00:00.000Z",
            "fonte": "Google Sheets - Todos processos"
        },
        "processos": [
            { "Status": "Concluído", "Dias": "5", "Data Sincronismo": "10/01/2024" },
            { "Status": "Em análise", "Dias": 10, "Data Sincronismo": "15/01/2024" }
        ],
        "analysis": {
            "total_processos": 2,
            "status_distribution": { "Concluído": 1, "Em análise": 1 },
            "processos_por_mes": { "2024-01": 2 },
            "tempo_medio_por_mes": { "2024-01": 7.5 },
            "status_por_mes": { "2024-01": { "Concluído": 1, "Em análise": 1 } }
        }
    }))
    .unwrap();

    assert_eq!(doc.metadata.total_processos, 2);
    assert_eq!(
        doc.metadata.ultima_atualizacao.as_deref(),
        Some("2024-03-01T12:00:00.000Z")
    );
    assert_eq!(doc.processos.len(), 2);
    // Numeric cells become text
    assert_eq!(doc.processos[1].get("Dias"), Some("10"));

    let analysis = doc.analysis.unwrap();
    assert_eq!(analysis.total, 2);
    assert_eq!(analysis.monthly_avg_days[&MonthKey::from("2024-01")], 8);
    assert_eq!(
        analysis.status_percentage(&MonthKey::from("2024-01"), "Concluído"),
        50
    );
}

#[test]
fn test_nulls_and_missing_sections_fall_back_to_defaults() {
    let doc: SnapshotDocument = serde_json::from_value(json!({
        "metadata": { "total_processos": null, "ultima_atualizacao": null },
        "processos": null
    }))
    .unwrap();
    assert_eq!(doc.metadata.total_processos, 0);
    assert_eq!(doc.metadata.ultima_atualizacao, None);
    assert!(doc.processos.is_empty());
    assert!(doc.analysis.is_none());

    let empty: SnapshotDocument = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, SnapshotDocument::default());
}

#[test]
fn test_analysis_tolerates_garbage_values() {
    let analysis: Analysis = serde_json::from_value(json!({
        "total_processos": "3",
        "status_distribution": { "Concluído": "2", "Cancelado": null },
        "processos_por_mes": { "2024-02": "x" },
        "tempo_medio_por_mes": null,
        "status_por_mes": null
    }))
    .unwrap();
    assert_eq!(analysis.total, 3);
    assert_eq!(analysis.status_distribution.get("Concluído"), 2);
    assert_eq!(analysis.status_distribution.get("Cancelado"), 0);
    assert_eq!(analysis.monthly_counts[&MonthKey::from("2024-02")], 0);
    assert!(analysis.monthly_avg_days.is_empty());
    assert!(analysis.monthly_status.is_empty());
}

#[test]
fn test_rows_serialize_in_column_order() {
    let doc: SnapshotDocument = serde_json::from_str(
        r#"{"processos":[{"Nome":"Ana","Status":"Concluído","Dias":"2"}]}"#,
    )
    .unwrap();
    let json = serde_json::to_string(&doc.processos[0]).unwrap();
    assert_eq!(json, r#"{"Nome":"Ana","Status":"Concluído","Dias":"2"}"#);
}

#[test]
fn test_document_without_analysis_is_aggregated() {
    let doc: SnapshotDocument = serde_json::from_value(json!({
        "metadata": { "total_processos": 2, "ultima_atualizacao": "2024-05-01T00:00:00Z" },
        "processos": [
            { "Status": "Concluído", "Dias": "4", "Data Sincronismo": "01/05/2024" },
            { "Status": "Cancelado", "Dias": "2", "Data Sincronismo": "02/05/2024" }
        ]
    }))
    .unwrap();
    let snapshot = snapshot_from_document(doc, &ColumnMap::default(), SnapshotOrigin::Json);

    assert_eq!(snapshot.analysis.total, 2);
    assert_eq!(snapshot.analysis.status_distribution.get("Cancelado"), 1);
    assert_eq!(
        snapshot.analysis.monthly_avg_days[&MonthKey::from("2024-05")],
        3
    );
    assert_eq!(
        snapshot.analysis.ultima_atualizacao.as_deref(),
        Some("2024-05-01T00:00:00Z")
    );
    assert_eq!(snapshot.last_update(), Some("2024-05-01T00:00:00Z"));
}

#[test]
fn test_snapshot_round_trips_through_document() {
    let snapshot = snapshot_at("2024-06-01T08:00:00.000Z");
    let text = serde_json::to_string(&snapshot.to_document()).unwrap();
    let doc: SnapshotDocument = serde_json::from_str(&text).unwrap();
    let again = snapshot_from_document(doc, &ColumnMap::default(), SnapshotOrigin::Json);
    assert_eq!(again, snapshot);
}

#[test]
fn test_origin_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&SnapshotOrigin::Spreadsheet).unwrap(),
        r#""spreadsheet""#
    );
}
