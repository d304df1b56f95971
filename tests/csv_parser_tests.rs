// CSV parsing tests: quoting, ragged rows, blank lines, format → parse round trip

use processos_dashboard::csv_parser::{format_csv, parse_csv};
use processos_dashboard::models::Row;

#[test]
fn test_parses_header_and_rows() {
    let parsed = parse_csv("Status,Dias,Data Sincronismo\nConcluído,5,10/01/2024\n");
    assert_eq!(parsed.headers, vec!["Status", "Dias", "Data Sincronismo"]);
    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows[0].get("Status"), Some("Concluído"));
    assert_eq!(parsed.rows[0].get("Dias"), Some("5"));
    assert_eq!(parsed.rows[0].get("Data Sincronismo"), Some("10/01/2024"));
}

#[test]
fn test_quoted_fields_keep_commas_and_escaped_quotes() {
    let text = "\"Nome\",\"Obs\"\n\"Silva, João\",\"disse \"\"ok\"\"\"\n";
    let parsed = parse_csv(text);
    assert_eq!(parsed.headers, vec!["Nome", "Obs"]);
    assert_eq!(parsed.rows[0].get("Nome"), Some("Silva, João"));
    assert_eq!(parsed.rows[0].get("Obs"), Some("disse \"ok\""));
}

#[test]
fn test_values_are_trimmed() {
    let parsed = parse_csv("A , B\n  x  ,   y\n");
    assert_eq!(parsed.headers, vec!["A", "B"]);
    assert_eq!(parsed.rows[0].get("A"), Some("x"));
    assert_eq!(parsed.rows[0].get("B"), Some("y"));
}

#[test]
fn test_short_rows_are_padded_with_empty_cells() {
    let parsed = parse_csv("A,B,C\n1\n1,2\n");
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[0].get("A"), Some("1"));
    assert_eq!(parsed.rows[0].get("B"), Some(""));
    assert_eq!(parsed.rows[0].get("C"), Some(""));
    assert_eq!(parsed.rows[1].get("B"), Some("2"));
    assert_eq!(parsed.rows[1].get("C"), Some(""));
}

#[test]
fn test_extra_cells_are_ignored() {
    let parsed = parse_csv("A,B\n1,2,3,4\n");
    assert_eq!(parsed.rows[0].len(), 2);
    assert_eq!(parsed.rows[0].get("B"), Some("2"));
}

#[test]
fn test_blank_lines_are_skipped() {
    let parsed = parse_csv("A,B\n\n1,2\n   \n\n3,4\n\n");
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[0].get("A"), Some("1"));
    assert_eq!(parsed.rows[1].get("A"), Some("3"));
}

#[test]
fn test_rows_keep_header_order() {
    let parsed = parse_csv("Z,A,M\n1,2,3\n");
    let columns: Vec<&str> = parsed.rows[0].columns().collect();
    assert_eq!(columns, vec!["Z", "A", "M"]);
}

#[test]
fn test_quote_after_leading_space_still_opens_quoted_mode() {
    let parsed = parse_csv("Nome,Status,Dias\nFulano, \"Em análise, aguardando\", 5\n");
    assert_eq!(parsed.rows[0].get("Nome"), Some("Fulano"));
    assert_eq!(parsed.rows[0].get("Status"), Some("Em análise, aguardando"));
    assert_eq!(parsed.rows[0].get("Dias"), Some("5"));

    let parsed = parse_csv("A,B\na, \"b, c\"\n");
    assert_eq!(parsed.rows[0].get("A"), Some("a"));
    assert_eq!(parsed.rows[0].get("B"), Some("b, c"));
}

#[test]
fn test_quote_inside_field_toggles_quoted_mode() {
    let parsed = parse_csv("A,B\nx\"y,z\"w,2\n");
    assert_eq!(parsed.rows[0].get("A"), Some("xy,zw"));
    assert_eq!(parsed.rows[0].get("B"), Some("2"));
}

#[test]
fn test_line_of_empty_cells_is_kept() {
    let parsed = parse_csv("A,B\n,\n1,2\n");
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[0].get("A"), Some(""));
}

#[test]
fn test_unterminated_quote_does_not_fail() {
    let parsed = parse_csv("A,B\n\"open,1\n2,3\n");
    assert_eq!(parsed.headers, vec!["A", "B"]);
    // Best effort: whatever was recovered still has every header column.
    for row in &parsed.rows {
        assert_eq!(row.len(), 2);
    }
}

#[test]
fn test_format_then_parse_reconstructs_values() {
    let headers = vec![
        "Protocolo GS".to_string(),
        "Nome".to_string(),
        "Observação".to_string(),
    ];
    let rows: Vec<Row> = vec![
        [
            ("Protocolo GS", "GS-001"),
            ("Nome", "Silva, João"),
            ("Observação", "aguardando \"parecer\", prazo curto"),
        ]
        .into_iter()
        .collect(),
        [
            ("Protocolo GS", "GS-002"),
            ("Nome", "\"Maria\""),
            ("Observação", ",,,"),
        ]
        .into_iter()
        .collect(),
        [
            ("Protocolo GS", "GS-003"),
            ("Nome", "Ana"),
            ("Observação", ""),
        ]
        .into_iter()
        .collect(),
    ];

    let text = format_csv(&headers, &rows).unwrap();
    let parsed = parse_csv(&text);
    assert_eq!(parsed.headers, headers);
    assert_eq!(parsed.rows, rows);
}

#[test]
fn test_format_writes_missing_cells_empty() {
    let headers = vec!["A".to_string(), "B".to_string()];
    let rows: Vec<Row> = vec![[("A", "1")].into_iter().collect()];
    let text = format_csv(&headers, &rows).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), vec!["A,B", "1,"]);
}
