// Typed view of a row: the columns the aggregation reads, with defaults for missing cells.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{MonthKey, Row, lenient};

/// Status used when a row has no `Status` cell.
pub const UNKNOWN_STATUS: &str = "Desconhecido";

const SYNC_DATE_FMT: &str = "%d/%m/%Y";

/// Spreadsheet headers for the columns the dashboard reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default = "default_status_column")]
    pub status: String,
    #[serde(default = "default_sync_date_column")]
    pub sync_date: String,
    #[serde(default = "default_days_column")]
    pub days: String,
    #[serde(default = "default_protocol_column")]
    pub protocol: String,
    #[serde(default = "default_name_column")]
    pub name: String,
}

fn default_status_column() -> String {
    "Status".into()
}

fn default_sync_date_column() -> String {
    "Data Sincronismo".into()
}

fn default_days_column() -> String {
    "Dias".into()
}

fn default_protocol_column() -> String {
    "Protocolo GS".into()
}

fn default_name_column() -> String {
    "Nome".into()
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            status: default_status_column(),
            sync_date: default_sync_date_column(),
            days: default_days_column(),
            protocol: default_protocol_column(),
            name: default_name_column(),
        }
    }
}

impl ColumnMap {
    /// Expected columns absent from `headers`. Missing columns are not fatal: their cells default.
    pub fn missing_from<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        [&self.status, &self.sync_date, &self.days]
            .into_iter()
            .filter(|c| !headers.iter().any(|h| h == *c))
            .map(String::as_str)
            .collect()
    }
}

/// One tracked process record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processo {
    /// `Status` cell, or [`UNKNOWN_STATUS`] when absent or blank.
    pub status: String,
    /// Raw `Data Sincronismo` cell (`DD/MM/YYYY`), empty when absent.
    pub sync_date: String,
    /// `Dias` cell as an integer; 0 when absent or non-numeric.
    pub days: i64,
    pub protocol: Option<String>,
    pub name: Option<String>,
    pub row: Row,
}

impl Processo {
    pub fn from_row(row: Row, columns: &ColumnMap) -> Self {
        let status = row
            .non_empty(&columns.status)
            .unwrap_or(UNKNOWN_STATUS)
            .to_string();
        let sync_date = row.non_empty(&columns.sync_date).unwrap_or("").to_string();
        let days = row
            .get(&columns.days)
            .and_then(lenient::parse_int_prefix)
            .unwrap_or(0);
        let protocol = row.non_empty(&columns.protocol).map(str::to_string);
        let name = row.non_empty(&columns.name).map(str::to_string);
        Self {
            status,
            sync_date,
            days,
            protocol,
            name,
            row,
        }
    }

    /// Grouping month, or `None` when the date is missing or malformed.
    pub fn month_key(&self) -> Option<MonthKey> {
        if self.sync_date.is_empty() {
            return None;
        }
        MonthKey::from_sync_date(&self.sync_date)
    }

    pub fn sync_date_parsed(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.sync_date, SYNC_DATE_FMT).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_missing_cells() {
        let row: Row = [("Nome", "Fulano")].into_iter().collect();
        let p = Processo::from_row(row, &ColumnMap::default());
        assert_eq!(p.status, UNKNOWN_STATUS);
        assert_eq!(p.days, 0);
        assert_eq!(p.sync_date, "");
        assert_eq!(p.month_key(), None);
        assert_eq!(p.name.as_deref(), Some("Fulano"));
        assert_eq!(p.protocol, None);
    }

    #[test]
    fn reads_configured_columns() {
        let columns = ColumnMap {
            days: "Dias de retorno".into(),
            ..ColumnMap::default()
        };
        let row: Row = [
            ("Status", " Concluído "),
            ("Data Sincronismo", "03/02/2024"),
            ("Dias de retorno", "9"),
        ]
        .into_iter()
        .collect();
        let p = Processo::from_row(row, &columns);
        assert_eq!(p.status, "Concluído");
        assert_eq!(p.days, 9);
        assert_eq!(p.month_key(), Some(MonthKey::from("2024-02")));
        assert_eq!(
            p.sync_date_parsed(),
            NaiveDate::from_ymd_opt(2024, 2, 3)
        );
    }

    #[test]
    fn reports_missing_expected_columns() {
        let headers = vec!["Status".to_string(), "Nome".to_string()];
        let columns = ColumnMap::default();
        assert_eq!(
            columns.missing_from(&headers),
            vec!["Data Sincronismo", "Dias"]
        );
    }
}
