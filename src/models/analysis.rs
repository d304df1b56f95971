// Aggregated view of a snapshot: status distribution and per-month statistics.
// Field names follow the snapshot document (`status_distribution`, `processos_por_mes`, ...).

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::lenient::{self, count_from_value, de};

/// Canonical `YYYY-MM` grouping key. Ordering is lexicographic, which is chronological
/// for four-digit years.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    pub fn new(year: i64, month: u32) -> Self {
        Self(format!("{}-{:02}", year, month))
    }

    /// Month of a `DD/MM/YYYY` date. `None` unless the text splits into exactly three
    /// `/` parts with an integer month in 1..=12 and an integer year.
    pub fn from_sync_date(date: &str) -> Option<Self> {
        let parts: Vec<&str> = date.trim().split('/').collect();
        let [_, month, year] = parts.as_slice() else {
            return None;
        };
        let month = lenient::parse_int_prefix(month)?;
        let year = lenient::parse_int_prefix(year)?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self::new(year, month as u32))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> Option<i64> {
        let (year, _) = self.0.split_once('-')?;
        year.parse().ok()
    }

    pub fn month(&self) -> Option<u32> {
        let (_, month) = self.0.split_once('-')?;
        month.parse().ok().filter(|m| (1..=12).contains(m))
    }
}

impl From<&str> for MonthKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status label → count, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    entries: Vec<(String, u64)>,
}

impl StatusCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, status: &str) {
        self.add(status, 1);
    }

    pub fn add(&mut self, status: &str, n: u64) {
        match self.entries.iter_mut().find(|(s, _)| s == status) {
            Some(entry) => entry.1 += n,
            None => self.entries.push((status.to_string(), n)),
        }
    }

    /// Count for any label; 0 when never seen.
    pub fn get(&self, status: &str) -> u64 {
        self.entries
            .iter()
            .find(|(s, _)| s == status)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// round(count / total × 100); 0 for an empty distribution.
    pub fn percentage(&self, status: &str) -> u32 {
        percentage(self.get(status), self.total())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(s, n)| (s.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// round(count / total × 100) with half-up rounding; 0 when total is 0.
pub fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    lenient::round_half_up(count as f64 / total as f64 * 100.0) as u32
}

impl Serialize for StatusCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (status, n) in &self.entries {
            map.serialize_entry(status, n)?;
        }
        map.end()
    }
}

struct StatusCountsVisitor;

impl<'de> Visitor<'de> for StatusCountsVisitor {
    type Value = StatusCounts;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of status → count")
    }

    fn visit_map<A>(self, mut access: A) -> Result<StatusCounts, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut counts = StatusCounts::new();
        while let Some((status, value)) = access.next_entry::<String, Value>()? {
            counts.add(&status, count_from_value(&value));
        }
        Ok(counts)
    }

    fn visit_unit<E>(self) -> Result<StatusCounts, E> {
        Ok(StatusCounts::new())
    }

    fn visit_none<E>(self) -> Result<StatusCounts, E> {
        Ok(StatusCounts::new())
    }
}

impl<'de> Deserialize<'de> for StatusCounts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StatusCountsVisitor)
    }
}

/// Statistics for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyStats<'a> {
    pub month: &'a MonthKey,
    pub count: u64,
    pub avg_days: i64,
    pub statuses: Option<&'a StatusCounts>,
}

impl MonthlyStats<'_> {
    /// Share of `status` among this month's rows; 0 when the month has no breakdown.
    pub fn status_percentage(&self, status: &str) -> u32 {
        self.statuses.map_or(0, |s| s.percentage(status))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(rename = "total_processos", default, deserialize_with = "de::count")]
    pub total: u64,
    #[serde(
        default,
        deserialize_with = "de::null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub ultima_atualizacao: Option<String>,
    #[serde(default)]
    pub status_distribution: StatusCounts,
    #[serde(rename = "processos_por_mes", default, deserialize_with = "de::count_map")]
    pub monthly_counts: BTreeMap<MonthKey, u64>,
    #[serde(rename = "tempo_medio_por_mes", default, deserialize_with = "de::rounded_map")]
    pub monthly_avg_days: BTreeMap<MonthKey, i64>,
    #[serde(rename = "status_por_mes", default, deserialize_with = "de::null_as_default")]
    pub monthly_status: BTreeMap<MonthKey, StatusCounts>,
}

impl Analysis {
    /// True when there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.status_distribution.total() == 0
    }

    /// Months with at least one dated row, ascending.
    pub fn months(&self) -> impl Iterator<Item = &MonthKey> {
        self.monthly_counts.keys()
    }

    pub fn monthly_stats<'a>(&'a self, month: &'a MonthKey) -> MonthlyStats<'a> {
        MonthlyStats {
            month,
            count: self.monthly_counts.get(month).copied().unwrap_or(0),
            avg_days: self.monthly_avg_days.get(month).copied().unwrap_or(0),
            statuses: self.monthly_status.get(month),
        }
    }

    /// Percentage of `status` within `month`; 0 for absent months or labels.
    pub fn status_percentage(&self, month: &MonthKey, status: &str) -> u32 {
        self.monthly_stats(month).status_percentage(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_from_sync_date() {
        assert_eq!(
            MonthKey::from_sync_date("10/01/2024"),
            Some(MonthKey::from("2024-01"))
        );
        assert_eq!(
            MonthKey::from_sync_date("5/9/2023"),
            Some(MonthKey::from("2023-09"))
        );
        assert_eq!(MonthKey::from_sync_date("not-a-date"), None);
        assert_eq!(MonthKey::from_sync_date("2024-01-10"), None);
        assert_eq!(MonthKey::from_sync_date("10/01/2024/x"), None);
        assert_eq!(MonthKey::from_sync_date("10/13/2024"), None);
        assert_eq!(MonthKey::from_sync_date("10/ab/2024"), None);
    }

    #[test]
    fn month_key_parts() {
        let key = MonthKey::new(2024, 3);
        assert_eq!(key.as_str(), "2024-03");
        assert_eq!(key.year(), Some(2024));
        assert_eq!(key.month(), Some(3));
        assert_eq!(MonthKey::from("garbage").month(), None);
    }

    #[test]
    fn status_counts_keep_first_encounter_order() {
        let mut counts = StatusCounts::new();
        for s in ["Em análise", "Concluído", "Em análise", "Cancelado"] {
            counts.increment(s);
        }
        let labels: Vec<&str> = counts.labels().collect();
        assert_eq!(labels, vec!["Em análise", "Concluído", "Cancelado"]);
        assert_eq!(counts.get("Em análise"), 2);
        assert_eq!(counts.get("Arquivado"), 0);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.percentage("Em análise"), 50);
    }

    #[test]
    fn status_counts_deserialize_in_document_order() {
        let counts: StatusCounts =
            serde_json::from_str(r#"{"Zeta": 1, "Alpha": "2", "Mid": null}"#).unwrap();
        let labels: Vec<&str> = counts.labels().collect();
        assert_eq!(labels, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(counts.get("Alpha"), 2);
        assert_eq!(counts.get("Mid"), 0);
        assert_eq!(
            serde_json::to_string(&counts).unwrap(),
            r#"{"Zeta":1,"Alpha":2,"Mid":0}"#
        );
    }

    #[test]
    fn percentage_guards_zero_total() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
    }
}
