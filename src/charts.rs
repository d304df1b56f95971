// Chart-ready series built from an analysis: status pie, monthly labels, average days,
// per-status monthly percentages and the colour for each status label.
// `None` is the "no data" sentinel; callers must check it before rendering.

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::models::{Analysis, MonthKey};

/// Status labels with a dedicated monthly percentage series.
pub const CANONICAL_STATUSES: [&str; 3] = ["Concluído", "Em análise", "Cancelado"];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartColor {
    pub background: &'static str,
    pub border: &'static str,
}

/// Colour bucket of a status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusCategory {
    Completed,
    InReview,
    Cancelled,
    Unknown,
    Other,
}

impl StatusCategory {
    /// Keyword match, ignoring case and accents: "conclu*" → completed, "analise" or
    /// "andamento" → in review, "cancel*" → cancelled, "desconhec*" → unknown.
    pub fn classify(label: &str) -> Self {
        let folded = fold(label);
        if folded.contains("conclu") {
            StatusCategory::Completed
        } else if folded.contains("analise") || folded.contains("andamento") {
            StatusCategory::InReview
        } else if folded.contains("cancel") {
            StatusCategory::Cancelled
        } else if folded.contains("desconhec") {
            StatusCategory::Unknown
        } else {
            StatusCategory::Other
        }
    }

    pub fn color(self) -> ChartColor {
        match self {
            StatusCategory::Completed => ChartColor {
                background: "rgba(46, 204, 113, 0.7)",
                border: "rgba(46, 204, 113, 1)",
            },
            StatusCategory::InReview => ChartColor {
                background: "rgba(52, 152, 219, 0.7)",
                border: "rgba(52, 152, 219, 1)",
            },
            StatusCategory::Cancelled => ChartColor {
                background: "rgba(241, 196, 15, 0.7)",
                border: "rgba(241, 196, 15, 1)",
            },
            StatusCategory::Unknown => ChartColor {
                background: "rgba(127, 140, 141, 0.7)",
                border: "rgba(127, 140, 141, 1)",
            },
            StatusCategory::Other => ChartColor {
                background: "rgba(149, 165, 166, 0.7)",
                border: "rgba(149, 165, 166, 1)",
            },
        }
    }
}

/// Lowercase with Portuguese diacritics stripped ("Análise" → "analise").
fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Pie chart series. Labels keep the distribution's first-encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChartData {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
    pub percentages: Vec<u32>,
    pub total: u64,
    pub colors: Vec<ChartColor>,
}

pub fn status_chart_data(analysis: &Analysis) -> Option<StatusChartData> {
    if analysis.is_empty() {
        return None;
    }
    let dist = &analysis.status_distribution;
    let total = dist.total();
    Some(StatusChartData {
        labels: dist.labels().map(str::to_string).collect(),
        data: dist.iter().map(|(_, n)| n).collect(),
        percentages: dist.labels().map(|l| dist.percentage(l)).collect(),
        total,
        colors: dist
            .labels()
            .map(|l| StatusCategory::classify(l).color())
            .collect(),
    })
}

/// How month keys are rendered on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthLabelStyle {
    /// "Jan"
    #[default]
    Abbreviated,
    /// "Jan/24"
    WithYear,
}

/// Label for a `YYYY-MM` key; keys that do not parse are shown as-is.
pub fn month_label(key: &MonthKey, style: MonthLabelStyle) -> String {
    let Some(month) = key.month() else {
        return key.to_string();
    };
    let abbrev = MONTH_ABBREVIATIONS[(month - 1) as usize];
    match (style, key.year()) {
        (MonthLabelStyle::WithYear, Some(year)) => {
            format!("{}/{:02}", abbrev, year.rem_euclid(100))
        }
        _ => abbrev.to_string(),
    }
}

/// Status label → one percentage per month, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSeries {
    series: Vec<(String, Vec<u32>)>,
}

impl StatusSeries {
    pub fn get(&self, status: &str) -> Option<&[u32]> {
        self.series
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, v)| v.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|(s, _)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Serialize for StatusSeries {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for (status, values) in &self.series {
            map.serialize_entry(status, values)?;
        }
        map.end()
    }
}

/// Monthly series, aligned positionally with `months`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalChartData {
    #[serde(rename = "meses")]
    pub months: Vec<String>,
    #[serde(rename = "tempoMedio")]
    pub avg_days: Vec<i64>,
    #[serde(rename = "statusData")]
    pub status_data: StatusSeries,
    #[serde(rename = "rawData")]
    pub raw_data: Analysis,
}

/// Temporal series for the canonical status labels.
pub fn temporal_chart_data(
    analysis: &Analysis,
    style: MonthLabelStyle,
) -> Option<TemporalChartData> {
    temporal_chart_data_for(analysis, &CANONICAL_STATUSES, style)
}

/// Temporal series for arbitrary status labels. A label absent from the data gets an
/// all-zero series.
pub fn temporal_chart_data_for(
    analysis: &Analysis,
    statuses: &[&str],
    style: MonthLabelStyle,
) -> Option<TemporalChartData> {
    if analysis.is_empty() {
        return None;
    }
    let months: Vec<&MonthKey> = analysis.months().collect();
    let series = statuses
        .iter()
        .map(|status| {
            let values = months
                .iter()
                .map(|m| analysis.status_percentage(m, status))
                .collect();
            (status.to_string(), values)
        })
        .collect();

    Some(TemporalChartData {
        months: months.iter().map(|m| month_label(m, style)).collect(),
        avg_days: months
            .iter()
            .map(|m| analysis.monthly_stats(m).avg_days)
            .collect(),
        status_data: StatusSeries { series },
        raw_data: analysis.clone(),
    })
}
