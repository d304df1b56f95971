// Groups processos by status and by sync month: counts, average days, monthly status breakdown.
// Pure functions; the data source and the sync worker call these on every fresh row set.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::models::{Analysis, ColumnMap, MonthKey, Processo, Row, StatusCounts, lenient};

#[derive(Default)]
struct MonthAccumulator {
    count: u64,
    days_total: i64,
    statuses: StatusCounts,
}

/// Builds the full analysis for a set of processos.
///
/// Every processo counts towards the status distribution; only those with a valid
/// `DD/MM/YYYY` sync date contribute to the per-month maps.
pub fn analyze(processos: &[Processo]) -> Analysis {
    let mut status_distribution = StatusCounts::new();
    let mut by_month: BTreeMap<MonthKey, MonthAccumulator> = BTreeMap::new();
    let mut undated = 0usize;

    for p in processos {
        status_distribution.increment(&p.status);

        let Some(month) = p.month_key() else {
            undated += 1;
            continue;
        };
        let acc = by_month.entry(month).or_default();
        acc.count += 1;
        acc.days_total = acc.days_total.saturating_add(p.days);
        acc.statuses.increment(&p.status);
    }

    if undated > 0 {
        debug!(
            undated,
            total = processos.len(),
            "rows without a valid sync date left out of monthly stats"
        );
    }

    let mut analysis = Analysis {
        total: processos.len() as u64,
        status_distribution,
        ..Analysis::default()
    };
    for (month, acc) in by_month {
        analysis
            .monthly_avg_days
            .insert(month.clone(), average(acc.days_total, acc.count));
        analysis.monthly_counts.insert(month.clone(), acc.count);
        analysis.monthly_status.insert(month, acc.statuses);
    }
    analysis
}

/// Typed conversion plus [`analyze`].
pub fn analyze_rows(rows: &[Row], columns: &ColumnMap) -> Analysis {
    let processos: Vec<Processo> = rows
        .iter()
        .cloned()
        .map(|r| Processo::from_row(r, columns))
        .collect();
    analyze(&processos)
}

/// Rounded mean of `total / count`; 0 when there are no samples.
pub fn average(total: i64, count: u64) -> i64 {
    if count == 0 {
        return 0;
    }
    lenient::round_half_up(total as f64 / count as f64)
}

/// Rounded mean of a sample list; 0 for an empty list.
pub fn average_days(samples: &[i64]) -> i64 {
    let total = samples.iter().fold(0i64, |acc, d| acc.saturating_add(*d));
    average(total, samples.len() as u64)
}

/// One processo per (protocol, name), keeping the most recent sync date.
///
/// Records without a protocol or a name are dropped. First-seen order of the keys is kept;
/// a later record replaces an earlier one only when its date parses and is strictly newer,
/// or when the earlier one has no date at all.
pub fn unique_processos(processos: &[Processo]) -> Vec<Processo> {
    let mut unique: Vec<Processo> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    for p in processos {
        let (Some(protocol), Some(name)) = (p.protocol.as_deref(), p.name.as_deref()) else {
            continue;
        };
        match index.get(&(protocol, name)).copied() {
            None => {
                index.insert((protocol, name), unique.len());
                unique.push(p.clone());
            }
            Some(i) => {
                let current = &mut unique[i];
                let replace = match (current.sync_date_parsed(), p.sync_date_parsed()) {
                    (Some(old), Some(new)) => new > old,
                    (None, Some(_)) => true,
                    _ => false,
                };
                if replace {
                    *current = p.clone();
                }
            }
        }
    }
    unique
}
