// Rendering context: the current snapshot plus its prepared chart series.
// Owned by the application state and replaced wholesale on every refresh.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::charts::{self, MonthLabelStyle, StatusChartData, TemporalChartData};
use crate::models::Snapshot;

/// Shared slot for the current dashboard; `None` until a snapshot has been loaded.
pub type SharedDashboard = Arc<RwLock<Option<Dashboard>>>;

pub fn shared(dashboard: Option<Dashboard>) -> SharedDashboard {
    Arc::new(RwLock::new(dashboard))
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub snapshot: Snapshot,
    pub status_chart: Option<StatusChartData>,
    pub temporal_chart: Option<TemporalChartData>,
    pub temporal_chart_with_year: Option<TemporalChartData>,
    pub built_at: DateTime<Utc>,
}

impl Dashboard {
    pub fn build(snapshot: Snapshot) -> Self {
        let analysis = &snapshot.analysis;
        Self {
            status_chart: charts::status_chart_data(analysis),
            temporal_chart: charts::temporal_chart_data(analysis, MonthLabelStyle::Abbreviated),
            temporal_chart_with_year: charts::temporal_chart_data(
                analysis,
                MonthLabelStyle::WithYear,
            ),
            built_at: Utc::now(),
            snapshot,
        }
    }

    pub fn last_update(&self) -> Option<&str> {
        self.snapshot.last_update()
    }

    pub fn temporal(&self, style: MonthLabelStyle) -> Option<&TemporalChartData> {
        match style {
            MonthLabelStyle::Abbreviated => self.temporal_chart.as_ref(),
            MonthLabelStyle::WithYear => self.temporal_chart_with_year.as_ref(),
        }
    }
}

/// Replaces the shared dashboard with one built from `snapshot`.
pub async fn replace(shared: &SharedDashboard, snapshot: Snapshot) {
    let dashboard = Dashboard::build(snapshot);
    *shared.write().await = Some(dashboard);
}

/// Timestamp of the currently loaded snapshot.
pub async fn current_timestamp(shared: &SharedDashboard) -> Option<String> {
    shared
        .read()
        .await
        .as_ref()
        .and_then(|d| d.last_update().map(str::to_string))
}
