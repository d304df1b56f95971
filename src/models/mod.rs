// Domain models: spreadsheet rows, typed processos, analysis and snapshot documents.

mod analysis;
pub mod lenient;
mod processo;
mod row;
mod snapshot;

pub use analysis::{Analysis, MonthKey, MonthlyStats, StatusCounts, percentage};
pub use processo::{ColumnMap, Processo, UNKNOWN_STATUS};
pub use row::Row;
pub use snapshot::{Metadata, Snapshot, SnapshotDocument, SnapshotOrigin};
