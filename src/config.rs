use serde::Deserialize;
use url::Url;

use crate::models::ColumnMap;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Spreadsheet headers read by the aggregation; defaults match the "Todos processos" sheet.
    #[serde(default)]
    pub columns: ColumnMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Site root serving the snapshot document (e.g. "https://example.org/").
    pub base_url: String,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,
}

fn default_snapshot_path() -> String {
    "data/processos.json".into()
}

fn default_sheet_name() -> String {
    "Todos processos".into()
}

fn default_sheets_base_url() -> String {
    "https://docs.google.com/spreadsheets/d/".into()
}

impl SourceConfig {
    /// `base_url` joined with `snapshot_path`.
    pub fn snapshot_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)?.join(&self.snapshot_path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Delay before each update check while waiting for a fresher snapshot.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Update checks per wait.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// How often the background worker runs a sync.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_check_interval_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_refresh_interval_secs() -> u64 {
    300
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            max_attempts: default_max_attempts(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            self.source.snapshot_url().is_ok(),
            "source.base_url / source.snapshot_path must form a valid URL, got {:?} + {:?}",
            self.source.base_url,
            self.source.snapshot_path
        );
        anyhow::ensure!(
            !self.source.spreadsheet_id.is_empty(),
            "source.spreadsheet_id must be non-empty"
        );
        anyhow::ensure!(
            !self.source.sheet_name.is_empty(),
            "source.sheet_name must be non-empty"
        );
        anyhow::ensure!(
            Url::parse(&self.source.sheets_base_url).is_ok(),
            "source.sheets_base_url must be a valid URL, got {:?}",
            self.source.sheets_base_url
        );
        anyhow::ensure!(
            self.sync.check_interval_ms > 0,
            "sync.check_interval_ms must be > 0, got {}",
            self.sync.check_interval_ms
        );
        anyhow::ensure!(
            self.sync.max_attempts > 0,
            "sync.max_attempts must be > 0, got {}",
            self.sync.max_attempts
        );
        anyhow::ensure!(
            self.sync.refresh_interval_secs > 0,
            "sync.refresh_interval_secs must be > 0, got {}",
            self.sync.refresh_interval_secs
        );
        anyhow::ensure!(
            !self.columns.status.is_empty()
                && !self.columns.sync_date.is_empty()
                && !self.columns.days.is_empty(),
            "columns.status, columns.sync_date and columns.days must be non-empty"
        );
        Ok(())
    }
}
