use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::monitoring::types::ProbeOutcome;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to create history directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open history store {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read history store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to append history record: {0}")]
    Write(#[from] csv::Error),
    #[error("failed to flush history store {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One persisted probe observation.
///
/// Flat projection of a [`ProbeOutcome`]: a completed exchange populates
/// `status_code` and `response_time_ms`, a failed one populates `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub name: String,
    pub url: String,
    pub timestamp: String,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub is_available: bool,
    pub error: Option<String>,
}

impl From<&ProbeOutcome> for HistoryRow {
    fn from(outcome: &ProbeOutcome) -> Self {
        Self {
            name: outcome.name.clone(),
            url: outcome.url.clone(),
            timestamp: outcome.timestamp.to_rfc3339(),
            status_code: outcome.status_code(),
            response_time_ms: outcome.latency_ms(),
            is_available: outcome.is_available(),
            error: outcome.error().map(str::to_owned),
        }
    }
}

/// Append-only store of probe outcomes.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Durably append one outcome. Safe to call from concurrent probe
    /// completions; rows never interleave.
    async fn append(&self, outcome: &ProbeOutcome) -> Result<(), HistoryError>;

    /// All previously appended rows in append order, optionally filtered
    /// by endpoint name.
    async fn read_all(&self, filter: Option<&[String]>) -> Result<Vec<HistoryRow>, HistoryError>;
}

/// CSV-backed history log.
///
/// The file is created lazily, with a header row, on the first append.
pub struct CsvHistory {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl CsvHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path, append_lock: Mutex::new(()) }
    }
}

#[async_trait]
impl HistoryStore for CsvHistory {
    async fn append(&self, outcome: &ProbeOutcome) -> Result<(), HistoryError> {
        let row = HistoryRow::from(outcome);
        let _guard = self.append_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| HistoryError::CreateDir { path: parent.to_path_buf(), source })?;
        }

        let exists = self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| HistoryError::Open { path: self.path.clone(), source })?;

        let mut writer = csv::WriterBuilder::new().has_headers(!exists).from_writer(file);
        writer.serialize(&row)?;
        writer
            .flush()
            .map_err(|source| HistoryError::Flush { path: self.path.clone(), source })?;

        Ok(())
    }

    async fn read_all(&self, filter: Option<&[String]>) -> Result<Vec<HistoryRow>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|source| HistoryError::Read { path: self.path.clone(), source })?;

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: HistoryRow =
                record.map_err(|source| HistoryError::Read { path: self.path.clone(), source })?;

            if let Some(names) = filter {
                if !names.contains(&row.name) {
                    continue;
                }
            }

            rows.push(row);
        }

        Ok(rows)
    }
}
