use std::{path::PathBuf, time::Duration};

use thiserror::Error;

pub type StatsResult<T> = std::result::Result<T, StatsError>;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("record store unavailable while reading `{table}`: {source}")]
    SourceUnavailable {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to read reference table {}: {source}", path.display())]
    ReferenceData {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reference table {} is malformed: {source}", path.display())]
    ReferenceFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("table scan for `{table}` aborted: {source}")]
    ScanAborted {
        table: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("stats run exceeded the {0:?} deadline")]
    Timeout(Duration),
}

impl StatsError {
    pub fn source_unavailable(table: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::SourceUnavailable { table, source }
    }
}
