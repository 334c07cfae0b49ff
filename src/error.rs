//! Error types surfaced by the telemetry decoder.

use thiserror::Error;

/// Failures that abort decoding of a telemetry log.
///
/// Malformed individual descriptors are not represented here: the walkers
/// skip them (or stop the affected region) and report the anomaly inline, so
/// output produced up to that point is retained.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A log-page read failed in the transport.
    #[error("log page read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The Device Internal Status log reports no telemetry data
    /// (`area1_last_log_page == 0`).
    #[error("device internal status log is empty")]
    EmptyLog,

    /// A header declares regions that do not fit in the reported sector
    /// count, or is otherwise self-contradictory.
    #[error("telemetry header inconsistent: {0}")]
    HeaderInconsistent(String),

    /// A string table slice cannot hold a whole number of 16-byte entries.
    #[error("string table corrupt: {0}")]
    CorruptStringTable(String),

    /// Allocation of an owned telemetry buffer failed.
    #[error("out of memory allocating telemetry buffer")]
    OutOfMemory,
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
