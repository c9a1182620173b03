use std::path::PathBuf;
use thiserror::Error;

/// Describes the failure modes of a probe run.
///
/// Only conditions that would corrupt persisted state or mislead the
/// operator surface as errors; everything recoverable is handled inside
/// [`Probe::run`](crate::Probe::run) so that the current log's
/// observations still drive a status.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The configured log file is gone although a cursor exists for it.
    #[error("log file {} is missing although a prior cursor exists for it", .0.display())]
    LogMissing(PathBuf),

    /// A severity or rotation pattern does not compile.
    #[error("pattern does not compile: {0}")]
    Pattern(#[from] regex::Error),

    /// The log prefix is not a valid glob.
    #[error("log prefix is not a valid glob: {0}")]
    Prefix(#[from] glob::PatternError),

    /// A log segment or the sidecar directory cannot be accessed.
    #[error("log cannot be read: {0}")]
    Io(#[from] std::io::Error),

    /// The new cursor cannot be persisted; the scan result is discarded
    /// because the next run would otherwise double-count lines.
    #[error("cursor sidecar cannot be written: {0}")]
    CursorSave(std::io::Error),

    /// Another probe for the same target log holds the advisory lock.
    #[error("another probe holds the lock {}", .0.display())]
    LockContention(PathBuf),

    /// Neither a log file nor a log prefix is configured.
    #[error("either a log file or a log prefix must be configured")]
    NoTarget,
}
