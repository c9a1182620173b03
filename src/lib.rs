#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! An incremental, rotation-aware log-monitoring probe.
//!
//! Each invocation of a [`Probe`] is one-shot: it scans the part of a target
//! log file that was appended since the previous invocation, folds lines
//! matching operator-supplied severity patterns into a single aggregated
//! [`Severity`], and persists its progress as a small cursor sidecar
//! (byte offset plus a head fingerprint of the file).
//!
//! Log rotation is observed, never performed: when the target's head
//! fingerprint no longer matches the persisted cursor, or the file shrank
//! below the persisted offset, the probe locates the most recently rotated
//! sibling (plain, gzip- or bzip2-compressed) and drains its tail before
//! reading the fresh log from the start, so that no line crossing the
//! rotation boundary is lost or counted twice.
//!
//! See
//!
//! * [`Probe::builder`](struct.Probe.html#method.builder) for the
//!   configuration surface,
//! * and [`Severity`](enum.Severity.html) for the mapping to the
//!   conventional monitoring exit codes (0 OK, 1 WARNING, 2 CRITICAL).

mod cursor_store;
mod file_kind;
mod log_discovery;
mod probe;
mod probe_error;
mod scan;
mod segment_reader;

pub use crate::cursor_store::{head_fingerprint, Cursor, CursorLock, CursorStore};
pub use crate::file_kind::FileKind;
pub use crate::probe::{Outcome, Probe, ProbeBuilder};
pub use crate::probe_error::ProbeError;
pub use crate::scan::{ScanTally, Severity};
