use std::path::{Path, PathBuf};

use log::{debug, warn};
use regex::Regex;

use crate::cursor_store::{head_fingerprint, Cursor, CursorStore};
use crate::file_kind::FileKind;
use crate::log_discovery::{newest_matching_log, newest_rotated_sibling};
use crate::probe_error::ProbeError;
use crate::scan::{PatternSet, ScanTally, Severity};
use crate::segment_reader::SegmentReader;

/// What one probe run observed.
#[derive(Clone, Copy, Debug)]
pub struct Outcome {
    /// The aggregated severity; the binary maps it to the exit code.
    pub severity: Severity,
    /// Line and match counts across predecessor tail and current log.
    pub tally: ScanTally,
}

/// One-shot incremental scanner over a target log.
///
/// Build it with [`Probe::builder`], then call [`Probe::run`] once per
/// monitoring-agent invocation. All configuration is immutable for the
/// lifetime of the probe.
pub struct Probe {
    o_log_file: Option<PathBuf>,
    o_log_prefix: Option<String>,
    rotation: Regex,
    patterns: PatternSet,
    store: CursorStore,
}

impl Probe {
    /// A builder over the two required parameters: the sidecar directory
    /// and the pattern identifying rotated siblings of the current log.
    #[must_use]
    pub fn builder<P, S>(cache_dir: P, rotation_pattern: S) -> ProbeBuilder
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        ProbeBuilder {
            cache_dir: cache_dir.into(),
            rotation_pattern: rotation_pattern.into(),
            o_log_file: None,
            o_log_prefix: None,
            o_warning_pattern: None,
            o_critical_pattern: None,
            o_ok_pattern: None,
        }
    }

    /// Executes one probe invocation.
    ///
    /// Resolves the current log, restores the cursor, drains the rotated
    /// predecessor's tail if the head fingerprint or size betrays a
    /// rotation, drains the current log from the cursor, persists the new
    /// cursor, and returns the aggregated outcome.
    ///
    /// A target that does not exist yet and never had a cursor is the
    /// benign first-run case and yields an OK outcome.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::LogMissing`] when the configured log is gone but a
    ///   cursor for it exists.
    /// - [`ProbeError::LockContention`] when another probe runs against the
    ///   same target.
    /// - [`ProbeError::CursorSave`] when the new cursor cannot be
    ///   persisted.
    /// - [`ProbeError::Io`] when the current log cannot be read.
    pub fn run(&self) -> Result<Outcome, ProbeError> {
        let Some(current) = self.resolve_current()? else {
            return Ok(Outcome {
                severity: Severity::Ok,
                tally: ScanTally::default(),
            });
        };

        let _lock = self.store.lock(&current)?;
        let cursor = self.store.load(&current).unwrap_or_default();

        let size = std::fs::metadata(&current)?.len();
        // an empty checksum means no usable prior state, so nothing can
        // have rotated away from under it; the fingerprint is recomputed
        // over exactly the prefix the cursor covers, appends stay invisible
        let rotated = !cursor.checksum.is_empty()
            && (size < cursor.offset
                || head_fingerprint(&current, cursor.offset)? != cursor.checksum);

        let mut tally = ScanTally::default();

        // predecessor tail strictly first, so events crossing the rotation
        // boundary keep their order
        let severity_prev = if rotated {
            debug!(
                "{} was rotated (size {size}, cursor offset {})",
                current.display(),
                cursor.offset
            );
            self.drain_predecessor(&current, cursor.offset, &mut tally)
        } else {
            Severity::Ok
        };

        // without an ok pattern there is no clearing, and carrying the
        // predecessor's verdict forward would re-report it forever; the
        // tail is drained anyway so the cursor can move on
        let initial = if self.patterns.clears_on_ok() {
            severity_prev
        } else {
            Severity::Ok
        };

        let current_offset = if rotated { 0 } else { cursor.offset };
        let mut reader = SegmentReader::open(&current, FileKind::Plain, current_offset)?;
        let severity = self.patterns.fold(&mut reader, initial, &mut tally)?;
        let consumed = reader.consumed();

        if tally.lines > 0 {
            let offset = current_offset + consumed;
            let new_cursor = Cursor {
                offset,
                checksum: head_fingerprint(&current, offset)?,
            };
            self.store
                .save(&current, &new_cursor)
                .map_err(ProbeError::CursorSave)?;
        }

        Ok(Outcome { severity, tally })
    }

    // Step one of a run: the explicit path, or prefix discovery.
    fn resolve_current(&self) -> Result<Option<PathBuf>, ProbeError> {
        if let Some(path) = &self.o_log_file {
            if path.is_file() {
                return Ok(Some(path.clone()));
            }
            // a cursor proves the log existed before, so its absence is a
            // real failure and not the benign first-run case
            return if self.store.load(path).is_some() {
                Err(ProbeError::LogMissing(path.clone()))
            } else {
                debug!("log {} does not exist yet", path.display());
                Ok(None)
            };
        }

        let prefix = self
            .o_log_prefix
            .as_deref()
            .ok_or(ProbeError::NoTarget)?;
        let o_path = newest_matching_log(prefix, &self.rotation)?;
        if o_path.is_none() {
            debug!("no log matching {prefix} exists yet");
        }
        Ok(o_path)
    }

    // Decompression and IO failures in the predecessor must not cost the
    // current log's observations; the segment then contributes nothing.
    fn drain_predecessor(
        &self,
        current: &Path,
        offset: u64,
        tally: &mut ScanTally,
    ) -> Severity {
        let o_predecessor = match newest_rotated_sibling(current, &self.rotation) {
            Ok(o_predecessor) => o_predecessor,
            Err(e) => {
                warn!(
                    "rotated siblings of {} cannot be listed: {e}",
                    current.display()
                );
                None
            }
        };
        let Some((path, kind)) = o_predecessor else {
            debug!(
                "{} was rotated, but no predecessor segment is left",
                current.display()
            );
            return Severity::Ok;
        };

        debug!(
            "draining predecessor {} ({kind:?}) from offset {offset}",
            path.display()
        );
        let result = SegmentReader::open(&path, kind, offset)
            .and_then(|mut reader| self.patterns.fold(&mut reader, Severity::Ok, tally));
        match result {
            Ok(severity) => severity,
            Err(e) => {
                warn!(
                    "predecessor segment {} cannot be read, skipping it: {e}",
                    path.display()
                );
                Severity::Ok
            }
        }
    }
}

/// Builder for a [`Probe`]; patterns are compiled once in [`build`](Self::build).
#[derive(Debug)]
pub struct ProbeBuilder {
    cache_dir: PathBuf,
    rotation_pattern: String,
    o_log_file: Option<PathBuf>,
    o_log_prefix: Option<String>,
    o_warning_pattern: Option<String>,
    o_critical_pattern: Option<String>,
    o_ok_pattern: Option<String>,
}

impl ProbeBuilder {
    /// The explicit path of the current log.
    #[must_use]
    pub fn log_file<P: Into<PathBuf>>(self, path: P) -> Self {
        self.o_log_file(Some(path.into()))
    }

    /// The explicit path of the current log, or `None` to discover it via
    /// the log prefix.
    #[must_use]
    pub fn o_log_file(mut self, o_path: Option<PathBuf>) -> Self {
        self.o_log_file = o_path;
        self
    }

    /// A glob the current log must match; the newest matching file (by
    /// lexical order, i.e. by date for date-stamped names) is scanned.
    #[must_use]
    pub fn log_prefix<S: Into<String>>(self, prefix: S) -> Self {
        self.o_log_prefix(Some(prefix.into()))
    }

    /// Like [`log_prefix`](Self::log_prefix), but optional.
    #[must_use]
    pub fn o_log_prefix(mut self, o_prefix: Option<String>) -> Self {
        self.o_log_prefix = o_prefix;
        self
    }

    /// Lines matching this pattern raise the severity to WARNING.
    #[must_use]
    pub fn warning_pattern<S: Into<String>>(self, pattern: S) -> Self {
        self.o_warning_pattern(Some(pattern.into()))
    }

    /// Like [`warning_pattern`](Self::warning_pattern), but optional.
    #[must_use]
    pub fn o_warning_pattern(mut self, o_pattern: Option<String>) -> Self {
        self.o_warning_pattern = o_pattern;
        self
    }

    /// Lines matching this pattern raise the severity to CRITICAL.
    #[must_use]
    pub fn critical_pattern<S: Into<String>>(self, pattern: S) -> Self {
        self.o_critical_pattern(Some(pattern.into()))
    }

    /// Like [`critical_pattern`](Self::critical_pattern), but optional.
    #[must_use]
    pub fn o_critical_pattern(mut self, o_pattern: Option<String>) -> Self {
        self.o_critical_pattern = o_pattern;
        self
    }

    /// Lines matching this pattern clear previously accumulated errors.
    #[must_use]
    pub fn ok_pattern<S: Into<String>>(self, pattern: S) -> Self {
        self.o_ok_pattern(Some(pattern.into()))
    }

    /// Like [`ok_pattern`](Self::ok_pattern), but optional.
    #[must_use]
    pub fn o_ok_pattern(mut self, o_pattern: Option<String>) -> Self {
        self.o_ok_pattern = o_pattern;
        self
    }

    /// Compiles the patterns and binds the sidecar directory.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::Pattern`] when a severity or rotation pattern does
    ///   not compile.
    /// - [`ProbeError::NoTarget`] when neither a log file nor a log prefix
    ///   is configured.
    pub fn build(self) -> Result<Probe, ProbeError> {
        if self.o_log_file.is_none() && self.o_log_prefix.is_none() {
            return Err(ProbeError::NoTarget);
        }
        Ok(Probe {
            rotation: Regex::new(&self.rotation_pattern)?,
            patterns: PatternSet::try_new(
                self.o_warning_pattern.as_deref(),
                self.o_critical_pattern.as_deref(),
                self.o_ok_pattern.as_deref(),
            )?,
            store: CursorStore::new(self.cache_dir),
            o_log_file: self.o_log_file,
            o_log_prefix: self.o_log_prefix,
        })
    }
}
