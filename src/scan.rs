use std::io;

use regex::bytes::Regex;

use crate::probe_error::ProbeError;

/// Aggregated severity of a scan, in the conventional monitoring order.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    /// Nothing of interest matched, or an ok line cleared earlier matches.
    Ok,
    /// At least one warning match without a later critical or clearing match.
    Warning,
    /// At least one critical match without a later clearing match.
    Critical,
}

impl Severity {
    /// The exit code a monitoring agent expects: 0, 1 or 2.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        })
    }
}

/// Line and match counts accumulated across the drains of one probe run.
///
/// Purely informational; the tally feeds the status line and is never
/// persisted.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanTally {
    /// Lines consumed, predecessor tail and current log together.
    pub lines: u64,
    /// Lines that matched the critical pattern.
    pub criticals: u64,
    /// Lines that matched the warning pattern.
    pub warnings: u64,
    /// Lines that matched the ok pattern.
    pub oks: u64,
}

/// The compiled severity patterns and the fold they drive.
///
/// An unset warning or critical pattern never matches; an unset ok pattern
/// means matched errors are not cleared by later lines.
pub(crate) struct PatternSet {
    o_warning: Option<Regex>,
    o_critical: Option<Regex>,
    o_ok: Option<Regex>,
}

impl PatternSet {
    pub(crate) fn try_new(
        o_warning: Option<&str>,
        o_critical: Option<&str>,
        o_ok: Option<&str>,
    ) -> Result<Self, ProbeError> {
        Ok(Self {
            o_warning: o_warning.map(Regex::new).transpose()?,
            o_critical: o_critical.map(Regex::new).transpose()?,
            o_ok: o_ok.map(Regex::new).transpose()?,
        })
    }

    // Whether an ok pattern is configured, i.e. whether ok lines clear
    // previously accumulated errors.
    pub(crate) fn clears_on_ok(&self) -> bool {
        self.o_ok.is_some()
    }

    /// The severity state machine, folded left to right over `lines`.
    ///
    /// Critical is sticky within a scan: a later warning match does not
    /// demote it. Only an ok match resets the state, and only when an ok
    /// pattern is configured. Starting from `initial` lets the caller chain
    /// the predecessor drain into the current one.
    pub(crate) fn fold<I>(
        &self,
        lines: I,
        initial: Severity,
        tally: &mut ScanTally,
    ) -> Result<Severity, io::Error>
    where
        I: Iterator<Item = Result<Vec<u8>, io::Error>>,
    {
        let mut severity = initial;
        for line in lines {
            let line = line?;
            tally.lines += 1;
            if Self::matches(&self.o_critical, &line) {
                tally.criticals += 1;
                severity = Severity::Critical;
            } else if Self::matches(&self.o_warning, &line) {
                tally.warnings += 1;
                if severity != Severity::Critical {
                    severity = Severity::Warning;
                }
            } else if Self::matches(&self.o_ok, &line) {
                tally.oks += 1;
                severity = Severity::Ok;
            }
        }
        Ok(severity)
    }

    fn matches(o_pattern: &Option<Regex>, line: &[u8]) -> bool {
        o_pattern.as_ref().is_some_and(|re| re.is_match(line))
    }
}
