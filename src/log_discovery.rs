use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;
use regex::Regex;

use crate::file_kind::FileKind;
use crate::probe_error::ProbeError;

/// The most recently rotated sibling of `current`, with its classification.
///
/// Candidates are the regular files in `current`'s directory whose basename
/// matches the rotation pattern, excluding `current` itself. The newest by
/// modification time wins; equal mtimes (coarse filesystem clocks) are
/// broken by lexically descending basename.
pub(crate) fn newest_rotated_sibling(
    current: &Path,
    rotation: &Regex,
) -> Result<Option<(PathBuf, FileKind)>, std::io::Error> {
    let directory = current
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let mut candidates: Vec<(SystemTime, String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
        let entry = entry?;
        let path = entry.path();
        if path == *current || !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if !rotation.is_match(&name) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, name, path));
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    match candidates.into_iter().next() {
        Some((_, _, path)) => {
            let kind = FileKind::detect(&path)?;
            debug!(
                "rotated predecessor of {}: {} ({kind:?})",
                current.display(),
                path.display()
            );
            Ok(Some((path, kind)))
        }
        None => Ok(None),
    }
}

/// The lexicographically greatest file matching the `prefix` glob whose
/// basename also matches the rotation pattern.
///
/// Lexical order equals chronological order for the date-stamped names
/// this resolver exists for, so the greatest path is the current log.
pub(crate) fn newest_matching_log(
    prefix: &str,
    rotation: &Regex,
) -> Result<Option<PathBuf>, ProbeError> {
    let mut newest: Option<PathBuf> = None;
    for entry in glob::glob(prefix)? {
        // entries that disappeared or cannot be read are no candidates
        let Ok(path) = entry else { continue };
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if !rotation.is_match(&name) {
            continue;
        }
        if newest.as_ref().is_none_or(|n| path > *n) {
            newest = Some(path);
        }
    }
    Ok(newest)
}
