use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crc::{Crc, CRC_32_ISO_HDLC};
use fs2::FileExt;
use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};

use crate::probe_error::ProbeError;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

// Leading bytes covered by the head fingerprint. Large enough to tell a
// regenerated file from its predecessor, small enough to stay cheap.
const FINGERPRINT_HEAD_LEN: usize = 256;

/// Scan progress through one target log, persisted between invocations.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Cursor {
    /// Byte position in the current log up to which lines were consumed.
    #[serde(default)]
    pub offset: u64,

    /// Head fingerprint of the current log at save time; an empty string
    /// when the file was empty or no state exists yet. A later run seeing a
    /// different fingerprint under the same path concludes the log was
    /// rotated or truncated.
    #[serde(default)]
    pub checksum: String,
}

/// Loads and saves cursor sidecars, one per target log, in a dedicated
/// directory.
///
/// The sidecar is a small JSON document; unknown fields are ignored on
/// load and missing fields default, so the format stays forward
/// compatible. Saving goes through a temp file and an atomic rename, so a
/// crash mid-write never leaves a corrupt sidecar behind.
#[derive(Clone, Debug)]
pub struct CursorStore {
    directory: PathBuf,
}

impl CursorStore {
    /// A store placing its sidecars into `directory`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The deterministic sidecar path for `target`.
    #[must_use]
    pub fn sidecar_path(&self, target: &Path) -> PathBuf {
        let stem = target
            .file_stem()
            .map_or_else(|| String::from("log"), |s| s.to_string_lossy().to_string());
        let hash = CRC32.checksum(target.as_os_str().as_encoded_bytes());
        self.directory.join(format!("{stem}_{hash:08x}.cursor"))
    }

    /// Reads the sidecar for `target`.
    ///
    /// A missing sidecar yields `None`. An unreadable or malformed one is
    /// reported through `log` and also yields `None`, so the run proceeds
    /// as first-seen instead of failing.
    #[must_use]
    pub fn load(&self, target: &Path) -> Option<Cursor> {
        let path = self.sidecar_path(target);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(
                    "cursor sidecar {} cannot be read, starting over: {e}",
                    path.display()
                );
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(cursor) => Some(cursor),
            Err(e) => {
                warn!(
                    "cursor sidecar {} is malformed, starting over: {e}",
                    path.display()
                );
                None
            }
        }
    }

    /// Persists `cursor` for `target`, atomically.
    ///
    /// # Errors
    ///
    /// `std::io::Error` when the temp file cannot be written or renamed;
    /// the caller must then discard the scan result, since the next run
    /// would double-count everything behind the stale cursor.
    pub fn save(&self, target: &Path, cursor: &Cursor) -> Result<(), std::io::Error> {
        let path = self.sidecar_path(target);
        let tmp = path.with_extension("cursor.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&serde_json::to_vec(cursor)?)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &path)?;
        debug!(
            "cursor for {} saved: offset {}, checksum {:?}",
            target.display(),
            cursor.offset,
            cursor.checksum
        );
        Ok(())
    }

    /// Removes the sidecar for `target`; absence is not an error.
    ///
    /// # Errors
    ///
    /// `std::io::Error` for anything but a missing sidecar.
    pub fn delete(&self, target: &Path) -> Result<(), std::io::Error> {
        match std::fs::remove_file(self.sidecar_path(target)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Takes the advisory lock guarding `target`'s cursor, non-blocking.
    ///
    /// The lock lives on a separate `.lock` file next to the sidecar
    /// (the sidecar itself gets replaced by rename) and is released when
    /// the returned guard drops.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::LockContention`] when another probe holds the lock.
    /// - [`ProbeError::Io`] when the lock file cannot be created.
    pub fn lock(&self, target: &Path) -> Result<CursorLock, ProbeError> {
        let mut path = self.sidecar_path(target).into_os_string();
        path.push(".lock");
        let path = PathBuf::from(path);

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        if file.try_lock_exclusive().is_err() {
            return Err(ProbeError::LockContention(path));
        }
        Ok(CursorLock { _file: file })
    }
}

/// Held for the duration of a probe run; dropping it releases the lock.
#[derive(Debug)]
pub struct CursorLock {
    _file: File,
}

/// CRC-32 over the leading `min(limit, 256)` bytes of `path`, as 8
/// lowercase hex digits.
///
/// Passing the cursor offset as `limit` keeps the hashed prefix inside the
/// region the cursor covers: appending to the file never changes its
/// fingerprint, while a regenerated file almost surely does. Hashing zero
/// bytes yields the empty string, which doubles as the "no prior state"
/// sentinel: a log that was rotated away to an empty successor and grows
/// later must not look rotated again.
///
/// # Errors
///
/// `std::io::Error` if the file cannot be opened or read.
pub fn head_fingerprint(path: &Path, limit: u64) -> Result<String, std::io::Error> {
    let upto = limit.min(FINGERPRINT_HEAD_LEN as u64);
    let mut head = Vec::with_capacity(FINGERPRINT_HEAD_LEN);
    File::open(path)?.take(upto).read_to_end(&mut head)?;
    if head.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{:08x}", CRC32.checksum(&head)))
    }
}
