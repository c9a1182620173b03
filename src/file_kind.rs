use std::fs::File;
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";

/// The physical encoding of a log segment.
///
/// Rotation daemons strip or append filename suffixes inconsistently, so
/// classification goes by the leading magic bytes and never by extension.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileKind {
    /// An uncompressed segment; offsets are file offsets.
    Plain,
    /// A gzip-compressed segment (magic `1F 8B`).
    Gzip,
    /// A bzip2-compressed segment (magic `"BZh"`).
    Bzip2,
}

impl FileKind {
    /// Classifies the file at `path` by its magic bytes.
    ///
    /// Files too short to carry a known magic (including empty files)
    /// classify as [`FileKind::Plain`]; classification itself cannot fail.
    ///
    /// # Errors
    ///
    /// `std::io::Error` if the file cannot be opened or read.
    pub fn detect(path: &Path) -> Result<Self, std::io::Error> {
        let mut head = Vec::with_capacity(BZIP2_MAGIC.len());
        File::open(path)?
            .take(BZIP2_MAGIC.len() as u64)
            .read_to_end(&mut head)?;

        if head.starts_with(&GZIP_MAGIC) {
            Ok(Self::Gzip)
        } else if head.starts_with(&BZIP2_MAGIC) {
            Ok(Self::Bzip2)
        } else {
            Ok(Self::Plain)
        }
    }
}
