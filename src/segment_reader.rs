use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;

use crate::file_kind::FileKind;

/// Positioned line reading over one log segment.
///
/// For compressed segments the offset refers to the decompressed stream;
/// plain segments seek directly, compressed ones decompress and discard up
/// to the offset. Iteration yields lines as raw bytes with the trailing
/// `\n` stripped, so binary content passes through to the pattern matcher
/// untouched. An unterminated last record is yielded and counted as well.
pub(crate) struct SegmentReader {
    reader: Box<dyn BufRead>,
    consumed: u64,
}

impl SegmentReader {
    /// Opens `path` as `kind` and positions at `offset` in the logical
    /// stream. A plain-segment offset beyond the end of the file simply
    /// yields no lines.
    pub(crate) fn open(path: &Path, kind: FileKind, offset: u64) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = match kind {
            FileKind::Plain => {
                let mut file = file;
                file.seek(SeekFrom::Start(offset))?;
                Box::new(BufReader::new(file))
            }
            FileKind::Gzip => Self::skipped(BufReader::new(GzDecoder::new(file)), offset)?,
            FileKind::Bzip2 => Self::skipped(BufReader::new(BzDecoder::new(file)), offset)?,
        };
        Ok(Self {
            reader,
            consumed: 0,
        })
    }

    fn skipped<R>(mut reader: R, offset: u64) -> Result<Box<dyn BufRead>, io::Error>
    where
        R: BufRead + 'static,
    {
        io::copy(&mut reader.by_ref().take(offset), &mut io::sink())?;
        Ok(Box::new(reader))
    }

    /// Logical bytes consumed past the opening offset, terminators included.
    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }
}

impl Iterator for SegmentReader {
    type Item = Result<Vec<u8>, io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(n) => {
                self.consumed += n as u64;
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
