//! Transparent-open routine: sniff a file's leading bytes against known
//! compression signatures and wrap it in the matching streaming decoder,
//! falling back to the plain file when nothing matches.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use crate::error::TabularError;

const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const BZIP2_MAGIC: &[u8] = &[0x42, 0x5A, 0x68];
const XZ_MAGIC: &[u8] = &[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];

/// Open `path`, transparently decompressing it if its leading bytes match
/// a known signature. The underlying file's position is always restored
/// to the start before the returned reader begins consuming it.
pub fn open_transparent(path: &Path) -> Result<Box<dyn Read>, TabularError> {
    let mut file = File::open(path)?;
    let mut probe = [0u8; 6];
    let n = read_fill(&mut file, &mut probe)?;
    file.seek(SeekFrom::Start(0))?;

    let head = &probe[..n];
    if head.starts_with(GZIP_MAGIC) {
        Ok(Box::new(GzDecoder::new(file)))
    } else if head.starts_with(BZIP2_MAGIC) {
        Ok(Box::new(BzDecoder::new(file)))
    } else if head.starts_with(XZ_MAGIC) {
        Ok(Box::new(
            XzDecoder::new(file),
        ))
    } else {
        Ok(Box::new(file))
    }
}

/// Read as many bytes as are available, up to `buf.len()`, without
/// treating a short read (a file smaller than the probe window) as an
/// error.
fn read_fill(file: &mut File, buf: &mut [u8]) -> Result<usize, TabularError> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}
