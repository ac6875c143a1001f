//! FASTQ file helpers: compression, record counting and the mate-size check.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use memchr::memchr_iter;

/// Buffer size for FASTQ I/O (1MB).
const BUF_SIZE: usize = 1024 * 1024;

/// Largest relative size difference between reconstructed mates that still
/// counts as genuinely paired data.
pub const MATE_SIZE_TOLERANCE: f64 = 0.05;

/// Gzip-compress `src` into `dst`, returning the uncompressed byte count.
pub fn gzip_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, File::open(src)?);
    let writer = BufWriter::with_capacity(BUF_SIZE, File::create(dst)?);
    let mut encoder = GzEncoder::new(writer, Compression::default());
    let copied = io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()?;
    Ok(copied)
}

/// Count FASTQ records in a plain-text file (four lines per record).
///
/// A final line without a trailing newline still counts as a line.
pub fn count_records(path: &Path) -> io::Result<u64> {
    count_records_from(File::open(path)?)
}

pub fn count_records_from<R: Read>(mut reader: R) -> io::Result<u64> {
    let mut buf = vec![0u8; BUF_SIZE];
    let mut lines = 0u64;
    let mut last = b'\n';
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        lines += memchr_iter(b'\n', &buf[..n]).count() as u64;
        last = buf[n - 1];
    }
    if last != b'\n' {
        lines += 1;
    }
    Ok(lines / 4)
}

/// Relative size difference `|a - b| / max(a, b)`; zero when both are empty.
pub fn relative_size_difference(a: u64, b: u64) -> f64 {
    let larger = a.max(b);
    if larger == 0 {
        return 0.0;
    }
    a.abs_diff(b) as f64 / larger as f64
}

/// True when two mate files are close enough in size to be treated as a pair.
pub fn mates_consistent(r1_len: u64, r2_len: u64) -> bool {
    relative_size_difference(r1_len, r2_len) <= MATE_SIZE_TOLERANCE
}
