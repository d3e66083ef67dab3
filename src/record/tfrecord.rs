use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::RecordError;

/// Upper bound on a single record; game examples are well under 1 KiB.
pub const MAX_RECORD_LEN: u64 = 16 * 1024 * 1024;

const MASK_DELTA: u32 = 0xa282_ead8;

/// Masked CRC32C, as used by the TFRecord format.
fn masked_crc(bytes: &[u8]) -> u32 {
    let crc = crc32c::crc32c(bytes);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

/// Writes length-prefixed, checksummed records.
pub struct RecordWriter<W: Write> {
    writer: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        RecordWriter { writer }
    }

    /// Write one record and return the number of bytes written.
    pub fn write_record(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut len_bytes = [0u8; 8];
        LittleEndian::write_u64(&mut len_bytes, bytes.len() as u64);

        self.writer.write_all(&len_bytes)?;
        self.writer
            .write_u32::<LittleEndian>(masked_crc(&len_bytes))?;
        self.writer.write_all(bytes)?;
        self.writer.write_u32::<LittleEndian>(masked_crc(bytes))?;
        Ok(16 + bytes.len())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reads records written by [`RecordWriter`], verifying both checksums.
///
/// Iterating yields each payload; iteration stops after the first error.
pub struct RecordReader<R: Read> {
    reader: R,
    path: PathBuf,
    offset: u64,
    failed: bool,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, RecordError> {
        let file = File::open(path).map_err(|source| RecordError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(RecordReader {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            offset: 0,
            failed: false,
        })
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader {
            reader,
            path: PathBuf::from("<stream>"),
            offset: 0,
            failed: false,
        }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next record. `Ok(None)` means a clean end of input.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, RecordError> {
        let start = self.offset;

        let mut header = [0u8; 12];
        let n = read_full(&mut self.reader, &mut header)?;
        if n == 0 {
            return Ok(None);
        }
        if n < header.len() {
            return Err(self.truncated(start));
        }

        let (len_bytes, len_crc) = header.split_at(8);
        if masked_crc(len_bytes) != LittleEndian::read_u32(len_crc) {
            return Err(self.checksum(start, "length"));
        }
        let len = LittleEndian::read_u64(len_bytes);
        if len > MAX_RECORD_LEN {
            return Err(RecordError::Oversized {
                path: self.path.clone(),
                offset: start,
                len,
            });
        }

        let mut payload = vec![0u8; len as usize];
        if read_full(&mut self.reader, &mut payload)? < payload.len() {
            return Err(self.truncated(start));
        }
        let mut payload_crc = [0u8; 4];
        if read_full(&mut self.reader, &mut payload_crc)? < payload_crc.len() {
            return Err(self.truncated(start));
        }
        if masked_crc(&payload) != LittleEndian::read_u32(&payload_crc) {
            return Err(self.checksum(start, "payload"));
        }

        self.offset += 16 + len;
        Ok(Some(payload))
    }

    fn truncated(&self, offset: u64) -> RecordError {
        RecordError::Truncated {
            path: self.path.clone(),
            offset,
        }
    }

    fn checksum(&self, offset: u64, what: &'static str) -> RecordError {
        RecordError::Checksum {
            path: self.path.clone(),
            offset,
            what,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_record().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

/// Fill `buf` as far as the input allows; returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
