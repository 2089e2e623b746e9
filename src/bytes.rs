//! Little-endian byte-buffer append/read primitives shared by the `.npy`
//! header codec and the `.npz` ZIP record codec.
//!
//! Both wire formats specify fixed-width little-endian integers embedded in
//! an otherwise freeform byte stream (a Python-literal header, a sequence of
//! ZIP records). Rather than have every caller reach for `byteorder`
//! directly, this module gives the rest of the crate one small vocabulary
//! for "append an integer" and "read an integer, advancing a cursor".

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io;

/// Appends little-endian primitive integers to a growable byte buffer.
///
/// This is the write-side counterpart of [`ByteReader`]. It never fails: the
/// only failure mode for appending to a `Vec<u8>` is allocation failure,
/// which Rust represents as an abort rather than a `Result`.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> ByteWriter<'a> {
    /// Wraps a buffer for little-endian appends.
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        ByteWriter { buf }
    }

    /// Appends raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends a `u16` as two little-endian bytes.
    pub fn write_u16(&mut self, value: u16) {
        let mut tmp = [0u8; 2];
        LittleEndian::write_u16(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }

    /// Appends a `u32` as four little-endian bytes.
    pub fn write_u32(&mut self, value: u32) {
        let mut tmp = [0u8; 4];
        LittleEndian::write_u32(&mut tmp, value);
        self.buf.extend_from_slice(&tmp);
    }
}

/// Reads little-endian primitive integers from a byte slice, advancing a
/// cursor as it goes.
///
/// This is used both for parsing ZIP records out of an in-memory buffer and
/// for parsing the `.npy` preamble out of a mapped window (where the
/// "reader" is just the mapped byte slice and the cursor is the window's
/// advancing view pointer).
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

/// Error reading past the end of the wrapped byte slice.
#[derive(Debug)]
pub struct UnexpectedEnd;

impl std::fmt::Display for UnexpectedEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "unexpected end of buffer")
    }
}

impl std::error::Error for UnexpectedEnd {}

impl From<UnexpectedEnd> for io::Error {
    fn from(_: UnexpectedEnd) -> io::Error {
        io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected end of buffer")
    }
}

impl<'a> ByteReader<'a> {
    /// Wraps `bytes` with the cursor at the start.
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, pos: 0 }
    }

    /// Bytes remaining after the cursor.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Current cursor position, in bytes from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reads `n` bytes and advances the cursor past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], UnexpectedEnd> {
        let end = self.pos.checked_add(n).ok_or(UnexpectedEnd)?;
        let slice = self.bytes.get(self.pos..end).ok_or(UnexpectedEnd)?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads a little-endian `u16` and advances the cursor.
    pub fn read_u16(&mut self) -> Result<u16, UnexpectedEnd> {
        let mut slice = self.read_bytes(2)?;
        Ok(slice.read_u16::<LittleEndian>().expect("length checked above"))
    }

    /// Reads a little-endian `u32` and advances the cursor.
    pub fn read_u32(&mut self) -> Result<u32, UnexpectedEnd> {
        let mut slice = self.read_bytes(4)?;
        Ok(slice.read_u32::<LittleEndian>().expect("length checked above"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_u16_and_u32() {
        let mut buf = Vec::new();
        {
            let mut w = ByteWriter::new(&mut buf);
            w.write_u16(0xABCD);
            w.write_u32(0x0102_0304);
            w.write_bytes(b"tail");
        }
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_u16().unwrap(), 0xABCD);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(r.read_bytes(4).unwrap(), b"tail");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn read_past_end_fails() {
        let buf = vec![1, 2, 3];
        let mut r = ByteReader::new(&buf);
        assert!(r.read_u32().is_err());
    }
}
