//! Reading and writing `.npz` files: a ZIP container of stored (and, on
//! read, optionally DEFLATE-compressed) `.npy` members.
//!
//! The teacher's original `npz.rs` delegated the whole ZIP layer to the
//! `zip` crate, which has no API for "rewrite the central directory in
//! place at a fixed offset" — exactly what the append protocol below
//! needs. So the records (`LocalEntryMeta`, the central directory entry,
//! the end-of-central-directory footer) are hand-rolled here using
//! [`crate::bytes`] (the same tool the header codec uses for `.npy`
//! integers), [`crc32fast`] for the checksum, and `flate2` for inflate on
//! the read side. Only the stored method (0) is ever written; method 8
//! (DEFLATE) is accepted on read.

use crate::bytes::{ByteReader, ByteWriter};
use crate::npy::{self, ReadNpyError, ReadableElement, SaveMode, WritableElement, WriteNpyError};
use crate::shapes::MultiDimArray;
use byteorder::{ByteOrder, LittleEndian};
use flate2::read::DeflateDecoder;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::error::Error;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;
const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const VERSION_NEEDED: u16 = 20;
const VERSION_MADE_BY: u16 = 20;
const COMPRESSION_STORED: u16 = 0;
const COMPRESSION_DEFLATE: u16 = 8;
const LOCAL_HEADER_FIXED_LEN: u64 = 30;
const EOCD_FIXED_LEN: usize = 22;

/// A malformed or corrupt ZIP container.
#[derive(Debug)]
#[non_exhaustive]
pub enum CorruptArchive {
    /// A signature that is neither a local file header nor a central
    /// directory marker was found where a local file header was expected.
    UnexpectedSignature(u32),
    BadEocdSignature(u32),
    /// The file is too short to hold a valid end-of-central-directory
    /// record.
    TruncatedRecord,
    NameNotUtf8,
    UnsupportedCompressionMethod(u16),
    /// A ZIP64 record marker was found; ZIP64 is out of scope.
    Zip64Unsupported,
    /// A member's decoded bytes don't hash to the CRC-32 recorded in its
    /// local file header.
    CrcMismatch,
}

impl Error for CorruptArchive {}

impl fmt::Display for CorruptArchive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorruptArchive::UnexpectedSignature(sig) => {
                write!(f, "unexpected record signature: {:#010x}", sig)
            }
            CorruptArchive::BadEocdSignature(sig) => {
                write!(f, "bad end-of-central-directory signature: {:#010x}", sig)
            }
            CorruptArchive::TruncatedRecord => write!(f, "archive is too short to contain a valid record"),
            CorruptArchive::NameNotUtf8 => write!(f, "member name is not valid utf-8"),
            CorruptArchive::UnsupportedCompressionMethod(m) => {
                write!(f, "unsupported compression method: {}", m)
            }
            CorruptArchive::Zip64Unsupported => write!(f, "zip64 records are not supported"),
            CorruptArchive::CrcMismatch => write!(f, "member data does not match its recorded crc-32"),
        }
    }
}

/// An error writing a `.npz` file.
#[derive(Debug)]
#[non_exhaustive]
pub enum WriteNpzError {
    Io(io::Error),
    /// An error writing one member's `.npy` bytes.
    Npy(WriteNpyError),
    CorruptArchive(CorruptArchive),
    /// A member name, payload, or the archive itself is too large for the
    /// 32-bit size fields version-1 ZIP records use.
    EntryTooLarge,
}

impl Error for WriteNpzError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriteNpzError::Io(err) => Some(err),
            WriteNpzError::Npy(err) => Some(err),
            WriteNpzError::CorruptArchive(err) => Some(err),
            WriteNpzError::EntryTooLarge => None,
        }
    }
}

impl fmt::Display for WriteNpzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WriteNpzError::Io(err) => write!(f, "I/O error: {}", err),
            WriteNpzError::Npy(err) => write!(f, "error writing npy member: {}", err),
            WriteNpzError::CorruptArchive(err) => write!(f, "existing archive is corrupt: {}", err),
            WriteNpzError::EntryTooLarge => write!(f, "entry exceeds the 32-bit size fields of a version-1 zip record"),
        }
    }
}

impl From<io::Error> for WriteNpzError {
    fn from(err: io::Error) -> Self {
        WriteNpzError::Io(err)
    }
}

impl From<WriteNpyError> for WriteNpzError {
    fn from(err: WriteNpyError) -> Self {
        WriteNpzError::Npy(err)
    }
}

impl From<CorruptArchive> for WriteNpzError {
    fn from(err: CorruptArchive) -> Self {
        WriteNpzError::CorruptArchive(err)
    }
}

/// An error reading a `.npz` file.
#[derive(Debug)]
#[non_exhaustive]
pub enum ReadNpzError {
    Io(io::Error),
    CorruptArchive(CorruptArchive),
    /// An error reading one member's `.npy` bytes.
    Npy(ReadNpyError),
    DecompressionFailed(io::Error),
    NameNotFound(String),
}

impl Error for ReadNpzError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadNpzError::Io(err) => Some(err),
            ReadNpzError::CorruptArchive(err) => Some(err),
            ReadNpzError::Npy(err) => Some(err),
            ReadNpzError::DecompressionFailed(err) => Some(err),
            ReadNpzError::NameNotFound(_) => None,
        }
    }
}

impl fmt::Display for ReadNpzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadNpzError::Io(err) => write!(f, "I/O error: {}", err),
            ReadNpzError::CorruptArchive(err) => write!(f, "archive is corrupt: {}", err),
            ReadNpzError::Npy(err) => write!(f, "error reading npy member: {}", err),
            ReadNpzError::DecompressionFailed(err) => write!(f, "inflate failed: {}", err),
            ReadNpzError::NameNotFound(name) => write!(f, "no member named {:?}", name),
        }
    }
}

impl From<io::Error> for ReadNpzError {
    fn from(err: io::Error) -> Self {
        ReadNpzError::Io(err)
    }
}

impl From<ReadNpyError> for ReadNpzError {
    fn from(err: ReadNpyError) -> Self {
        ReadNpzError::Npy(err)
    }
}

impl From<CorruptArchive> for ReadNpzError {
    fn from(err: CorruptArchive) -> Self {
        ReadNpzError::CorruptArchive(err)
    }
}

/// Bookkeeping for one member written so far, enough to emit its central
/// directory entry once the member count is known.
struct LocalEntryMeta {
    name: String,
    name_len: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    local_header_offset: u32,
}

fn write_local_header<W: Write>(
    writer: &mut W,
    name: &str,
    name_len: u16,
    crc32: u32,
    size: u32,
) -> io::Result<()> {
    let mut buf = Vec::with_capacity(LOCAL_HEADER_FIXED_LEN as usize + name.len());
    let mut w = ByteWriter::new(&mut buf);
    w.write_u32(LOCAL_FILE_HEADER_SIGNATURE);
    w.write_u16(VERSION_NEEDED);
    w.write_u16(0); // flags
    w.write_u16(COMPRESSION_STORED);
    w.write_u16(0); // mod time
    w.write_u16(0); // mod date
    w.write_u32(crc32);
    w.write_u32(size); // compressed size (== uncompressed: always stored)
    w.write_u32(size); // uncompressed size
    w.write_u16(name_len);
    w.write_u16(0); // extra length
    w.write_bytes(name.as_bytes());
    writer.write_all(&buf)
}

fn write_central_entry(buf: &mut Vec<u8>, entry: &LocalEntryMeta) {
    let mut w = ByteWriter::new(buf);
    w.write_u32(CENTRAL_DIRECTORY_SIGNATURE);
    w.write_u16(VERSION_MADE_BY);
    w.write_u16(VERSION_NEEDED);
    w.write_u16(0); // flags
    w.write_u16(COMPRESSION_STORED);
    w.write_u16(0); // mod time
    w.write_u16(0); // mod date
    w.write_u32(entry.crc32);
    w.write_u32(entry.compressed_size);
    w.write_u32(entry.uncompressed_size);
    w.write_u16(entry.name_len);
    w.write_u16(0); // extra length
    w.write_u16(0); // comment length
    w.write_u16(0); // disk number start
    w.write_u16(0); // internal attrs
    w.write_u32(0); // external attrs
    w.write_u32(entry.local_header_offset);
    w.write_bytes(entry.name.as_bytes());
}

fn write_eocd<W: Write>(
    writer: &mut W,
    n_records: u16,
    central_dir_size: u32,
    central_dir_offset: u32,
) -> io::Result<()> {
    let mut buf = Vec::with_capacity(EOCD_FIXED_LEN);
    let mut w = ByteWriter::new(&mut buf);
    w.write_u32(EOCD_SIGNATURE);
    w.write_u16(0); // disk number
    w.write_u16(0); // disk with central directory
    w.write_u16(n_records); // entries on this disk
    w.write_u16(n_records); // total entries
    w.write_u32(central_dir_size);
    w.write_u32(central_dir_offset);
    w.write_u16(0); // comment length
    writer.write_all(&buf)
}

fn checked_u16(n: usize) -> Result<u16, WriteNpzError> {
    u16::try_from(n).map_err(|_| WriteNpzError::EntryTooLarge)
}

fn checked_u32(n: usize) -> Result<u32, WriteNpzError> {
    u32::try_from(n).map_err(|_| WriteNpzError::EntryTooLarge)
}

/// Builds a fresh `.npz` archive one member at a time, writing stored
/// (uncompressed) entries as they're added and the central directory on
/// [`NpzWriter::finish`].
pub struct NpzWriter<W: Write + Seek> {
    writer: W,
    entries: Vec<LocalEntryMeta>,
}

impl<W: Write + Seek> NpzWriter<W> {
    pub fn new(writer: W) -> Self {
        NpzWriter { writer, entries: Vec::new() }
    }

    /// Adds an array under `name` (`.npy` is appended automatically).
    pub fn add_array<T: WritableElement>(
        &mut self,
        name: impl Into<String>,
        data: &[T],
        shape: &[usize],
    ) -> Result<(), WriteNpzError> {
        let member_name = format!("{}.npy", name.into());
        let name_len = checked_u16(member_name.len())?;
        let local_header_offset = checked_u32(self.writer.stream_position()? as usize)?;

        let mut npy_bytes = Vec::new();
        npy::write_fresh(&mut npy_bytes, data, shape)?;
        let crc32 = crc32fast::hash(&npy_bytes);
        let size = checked_u32(npy_bytes.len())?;

        write_local_header(&mut self.writer, &member_name, name_len, crc32, size)?;
        self.writer.write_all(&npy_bytes)?;

        self.entries.push(LocalEntryMeta {
            name: member_name,
            name_len,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            local_header_offset,
        });
        Ok(())
    }

    /// Writes the central directory and end-of-central-directory record,
    /// returning the underlying writer.
    pub fn finish(mut self) -> Result<W, WriteNpzError> {
        let central_dir_offset = checked_u32(self.writer.stream_position()? as usize)?;
        let mut central_dir = Vec::new();
        for entry in &self.entries {
            write_central_entry(&mut central_dir, entry);
        }
        self.writer.write_all(&central_dir)?;
        let central_dir_size = checked_u32(central_dir.len())?;
        let n_records = u16::try_from(self.entries.len()).map_err(|_| WriteNpzError::EntryTooLarge)?;
        write_eocd(&mut self.writer, n_records, central_dir_size, central_dir_offset)?;
        Ok(self.writer)
    }
}

/// Appends a single new member to an existing `.npz` file, per the
/// rewrite-the-central-directory protocol: read the old directory into
/// memory, overwrite it with the new member's local header and payload,
/// then rewrite the directory (old entries plus the new one) and a fresh
/// end-of-central-directory record after it.
fn append_compressed<P: AsRef<Path>, T: WritableElement>(
    path: P,
    name: &str,
    data: &[T],
    shape: &[usize],
) -> Result<(), WriteNpzError> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let file_len = file.seek(SeekFrom::End(0))?;
    if file_len < EOCD_FIXED_LEN as u64 {
        return Err(CorruptArchive::TruncatedRecord.into());
    }
    file.seek(SeekFrom::Start(file_len - EOCD_FIXED_LEN as u64))?;
    let mut eocd_buf = [0u8; EOCD_FIXED_LEN];
    file.read_exact(&mut eocd_buf)?;
    let mut r = ByteReader::new(&eocd_buf);
    let sig = r.read_u32().expect("fixed-size buffer");
    if sig != EOCD_SIGNATURE {
        return Err(CorruptArchive::BadEocdSignature(sig).into());
    }
    let _disk_number = r.read_u16().expect("fixed-size buffer");
    let _disk_with_central_dir = r.read_u16().expect("fixed-size buffer");
    let _entries_this_disk = r.read_u16().expect("fixed-size buffer");
    let n_records = r.read_u16().expect("fixed-size buffer");
    let central_dir_size = r.read_u32().expect("fixed-size buffer");
    let central_dir_offset = r.read_u32().expect("fixed-size buffer");
    if n_records == 0xFFFF || central_dir_size == 0xFFFF_FFFF || central_dir_offset == 0xFFFF_FFFF {
        return Err(CorruptArchive::Zip64Unsupported.into());
    }

    file.seek(SeekFrom::Start(central_dir_offset as u64))?;
    let mut old_central_dir = vec![0u8; central_dir_size as usize];
    file.read_exact(&mut old_central_dir)?;

    let member_name = format!("{}.npy", name);
    let name_len = checked_u16(member_name.len())?;
    let mut npy_bytes = Vec::new();
    npy::write_fresh(&mut npy_bytes, data, shape)?;
    let crc32 = crc32fast::hash(&npy_bytes);
    let size = checked_u32(npy_bytes.len())?;

    file.seek(SeekFrom::Start(central_dir_offset as u64))?;
    let new_local_header_offset = central_dir_offset;
    write_local_header(&mut file, &member_name, name_len, crc32, size)?;
    file.write_all(&npy_bytes)?;

    let new_central_dir_offset = checked_u32(file.stream_position()? as usize)?;
    file.write_all(&old_central_dir)?;
    let new_entry = LocalEntryMeta {
        name: member_name,
        name_len,
        crc32,
        compressed_size: size,
        uncompressed_size: size,
        local_header_offset: new_local_header_offset,
    };
    let mut entry_bytes = Vec::new();
    write_central_entry(&mut entry_bytes, &new_entry);
    file.write_all(&entry_bytes)?;

    let new_central_dir_size = central_dir_size
        .checked_add(entry_bytes.len() as u32)
        .ok_or(WriteNpzError::EntryTooLarge)?;
    let new_n_records = n_records.checked_add(1).ok_or(WriteNpzError::EntryTooLarge)?;
    write_eocd(&mut file, new_n_records, new_central_dir_size, new_central_dir_offset)?;
    let end = file.stream_position()?;
    file.set_len(end)?;
    file.flush()?;
    Ok(())
}

/// Writes or appends a single array to the `.npz` file at `path`, under
/// `name` (stored as `name.npy`), per `mode`.
pub fn save_compressed<P: AsRef<Path>, T: WritableElement>(
    path: P,
    name: &str,
    data: &[T],
    shape: &[usize],
    mode: SaveMode,
) -> Result<(), WriteNpzError> {
    match mode {
        SaveMode::Write => {
            let file = File::create(path)?;
            let mut writer = NpzWriter::new(BufWriter::new(file));
            writer.add_array(name, data, shape)?;
            let mut inner = writer.finish()?;
            inner.flush()?;
            Ok(())
        }
        SaveMode::Append => append_compressed(path, name, data, shape),
    }
}

struct IndexedEntry {
    name: String,
    compression_method: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    data_offset: u64,
}

/// Reads `.npy` members out of a `.npz` archive by walking the local file
/// headers in file order (not the central directory) until a non-local
/// signature is reached, per the read protocol.
pub struct NpzReader<R: Read + Seek> {
    reader: R,
    entries: Vec<IndexedEntry>,
}

impl<R: Read + Seek> NpzReader<R> {
    pub fn new(mut reader: R) -> Result<Self, ReadNpzError> {
        let mut entries = Vec::new();
        let mut offset: u64 = 0;
        loop {
            reader.seek(SeekFrom::Start(offset))?;
            let mut sig_buf = [0u8; 4];
            match reader.read_exact(&mut sig_buf) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(err) => return Err(err.into()),
            }
            let sig = LittleEndian::read_u32(&sig_buf);
            if sig != LOCAL_FILE_HEADER_SIGNATURE {
                if sig == CENTRAL_DIRECTORY_SIGNATURE || sig == EOCD_SIGNATURE {
                    break;
                }
                return Err(CorruptArchive::UnexpectedSignature(sig).into());
            }

            let mut rest = [0u8; 26];
            reader.read_exact(&mut rest)?;
            let mut r = ByteReader::new(&rest);
            let _version_needed = r.read_u16().expect("fixed-size buffer");
            let _flags = r.read_u16().expect("fixed-size buffer");
            let compression_method = r.read_u16().expect("fixed-size buffer");
            let _mod_time = r.read_u16().expect("fixed-size buffer");
            let _mod_date = r.read_u16().expect("fixed-size buffer");
            let crc32 = r.read_u32().expect("fixed-size buffer");
            let compressed_size = r.read_u32().expect("fixed-size buffer");
            let uncompressed_size = r.read_u32().expect("fixed-size buffer");
            let name_length = r.read_u16().expect("fixed-size buffer");
            let extra_length = r.read_u16().expect("fixed-size buffer");

            let mut name_buf = vec![0u8; name_length as usize];
            reader.read_exact(&mut name_buf)?;
            let name = String::from_utf8(name_buf).map_err(|_| CorruptArchive::NameNotUtf8)?;
            let stripped = name.strip_suffix(".npy").unwrap_or(&name).to_string();

            let data_offset = offset + LOCAL_HEADER_FIXED_LEN + name_length as u64 + extra_length as u64;
            entries.push(IndexedEntry {
                name: stripped,
                compression_method,
                crc32,
                compressed_size,
                uncompressed_size,
                data_offset,
            });
            offset = data_offset + compressed_size as u64;
        }
        Ok(NpzReader { reader, entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn by_name_full<T: ReadableElement>(&mut self, name: &str) -> Result<MultiDimArray<T>, ReadNpzError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| ReadNpzError::NameNotFound(name.to_string()))?;
        self.by_index_full(index)
    }

    pub fn by_index_full<T: ReadableElement>(&mut self, index: usize) -> Result<MultiDimArray<T>, ReadNpzError> {
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| ReadNpzError::NameNotFound(format!("index {}", index)))?;
        let compression_method = entry.compression_method;
        let crc32 = entry.crc32;
        let compressed_size = entry.compressed_size;
        let uncompressed_size = entry.uncompressed_size;
        let data_offset = entry.data_offset;

        self.reader.seek(SeekFrom::Start(data_offset))?;
        let npy_bytes = match compression_method {
            COMPRESSION_STORED => {
                let mut buf = vec![0u8; compressed_size as usize];
                self.reader.read_exact(&mut buf)?;
                buf
            }
            COMPRESSION_DEFLATE => {
                let mut compressed = vec![0u8; compressed_size as usize];
                self.reader.read_exact(&mut compressed)?;
                let mut decoder = DeflateDecoder::new(&compressed[..]);
                let mut decompressed = Vec::with_capacity(uncompressed_size as usize);
                decoder
                    .read_to_end(&mut decompressed)
                    .map_err(ReadNpzError::DecompressionFailed)?;
                decompressed
            }
            other => return Err(CorruptArchive::UnsupportedCompressionMethod(other).into()),
        };

        if crc32fast::hash(&npy_bytes) != crc32 {
            return Err(CorruptArchive::CrcMismatch.into());
        }
        Ok(npy::read_full(&mut &npy_bytes[..])?)
    }

    /// Reads every member into a mapping from its (suffix-stripped) name.
    pub fn read_all_full<T: ReadableElement>(&mut self) -> Result<HashMap<String, MultiDimArray<T>>, ReadNpzError> {
        let mut out = HashMap::with_capacity(self.entries.len());
        for index in 0..self.entries.len() {
            let name = self.entries[index].name.clone();
            out.insert(name, self.by_index_full(index)?);
        }
        Ok(out)
    }
}

/// Reads every member of the `.npz` file at `path`.
pub fn load_compressed_full<P: AsRef<Path>, T: ReadableElement>(
    path: P,
) -> Result<HashMap<String, MultiDimArray<T>>, ReadNpzError> {
    let file = File::open(path)?;
    NpzReader::new(file)?.read_all_full()
}

/// Reads the single member `name` of the `.npz` file at `path`.
pub fn load_compressed_full_named<P: AsRef<Path>, T: ReadableElement>(
    path: P,
    name: &str,
) -> Result<MultiDimArray<T>, ReadNpzError> {
    let file = File::open(path)?;
    NpzReader::new(file)?.by_name_full(name)
}

/// Flattened convenience over [`load_compressed_full`]: discards shape for
/// every member.
pub fn load_compressed<P: AsRef<Path>, T: ReadableElement>(
    path: P,
) -> Result<HashMap<String, Vec<T>>, ReadNpzError> {
    Ok(load_compressed_full::<P, T>(path)?
        .into_iter()
        .map(|(name, arr)| (name, arr.into_raw_parts().0))
        .collect())
}

/// Flattened convenience over [`load_compressed_full_named`]: discards
/// shape.
pub fn load_compressed_named<P: AsRef<Path>, T: ReadableElement>(
    path: P,
    name: &str,
) -> Result<Vec<T>, ReadNpzError> {
    Ok(load_compressed_full_named::<P, T>(path, name)?.into_raw_parts().0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use tempfile::NamedTempFile;

    #[test]
    fn write_then_read_round_trips() {
        let f = NamedTempFile::new().unwrap();
        save_compressed(f.path(), "arr1", &[1.0f64, 2.0, 3.0, 4.0], &[2, 2], SaveMode::Write).unwrap();
        let arr = load_compressed_full_named::<_, f64>(f.path(), "arr1").unwrap();
        assert_eq!(arr.shape(), &[2, 2]);
        assert_eq!(arr.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn append_adds_second_member_without_disturbing_first() {
        let f = NamedTempFile::new().unwrap();
        save_compressed(f.path(), "arr1", &[1i32, 2, 3], &[3], SaveMode::Write).unwrap();
        save_compressed(f.path(), "arr2", &[4i32, 5, 6, 7], &[4], SaveMode::Append).unwrap();

        let all = load_compressed_full::<_, i32>(f.path()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["arr1"].as_slice(), &[1, 2, 3]);
        assert_eq!(all["arr2"].as_slice(), &[4, 5, 6, 7]);
    }

    #[test]
    fn member_name_strips_npy_suffix() {
        let f = NamedTempFile::new().unwrap();
        save_compressed(f.path(), "x", &[true, false], &[2], SaveMode::Write).unwrap();
        let file = File::open(f.path()).unwrap();
        let reader = NpzReader::new(file).unwrap();
        assert_eq!(reader.names().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn wrong_type_surfaces_as_npy_error() {
        let f = NamedTempFile::new().unwrap();
        save_compressed(f.path(), "arr", &[1.0f32, 2.0, 3.0], &[3], SaveMode::Write).unwrap();
        let err = load_compressed_named::<_, f64>(f.path(), "arr").unwrap_err();
        assert!(matches!(err, ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))));
    }

    /// Builds a minimal one-member archive with a DEFLATE-compressed `.npy`
    /// payload by hand, to exercise the inflate branch of the read path
    /// without this crate ever writing compressed entries itself.
    fn build_deflated_archive(npy_bytes: &[u8]) -> Vec<u8> {
        let mut compressed = Vec::new();
        {
            let mut encoder = DeflateEncoder::new(&mut compressed, Compression::default());
            encoder.write_all(npy_bytes).unwrap();
            encoder.finish().unwrap();
        }
        let crc32 = crc32fast::hash(npy_bytes);
        let name = "member.npy";

        let mut archive = Vec::new();
        let local_header_offset = 0u32;
        {
            let mut w = ByteWriter::new(&mut archive);
            w.write_u32(LOCAL_FILE_HEADER_SIGNATURE);
            w.write_u16(VERSION_NEEDED);
            w.write_u16(0);
            w.write_u16(COMPRESSION_DEFLATE);
            w.write_u16(0);
            w.write_u16(0);
            w.write_u32(crc32);
            w.write_u32(compressed.len() as u32);
            w.write_u32(npy_bytes.len() as u32);
            w.write_u16(name.len() as u16);
            w.write_u16(0);
            w.write_bytes(name.as_bytes());
        }
        archive.extend_from_slice(&compressed);

        let central_dir_offset = archive.len() as u32;
        let entry = LocalEntryMeta {
            name: name.to_string(),
            name_len: name.len() as u16,
            crc32,
            compressed_size: compressed.len() as u32,
            uncompressed_size: npy_bytes.len() as u32,
            local_header_offset,
        };
        write_central_entry(&mut archive, &entry);
        let central_dir_size = archive.len() as u32 - central_dir_offset;
        write_eocd(&mut archive, 1, central_dir_size, central_dir_offset).unwrap();
        archive
    }

    #[test]
    fn decompresses_deflate_member() {
        let mut npy_bytes = Vec::new();
        npy::write_fresh(&mut npy_bytes, &[10i32, 20, 30, 40], &[4]).unwrap();
        let archive = build_deflated_archive(&npy_bytes);

        let mut reader = NpzReader::new(io::Cursor::new(archive)).unwrap();
        let arr = reader.by_name_full::<i32>("member").unwrap();
        assert_eq!(arr.as_slice(), &[10, 20, 30, 40]);
    }
}
