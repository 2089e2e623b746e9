//! Reading, writing, and zero-copy viewing of `.npy` files, operating over
//! [`MultiDimArray`] rather than a generic strided array type: every array
//! this engine touches is already contiguous, C-order, host-endian memory.

mod elements;

pub use elements::{ElementDescriptor, ReadableElement, WritableElement};

use crate::descriptor::TypeDescriptor;
use crate::endian::Endianness;
use crate::header::{
    FormatHeaderError, Header, ParseHeaderError, ReadHeaderError, WriteHeaderError,
};
use crate::mapped::{MappedError, MappedWindow};
use crate::shapes::MultiDimArray;
use std::error::Error;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::mem;
use std::path::Path;

/// How [`save`] should open the target file.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SaveMode {
    /// Create or truncate, then write a fresh array.
    Write,
    /// Open an existing file and grow its leading dimension.
    Append,
}

/// An error writing array data.
#[derive(Debug)]
pub enum WriteDataError {
    Io(io::Error),
}

impl Error for WriteDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriteDataError::Io(err) => Some(err),
        }
    }
}

impl fmt::Display for WriteDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WriteDataError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl From<io::Error> for WriteDataError {
    fn from(err: io::Error) -> Self {
        WriteDataError::Io(err)
    }
}

/// An error writing a `.npy` file or appending to one.
#[derive(Debug)]
#[non_exhaustive]
pub enum WriteNpyError {
    Io(io::Error),
    FormatHeader(FormatHeaderError),
    /// The target file's `fortran_order` or descriptor doesn't support the
    /// requested append.
    UnsupportedLayout,
    /// The array's type doesn't match the descriptor already on disk.
    TypeMismatch,
    /// The array's trailing dimensions don't match the existing file's.
    ShapeMismatch,
    /// An error reading the header of the file being appended to.
    ReadHeader(ReadHeaderError),
}

impl Error for WriteNpyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriteNpyError::Io(err) => Some(err),
            WriteNpyError::FormatHeader(err) => Some(err),
            WriteNpyError::ReadHeader(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for WriteNpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WriteNpyError::Io(err) => write!(f, "I/O error: {}", err),
            WriteNpyError::FormatHeader(err) => write!(f, "error formatting header: {}", err),
            WriteNpyError::UnsupportedLayout => write!(f, "unsupported layout for append"),
            WriteNpyError::TypeMismatch => write!(f, "element type does not match the file's descriptor"),
            WriteNpyError::ShapeMismatch => write!(f, "trailing dimensions do not match the existing file"),
            WriteNpyError::ReadHeader(err) => write!(f, "error reading existing header: {}", err),
        }
    }
}

impl From<io::Error> for WriteNpyError {
    fn from(err: io::Error) -> Self {
        WriteNpyError::Io(err)
    }
}

impl From<WriteHeaderError> for WriteNpyError {
    fn from(err: WriteHeaderError) -> Self {
        match err {
            WriteHeaderError::Io(err) => WriteNpyError::Io(err),
            WriteHeaderError::Format(err) => WriteNpyError::FormatHeader(err),
        }
    }
}

impl From<FormatHeaderError> for WriteNpyError {
    fn from(err: FormatHeaderError) -> Self {
        WriteNpyError::FormatHeader(err)
    }
}

impl From<WriteDataError> for WriteNpyError {
    fn from(err: WriteDataError) -> Self {
        match err {
            WriteDataError::Io(err) => WriteNpyError::Io(err),
        }
    }
}

impl From<ReadHeaderError> for WriteNpyError {
    fn from(err: ReadHeaderError) -> Self {
        WriteNpyError::ReadHeader(err)
    }
}

/// Writes the header and raw payload for `data`/`shape` to `writer`,
/// without any append logic. Used by both [`save`] (`Write` mode) and
/// [`save_mapped`], and by the npz writer to build a member's bytes before
/// it knows that member's CRC32 or final size.
pub(crate) fn write_fresh<W: Write, T: WritableElement>(
    mut writer: W,
    data: &[T],
    shape: &[usize],
) -> Result<(), WriteNpyError> {
    Header { descriptor: T::type_descriptor(), fortran_order: false, shape: shape.to_vec() }
        .write(&mut writer)?;
    T::write_slice(data, &mut writer)?;
    Ok(())
}

/// Appends `data` (whose leading dimension grows the file's shape[0]) to
/// the existing `.npy` file at `path`.
///
/// If the new header happens to serialize to a different byte length than
/// the old one (the decimal width of `shape[0]` crossed a padding
/// boundary), the whole file is rewritten with the new header followed by
/// the concatenated old and new payloads, rather than corrupting the file
/// by writing a mismatched-length header in place.
pub fn append<P: AsRef<Path>, T: WritableElement>(
    path: P,
    data: &[T],
    shape: &[usize],
) -> Result<(), WriteNpyError> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let header = Header::from_reader(&mut file)?;
    if header.fortran_order {
        return Err(WriteNpyError::UnsupportedLayout);
    }
    if !header.descriptor.matches_kind_and_size(T::type_descriptor()) {
        return Err(WriteNpyError::TypeMismatch);
    }
    if header.shape.len() != shape.len() || header.shape[1..] != shape[1..] {
        return Err(WriteNpyError::ShapeMismatch);
    }

    let old_header_len = header.byte_len()?;
    let old_len0 = header.shape[0];
    let mut new_shape = header.shape.clone();
    new_shape[0] = old_len0 + shape[0];
    let new_header =
        Header { descriptor: header.descriptor, fortran_order: false, shape: new_shape };
    let new_header_bytes = new_header.to_bytes()?;

    if new_header_bytes.len() == old_header_len {
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&new_header_bytes)?;
        file.seek(SeekFrom::End(0))?;
        T::write_slice(data, &mut file)?;
    } else {
        let old_payload_len =
            old_len0 * header.shape[1..].iter().product::<usize>() * header.descriptor.size_bytes;
        file.seek(SeekFrom::Start(old_header_len as u64))?;
        let mut old_payload = vec![0u8; old_payload_len];
        file.read_exact(&mut old_payload)?;
        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(&new_header_bytes)?;
        file.write_all(&old_payload)?;
        T::write_slice(data, &mut file)?;
    }
    file.flush()?;
    Ok(())
}

/// Writes or appends `data`/`shape` to the `.npy` file at `path`, per
/// `mode`.
pub fn save<P: AsRef<Path>, T: WritableElement>(
    path: P,
    data: &[T],
    shape: &[usize],
    mode: SaveMode,
) -> Result<(), WriteNpyError> {
    match mode {
        SaveMode::Write => {
            let file = File::create(path)?;
            write_fresh(BufWriter::new(file), data, shape)
        }
        SaveMode::Append => append(path, data, shape),
    }
}

/// Writes a `.npy` header and payload to a pre-sized mapped window,
/// starting at the window's cursor. No truncation is performed; the
/// caller is responsible for sizing the mapping to fit.
pub fn save_mapped<T: WritableElement>(
    window: &mut MappedWindow,
    data: &[T],
    shape: &[usize],
) -> Result<(), WriteNpyError> {
    let header = Header { descriptor: T::type_descriptor(), fortran_order: false, shape: shape.to_vec() };
    let header_bytes = header.to_bytes()?;
    window.copy_to(&header_bytes).map_err(map_write_mapped_err)?;
    let payload =
        unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, mem::size_of_val(data)) };
    window.copy_to(payload).map_err(map_write_mapped_err)?;
    Ok(())
}

fn map_write_mapped_err(err: MappedError) -> WriteNpyError {
    WriteNpyError::Io(err.into())
}

/// An error reading array data.
#[derive(Debug)]
pub enum ReadDataError {
    Io(io::Error),
    /// The type descriptor does not match the requested element type.
    WrongDescriptor(TypeDescriptor),
    /// The file does not contain all the data described in the header.
    MissingData,
    /// Extra bytes are present between the end of the data and the end of
    /// the payload region.
    ExtraBytes(usize),
    /// Bytes were read but are not a valid bit pattern for the element
    /// type (e.g. a `bool` byte other than 0 or 1).
    ParseData(Box<dyn Error + Send + Sync + 'static>),
}

impl Error for ReadDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadDataError::Io(err) => Some(err),
            ReadDataError::ParseData(err) => Some(&**err),
            _ => None,
        }
    }
}

impl fmt::Display for ReadDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadDataError::Io(err) => write!(f, "I/O error: {}", err),
            ReadDataError::WrongDescriptor(desc) => {
                write!(f, "incorrect descriptor ({}) for this type", desc.to_descr_string())
            }
            ReadDataError::MissingData => write!(f, "reached EOF before reading all data"),
            ReadDataError::ExtraBytes(n) => write!(f, "payload had {} extra bytes", n),
            ReadDataError::ParseData(err) => write!(f, "error parsing data: {}", err),
        }
    }
}

impl From<io::Error> for ReadDataError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ReadDataError::MissingData
        } else {
            ReadDataError::Io(err)
        }
    }
}

/// An error reading a `.npy` file.
#[derive(Debug)]
#[non_exhaustive]
pub enum ReadNpyError {
    Io(io::Error),
    ParseHeader(ParseHeaderError),
    /// Overflow computing the number of elements or bytes from the shape.
    LengthOverflow,
    WrongDescriptor(TypeDescriptor),
    MissingData,
    ExtraBytes(usize),
    ParseData(Box<dyn Error + Send + Sync + 'static>),
}

impl Error for ReadNpyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadNpyError::Io(err) => Some(err),
            ReadNpyError::ParseHeader(err) => Some(err),
            ReadNpyError::ParseData(err) => Some(&**err),
            _ => None,
        }
    }
}

impl fmt::Display for ReadNpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadNpyError::Io(err) => write!(f, "I/O error: {}", err),
            ReadNpyError::ParseHeader(err) => write!(f, "error parsing header: {}", err),
            ReadNpyError::LengthOverflow => write!(f, "overflow computing length from shape"),
            ReadNpyError::WrongDescriptor(desc) => {
                write!(f, "incorrect descriptor ({}) for this type", desc.to_descr_string())
            }
            ReadNpyError::MissingData => write!(f, "reached EOF before reading all data"),
            ReadNpyError::ExtraBytes(n) => write!(f, "file had {} extra bytes before EOF", n),
            ReadNpyError::ParseData(err) => write!(f, "error parsing data: {}", err),
        }
    }
}

impl From<io::Error> for ReadNpyError {
    fn from(err: io::Error) -> Self {
        ReadNpyError::Io(err)
    }
}

impl From<ReadHeaderError> for ReadNpyError {
    fn from(err: ReadHeaderError) -> Self {
        match err {
            ReadHeaderError::Io(err) => ReadNpyError::Io(err),
            ReadHeaderError::Parse(err) => ReadNpyError::ParseHeader(err),
        }
    }
}

impl From<ReadDataError> for ReadNpyError {
    fn from(err: ReadDataError) -> Self {
        match err {
            ReadDataError::Io(err) => ReadNpyError::Io(err),
            ReadDataError::WrongDescriptor(desc) => ReadNpyError::WrongDescriptor(desc),
            ReadDataError::MissingData => ReadNpyError::MissingData,
            ReadDataError::ExtraBytes(n) => ReadNpyError::ExtraBytes(n),
            ReadDataError::ParseData(err) => ReadNpyError::ParseData(err),
        }
    }
}

fn checked_len(shape: &[usize], elem_size: usize) -> Option<usize> {
    let len = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))?;
    if len > isize::MAX as usize {
        return None;
    }
    len.checked_mul(elem_size)?;
    Some(len)
}

/// Reads the `.npy` file at `path` into a fully-owned [`MultiDimArray`],
/// copying and byte-swapping as needed.
pub fn load_full<P: AsRef<Path>, T: ReadableElement>(path: P) -> Result<MultiDimArray<T>, ReadNpyError> {
    let mut file = File::open(path)?;
    read_full(&mut file)
}

/// Reads an array whose header starts at the reader's current position.
pub fn read_full<R: Read, T: ReadableElement>(reader: &mut R) -> Result<MultiDimArray<T>, ReadNpyError> {
    let header = Header::from_reader(reader)?;
    let len =
        checked_len(&header.shape, mem::size_of::<T>()).ok_or(ReadNpyError::LengthOverflow)?;
    let data = T::read_to_end_exact_vec(reader, header.descriptor, len)?;
    Ok(MultiDimArray::new(data, header.shape).expect("read_to_end_exact_vec returns exactly `len` elements"))
}

/// Flattened convenience over [`load_full`]: returns just the element
/// sequence, discarding shape.
pub fn load<P: AsRef<Path>, T: ReadableElement>(path: P) -> Result<Vec<T>, ReadNpyError> {
    Ok(load_full(path)?.into_raw_parts().0)
}

/// Reads a `.npy` array out of a mapped window starting at the cursor,
/// copying the payload and byte-swapping as needed, and advances the
/// cursor past it.
pub fn load_full_mapped<T: ReadableElement>(
    window: &mut MappedWindow,
) -> Result<MultiDimArray<T>, ReadNpyError> {
    let header = Header::from_mapped(window)?;
    let len =
        checked_len(&header.shape, mem::size_of::<T>()).ok_or(ReadNpyError::LengthOverflow)?;
    let byte_len = len * header.descriptor.size_bytes;
    let bytes = window.read_exact(byte_len).map_err(|e| ReadNpyError::Io(e.into()))?;
    let data = T::read_to_end_exact_vec(bytes, header.descriptor, len)?;
    Ok(MultiDimArray::new(data, header.shape).expect("read_to_end_exact_vec returns exactly `len` elements"))
}

/// An error validating element bytes for a zero-copy view.
#[derive(Debug)]
pub enum ViewDataError {
    /// Some of the data is invalid for the element type (e.g. non-0/1
    /// bytes for `bool`).
    InvalidData(Box<dyn Error + Send + Sync + 'static>),
}

impl Error for ViewDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ViewDataError::InvalidData(err) => Some(&**err),
        }
    }
}

impl fmt::Display for ViewDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ViewDataError::InvalidData(err) => write!(f, "invalid data for element type: {}", err),
        }
    }
}

/// An error creating a view into a mapped `.npy` file.
#[derive(Debug)]
#[non_exhaustive]
pub enum ViewNpyError {
    Io(io::Error),
    ParseHeader(ParseHeaderError),
    LengthOverflow,
    WrongDescriptor(TypeDescriptor),
    /// The stored endianness doesn't match the host's (and isn't `|`).
    NonNativeEndian,
    MissingBytes(usize),
    /// Some of the data is invalid for the element type (e.g. non-0/1
    /// bytes for `bool`).
    InvalidData(Box<dyn Error + Send + Sync + 'static>),
}

impl Error for ViewNpyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ViewNpyError::Io(err) => Some(err),
            ViewNpyError::ParseHeader(err) => Some(err),
            ViewNpyError::InvalidData(err) => Some(&**err),
            _ => None,
        }
    }
}

impl fmt::Display for ViewNpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ViewNpyError::Io(err) => write!(f, "I/O error: {}", err),
            ViewNpyError::ParseHeader(err) => write!(f, "error parsing header: {}", err),
            ViewNpyError::LengthOverflow => write!(f, "overflow computing length from shape"),
            ViewNpyError::WrongDescriptor(desc) => {
                write!(f, "incorrect descriptor ({}) for this type", desc.to_descr_string())
            }
            ViewNpyError::NonNativeEndian => write!(f, "descriptor does not match native endianness"),
            ViewNpyError::MissingBytes(n) => write!(f, "missing {} bytes of data specified in header", n),
            ViewNpyError::InvalidData(err) => write!(f, "invalid data for element type: {}", err),
        }
    }
}

impl From<ReadHeaderError> for ViewNpyError {
    fn from(err: ReadHeaderError) -> Self {
        match err {
            ReadHeaderError::Io(err) => ViewNpyError::Io(err),
            ReadHeaderError::Parse(err) => ViewNpyError::ParseHeader(err),
        }
    }
}

impl From<ReadDataError> for ViewNpyError {
    fn from(err: ReadDataError) -> Self {
        match err {
            ReadDataError::Io(err) => ViewNpyError::Io(err),
            ReadDataError::WrongDescriptor(desc) => ViewNpyError::WrongDescriptor(desc),
            // Neither of these can actually happen here: the fallback reads
            // exactly `byte_len` bytes out of the mapping before calling
            // `read_to_end_exact_vec`, so there's never a short read or
            // leftover trailing data to report.
            ReadDataError::MissingData => ViewNpyError::MissingBytes(0),
            ReadDataError::ExtraBytes(_) => ViewNpyError::MissingBytes(0),
            ReadDataError::ParseData(err) => ViewNpyError::InvalidData(err),
        }
    }
}

/// Outcome of [`load_no_copy`]: a zero-copy view when the payload happened
/// to be aligned for `T`, or an owned copy when the alignment fallback
/// described at [`load_no_copy`] kicked in.
#[derive(Debug)]
pub enum NoCopyLoad<'w, T> {
    Mapped(&'w [T]),
    Copied(Vec<T>),
}

impl<'w, T> NoCopyLoad<'w, T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            NoCopyLoad::Mapped(slice) => slice,
            NoCopyLoad::Copied(vec) => vec,
        }
    }

    /// Whether this load avoided copying the payload.
    pub fn is_mapped(&self) -> bool {
        matches!(self, NoCopyLoad::Mapped(_))
    }
}

/// Returns a view of a `.npy` array stored in `window` starting at the
/// cursor, advancing the cursor past the payload on success.
///
/// The view is zero-copy ([`NoCopyLoad::Mapped`]) whenever the payload's
/// byte offset happens to be aligned for `T`. When it isn't, this falls
/// back to a copying read ([`NoCopyLoad::Copied`]) rather than failing,
/// since alignment is a property of the file's header length and the
/// window's mapping offset, not something a caller can generally arrange
/// in advance; the fallback is signaled on stderr so the hazard isn't
/// silent.
pub fn load_no_copy<'w, T: ReadableElement>(
    window: &'w mut MappedWindow,
) -> Result<NoCopyLoad<'w, T>, ViewNpyError> {
    let header = Header::from_mapped(window)?;
    let expected = T::type_descriptor();
    if !header.descriptor.matches_kind_and_size(expected) {
        return Err(ViewNpyError::WrongDescriptor(header.descriptor));
    }
    if header.descriptor.endianness != Endianness::host()
        && header.descriptor.endianness != Endianness::NotApplicable
    {
        return Err(ViewNpyError::NonNativeEndian);
    }
    let len = checked_len(&header.shape, mem::size_of::<T>()).ok_or(ViewNpyError::LengthOverflow)?;
    let byte_len = len * header.descriptor.size_bytes;
    if byte_len > window.remaining() {
        return Err(ViewNpyError::MissingBytes(byte_len - window.remaining()));
    }
    let offset = window.position();
    if let Err(ViewDataError::InvalidData(err)) =
        T::validate_bytes(&window.as_bytes()[offset..offset + byte_len])
    {
        return Err(ViewNpyError::InvalidData(err));
    }
    match unsafe { window.view_at::<T>(offset, len) } {
        Ok(_) => {
            window.advance(byte_len).expect("byte_len already bounds-checked above");
            let view = unsafe { window.view_at::<T>(offset, len) }
                .expect("alignment already confirmed by the check above");
            Ok(NoCopyLoad::Mapped(view))
        }
        Err(MappedError::AlignmentHazard { offset, required }) => {
            eprintln!(
                "npy_format: warning: payload at byte offset {} is not aligned to the \
                 {}-byte boundary required for this element type; falling back to a \
                 copying load",
                offset, required
            );
            let bytes = window.read_exact(byte_len).map_err(|err| ViewNpyError::Io(err.into()))?;
            let data = T::read_to_end_exact_vec(bytes, header.descriptor, len)?;
            Ok(NoCopyLoad::Copied(data))
        }
        Err(other) => Err(ViewNpyError::Io(other.into())),
    }
}
