//! Types and methods for (de)serializing the header of an `.npy` file
//! (format version 1.0 only — see the crate's non-goals).
//!
//! In most cases, users do not need this module, since they can use the
//! more convenient, higher-level functionality in [`crate::npy`] instead.

use crate::descriptor::{ParseDescriptorError, TypeDescriptor};
use crate::mapped::{MappedError, MappedWindow};
use byteorder::{ByteOrder, LittleEndian};
use py_literal::{
    FormatError as PyValueFormatError, ParseError as PyValueParseError, Value as PyValue,
};
use std::convert::TryFrom;
use std::error::Error;
use std::fmt;
use std::io;

/// Magic string that begins every `.npy` file.
const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// Version 1.0 is the only version this crate writes or accepts (see the
/// non-goals: format versions 2.0/3.0 with long headers are out of scope).
const VERSION: [u8; 2] = [0x01, 0x00];

/// The total preamble (magic + version + `HEADER_LEN`) is always this many
/// bytes for version 1.0.
const PREAMBLE_LEN: usize = MAGIC_STRING.len() + VERSION.len() + 2;

/// The combined preamble + property string length must be a multiple of
/// this value.
const HEADER_DIVISOR: usize = 16;

/// Error parsing an `.npy` header.
#[derive(Debug)]
pub enum ParseHeaderError {
    /// The first six bytes are not the expected magic string.
    MagicString,
    /// The version number is not the supported `1.0`.
    Version { major: u8, minor: u8 },
    /// The array format string contains non-ASCII characters.
    NonAscii,
    /// The Python dictionary in the header is missing an expected key.
    MissingKey(&'static str),
    /// The value for a key has the wrong type or is otherwise illegal.
    IllegalValue { key: &'static str, value: PyValue },
    /// `fortran_order` is `True`; Fortran-order arrays are not supported.
    FortranOrderUnsupported,
    /// The `descr` string failed to parse as a type descriptor.
    Descriptor(ParseDescriptorError),
    /// Error parsing the dictionary text itself.
    DictParse(PyValueParseError),
    /// The header's metadata value is not a dictionary.
    MetaNotDict(PyValue),
    /// There is no newline at the end of the header.
    MissingNewline,
}

impl Error for ParseHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseHeaderError::DictParse(err) => Some(err),
            ParseHeaderError::Descriptor(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ParseHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ParseHeaderError::*;
        match self {
            MagicString => write!(f, "start does not match magic string"),
            Version { major, minor } => write!(f, "unsupported version: {}.{}", major, minor),
            NonAscii => write!(f, "non-ascii in array format string"),
            MissingKey(key) => write!(f, "missing key: {}", key),
            IllegalValue { key, value } => write!(f, "illegal value for key {}: {}", key, value),
            FortranOrderUnsupported => write!(f, "fortran_order=True is not supported"),
            Descriptor(err) => write!(f, "error parsing descr: {}", err),
            DictParse(err) => write!(f, "error parsing metadata dict: {}", err),
            MetaNotDict(value) => write!(f, "metadata is not a dict: {}", value),
            MissingNewline => write!(f, "newline missing at end of header"),
        }
    }
}

impl From<PyValueParseError> for ParseHeaderError {
    fn from(err: PyValueParseError) -> Self {
        ParseHeaderError::DictParse(err)
    }
}

impl From<ParseDescriptorError> for ParseHeaderError {
    fn from(err: ParseDescriptorError) -> Self {
        ParseHeaderError::Descriptor(err)
    }
}

/// Error reading an `.npy` header from an I/O stream.
#[derive(Debug)]
pub enum ReadHeaderError {
    Io(io::Error),
    Parse(ParseHeaderError),
}

impl Error for ReadHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadHeaderError::Io(err) => Some(err),
            ReadHeaderError::Parse(err) => Some(err),
        }
    }
}

impl fmt::Display for ReadHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadHeaderError::Io(err) => write!(f, "I/O error: {}", err),
            ReadHeaderError::Parse(err) => write!(f, "error parsing header: {}", err),
        }
    }
}

impl From<io::Error> for ReadHeaderError {
    fn from(err: io::Error) -> Self {
        ReadHeaderError::Io(err)
    }
}

impl From<ParseHeaderError> for ReadHeaderError {
    fn from(err: ParseHeaderError) -> Self {
        ReadHeaderError::Parse(err)
    }
}

impl From<MappedError> for ReadHeaderError {
    fn from(err: MappedError) -> Self {
        ReadHeaderError::Io(err.into())
    }
}

/// Error formatting an `.npy` header.
#[derive(Debug)]
pub enum FormatHeaderError {
    PyValue(PyValueFormatError),
    /// The total header length overflows `usize`, or `HEADER_LEN` exceeds
    /// the maximum value representable in the version 1.0 `u16` field.
    HeaderTooLong,
}

impl Error for FormatHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FormatHeaderError::PyValue(err) => Some(err),
            FormatHeaderError::HeaderTooLong => None,
        }
    }
}

impl fmt::Display for FormatHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatHeaderError::PyValue(err) => write!(f, "error formatting python value: {}", err),
            FormatHeaderError::HeaderTooLong => write!(f, "the header is too long"),
        }
    }
}

impl From<PyValueFormatError> for FormatHeaderError {
    fn from(err: PyValueFormatError) -> Self {
        FormatHeaderError::PyValue(err)
    }
}

/// Error writing an `.npy` header.
#[derive(Debug)]
pub enum WriteHeaderError {
    Io(io::Error),
    Format(FormatHeaderError),
}

impl Error for WriteHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriteHeaderError::Io(err) => Some(err),
            WriteHeaderError::Format(err) => Some(err),
        }
    }
}

impl fmt::Display for WriteHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WriteHeaderError::Io(err) => write!(f, "I/O error: {}", err),
            WriteHeaderError::Format(err) => write!(f, "error formatting header: {}", err),
        }
    }
}

impl From<io::Error> for WriteHeaderError {
    fn from(err: io::Error) -> Self {
        WriteHeaderError::Io(err)
    }
}

impl From<FormatHeaderError> for WriteHeaderError {
    fn from(err: FormatHeaderError) -> Self {
        WriteHeaderError::Format(err)
    }
}

/// Header of an `.npy` file (version 1.0).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Header {
    pub descriptor: TypeDescriptor,
    /// Always `false` on write. Reading `true` is a [`ParseHeaderError::FortranOrderUnsupported`].
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl Header
where
    Header: Sized,
{
    fn from_py_value(value: PyValue) -> Result<Header, ParseHeaderError> {
        let dict = match value {
            PyValue::Dict(dict) => dict,
            other => return Err(ParseHeaderError::MetaNotDict(other)),
        };
        let mut descr: Option<TypeDescriptor> = None;
        let mut fortran_order: Option<bool> = None;
        let mut shape: Option<Vec<usize>> = None;
        for (key, value) in dict {
            match key {
                PyValue::String(ref k) if k == "descr" => match value {
                    PyValue::String(ref s) => {
                        descr = Some(TypeDescriptor::from_descr_string(s)?);
                    }
                    other => {
                        return Err(ParseHeaderError::IllegalValue { key: "descr", value: other })
                    }
                },
                PyValue::String(ref k) if k == "fortran_order" => match value {
                    PyValue::Boolean(b) => fortran_order = Some(b),
                    other => {
                        return Err(ParseHeaderError::IllegalValue {
                            key: "fortran_order",
                            value: other,
                        })
                    }
                },
                PyValue::String(ref k) if k == "shape" => match &value {
                    PyValue::Tuple(elems) | PyValue::List(elems) => {
                        let mut dims = Vec::with_capacity(elems.len());
                        let mut ok = true;
                        for elem in elems {
                            match elem {
                                PyValue::Integer(n) if *n >= 0 => dims.push(*n as usize),
                                _ => {
                                    ok = false;
                                    break;
                                }
                            }
                        }
                        if ok {
                            shape = Some(dims);
                        } else {
                            return Err(ParseHeaderError::IllegalValue { key: "shape", value });
                        }
                    }
                    _ => return Err(ParseHeaderError::IllegalValue { key: "shape", value }),
                },
                _ => {}
            }
        }
        let descriptor = descr.ok_or(ParseHeaderError::MissingKey("descr"))?;
        let fortran_order = fortran_order.ok_or(ParseHeaderError::MissingKey("fortran_order"))?;
        let shape = shape.ok_or(ParseHeaderError::MissingKey("shape"))?;
        if fortran_order {
            return Err(ParseHeaderError::FortranOrderUnsupported);
        }
        Ok(Header { descriptor, fortran_order, shape })
    }

    fn to_py_value(&self) -> PyValue {
        PyValue::Dict(vec![
            (
                PyValue::String("descr".into()),
                PyValue::String(self.descriptor.to_descr_string()),
            ),
            (
                PyValue::String("fortran_order".into()),
                PyValue::Boolean(self.fortran_order),
            ),
            (
                PyValue::String("shape".into()),
                PyValue::Tuple(self.shape.iter().map(|&n| PyValue::Integer(n as i64)).collect()),
            ),
        ])
    }

    /// Parses a header from the start of an I/O reader, leaving the cursor
    /// immediately after the header's trailing newline.
    pub fn from_reader<R: io::Read>(reader: &mut R) -> Result<Header, ReadHeaderError> {
        let mut magic = [0u8; MAGIC_STRING.len()];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC_STRING {
            return Err(ParseHeaderError::MagicString.into());
        }
        let mut version = [0u8; 2];
        reader.read_exact(&mut version)?;
        if version != VERSION {
            return Err(ParseHeaderError::Version { major: version[0], minor: version[1] }.into());
        }
        let mut header_len_bytes = [0u8; 2];
        reader.read_exact(&mut header_len_bytes)?;
        let header_len = usize::from(LittleEndian::read_u16(&header_len_bytes));

        let mut buf = vec![0u8; header_len];
        reader.read_exact(&mut buf)?;
        Self::parse_property_string(&buf)
    }

    /// Parses a header out of a [`MappedWindow`], advancing its cursor past
    /// the magic string, version, length prefix, and property string
    /// (including its trailing newline). This is the mapped-window
    /// counterpart of [`Header::from_reader`], used by the zero-copy load
    /// path.
    pub fn from_mapped(window: &mut MappedWindow) -> Result<Header, ReadHeaderError> {
        let magic = window.read_exact(MAGIC_STRING.len())?;
        if magic != MAGIC_STRING {
            return Err(ParseHeaderError::MagicString.into());
        }
        let version = window.read_exact(2)?;
        if version != VERSION {
            return Err(
                ParseHeaderError::Version { major: version[0], minor: version[1] }.into()
            );
        }
        let header_len_bytes = window.read_exact(2)?;
        let header_len = usize::from(LittleEndian::read_u16(header_len_bytes));
        let buf = window.read_exact(header_len)?.to_vec();
        Ok(Self::parse_property_string(&buf)?)
    }

    fn parse_property_string(buf: &[u8]) -> Result<Header, ParseHeaderError> {
        let without_newline = match buf.split_last() {
            Some((&b'\n', rest)) => rest,
            _ => return Err(ParseHeaderError::MissingNewline),
        };
        if !without_newline.is_ascii() {
            return Err(ParseHeaderError::NonAscii);
        }
        // ASCII is always valid UTF-8.
        let header_str = unsafe { std::str::from_utf8_unchecked(without_newline) };
        let value: PyValue = header_str.parse()?;
        Header::from_py_value(value)
    }

    /// Returns the serialized representation of the header, padded so that
    /// `10 + property_string_len` is a multiple of 16 and terminated by a
    /// single newline.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatHeaderError> {
        let mut arr_format = Vec::new();
        self.to_py_value().write_ascii(&mut arr_format)?;

        let unpadded_total_len = PREAMBLE_LEN
            .checked_add(arr_format.len())
            .and_then(|n| n.checked_add(1))
            .ok_or(FormatHeaderError::HeaderTooLong)?;
        let padding_len = HEADER_DIVISOR - unpadded_total_len % HEADER_DIVISOR;
        let total_len = unpadded_total_len
            .checked_add(padding_len)
            .ok_or(FormatHeaderError::HeaderTooLong)?;
        let header_len = total_len - PREAMBLE_LEN;
        let header_len_u16 = u16::try_from(header_len).map_err(|_| FormatHeaderError::HeaderTooLong)?;

        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(MAGIC_STRING);
        out.extend_from_slice(&VERSION);
        let mut len_bytes = [0u8; 2];
        LittleEndian::write_u16(&mut len_bytes, header_len_u16);
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(&arr_format);
        out.resize(total_len - 1, b' ');
        out.push(b'\n');

        debug_assert_eq!(out.len(), total_len);
        debug_assert_eq!(out.len() % HEADER_DIVISOR, 0);
        Ok(out)
    }

    /// Writes the serialized header to `writer`.
    pub fn write<W: io::Write>(&self, mut writer: W) -> Result<(), WriteHeaderError> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Total on-disk byte length of this header (preamble + property
    /// string + padding + newline). Used by the append protocol to decide
    /// whether a rewritten header fits in the space of the old one.
    pub fn byte_len(&self) -> Result<usize, FormatHeaderError> {
        Ok(self.to_bytes()?.len())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_py_value())
    }
}
