//! `ElementDescriptor`/`WritableElement`/`ReadableElement` for `bool`.
//!
//! Rust guarantees `bool` is one byte wide, with `false` as `0x00` and
//! `true` as `0x01`; every other byte value is an invalid bit pattern, so
//! unlike the numeric primitives this type overrides
//! [`ElementDescriptor::validate_bytes`].

use crate::descriptor::{Kind, TypeDescriptor};
use crate::endian::Endianness;
use crate::npy::elements::{bytes_into_vec, read_raw_bytes, write_raw_slice, ElementDescriptor};
use crate::npy::{ReadDataError, ReadableElement, ViewDataError, WritableElement, WriteDataError};
use std::error::Error;
use std::fmt;
use std::io;

/// A byte other than `0x00`/`0x01` where a `bool` was expected.
#[derive(Debug)]
pub struct InvalidBoolByte {
    pub bad_value: u8,
}

impl Error for InvalidBoolByte {}

impl fmt::Display for InvalidBoolByte {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#04x} is not a valid bool byte", self.bad_value)
    }
}

fn check_valid_for_bool(bytes: &[u8]) -> Result<(), InvalidBoolByte> {
    match bytes.iter().find(|&&b| b > 1) {
        Some(&bad_value) => Err(InvalidBoolByte { bad_value }),
        None => Ok(()),
    }
}

impl ElementDescriptor for bool {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor { kind: Kind::Bool, size_bytes: 1, endianness: Endianness::NotApplicable }
    }

    fn validate_bytes(bytes: &[u8]) -> Result<(), ViewDataError> {
        check_valid_for_bool(bytes).map_err(|err| ViewDataError::InvalidData(Box::new(err)))
    }
}

impl WritableElement for bool {
    fn write_slice<W: io::Write>(slice: &[Self], writer: W) -> Result<(), WriteDataError> {
        write_raw_slice(slice, writer)
    }
}

impl ReadableElement for bool {
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        stored: TypeDescriptor,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        let buf = read_raw_bytes(reader, stored, Self::type_descriptor(), len, false)?;
        check_valid_for_bool(&buf).map_err(|err| ReadDataError::ParseData(Box::new(err)))?;
        Ok(unsafe { bytes_into_vec(buf) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_true_and_false() {
        let values = vec![true, false, true, true];
        let mut buf = Vec::new();
        bool::write_slice(&values, &mut buf).unwrap();
        let read_back =
            bool::read_to_end_exact_vec(&buf[..], bool::type_descriptor(), values.len()).unwrap();
        assert_eq!(read_back, values);
    }

    #[test]
    fn rejects_invalid_byte() {
        let buf = vec![0x00, 0x02];
        assert!(matches!(
            bool::read_to_end_exact_vec(&buf[..], bool::type_descriptor(), 2),
            Err(ReadDataError::ParseData(_))
        ));
    }
}
