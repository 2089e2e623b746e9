//! `ElementDescriptor`/`WritableElement`/`ReadableElement` for the
//! fixed-width numeric primitives. Every bit pattern of these types is
//! valid, so [`ElementDescriptor::validate_bytes`] keeps its default.

use crate::descriptor::{Kind, TypeDescriptor};
use crate::endian::Endianness;
use crate::npy::elements::{bytes_into_vec, read_raw_bytes, write_raw_slice, ElementDescriptor};
use crate::npy::{ReadDataError, ReadableElement, WritableElement, WriteDataError};
use std::io;

macro_rules! impl_primitive {
    ($t:ty, $kind:expr, $size:expr, $endianness:expr) => {
        impl ElementDescriptor for $t {
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor { kind: $kind, size_bytes: $size, endianness: $endianness }
            }
        }

        impl WritableElement for $t {
            fn write_slice<W: io::Write>(slice: &[Self], writer: W) -> Result<(), WriteDataError> {
                write_raw_slice(slice, writer)
            }
        }

        impl ReadableElement for $t {
            fn read_to_end_exact_vec<R: io::Read>(
                reader: R,
                stored: TypeDescriptor,
                len: usize,
            ) -> Result<Vec<Self>, ReadDataError> {
                let buf = read_raw_bytes(reader, stored, Self::type_descriptor(), len, false)?;
                Ok(unsafe { bytes_into_vec(buf) })
            }
        }
    };
}

// Single-byte kinds are never byte-swapped, so they're always written `|`.
impl_primitive!(i8, Kind::Int, 1, Endianness::NotApplicable);
impl_primitive!(u8, Kind::Uint, 1, Endianness::NotApplicable);

impl_primitive!(i16, Kind::Int, 2, Endianness::host());
impl_primitive!(i32, Kind::Int, 4, Endianness::host());
impl_primitive!(i64, Kind::Int, 8, Endianness::host());
impl_primitive!(u16, Kind::Uint, 2, Endianness::host());
impl_primitive!(u32, Kind::Uint, 4, Endianness::host());
impl_primitive!(u64, Kind::Uint, 8, Endianness::host());
impl_primitive!(f32, Kind::Float, 4, Endianness::host());
impl_primitive!(f64, Kind::Float, 8, Endianness::host());
