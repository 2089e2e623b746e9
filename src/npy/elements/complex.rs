//! `ElementDescriptor`/`WritableElement`/`ReadableElement` for
//! `num_complex::Complex<f32>`/`Complex<f64>`.
//!
//! `Complex<T>` is `repr(C)` with two fields of type `T`, so its raw bytes
//! are just the real part followed by the imaginary part; byte-swapping a
//! mismatched-endianness complex element means swapping each half
//! independently rather than reversing the whole element, which is exactly
//! what [`crate::endian::swap_complex_elements`] does.

use crate::descriptor::{Kind, TypeDescriptor};
use crate::endian::Endianness;
use crate::npy::elements::{bytes_into_vec, read_raw_bytes, write_raw_slice, ElementDescriptor};
use crate::npy::{ReadDataError, ReadableElement, WritableElement, WriteDataError};
use num_complex::Complex;
use std::io;
use std::mem;

macro_rules! impl_complex {
    ($t:ty, $size:expr) => {
        impl ElementDescriptor for Complex<$t> {
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor { kind: Kind::Complex, size_bytes: $size, endianness: Endianness::host() }
            }
        }

        impl WritableElement for Complex<$t> {
            fn write_slice<W: io::Write>(slice: &[Self], writer: W) -> Result<(), WriteDataError> {
                write_raw_slice(slice, writer)
            }
        }

        impl ReadableElement for Complex<$t> {
            fn read_to_end_exact_vec<R: io::Read>(
                reader: R,
                stored: TypeDescriptor,
                len: usize,
            ) -> Result<Vec<Self>, ReadDataError> {
                let buf = read_raw_bytes(reader, stored, Self::type_descriptor(), len, true)?;
                Ok(unsafe { bytes_into_vec(buf) })
            }
        }
    };
}

// `$size` is `2 * sizeof(component)`, the element size the descriptor and
// the endianness bridge both key their swap width on.
impl_complex!(f32, mem::size_of::<f32>() * 2);
impl_complex!(f64, mem::size_of::<f64>() * 2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_size_is_twice_the_component() {
        assert_eq!(Complex::<f64>::type_descriptor().size_bytes, 16);
        assert_eq!(Complex::<f32>::type_descriptor().size_bytes, 8);
    }

    #[test]
    fn round_trips_through_bytes() {
        let values = vec![Complex::new(1.0, -2.0), Complex::new(3.5, 4.5)];
        let mut buf = Vec::new();
        Complex::<f64>::write_slice(&values, &mut buf).unwrap();
        let read_back =
            Complex::<f64>::read_to_end_exact_vec(&buf[..], Complex::<f64>::type_descriptor(), 2)
                .unwrap();
        assert_eq!(read_back, values);
    }
}
