//! Per-type plumbing for the `.npy` read/write/view engine.
//!
//! Every element type this crate supports implements [`ElementDescriptor`]
//! (its `(kind, size, endianness)` and, for types like `bool` where not
//! every bit pattern is valid, a validity check), plus whichever of
//! [`WritableElement`]/[`ReadableElement`] its direction needs. The
//! byte-swapping and casting logic lives once in this module, shared by
//! every type via the helpers below; `bool_impl.rs`, `primitive.rs`, and
//! `complex.rs` just wire up the per-type constants.

use crate::descriptor::TypeDescriptor;
use crate::endian::{swap_complex_elements, swap_elements, Endianness};
use crate::npy::{ReadDataError, ViewDataError, WriteDataError};
use std::io::{self, Read, Write};
use std::mem;

mod bool_impl;
mod complex;
mod primitive;

/// An element type whose on-disk descriptor and bit-validity this crate
/// knows how to check.
pub trait ElementDescriptor: Sized {
    /// The descriptor this crate writes for `Self`.
    fn type_descriptor() -> TypeDescriptor;

    /// Checks that `bytes` (already known to be the right length for some
    /// number of `Self` elements) holds only valid bit patterns.
    ///
    /// The default accepts anything, which is correct for every numeric
    /// type supported here; `bool` is the one override.
    fn validate_bytes(_bytes: &[u8]) -> Result<(), ViewDataError> {
        Ok(())
    }
}

/// An element type that can be written to an `.npy` or `.npz` file.
pub trait WritableElement: ElementDescriptor {
    fn write_slice<W: io::Write>(slice: &[Self], writer: W) -> Result<(), WriteDataError>;
}

/// An element type that can be read from an `.npy` or `.npz` file.
pub trait ReadableElement: ElementDescriptor {
    /// Reads to the end of `reader`, producing a `Vec` of length `len`.
    ///
    /// Fails if `stored` doesn't match `Self`'s kind and size, if `reader`
    /// runs out before `len` elements are read, or if bytes remain after
    /// the `len`th element.
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        stored: TypeDescriptor,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError>;
}

/// Writes `slice` as raw bytes, in the host's native layout.
///
/// # Safety requirement on callers
///
/// `T` must have no padding, and every bit pattern reachable from `slice`
/// must already be valid for `T` (true for the fixed-width numeric types
/// and for `bool`, since this crate only ever constructs `bool` slices
/// from validated bytes).
pub(super) fn write_raw_slice<T, W: Write>(slice: &[T], mut writer: W) -> Result<(), WriteDataError> {
    let bytes =
        unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, mem::size_of_val(slice)) };
    writer.write_all(bytes)?;
    Ok(())
}

/// Reads `len` elements' worth of raw bytes, checks there's nothing left
/// over, and byte-swaps in place if `stored`'s endianness disagrees with
/// the host's.
pub(super) fn read_raw_bytes<R: Read>(
    mut reader: R,
    stored: TypeDescriptor,
    expected: TypeDescriptor,
    len: usize,
    is_complex: bool,
) -> Result<Vec<u8>, ReadDataError> {
    if !stored.matches_kind_and_size(expected) {
        return Err(ReadDataError::WrongDescriptor(stored));
    }
    let byte_len = len
        .checked_mul(expected.size_bytes)
        .expect("length was already checked against isize::MAX by the caller");
    let mut buf = vec![0u8; byte_len];
    reader.read_exact(&mut buf)?;
    let mut trailing = Vec::new();
    reader.read_to_end(&mut trailing)?;
    if !trailing.is_empty() {
        return Err(ReadDataError::ExtraBytes(trailing.len()));
    }
    if stored.endianness != Endianness::host() && stored.endianness != Endianness::NotApplicable {
        if is_complex {
            swap_complex_elements(&mut buf, expected.size_bytes);
        } else {
            swap_elements(&mut buf, expected.size_bytes);
        }
    }
    Ok(buf)
}

/// Reinterprets a byte buffer produced by [`read_raw_bytes`] as a `Vec<T>`,
/// reusing its allocation.
///
/// # Safety
///
/// `buf.len()` must be a multiple of `size_of::<T>()`, `buf` must have been
/// allocated with `vec![0u8; n]` (so capacity equals length), and every
/// element-sized chunk of `buf` must already be a valid `T` (checked via
/// [`ElementDescriptor::validate_bytes`] where not trivially true).
pub(super) unsafe fn bytes_into_vec<T>(buf: Vec<u8>) -> Vec<T> {
    let elem_size = mem::size_of::<T>();
    debug_assert_eq!(buf.len() % elem_size, 0);
    let len = buf.len() / elem_size;
    let ptr = buf.as_ptr() as *mut T;
    mem::forget(buf);
    Vec::from_raw_parts(ptr, len, len)
}
