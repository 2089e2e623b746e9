//! Reading and writing NumPy's on-disk array formats — the single-array
//! `.npy` format (version 1.0) and the multi-array ZIP-wrapped `.npz`
//! format — without depending on NumPy or Python.
//!
//! # `.npy` files
//!
//! - Reading: [`load`], [`load_full`], [`read_full`]
//! - Writing: [`save`] (with [`SaveMode::Write`] or [`SaveMode::Append`])
//! - Memory-mapped I/O: [`save_mapped`], [`load_full_mapped`], [`load_no_copy`]
//!
//! # `.npz` files
//!
//! - Reading: [`load_compressed`], [`load_compressed_full`],
//!   [`load_compressed_named`], [`load_compressed_full_named`], or the
//!   lower-level [`NpzReader`]
//! - Writing: [`save_compressed`], or the lower-level [`NpzWriter`]
//!
//! # Limitations
//!
//! * Only format version 1.0 headers are read or written; versions 2.0/3.0
//!   (long headers) are out of scope.
//! * `fortran_order = True` arrays are rejected on read and never produced
//!   on write.
//! * The element traits ([`WritableElement`], [`ReadableElement`],
//!   [`ElementDescriptor`]) are implemented for fixed-size integers up to
//!   64 bits, `f32`/`f64`, `Complex<f32>`/`Complex<f64>`, and `bool`.
//! * `.npz` archives larger than 4 GiB (ZIP64) are not supported.

mod bytes;
mod descriptor;
mod endian;
mod header;
mod mapped;
mod npy;
mod npz;
mod shapes;

pub use crate::descriptor::{Kind, ParseDescriptorError, TypeDescriptor};
pub use crate::endian::Endianness;
pub use crate::header::{FormatHeaderError, Header, ParseHeaderError, ReadHeaderError, WriteHeaderError};
pub use crate::mapped::{AccessMode, CacheHint, MappedError, MappedWindow};
pub use crate::shapes::{Matrix, MultiDimArray, ShapeMismatch, Tensor, Vector};

pub use crate::npy::{
    append, load, load_full, load_full_mapped, load_no_copy, read_full, save, save_mapped,
    ElementDescriptor, NoCopyLoad, ReadDataError, ReadNpyError, ReadableElement, SaveMode,
    ViewDataError, ViewNpyError, WritableElement, WriteDataError, WriteNpyError,
};
pub use crate::npz::{
    load_compressed, load_compressed_full, load_compressed_full_named, load_compressed_named,
    save_compressed, CorruptArchive, NpzReader, NpzWriter, ReadNpzError, WriteNpzError,
};
