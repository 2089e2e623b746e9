//! The `(kind, size, endianness)` type descriptor and its textual `descr`
//! encoding.
//!
//! Grounded in `detail::ParseDescription`/`Traits<T>` in
//! `examples/original_source/Npy++/Npy++.h`, which maps each element type
//! to a one-character kind code and a byte size; this module turns that
//! implicit per-type specialization into a runtime-checked value, per the
//! "Type dispatch" note in the design notes: the mapping is a 5-way switch
//! on kind, so there's no need for compile-time specialization.

use crate::endian::Endianness;
use std::fmt;

/// NumPy's single-character element-kind codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
    /// `f`: floating point.
    Float,
    /// `i`: signed integer (includes plain byte).
    Int,
    /// `u`: unsigned integer.
    Uint,
    /// `b`: boolean.
    Bool,
    /// `c`: complex floating point.
    Complex,
}

impl Kind {
    fn to_char(self) -> char {
        match self {
            Kind::Float => 'f',
            Kind::Int => 'i',
            Kind::Uint => 'u',
            Kind::Bool => 'b',
            Kind::Complex => 'c',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'f' => Some(Kind::Float),
            'i' => Some(Kind::Int),
            'u' => Some(Kind::Uint),
            'b' => Some(Kind::Bool),
            'c' => Some(Kind::Complex),
            _ => None,
        }
    }
}

/// A parsed `descr` value: `(endianness, kind, size_bytes)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TypeDescriptor {
    pub kind: Kind,
    pub size_bytes: usize,
    pub endianness: Endianness,
}

/// Error parsing a `descr` string such as `"<f8"`.
#[derive(Debug)]
pub enum ParseDescriptorError {
    /// The string is too short to contain an endianness, kind, and size.
    TooShort,
    /// The first character is not one of `<`, `>`, `|`.
    UnknownEndianness(char),
    /// The second character is not one of `f`, `i`, `u`, `b`, `c`.
    UnknownKind(char),
    /// The trailing size digits don't parse as a positive integer.
    InvalidSize(String),
}

impl fmt::Display for ParseDescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseDescriptorError::TooShort => write!(f, "descr string too short"),
            ParseDescriptorError::UnknownEndianness(c) => {
                write!(f, "unknown endianness character: {:?}", c)
            }
            ParseDescriptorError::UnknownKind(c) => write!(f, "unknown kind character: {:?}", c),
            ParseDescriptorError::InvalidSize(s) => write!(f, "invalid size field: {:?}", s),
        }
    }
}

impl std::error::Error for ParseDescriptorError {}

impl TypeDescriptor {
    /// Renders as the three-part `descr` string, e.g. `"<f8"`.
    pub fn to_descr_string(self) -> String {
        format!("{}{}{}", self.endianness.to_char(), self.kind.to_char(), self.size_bytes)
    }

    /// Parses a `descr` string such as `"<f8"` or `"|b1"`.
    pub fn from_descr_string(s: &str) -> Result<Self, ParseDescriptorError> {
        let mut chars = s.chars();
        let e = chars.next().ok_or(ParseDescriptorError::TooShort)?;
        let k = chars.next().ok_or(ParseDescriptorError::TooShort)?;
        let rest: String = chars.collect();
        if rest.is_empty() {
            return Err(ParseDescriptorError::TooShort);
        }
        let endianness =
            Endianness::from_char(e).ok_or(ParseDescriptorError::UnknownEndianness(e))?;
        let kind = Kind::from_char(k).ok_or(ParseDescriptorError::UnknownKind(k))?;
        let size_bytes = rest
            .parse::<usize>()
            .map_err(|_| ParseDescriptorError::InvalidSize(rest))?;
        Ok(TypeDescriptor { kind, size_bytes, endianness })
    }

    /// Returns `true` iff `self` has the same `kind` and `size_bytes` as
    /// `expected`; endianness is deliberately ignored (that's handled
    /// separately by the endianness bridge during read, and is irrelevant
    /// on write since the writer always chooses its own encoding).
    pub fn matches_kind_and_size(self, expected: TypeDescriptor) -> bool {
        self.kind == expected.kind && self.size_bytes == expected.size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_descr_string() {
        let d = TypeDescriptor { kind: Kind::Float, size_bytes: 8, endianness: Endianness::Little };
        assert_eq!(d.to_descr_string(), "<f8");
        assert_eq!(TypeDescriptor::from_descr_string("<f8").unwrap(), d);
    }

    #[test]
    fn single_byte_kinds_use_not_applicable() {
        let d = TypeDescriptor { kind: Kind::Uint, size_bytes: 1, endianness: Endianness::NotApplicable };
        assert_eq!(d.to_descr_string(), "|u1");
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(TypeDescriptor::from_descr_string("").is_err());
        assert!(TypeDescriptor::from_descr_string("<").is_err());
        assert!(TypeDescriptor::from_descr_string("<f").is_err());
        assert!(TypeDescriptor::from_descr_string("<x8").is_err());
        assert!(TypeDescriptor::from_descr_string("?f8").is_err());
    }
}
