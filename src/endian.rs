//! Runtime host-endianness detection and elementwise byte swapping.
//!
//! Grounded in `detail::IsBigEndian` in
//! `examples/original_source/Npy++/Npy++.cpp`, which detects host order at
//! runtime from the layout of a known 32-bit pattern rather than trusting a
//! compile-time flag. The Rust translation uses `to_ne_bytes` for the same
//! inspection instead of a `union`.

/// Byte order of a stored `.npy`/`.npz` element, as recorded in a `descr`
/// string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Endianness {
    Little,
    Big,
    /// `|`: not applicable (single-byte kinds).
    NotApplicable,
}

impl Endianness {
    /// The character used for this endianness in a `descr` string.
    pub fn to_char(self) -> char {
        match self {
            Endianness::Little => '<',
            Endianness::Big => '>',
            Endianness::NotApplicable => '|',
        }
    }

    /// Parses one of `<`, `>`, `|`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Endianness::Little),
            '>' => Some(Endianness::Big),
            '|' => Some(Endianness::NotApplicable),
            _ => None,
        }
    }

    /// The endianness of the host this code is running on.
    pub fn host() -> Self {
        if host_is_big_endian() {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Returns `true` iff the host is big-endian, determined at runtime from
/// the byte layout of a known pattern (rather than `cfg!(target_endian)`).
pub fn host_is_big_endian() -> bool {
    let probe: u32 = 0x0102_0304;
    probe.to_ne_bytes()[0] == 1
}

/// Reverses each `word_size`-byte chunk of `buf` in place.
///
/// `buf.len()` must be a multiple of `word_size`; `word_size` of 1 is a
/// no-op (single-byte kinds never swap).
pub fn swap_elements(buf: &mut [u8], word_size: usize) {
    debug_assert_eq!(buf.len() % word_size, 0);
    if word_size <= 1 {
        return;
    }
    for chunk in buf.chunks_exact_mut(word_size) {
        chunk.reverse();
    }
}

/// Reverses each half of each `element_size`-byte complex element in place.
///
/// A complex element's size is `2 * sizeof(real part)`; the swap reverses
/// each half (the real part, then the imaginary part) independently rather
/// than reversing the whole element, since the two halves are each
/// independently-encoded floats.
pub fn swap_complex_elements(buf: &mut [u8], element_size: usize) {
    debug_assert_eq!(buf.len() % element_size, 0);
    debug_assert_eq!(element_size % 2, 0);
    let half = element_size / 2;
    for chunk in buf.chunks_exact_mut(element_size) {
        chunk[..half].reverse();
        chunk[half..].reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_u16_words() {
        let mut buf = vec![0x01, 0x02, 0x03, 0x04];
        swap_elements(&mut buf, 2);
        assert_eq!(buf, vec![0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn swap_single_byte_is_noop() {
        let mut buf = vec![0x01, 0x02, 0x03];
        swap_elements(&mut buf, 1);
        assert_eq!(buf, vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn swap_complex_swaps_halves_independently() {
        // Two f32 halves (4 bytes each) forming one 8-byte complex element.
        let mut buf = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        swap_complex_elements(&mut buf, 8);
        assert_eq!(buf, vec![0x04, 0x03, 0x02, 0x01, 0x08, 0x07, 0x06, 0x05]);
    }

    #[test]
    fn endianness_round_trips_through_char() {
        for e in [Endianness::Little, Endianness::Big, Endianness::NotApplicable] {
            assert_eq!(Endianness::from_char(e.to_char()), Some(e));
        }
    }
}
