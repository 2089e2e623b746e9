//! Round-trip equality and header-padding invariants for `.npy` files.

use npy_format::{save, Header, SaveMode};
use tempfile::NamedTempFile;

#[test]
fn writes_f8_shape_2x2_with_expected_header_and_payload() {
    let f = NamedTempFile::new().unwrap();
    save(f.path(), &[1.0f64, 2.0, 3.0, 4.0], &[2, 2], SaveMode::Write).unwrap();

    let bytes = std::fs::read(f.path()).unwrap();
    assert_eq!(&bytes[..6], b"\x93NUMPY");
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let header_str = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
    assert!(header_str.contains("'descr': '<f8'"));
    assert!(header_str.contains("(2, 2"));
    assert_eq!((10 + header_len) % 16, 0);
    assert_eq!(bytes[10 + header_len - 1], b'\n');

    let payload = &bytes[10 + header_len..];
    assert_eq!(payload.len(), 32);

    let loaded = npy_format::load_full::<_, f64>(f.path()).unwrap();
    assert_eq!(loaded.shape(), &[2, 2]);
    assert_eq!(loaded.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn round_trip_preserves_data_and_shape_for_every_native_dtype() {
    fn check<T>(values: &[T], shape: &[usize])
    where
        T: Copy + PartialEq + std::fmt::Debug + npy_format::WritableElement + npy_format::ReadableElement,
    {
        let f = NamedTempFile::new().unwrap();
        save(f.path(), values, shape, SaveMode::Write).unwrap();
        let loaded = npy_format::load_full::<_, T>(f.path()).unwrap();
        assert_eq!(loaded.shape(), shape);
        assert_eq!(loaded.as_slice(), values);
    }

    check(&[1i32, -2, 3, 4, -5, 6], &[2, 3]);
    check(&[1u8, 2, 3, 255], &[4]);
    check(&[1.5f32, -2.25, 3.125], &[3]);
    check(&[true, false, true], &[3]);
}

#[test]
fn header_bytes_always_pad_to_a_multiple_of_16() {
    for shape in [vec![0], vec![1], vec![9], vec![10], vec![99], vec![100], vec![12345]] {
        let header = Header {
            descriptor: npy_format::TypeDescriptor {
                kind: npy_format::Kind::Float,
                size_bytes: 8,
                endianness: npy_format::Endianness::host(),
            },
            fortran_order: false,
            shape,
        };
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len() % 16, 0);
        assert_eq!(*bytes.last().unwrap(), b'\n');
    }
}
