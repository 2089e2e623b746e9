//! `.npz` round trips, including a hand-built member whose header declares
//! big-endian storage to exercise cross-endianness conversion on read.

use npy_format::{load_compressed_full, save_compressed, Endianness, Header, Kind, NpzReader, SaveMode, TypeDescriptor};
use num_complex::Complex;
use std::io::{Cursor, Write};

#[test]
fn npz_holds_two_complex128_arrays_under_their_own_names() {
    let f = tempfile::NamedTempFile::new().unwrap();
    let shape = [32usize, 64, 128];
    let len = shape.iter().product();
    let arr1: Vec<Complex<f64>> = (0..len).map(|i| Complex::new(i as f64, -(i as f64))).collect();
    let arr2: Vec<Complex<f64>> = (0..len).map(|i| Complex::new(-(i as f64), i as f64)).collect();

    save_compressed(f.path(), "arr1", &arr1, &shape, SaveMode::Write).unwrap();
    save_compressed(f.path(), "arr2", &arr2, &shape, SaveMode::Append).unwrap();

    let all = load_compressed_full::<_, Complex<f64>>(f.path()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["arr1"].shape(), &shape);
    assert_eq!(all["arr1"].as_slice(), &arr1[..]);
    assert_eq!(all["arr2"].as_slice(), &arr2[..]);
}

const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;
const EOCD_SIGNATURE: u32 = 0x0605_4b50;

/// Builds a single-member, stored-method `.npz` archive by hand whose `.npy`
/// header declares big-endian `u2` storage, regardless of this host's
/// endianness, so the read path's byte-swap conversion can be exercised.
fn build_foreign_endian_archive(name: &str, values: &[u16], shape: &[usize]) -> Vec<u8> {
    let header = Header {
        descriptor: TypeDescriptor { kind: Kind::Uint, size_bytes: 2, endianness: Endianness::Big },
        fortran_order: false,
        shape: shape.to_vec(),
    };
    let header_bytes = header.to_bytes().unwrap();
    let mut npy_bytes = header_bytes;
    for &v in values {
        npy_bytes.extend_from_slice(&v.to_be_bytes());
    }

    let crc32 = crc32fast::hash(&npy_bytes);
    let member_name = format!("{}.npy", name);

    let mut archive = Vec::new();
    let mut push_u16 = |buf: &mut Vec<u8>, v: u16| buf.extend_from_slice(&v.to_le_bytes());
    let mut push_u32 = |buf: &mut Vec<u8>, v: u32| buf.extend_from_slice(&v.to_le_bytes());

    push_u32(&mut archive, LOCAL_FILE_HEADER_SIGNATURE);
    push_u16(&mut archive, 20); // version needed
    push_u16(&mut archive, 0); // flags
    push_u16(&mut archive, 0); // compression: stored
    push_u16(&mut archive, 0); // mod time
    push_u16(&mut archive, 0); // mod date
    push_u32(&mut archive, crc32);
    push_u32(&mut archive, npy_bytes.len() as u32);
    push_u32(&mut archive, npy_bytes.len() as u32);
    push_u16(&mut archive, member_name.len() as u16);
    push_u16(&mut archive, 0); // extra length
    archive.write_all(member_name.as_bytes()).unwrap();
    archive.write_all(&npy_bytes).unwrap();

    let central_dir_offset = archive.len() as u32;
    push_u32(&mut archive, CENTRAL_DIRECTORY_SIGNATURE);
    push_u16(&mut archive, 20); // version made by
    push_u16(&mut archive, 20); // version needed
    push_u16(&mut archive, 0); // flags
    push_u16(&mut archive, 0); // compression
    push_u16(&mut archive, 0); // mod time
    push_u16(&mut archive, 0); // mod date
    push_u32(&mut archive, crc32);
    push_u32(&mut archive, npy_bytes.len() as u32);
    push_u32(&mut archive, npy_bytes.len() as u32);
    push_u16(&mut archive, member_name.len() as u16);
    push_u16(&mut archive, 0); // extra length
    push_u16(&mut archive, 0); // comment length
    push_u16(&mut archive, 0); // disk number start
    push_u16(&mut archive, 0); // internal attrs
    push_u32(&mut archive, 0); // external attrs
    push_u32(&mut archive, 0); // local header offset
    archive.write_all(member_name.as_bytes()).unwrap();
    let central_dir_size = archive.len() as u32 - central_dir_offset;

    push_u32(&mut archive, EOCD_SIGNATURE);
    push_u16(&mut archive, 0);
    push_u16(&mut archive, 0);
    push_u16(&mut archive, 1);
    push_u16(&mut archive, 1);
    push_u32(&mut archive, central_dir_size);
    push_u32(&mut archive, central_dir_offset);
    push_u16(&mut archive, 0);

    archive
}

#[test]
fn reads_big_endian_u2_member_as_host_native_on_a_little_endian_host() {
    assert_eq!(Endianness::host(), Endianness::Little, "this test assumes a little-endian host");

    let values: Vec<u16> = (0..16).collect();
    let archive = build_foreign_endian_archive("grid", &values, &[2, 2, 2, 2]);

    let mut reader = NpzReader::new(Cursor::new(archive)).unwrap();
    let arr = reader.by_name_full::<u16>("grid").unwrap();
    assert_eq!(arr.shape(), &[2, 2, 2, 2]);
    assert_eq!(arr.as_slice(), &values[..]);
}
