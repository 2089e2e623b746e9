//! Views into mapped `.npy` files: the zero-copy path when the payload is
//! aligned, and the copying fallback when it isn't.

use npy_format::{
    load_full_mapped, load_no_copy, save, AccessMode, CacheHint, MappedWindow, NoCopyLoad, SaveMode,
};
use tempfile::NamedTempFile;

#[test]
fn zero_copy_view_matches_copying_load() {
    let f = NamedTempFile::new().unwrap();
    let values: Vec<i64> = (0..64).collect();
    save(f.path(), &values, &[64], SaveMode::Write).unwrap();

    let mut copying = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
    let copied = load_full_mapped::<i64>(&mut copying).unwrap();

    let mut zero_copy = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
    let view = load_no_copy::<i64>(&mut zero_copy).unwrap();

    assert!(view.is_mapped(), "a window opened at offset 0 is always aligned for i64");
    assert_eq!(view.as_slice().len(), copied.as_slice().len());
    assert_eq!(view.as_slice(), copied.as_slice());
    assert_eq!(view.as_slice(), &values[..]);
}

#[test]
fn zero_copy_view_rejects_wrong_element_type() {
    let f = NamedTempFile::new().unwrap();
    save(f.path(), &[1.0f32, 2.0, 3.0], &[3], SaveMode::Write).unwrap();

    let mut window = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
    let err = load_no_copy::<f64>(&mut window).unwrap_err();
    assert!(matches!(err, npy_format::ViewNpyError::WrongDescriptor(_)));
}

#[test]
fn misaligned_payload_falls_back_to_a_copying_load() {
    let staging = NamedTempFile::new().unwrap();
    let values: Vec<i64> = (0..16).collect();
    save(staging.path(), &values, &[16], SaveMode::Write).unwrap();
    let npy_bytes = std::fs::read(staging.path()).unwrap();

    // One leading junk byte pushes the real `.npy` header to file offset 1.
    // The header itself always serializes to a multiple of 16 bytes, so the
    // payload lands at `1 + 16*k`, which is never a multiple of 8 — the
    // alignment `i64` needs — once the window is remapped onto that offset.
    let mut contents = vec![0xffu8];
    contents.extend_from_slice(&npy_bytes);
    let f = NamedTempFile::new().unwrap();
    std::fs::write(f.path(), &contents).unwrap();

    let mut window = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
    window.remap_at(1, 0).unwrap();
    assert_eq!(window.position(), 1, "remap must land on the unaligned skew, not page-align it away");

    match load_no_copy::<i64>(&mut window).unwrap() {
        NoCopyLoad::Copied(data) => assert_eq!(data, values),
        NoCopyLoad::Mapped(_) => panic!("expected the misaligned offset to trigger the copying fallback"),
    }
}
