//! `Append` growth behavior, including the header-relocation edge case
//! where the decimal width of `shape[0]` crosses a padding boundary.

use npy_format::{append, load_full, save, SaveMode};
use tempfile::NamedTempFile;

#[test]
fn append_doubles_leading_dimension_and_concatenates_payload() {
    let f = NamedTempFile::new().unwrap();
    save(f.path(), &[1i64, 2, 3], &[3], SaveMode::Write).unwrap();
    save(f.path(), &[1i64, 2, 3], &[3], SaveMode::Append).unwrap();

    let loaded = load_full::<_, i64>(f.path()).unwrap();
    assert_eq!(loaded.shape(), &[6]);
    assert_eq!(loaded.as_slice(), &[1, 2, 3, 1, 2, 3]);
}

#[test]
fn append_preserves_trailing_dimensions() {
    let f = NamedTempFile::new().unwrap();
    save(f.path(), &[1.0f32, 2.0, 3.0, 4.0], &[2, 2], SaveMode::Write).unwrap();
    save(f.path(), &[5.0f32, 6.0], &[1, 2], SaveMode::Append).unwrap();

    let loaded = load_full::<_, f32>(f.path()).unwrap();
    assert_eq!(loaded.shape(), &[3, 2]);
    assert_eq!(loaded.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

/// Appending enough rows to grow `shape[0]`'s decimal width (here 9 -> 10)
/// can change the padded header length; the append path must relocate the
/// payload rather than corrupt the file with a mismatched-length header
/// written in place.
#[test]
fn append_across_a_decimal_width_boundary_relocates_instead_of_corrupting() {
    let f = NamedTempFile::new().unwrap();
    let nines: Vec<i32> = (0..9).collect();
    save(f.path(), &nines, &[9], SaveMode::Write).unwrap();
    append(f.path(), &[9i32], &[1]).unwrap();

    let loaded = load_full::<_, i32>(f.path()).unwrap();
    assert_eq!(loaded.shape(), &[10]);
    assert_eq!(loaded.as_slice(), &(0..10).collect::<Vec<_>>()[..]);
}

#[test]
fn append_rejects_mismatched_trailing_shape() {
    let f = NamedTempFile::new().unwrap();
    save(f.path(), &[1i32, 2, 3, 4, 5, 6], &[2, 3], SaveMode::Write).unwrap();
    let err = append(f.path(), &[1i32, 2, 3, 4], &[2, 2]).unwrap_err();
    assert!(matches!(err, npy_format::WriteNpyError::ShapeMismatch));
}
