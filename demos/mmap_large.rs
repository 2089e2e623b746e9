//! Writes a large `f8` array and reads it back through a memory-mapped
//! zero-copy view instead of copying the payload into a fresh `Vec`.

use npy_format::{load_no_copy, save_mapped, AccessMode, CacheHint, Header, Kind, MappedWindow, TypeDescriptor};
use std::fs::File;

fn main() {
    let path = std::env::temp_dir().join("npy-format-mmap-large.npy");
    let len = 10_000_000usize;
    let data: Vec<f64> = (0..len).map(|i| i as f64 * 0.5).collect();

    let header = Header {
        descriptor: TypeDescriptor { kind: Kind::Float, size_bytes: 8, endianness: npy_format::Endianness::host() },
        fortran_order: false,
        shape: vec![len],
    };
    let header_len = header.byte_len().expect("header too long");
    let file_len = header_len + len * std::mem::size_of::<f64>();
    File::create(&path)
        .and_then(|f| f.set_len(file_len as u64))
        .expect("failed to pre-size backing file");

    {
        let mut window = MappedWindow::open(&path, file_len as u64, AccessMode::ReadWrite, CacheHint::Sequential)
            .expect("failed to open mapped window for writing");
        save_mapped(&mut window, &data, &[len]).expect("failed to write array");
    }

    let mut window = MappedWindow::open(&path, 0, AccessMode::ReadOnly, CacheHint::Random)
        .expect("failed to open mapped window for reading");
    let view = load_no_copy::<f64>(&mut window).expect("failed to create a view");
    let slice = view.as_slice();

    println!(
        "mapped {} elements {}",
        slice.len(),
        if view.is_mapped() { "without copying" } else { "via a copying fallback" }
    );
    println!("first: {}, last: {}", slice[0], slice[slice.len() - 1]);
}
