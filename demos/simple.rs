//! Writes a small `f8` array, reads it back, and prints it.

use npy_format::{load_full, save, SaveMode};

fn main() {
    let path = std::env::temp_dir().join("npy-format-simple.npy");
    let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
    let shape = [2, 3];

    save(&path, &data, &shape, SaveMode::Write).expect("failed to write array");
    println!("wrote {:?} (shape {:?}) to {}", data, shape, path.display());

    let loaded = load_full::<_, f64>(&path).expect("failed to read array back");
    println!("read back shape {:?}, data {:?}", loaded.shape(), loaded.as_slice());
}
