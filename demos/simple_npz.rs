//! Writes two arrays into a `.npz` archive, then lists and reads them back.

use npy_format::{load_compressed_full_named, save_compressed, SaveMode};

fn main() {
    let path = std::env::temp_dir().join("npy-format-simple.npz");

    save_compressed(&path, "weights", &[0.1f32, 0.2, 0.3, 0.4], &[2, 2], SaveMode::Write)
        .expect("failed to write first member");
    save_compressed(&path, "bias", &[1.0f32, -1.0], &[2], SaveMode::Append)
        .expect("failed to append second member");

    println!("wrote {}", path.display());

    let weights = load_compressed_full_named::<_, f32>(&path, "weights").expect("failed to read weights");
    let bias = load_compressed_full_named::<_, f32>(&path, "bias").expect("failed to read bias");
    println!("weights: shape {:?}, data {:?}", weights.shape(), weights.as_slice());
    println!("bias: shape {:?}, data {:?}", bias.shape(), bias.as_slice());
}
