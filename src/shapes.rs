//! The in-memory array value type and its fixed-rank convenience wrappers.
//!
//! [`MultiDimArray`] is a flat, row-major buffer paired with a shape; it
//! plays the role `ndarray::ArrayBase` plays in array-oriented Rust crates,
//! but without the strided-view/broadcasting machinery this crate's
//! contiguous-only, copy-in/copy-out read and write paths never need.

use std::error::Error;
use std::fmt;

/// A row-major, contiguous, owned n-dimensional array.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiDimArray<T> {
    data: Vec<T>,
    shape: Vec<usize>,
}

/// The product of `shape` doesn't match the length of the data buffer
/// passed to [`MultiDimArray::new`].
#[derive(Debug)]
pub struct ShapeMismatch {
    pub shape: Vec<usize>,
    pub data_len: usize,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "shape {:?} (product {}) does not match data length {}",
            self.shape,
            self.shape.iter().product::<usize>(),
            self.data_len
        )
    }
}

impl Error for ShapeMismatch {}

impl<T> MultiDimArray<T> {
    /// Builds an array from a flat, row-major buffer and a shape. Fails if
    /// the shape's product doesn't equal `data.len()`.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self, ShapeMismatch> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeMismatch { shape, data_len: data.len() });
        }
        Ok(MultiDimArray { data, shape })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_raw_parts(self) -> (Vec<T>, Vec<usize>) {
        (self.data, self.shape)
    }
}

/// A rank-1 [`MultiDimArray`].
#[derive(Clone, Debug, PartialEq)]
pub struct Vector<T>(MultiDimArray<T>);

impl<T> Vector<T> {
    pub fn new(data: Vec<T>) -> Self {
        let len = data.len();
        Vector(MultiDimArray::new(data, vec![len]).expect("a 1-D shape always matches its own length"))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }

    pub fn into_inner(self) -> MultiDimArray<T> {
        self.0
    }
}

/// A rank-2 [`MultiDimArray`], row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T>(MultiDimArray<T>);

/// The flat buffer's length isn't `rows * cols`.
pub use ShapeMismatch as MatrixShapeMismatch;

impl<T> Matrix<T> {
    pub fn new(data: Vec<T>, rows: usize, cols: usize) -> Result<Self, ShapeMismatch> {
        Ok(Matrix(MultiDimArray::new(data, vec![rows, cols])?))
    }

    pub fn rows(&self) -> usize {
        self.0.shape()[0]
    }

    pub fn cols(&self) -> usize {
        self.0.shape()[1]
    }

    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }

    /// Row-major index of element `(row, col)`.
    pub fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.cols() + col
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.0.as_slice().get(self.index_of(row, col))
    }

    pub fn into_inner(self) -> MultiDimArray<T> {
        self.0
    }
}

/// A [`MultiDimArray`] of any rank, kept distinct from [`Vector`]/[`Matrix`]
/// purely as a naming convenience for callers working with rank >= 3 data.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T>(MultiDimArray<T>);

impl<T> Tensor<T> {
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self, ShapeMismatch> {
        Ok(Tensor(MultiDimArray::new(data, shape)?))
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }

    pub fn into_inner(self) -> MultiDimArray<T> {
        self.0
    }
}

impl<T> From<MultiDimArray<T>> for Tensor<T> {
    fn from(arr: MultiDimArray<T>) -> Self {
        Tensor(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_shape() {
        assert!(MultiDimArray::new(vec![1, 2, 3], vec![2, 2]).is_err());
    }

    #[test]
    fn matrix_indexes_row_major() {
        let m = Matrix::new(vec![1, 2, 3, 4, 5, 6], 2, 3).unwrap();
        assert_eq!(*m.get(1, 2).unwrap(), 6);
        assert_eq!(m.index_of(1, 0), 3);
    }

    #[test]
    fn vector_is_rank_one() {
        let v = Vector::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.into_inner().shape(), &[3]);
    }

    #[test]
    fn tensor_preserves_rank_and_shape() {
        let t = Tensor::new(vec![0u8; 32 * 64 * 128], vec![32, 64, 128]).unwrap();
        assert_eq!(t.shape(), &[32, 64, 128]);
    }
}
