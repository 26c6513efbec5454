//! Small ndarray-like helpers used throughout the crate.
//!
//! `Array2` is a lightweight row-major container with row views and row
//! selection. Models copy it into their backend's matrix type at fit time.
pub mod matrix;

pub use matrix::{Array2, ShapeError};

#[inline]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
