//! Vector similarity primitives.
//!
//! The ranking pass compares paper embeddings against interest embeddings
//! with cosine similarity. The function here is pure and deterministic; it
//! owns the two policy decisions the rest of the crate relies on:
//!
//! - vectors of unequal length are a hard error for that comparison
//!   (never silently truncated or padded), and
//! - a zero-magnitude vector has similarity 0 to everything, rather than
//!   producing a division by zero.

use thiserror::Error;

/// Errors from similarity computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimilarityError {
    /// The two vectors have different lengths.
    ///
    /// This indicates embeddings from inconsistent models and should not
    /// occur at runtime; it fails the single comparison that hit it.
    #[error("vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Length of the left-hand vector
        left: usize,
        /// Length of the right-hand vector
        right: usize,
    },
}

/// Compute the cosine similarity of two equal-length vectors.
///
/// Returns a value in `[-1, 1]`: the normalized dot product, measuring
/// directional closeness independent of magnitude. If either vector has
/// zero magnitude the result is defined as `0.0` (no similarity).
///
/// # Errors
/// Returns [`SimilarityError::DimensionMismatch`] when the lengths differ.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut mag_a = 0.0f64;
    let mut mag_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        return Ok(0.0);
    }

    Ok((dot / denom).clamp(-1.0, 1.0) as f32)
}
