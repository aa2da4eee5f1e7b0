//! Cosine similarity between embedding vectors

use crate::domain::DomainError;

/// Computes the cosine similarity of two equal-length vectors, in [-1, 1].
///
/// Mismatched dimensionality and zero-norm inputs are reported as errors
/// rather than collapsing into NaN or a silent zero score.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, DomainError> {
    if a.len() != b.len() {
        return Err(DomainError::validation(format!(
            "vector dimensionality mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    if a.is_empty() {
        return Err(DomainError::validation("cannot score empty vectors"));
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(DomainError::validation(
            "cannot score a zero vector: norm is zero",
        ));
    }

    Ok(dot / (norm_a * norm_b))
}
