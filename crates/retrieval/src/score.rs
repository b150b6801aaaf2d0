//! Similarity scoring.

/// Cosine similarity between two vectors, in [-1.0, 1.0].
///
/// Magnitude carries no semantic weight for text embeddings, only
/// direction does. A zero-norm vector (degenerate but valid input) or a
/// length mismatch scores 0.0 rather than raising a division error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
