//! Character-hashing embedding.
//!
//! Every UTF-16 code unit `c` adds `(c % 13) - 6` to slot `c % DIMENSIONS`, and
//! the result is scaled to unit length. Identical text always gives identical
//! vectors and texts sharing many characters land close together. It carries
//! no real semantics.

use crate::vector_math::normalize;

pub const DIMENSIONS: usize = 128;

pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];
    for unit in text.encode_utf16() {
        let code = unit as usize;
        vector[code % DIMENSIONS] += (code % 13) as f32 - 6.0;
    }
    normalize(&mut vector);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_math::{cosine_similarity, l2_norm};

    #[test]
    fn embedding_is_deterministic() {
        let a = embed_text("Ollama serves local LLMs via HTTP on port 11434.");
        let b = embed_text("Ollama serves local LLMs via HTTP on port 11434.");
        assert_eq!(a, b);
        assert_eq!(a.len(), DIMENSIONS);
    }

    #[test]
    fn embedding_has_unit_norm() {
        let v = embed_text("TypeScript is great for large JavaScript applications.");
        assert!((l2_norm(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_gives_zero_vector() {
        let v = embed_text("");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn similar_text_scores_higher_than_unrelated_text() {
        let query = embed_text("local llm server port");
        let near = embed_text("local llm server on port 11434");
        let far = embed_text("ZZZZ QQQQ 9999 !!!!");
        let near_score = cosine_similarity(&query, &near).expect("cosine");
        let far_score = cosine_similarity(&query, &far).unwrap_or(0.0);
        assert!(near_score > far_score);
    }
}
