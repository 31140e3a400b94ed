//! BM25 sparse encoder
//!
//! Documents carry saturated term frequencies; queries carry one unit
//! weight per distinct term. The index applies IDF at query time, so the
//! dot product of the two is the BM25 score.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "how", "i", "if",
    "in", "into", "is", "it", "me", "my", "no", "not", "of", "on", "or", "so", "such", "that",
    "the", "their", "then", "there", "these", "they", "this", "to", "was", "what", "when",
    "which", "will", "with", "you", "your",
];

/// Sparse vector with ascending, unique indices
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

/// BM25 parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
    /// Expected document length in tokens
    pub avg_len: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            avg_len: 256.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bm25Encoder {
    params: Bm25Params,
}

impl Bm25Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: Bm25Params) -> Self {
        Self { params }
    }

    /// Lowercased terms without stop words or single characters
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| token.chars().count() >= 2 && !STOP_WORDS.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Stable 32-bit term id
    pub fn term_id(token: &str) -> u32 {
        let digest = Sha256::digest(token.as_bytes());
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    /// Encode an indexed document
    pub fn encode_document(&self, text: &str) -> SparseVector {
        let tokens = Self::tokenize(text);
        let doc_len = tokens.len() as f32;

        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in &tokens {
            *counts.entry(Self::term_id(token)).or_insert(0.0) += 1.0;
        }

        let Bm25Params { k1, b, avg_len } = self.params;
        let norm = k1 * (1.0 - b + b * doc_len / avg_len);

        let mut vector = SparseVector::default();
        for (index, tf) in counts {
            vector.indices.push(index);
            vector.values.push(tf * (k1 + 1.0) / (tf + norm));
        }
        vector
    }

    /// Encode a search query
    pub fn encode_query(&self, text: &str) -> SparseVector {
        let mut ids: Vec<u32> = Self::tokenize(text)
            .iter()
            .map(|token| Self::term_id(token))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        SparseVector {
            values: vec![1.0; ids.len()],
            indices: ids,
        }
    }
}
