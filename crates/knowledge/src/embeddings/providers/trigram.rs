//! Offline embedding provider built from hashed character trigrams.

use crate::embeddings::provider::{l2_normalize, EmbeddingProvider};
use ragline_core::AppResult;
use std::collections::HashMap;

const MODEL_NAME: &str = "trigram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Deterministic, content-aware embeddings with no model download.
///
/// Each non-stop word contributes to one bucket per character trigram
/// (weighted by the square root of its frequency) and one bucket for the
/// whole word. Texts sharing vocabulary land close together, which is enough
/// for development, tests and air-gapped installs.
///
/// Text with no qualifying word (short tokens, stop words, punctuation) falls
/// back to hashing its characters and character pairs, so every non-empty
/// input embeds to a unit vector.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, token: &str, multiplier: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut frequencies: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *frequencies.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &frequencies {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(&trigram, 37)] += (*freq as f32).sqrt();
            }
            vector[self.bucket(word, 31)] += *freq as f32;
        }

        if frequencies.is_empty() {
            self.embed_characters(&lower, &mut vector);
        }

        l2_normalize(&mut vector);
        vector
    }

    fn embed_characters(&self, lower: &str, vector: &mut [f32]) {
        let trimmed = lower.trim();
        let source = if trimmed.is_empty() { lower } else { trimmed };
        let chars: Vec<char> = source.chars().collect();

        for c in &chars {
            vector[self.bucket(c.encode_utf8(&mut [0u8; 4]), 41)] += 1.0;
        }
        for pair in chars.windows(2) {
            let bigram: String = pair.iter().collect();
            vector[self.bucket(&bigram, 43)] += 0.5;
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
