//! Ranking behavior of the vector index.

use crate::embeddings::l2_normalize;
use crate::types::{Chunk, Document};
use crate::vector_index::VectorIndex;

fn chunk(text: &str) -> Chunk {
    let doc = Document::new(text).with_title(text).with_source("ranking");
    Chunk {
        text: text.to_string(),
        metadata: doc.chunk_metadata(),
    }
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let mut v = v.to_vec();
    l2_normalize(&mut v);
    v
}

fn index_of(rows: &[(&str, &[f32])]) -> VectorIndex {
    let dimension = rows[0].1.len();
    let mut index = VectorIndex::create(dimension);
    index
        .add_entries(
            rows.iter().map(|(text, _)| chunk(text)).collect(),
            rows.iter().map(|(_, v)| normalize(v)).collect(),
        )
        .unwrap();
    index
}

#[test]
fn test_relevant_query_returns_high_scores() {
    let index = index_of(&[
        ("Rust is a systems programming language", &[1.0, 0.5, 0.2, 0.1]),
        ("Cooking recipes for pasta", &[-0.3, -0.8, 0.4, -0.2]),
    ]);

    let results = index.search(&normalize(&[0.9, 0.4, 0.3, 0.1]), 5).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.text, "Rust is a systems programming language");
    assert!(
        results[0].1 > 0.8,
        "Relevant chunk score should be high: {}",
        results[0].1
    );
    assert!(results[0].1 > results[1].1, "Scores should be ordered");
}

#[test]
fn test_unrelated_query_returns_low_scores() {
    let index = index_of(&[("Rust programming language features", &[1.0, 0.0, 0.0, 0.0])]);

    let results = index.search(&normalize(&[0.0, 1.0, 0.0, 0.0]), 5).unwrap();

    assert_eq!(results.len(), 1);
    assert!(
        results[0].1 < 0.5,
        "Unrelated chunk score should be low: {}",
        results[0].1
    );
}

#[test]
fn test_scores_are_ordered_descending() {
    let index = index_of(&[
        ("Text A", &[1.0, 0.0, 0.0]),
        ("Text B", &[0.7, 0.7, 0.0]),
        ("Text C", &[0.0, 1.0, 0.0]),
        ("Text D", &[-1.0, 0.0, 0.0]),
    ]);

    let results = index.search(&normalize(&[1.0, 0.0, 0.0]), 10).unwrap();

    assert_eq!(results.len(), 4);
    for pair in results.windows(2) {
        assert!(
            pair[0].1 >= pair[1].1,
            "Scores should be ordered: {} >= {}",
            pair[0].1,
            pair[1].1
        );
    }
    assert_eq!(results[0].0.text, "Text A");
    assert!(results[0].1 > 0.99, "Perfect match should have score near 1.0");
}

#[test]
fn test_negative_similarity_chunks() {
    let index = index_of(&[("Opposite content", &[-1.0, 0.0, 0.0])]);

    let results = index.search(&normalize(&[1.0, 0.0, 0.0]), 5).unwrap();

    assert_eq!(results.len(), 1);
    assert!(
        results[0].1 > -1.1 && results[0].1 < -0.9,
        "Opposite vectors should score close to -1.0"
    );
}

#[test]
fn test_top_k_limit_respected() {
    let mut index = VectorIndex::create(2);
    for i in 1..=10 {
        index
            .add_entries(
                vec![chunk(&format!("Text {}", i))],
                vec![normalize(&[i as f32, 10.0])],
            )
            .unwrap();
    }

    let results = index.search(&normalize(&[1.0, 0.0]), 3).unwrap();

    assert_eq!(results.len(), 3, "Should return exactly top_k results");
    assert_eq!(results[0].0.text, "Text 10");
}
