//! Embedding providers for the knowledge store.
//!
//! Every provider returns L2-normalized vectors of a fixed, probed dimension.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, l2_normalize, EmbeddingProvider, DIMENSION_PROBE_TEXT};
