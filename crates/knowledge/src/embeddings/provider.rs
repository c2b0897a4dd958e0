//! Embedding provider trait and factory.

use super::providers::{OllamaProvider, TrigramProvider};
use ragline_core::config::EmbeddingSettings;
use ragline_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Text embedded once at startup to discover the model's output size.
pub const DIMENSION_PROBE_TEXT: &str = "dimension probe";

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Create an embedding provider and probe its output dimension.
///
/// Any failure here is an [`AppError::Initialization`]: the store cannot run
/// without a working embedder.
pub async fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    tracing::debug!(
        "Creating embedding provider: provider={}, model={}",
        settings.provider,
        settings.model
    );

    let provider: Arc<dyn EmbeddingProvider> = match settings.provider.as_str() {
        "trigram" => {
            if settings.dimensions == 0 {
                return Err(AppError::Initialization(
                    "Trigram embedding dimensions must be greater than zero".to_string(),
                ));
            }
            let provider = TrigramProvider::new(settings.dimensions);
            verify_probe(&provider).await?;
            Arc::new(provider)
        }

        "ollama" => {
            let endpoint = settings
                .endpoint
                .clone()
                .or_else(|| std::env::var("OLLAMA_URL").ok());
            let provider = OllamaProvider::connect(
                endpoint.as_deref(),
                &settings.model,
                Duration::from_secs(settings.timeout_secs),
            )
            .await?;
            Arc::new(provider)
        }

        other => {
            return Err(AppError::Initialization(format!(
                "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
                other
            )))
        }
    };

    tracing::info!(
        "Embedding provider ready: {} (model: {}, dimensions: {})",
        provider.provider_name(),
        provider.model_name(),
        provider.dimensions()
    );

    Ok(provider)
}

async fn verify_probe(provider: &dyn EmbeddingProvider) -> AppResult<()> {
    let probe = provider.embed(DIMENSION_PROBE_TEXT).await.map_err(|e| {
        AppError::Initialization(format!(
            "Embedding probe failed for provider '{}': {}",
            provider.provider_name(),
            e
        ))
    })?;

    if probe.len() != provider.dimensions() {
        return Err(AppError::Initialization(format!(
            "Embedding probe returned {} dimensions, expected {}",
            probe.len(),
            provider.dimensions()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let provider = create_provider(&settings("trigram")).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let result = create_provider(&settings("unknown")).await;
        assert!(matches!(result, Err(AppError::Initialization(_))));
    }

    #[tokio::test]
    async fn test_zero_dimensions_rejected() {
        let mut settings = settings("trigram");
        settings.dimensions = 0;
        assert!(matches!(
            create_provider(&settings).await,
            Err(AppError::Initialization(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_fatal() {
        let mut settings = settings("ollama");
        settings.model = "nomic-embed-text".to_string();
        settings.endpoint = Some("http://127.0.0.1:1".to_string());
        settings.timeout_secs = 2;

        assert!(matches!(
            create_provider(&settings).await,
            Err(AppError::Initialization(_))
        ));
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }
}
