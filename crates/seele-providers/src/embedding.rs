use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Turns text into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedding dimension D. Vectors of any other length never leave this
    /// interface.
    fn dim(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// OpenAI-compatible `/v1/embeddings` client.
pub struct HttpEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dim: usize,
}

impl HttpEmbedder {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        dim: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
            model,
            dim,
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v1/embeddings", self.base_url);
        debug!(count = texts.len(), model = %self.model, "embedding batch");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "embeddings API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let api_resp: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_embeddings(api_resp, texts.len(), self.dim)
    }
}

pub(crate) fn parse_embeddings(
    resp: EmbeddingResponse,
    expected_count: usize,
    expected_dim: usize,
) -> Result<Vec<Vec<f32>>, ProviderError> {
    if resp.data.len() != expected_count {
        return Err(ProviderError::Parse(format!(
            "expected {expected_count} embeddings, got {}",
            resp.data.len()
        )));
    }
    // The API may reorder entries; `index` is authoritative.
    let mut rows = resp.data;
    rows.sort_by_key(|d| d.index);
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if row.embedding.len() != expected_dim {
            return Err(ProviderError::Parse(format!(
                "embedding dimension {} does not match configured {expected_dim}",
                row.embedding.len()
            )));
        }
        out.push(row.embedding);
    }
    Ok(out)
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub(crate) data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingRow {
    pub(crate) index: usize,
    pub(crate) embedding: Vec<f32>,
}
