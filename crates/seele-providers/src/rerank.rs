use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;

/// One reranked candidate: index into the submitted document list plus a
/// relevance score (higher is better).
#[derive(Debug, Clone, PartialEq)]
pub struct RerankHit {
    pub index: usize,
    pub score: f64,
}

/// Scores (query, candidate) pairs. Optional — when absent, retrieval
/// falls back to vector-score ordering.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
    ) -> Result<Vec<RerankHit>, ProviderError>;
}

/// `/v1/rerank` client (Jina/Cohere-style wire shape).
pub struct HttpReranker {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl HttpReranker {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
    ) -> Result<Vec<RerankHit>, ProviderError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v1/rerank", self.base_url);
        debug!(candidates = documents.len(), model = %self.model, "reranking");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "query": query,
                "documents": documents,
            }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "rerank API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let api_resp: RerankResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_rerank(api_resp, documents.len())
    }
}

pub(crate) fn parse_rerank(
    resp: RerankResponse,
    document_count: usize,
) -> Result<Vec<RerankHit>, ProviderError> {
    let mut hits = Vec::with_capacity(resp.results.len());
    for r in resp.results {
        if r.index >= document_count {
            return Err(ProviderError::Parse(format!(
                "rerank index {} out of bounds ({document_count} documents)",
                r.index
            )));
        }
        hits.push(RerankHit {
            index: r.index,
            score: r.relevance_score,
        });
    }
    Ok(hits)
}

#[derive(Deserialize)]
pub(crate) struct RerankResponse {
    pub(crate) results: Vec<RerankRow>,
}

#[derive(Deserialize)]
pub(crate) struct RerankRow {
    pub(crate) index: usize,
    pub(crate) relevance_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hits() {
        let resp: RerankResponse = serde_json::from_value(serde_json::json!({
            "results": [
                {"index": 2, "relevance_score": 0.91},
                {"index": 0, "relevance_score": 0.40}
            ]
        }))
        .unwrap();
        let hits = parse_rerank(resp, 3).unwrap();
        assert_eq!(hits[0], RerankHit { index: 2, score: 0.91 });
    }

    #[test]
    fn out_of_bounds_index_is_a_parse_error() {
        let resp: RerankResponse = serde_json::from_value(serde_json::json!({
            "results": [{"index": 5, "relevance_score": 0.5}]
        }))
        .unwrap();
        assert!(parse_rerank(resp, 3).is_err());
    }
}
