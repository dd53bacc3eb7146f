use std::collections::HashMap;
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{debug, warn};

use seele_core::time::human_time;
use seele_providers::{Embedder, Reranker};
use seele_store::{Role, Store, VectorFilter, VectorKind};

/// Retrieval parameters (env-configurable).
#[derive(Debug, Clone, Copy)]
pub struct RetrieverParams {
    pub recall_summary_per_query: usize,
    pub recall_conv_per_summary: usize,
    pub rerank_top_summaries: usize,
    pub rerank_top_convs: usize,
}

impl Default for RetrieverParams {
    fn default() -> Self {
        Self {
            recall_summary_per_query: 3,
            recall_conv_per_summary: 4,
            rerank_top_summaries: 3,
            rerank_top_convs: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievedSummary {
    pub summary_id: i64,
    pub text: String,
    /// Local-time range covered by the summary.
    pub human_time: String,
}

#[derive(Debug, Clone)]
pub struct RetrievedTurn {
    pub turn_id: i64,
    pub role: Role,
    pub text: String,
    pub human_time: String,
}

/// What recall hands to the prompt assembler. Empty on embedder failure —
/// a turn without memories is better than no turn at all.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub summaries: Vec<RetrievedSummary>,
    pub turns: Vec<RetrievedTurn>,
}

/// Two-stage recall: summaries first (excluding the active session), then
/// the turns behind each recalled summary, then rerank pruning when a
/// reranker is configured.
pub struct Retriever {
    store: Arc<Store>,
    embedder: Arc<dyn Embedder>,
    reranker: Option<Arc<dyn Reranker>>,
    params: RetrieverParams,
    tz: Tz,
    /// Most-recent-assistant embedding, keyed by the exact text. Memory
    /// only; recomputed on first use after a restart.
    assistant_cache: tokio::sync::Mutex<Option<(String, Vec<f32>)>>,
}

impl Retriever {
    pub fn new(
        store: Arc<Store>,
        embedder: Arc<dyn Embedder>,
        reranker: Option<Arc<dyn Reranker>>,
        params: RetrieverParams,
        tz: Tz,
    ) -> Self {
        Self {
            store,
            embedder,
            reranker,
            params,
            tz,
            assistant_cache: tokio::sync::Mutex::new(None),
        }
    }

    /// Recall summaries and turns relevant to the current input. Never
    /// returns anything from `active_session`; degrades to empty on
    /// embedder failure and to vector ordering on reranker failure.
    pub async fn retrieve(
        &self,
        user_text: &str,
        last_assistant: Option<&str>,
        active_session: i64,
    ) -> RetrievalResult {
        let (user_vec, assistant_vec) = match self.query_vectors(user_text, last_assistant).await {
            Ok(v) => v,
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "embedder failed, skipping recall");
                return RetrievalResult::default();
            }
        };

        match self.recall(&user_vec, assistant_vec.as_deref(), active_session) {
            Ok((summaries, turns)) => self.prune(user_text, summaries, turns).await,
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "recall query failed, skipping");
                RetrievalResult::default()
            }
        }
    }

    /// Embed the user input and (if present and not cached) the most recent
    /// assistant turn in a single batch.
    async fn query_vectors(
        &self,
        user_text: &str,
        last_assistant: Option<&str>,
    ) -> Result<(Vec<f32>, Option<Vec<f32>>), seele_providers::ProviderError> {
        let Some(assistant) = last_assistant else {
            let mut vecs = self.embedder.embed(&[user_text.to_string()]).await?;
            return Ok((vecs.remove(0), None));
        };

        let cached = {
            let cache = self.assistant_cache.lock().await;
            cache
                .as_ref()
                .filter(|(text, _)| text == assistant)
                .map(|(_, v)| v.clone())
        };

        if let Some(assistant_vec) = cached {
            let mut vecs = self.embedder.embed(&[user_text.to_string()]).await?;
            return Ok((vecs.remove(0), Some(assistant_vec)));
        }

        let mut vecs = self
            .embedder
            .embed(&[user_text.to_string(), assistant.to_string()])
            .await?;
        let user_vec = vecs.remove(0);
        let assistant_vec = vecs.remove(0);
        *self.assistant_cache.lock().await = Some((assistant.to_string(), assistant_vec.clone()));
        Ok((user_vec, Some(assistant_vec)))
    }

    /// Stage 1 + 2: vector recall with per-id best-score dedup.
    #[allow(clippy::type_complexity)]
    fn recall(
        &self,
        user_vec: &[f32],
        assistant_vec: Option<&[f32]>,
        active_session: i64,
    ) -> Result<(Vec<(seele_store::Summary, f64)>, Vec<(seele_store::Turn, f64)>), seele_store::StoreError>
    {
        let mut summary_scores: HashMap<i64, f64> = HashMap::new();
        let mut queries: Vec<&[f32]> = vec![user_vec];
        if let Some(v) = assistant_vec {
            queries.push(v);
        }
        for q in &queries {
            let hits = self.store.vector_search(
                VectorKind::Summary,
                q,
                self.params.recall_summary_per_query,
                VectorFilter::ExcludeSession(active_session),
            )?;
            for (id, score) in hits {
                let best = summary_scores.entry(id).or_insert(f64::MIN);
                if score > *best {
                    *best = score;
                }
            }
        }

        let mut summaries = Vec::with_capacity(summary_scores.len());
        for (id, score) in &summary_scores {
            summaries.push((self.store.summary(*id)?, *score));
        }

        // Stage 2: recall turns from each recalled summary's session,
        // queried by the user input.
        let mut turn_scores: HashMap<i64, f64> = HashMap::new();
        for (summary, _) in &summaries {
            let hits = self.store.vector_search(
                VectorKind::Turn,
                user_vec,
                self.params.recall_conv_per_summary,
                VectorFilter::SessionIs(summary.session_id),
            )?;
            for (id, score) in hits {
                let best = turn_scores.entry(id).or_insert(f64::MIN);
                if score > *best {
                    *best = score;
                }
            }
        }

        let mut turns = Vec::with_capacity(turn_scores.len());
        for (id, score) in &turn_scores {
            turns.push((self.store.turn(*id)?, *score));
        }

        debug!(
            summaries = summaries.len(),
            turns = turns.len(),
            "recall candidates gathered"
        );
        Ok((summaries, turns))
    }

    /// Stage 3: rerank pruning, or vector-score ordering when no reranker
    /// is configured (or it fails). Ties keep the more recent item.
    async fn prune(
        &self,
        user_text: &str,
        mut summaries: Vec<(seele_store::Summary, f64)>,
        mut turns: Vec<(seele_store::Turn, f64)>,
    ) -> RetrievalResult {
        if let Some(reranker) = &self.reranker {
            let summary_docs: Vec<String> = summaries.iter().map(|(s, _)| s.text.clone()).collect();
            let turn_docs: Vec<String> = turns.iter().map(|(t, _)| t.text.clone()).collect();
            match (
                reranker.rerank(user_text, &summary_docs).await,
                reranker.rerank(user_text, &turn_docs).await,
            ) {
                (Ok(summary_hits), Ok(turn_hits)) => {
                    for hit in summary_hits {
                        if let Some(entry) = summaries.get_mut(hit.index) {
                            entry.1 = hit.score;
                        }
                    }
                    for hit in turn_hits {
                        if let Some(entry) = turns.get_mut(hit.index) {
                            entry.1 = hit.score;
                        }
                    }
                }
                (summary_res, turn_res) => {
                    let err = summary_res.err().or(turn_res.err());
                    if let Some(e) = err {
                        warn!(kind = %e.kind(), error = %e, "rerank failed, using vector order");
                    }
                }
            }
        }

        summaries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.0.last_ts.cmp(&a.0.last_ts))
                .then(b.0.summary_id.cmp(&a.0.summary_id))
        });
        turns.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.0.ts.cmp(&a.0.ts))
                .then(b.0.turn_id.cmp(&a.0.turn_id))
        });
        summaries.truncate(self.params.rerank_top_summaries);
        turns.truncate(self.params.rerank_top_convs);

        RetrievalResult {
            summaries: summaries
                .into_iter()
                .map(|(s, _)| RetrievedSummary {
                    summary_id: s.summary_id,
                    human_time: format!(
                        "{} – {}",
                        human_time(s.first_ts, self.tz),
                        human_time(s.last_ts, self.tz)
                    ),
                    text: s.text,
                })
                .collect(),
            turns: turns
                .into_iter()
                .map(|(t, _)| RetrievedTurn {
                    turn_id: t.turn_id,
                    role: t.role,
                    human_time: human_time(t.ts, self.tz),
                    text: t.text,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use seele_providers::{ProviderError, RerankHit};

    const DIM: usize = 4;

    fn unit(axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        v[axis] = 1.0;
        v
    }

    /// Maps known texts to fixed vectors; counts texts embedded.
    struct StubEmbedder {
        map: Vec<(String, Vec<f32>)>,
        embedded_texts: AtomicUsize,
        fail: bool,
    }

    impl StubEmbedder {
        fn new(map: Vec<(&str, Vec<f32>)>) -> Self {
            Self {
                map: map.into_iter().map(|(t, v)| (t.to_string(), v)).collect(),
                embedded_texts: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn dim(&self) -> usize {
            DIM
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            if self.fail {
                return Err(ProviderError::Unavailable("stub down".into()));
            }
            self.embedded_texts.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    self.map
                        .iter()
                        .find(|(k, _)| k == t)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| unit(3))
                })
                .collect())
        }
    }

    struct StubReranker {
        fail: bool,
    }

    #[async_trait]
    impl Reranker for StubReranker {
        async fn rerank(
            &self,
            _query: &str,
            documents: &[String],
        ) -> Result<Vec<RerankHit>, ProviderError> {
            if self.fail {
                return Err(ProviderError::Unavailable("rerank down".into()));
            }
            // Scores keyed on content so candidate order doesn't matter.
            Ok(documents
                .iter()
                .enumerate()
                .map(|(i, doc)| RerankHit {
                    index: i,
                    score: if doc.contains("scales") { 1.0 } else { 0.1 },
                })
                .collect())
        }
    }

    /// One archived session holding a summary (axis 0) and two turns
    /// (axes 0 and 1), plus an active session with a competing turn.
    fn fixture() -> (Arc<Store>, i64) {
        let store = Arc::new(Store::open_in_memory(DIM).unwrap());
        let old = store.create_session(100).unwrap();
        let t1 = store
            .append_turn(old.session_id, Role::User, "piano recital plans", 110)
            .unwrap();
        let t2 = store
            .append_turn(old.session_id, Role::Assistant, "scales before pieces", 120)
            .unwrap();
        store.attach_turn_vector(t1, &unit(0)).unwrap();
        store.attach_turn_vector(t2, &unit(1)).unwrap();
        let s = store
            .insert_summary(old.session_id, "talked about piano practice", 110, 120, t2)
            .unwrap();
        store.attach_summary_vector(s, &unit(0)).unwrap();
        store.archive_session(old.session_id, 130).unwrap();

        let active = store.create_session(200).unwrap();
        let t3 = store
            .append_turn(active.session_id, Role::User, "piano again today", 210)
            .unwrap();
        store.attach_turn_vector(t3, &unit(0)).unwrap();
        let s2 = store
            .insert_summary(active.session_id, "active session piano notes", 210, 210, t3)
            .unwrap();
        store.attach_summary_vector(s2, &unit(0)).unwrap();

        (store, active.session_id)
    }

    fn retriever(
        store: Arc<Store>,
        embedder: Arc<dyn Embedder>,
        reranker: Option<Arc<dyn Reranker>>,
    ) -> Retriever {
        Retriever::new(
            store,
            embedder,
            reranker,
            RetrieverParams::default(),
            chrono_tz::Tz::UTC,
        )
    }

    #[tokio::test]
    async fn recalls_summary_then_its_turns_excluding_active_session() {
        let (store, active) = fixture();
        let embedder = Arc::new(StubEmbedder::new(vec![("about piano", unit(0))]));
        let r = retriever(store, embedder, None);

        let result = r.retrieve("about piano", None, active).await;

        assert_eq!(result.summaries.len(), 1);
        assert_eq!(result.summaries[0].text, "talked about piano practice");
        assert!(result.summaries[0].human_time.contains("1970-01-01"));

        // Both turns of the recalled session, never the active one.
        assert_eq!(result.turns.len(), 2);
        assert!(result.turns.iter().all(|t| t.text != "piano again today"));
        // Vector order: the axis-0 turn matches the query best.
        assert_eq!(result.turns[0].text, "piano recital plans");
    }

    #[tokio::test]
    async fn embedder_failure_degrades_to_empty() {
        let (store, active) = fixture();
        let mut stub = StubEmbedder::new(vec![]);
        stub.fail = true;
        let r = retriever(store, Arc::new(stub), None);

        let result = r.retrieve("anything", None, active).await;
        assert!(result.summaries.is_empty());
        assert!(result.turns.is_empty());
    }

    #[tokio::test]
    async fn reranker_failure_falls_back_to_vector_order() {
        let (store, active) = fixture();
        let embedder = Arc::new(StubEmbedder::new(vec![("about piano", unit(0))]));
        let r = retriever(
            store,
            embedder,
            Some(Arc::new(StubReranker { fail: true })),
        );

        let result = r.retrieve("about piano", None, active).await;
        assert_eq!(result.turns[0].text, "piano recital plans");
    }

    #[tokio::test]
    async fn reranker_reorders_candidates() {
        let (store, active) = fixture();
        let embedder = Arc::new(StubEmbedder::new(vec![("about piano", unit(0))]));
        let r = retriever(
            store,
            embedder,
            Some(Arc::new(StubReranker { fail: false })),
        );

        // The stub scores later candidates higher, flipping vector order.
        let result = r.retrieve("about piano", None, active).await;
        assert_eq!(result.turns[0].text, "scales before pieces");
    }

    #[tokio::test]
    async fn assistant_embedding_is_cached_between_calls() {
        let (store, active) = fixture();
        let embedder = Arc::new(StubEmbedder::new(vec![
            ("q1", unit(0)),
            ("q2", unit(0)),
            ("same reply", unit(1)),
        ]));
        let counter = Arc::clone(&embedder);
        let r = retriever(store, embedder, None);

        r.retrieve("q1", Some("same reply"), active).await;
        let after_first = counter.embedded_texts.load(Ordering::SeqCst);
        assert_eq!(after_first, 2); // user + assistant

        r.retrieve("q2", Some("same reply"), active).await;
        let after_second = counter.embedded_texts.load(Ordering::SeqCst);
        assert_eq!(after_second, 3); // only the new user text
    }
}
