//! Question → retrieved context → generated answer.
use std::sync::Arc;
use std::time::Instant;

use generate::Generator;
use index::{IndexCache, IndexError, IndexStore, SearchHit, VectorIndex};
use semantic::Embedder;
use tracing::{debug, info, warn};

use crate::config::{Messages, PipelineConfig, RetrievalConfig};
use crate::error::ResponderError;
use crate::prompt::PromptTemplate;

/// Outcome of one question. Every question yields exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// The model's answer, verbatim.
    Generated(String),
    /// No index has been committed yet.
    NotReady,
    /// The index holds nothing relevant to the question.
    NoContext,
    /// Embedding, loading or generation failed. Carries the failure detail.
    ProviderError(String),
}

impl Answer {
    /// Stable machine-readable label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Answer::Generated(_) => "generated",
            Answer::NotReady => "not_ready",
            Answer::NoContext => "no_context",
            Answer::ProviderError(_) => "provider_error",
        }
    }

    /// The user-facing text for this outcome.
    pub fn into_text(self, messages: &Messages) -> String {
        match self {
            Answer::Generated(text) => text,
            Answer::NotReady => messages.not_ready.clone(),
            Answer::NoContext => messages.no_context.clone(),
            Answer::ProviderError(detail) => messages.provider_error(&detail),
        }
    }
}

enum Retrieval {
    NotReady,
    Hits(Vec<SearchHit>),
}

/// Answers questions against whatever snapshot is committed at the time of
/// the call.
///
/// Every question checks the committed snapshot's build id. The loaded index
/// is reused while it matches, and a rebuild becomes visible to the next
/// question without restarting anything.
#[derive(Clone)]
pub struct Responder {
    index: IndexCache,
    retrieval: RetrievalConfig,
    template: Arc<PromptTemplate>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

impl Responder {
    pub fn new(
        cfg: &PipelineConfig,
        template: PromptTemplate,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            index: IndexCache::new(IndexStore::new(&cfg.index)),
            retrieval: cfg.retrieval,
            template: Arc::new(template),
            embedder,
            generator,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.index.store().is_ready()
    }

    pub async fn answer(&self, question: &str) -> Answer {
        let start = Instant::now();
        let hits = match self.retrieve(question).await {
            Ok(Retrieval::NotReady) => {
                debug!("answer_not_ready");
                return Answer::NotReady;
            }
            Ok(Retrieval::Hits(hits)) => hits,
            Err(err) => {
                warn!(error = %err, stage = "retrieval", "answer_failed");
                return Answer::ProviderError(err.to_string());
            }
        };

        if hits.is_empty() {
            info!(elapsed_ms = start.elapsed().as_millis() as u64, "answer_no_context");
            return Answer::NoContext;
        }

        let context: Vec<&str> = hits.iter().map(|hit| hit.text.as_str()).collect();
        let prompt = self.template.render(context.as_slice(), question);
        match self.generator.generate(&prompt).await {
            Ok(text) => {
                info!(
                    chunks = hits.len(),
                    top_score = hits[0].score,
                    model = self.generator.model_id(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "answer_generated"
                );
                Answer::Generated(text)
            }
            Err(err) => {
                let err = ResponderError::from(err);
                warn!(error = %err, stage = "generation", "answer_failed");
                Answer::ProviderError(err.to_string())
            }
        }
    }

    /// The chunks that would be handed to the model for `question`, best
    /// first, after the similarity floor is applied.
    pub async fn context_for(&self, question: &str) -> Result<Option<Vec<SearchHit>>, ResponderError> {
        match self.retrieve(question).await? {
            Retrieval::NotReady => Ok(None),
            Retrieval::Hits(hits) => Ok(Some(hits)),
        }
    }

    async fn retrieve(&self, question: &str) -> Result<Retrieval, ResponderError> {
        if !self.is_ready() {
            return Ok(Retrieval::NotReady);
        }

        let cache = self.index.clone();
        let index = match tokio::task::spawn_blocking(move || cache.load()).await? {
            Ok(index) => index,
            // Marker vanished between the check and the read.
            Err(IndexError::NotFound(_)) => return Ok(Retrieval::NotReady),
            Err(err) => return Err(err.into()),
        };
        self.check_model(&index)?;

        let query = self.embedder.embed_query(question).await?;
        let mut hits = index.search(&query, self.retrieval.top_k)?;
        if let Some(min) = self.retrieval.min_similarity {
            hits.retain(|hit| hit.score >= min);
        }
        debug!(
            candidates = index.len(),
            kept = hits.len(),
            "context_retrieved"
        );
        Ok(Retrieval::Hits(hits))
    }

    fn check_model(&self, index: &VectorIndex) -> Result<(), ResponderError> {
        let query_model = self.embedder.model_id();
        if index.embedding_model() != query_model {
            return Err(ResponderError::ModelMismatch {
                index_model: index.embedding_model().to_string(),
                query_model: query_model.to_string(),
            });
        }
        Ok(())
    }
}
