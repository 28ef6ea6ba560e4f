#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docqa::{
    ChunkingConfig, CorpusConfig, Embedder, GenerateError, Generator, IndexConfig, PipelineConfig,
    PromptTemplate, Responder, SemanticError, StubEmbedder,
};

pub const FEES: &str = "Tuition fees for the undergraduate programme are 10000 rupees per \
semester. Fees are payable at the accounts office before the semester starts.";

pub const HOSTEL: &str = "The hostel has two blocks with shared rooms. Mess timings are \
printed on the notice board near the warden office.";

pub const ADMISSION: &str = "Admission opens in June every year. Applicants must submit \
their marksheets and a transfer certificate with the application form.";

/// Config rooted in `root`: corpus in `root/pdfs`, index in `root/vector_index`.
pub fn config_in(root: &Path) -> PipelineConfig {
    PipelineConfig {
        corpus: CorpusConfig {
            source_dir: root.join("pdfs"),
            ..CorpusConfig::default()
        },
        chunking: ChunkingConfig::new(200, 20),
        index: IndexConfig {
            dir: root.join("vector_index"),
            ..IndexConfig::default()
        },
        ..PipelineConfig::default()
    }
}

pub fn write_doc(root: &Path, name: &str, text: &str) {
    let dir = root.join("pdfs");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), text).unwrap();
}

pub fn stub() -> Arc<StubEmbedder> {
    Arc::new(StubEmbedder::new(4096))
}

pub fn responder(cfg: &PipelineConfig, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) -> Responder {
    Responder::new(cfg, PromptTemplate::default(), embedder, generator)
}

/// Answers with a fixed prefix and keeps every prompt it was given.
#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn model_id(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("generated answer".to_string())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn model_id(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Err(GenerateError::Http {
            status: 429,
            body: "quota exhausted".into(),
        })
    }
}

/// Fails every call, as a provider outage would.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing"
    }

    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Err(SemanticError::Http {
            status: 503,
            body: "unavailable".into(),
        })
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
        Err(SemanticError::Http {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

/// Returns one vector fewer than asked for.
pub struct ShortEmbedder;

#[async_trait]
impl Embedder for ShortEmbedder {
    fn model_id(&self) -> &str {
        "short"
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(vec![1.0, 0.0])
    }
}

/// Answers with the context section of the prompt, as a model that quotes
/// its sources would.
pub struct QuotingGenerator;

#[async_trait]
impl Generator for QuotingGenerator {
    fn model_id(&self) -> &str {
        "quoting"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let context = prompt
            .split_once("Context:\n")
            .and_then(|(_, rest)| rest.split_once("\n\nQuestion:"))
            .map(|(context, _)| context.trim().to_string())
            .unwrap_or_default();
        Ok(context)
    }
}
