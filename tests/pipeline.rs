mod common;

use std::sync::Arc;

use common::*;
use docqa::{
    build_index, Answer, BuildError, Embedder, IndexBuildResult, IndexStore, IngestError,
    RetrievalConfig, SkipReason, StubEmbedder,
};

fn college_corpus(root: &std::path::Path) {
    write_doc(root, "admission.txt", ADMISSION);
    write_doc(root, "fees.txt", FEES);
    write_doc(root, "hostel.txt", HOSTEL);
}

#[tokio::test]
async fn question_is_answered_from_indexed_corpus() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    let embedder = stub();

    let report = match build_index(&cfg, embedder.as_ref()).await.unwrap() {
        IndexBuildResult::Built(report) => report,
        other => panic!("expected a build, got {other:?}"),
    };
    assert_eq!(report.documents, 3);
    assert!(report.skipped.is_empty());
    assert!(report.chunks >= 3);
    assert_eq!(report.embedding_model, "stub-bow-4096");
    assert!(report.snapshot_path.is_file());

    let generator = Arc::new(RecordingGenerator::default());
    let responder = responder(&cfg, embedder, generator.clone());
    assert!(responder.is_ready());

    let question = "What are the tuition fees per semester?";
    let answer = responder.answer(question).await;
    assert_eq!(answer, Answer::Generated("generated answer".into()));
    assert_eq!(answer.outcome(), "generated");

    let prompt = generator.last_prompt();
    assert!(prompt.contains("10000 rupees"));
    assert!(prompt.contains(&format!("Question:\n{question}")));
    assert!(!prompt.contains("{context}"));
}

#[tokio::test]
async fn single_document_answer_mentions_june() {
    let tmp = tempfile::tempdir().unwrap();
    write_doc(tmp.path(), "prospectus.txt", "Admission opens in June. Fees are 10000.");
    let cfg = config_in(tmp.path());
    let embedder = stub();
    build_index(&cfg, embedder.as_ref()).await.unwrap();

    let responder = responder(&cfg, embedder, Arc::new(QuotingGenerator));
    let question = "When does admission open?";

    let hits = responder.context_for(question).await.unwrap().unwrap();
    assert!(hits[0].text.contains("Admission opens in June"));

    match responder.answer(question).await {
        Answer::Generated(text) => assert!(text.contains("June")),
        other => panic!("expected a generated answer, got {other:?}"),
    }
}

#[tokio::test]
async fn most_similar_chunk_comes_first() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let mut cfg = config_in(tmp.path());
    cfg.retrieval = RetrievalConfig {
        top_k: 2,
        min_similarity: None,
    };
    let embedder = stub();
    build_index(&cfg, embedder.as_ref()).await.unwrap();

    let responder = responder(&cfg, embedder, Arc::new(RecordingGenerator::default()));
    let hits = responder
        .context_for("What are the tuition fees per semester?")
        .await
        .unwrap()
        .expect("index is ready");

    assert_eq!(hits.len(), 2);
    assert!(hits[0].text.contains("10000"));
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn rebuilding_unchanged_corpus_gives_same_entries() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    let embedder = stub();
    let store = IndexStore::new(&cfg.index);

    build_index(&cfg, embedder.as_ref()).await.unwrap();
    let first = store.load_snapshot().unwrap();
    build_index(&cfg, embedder.as_ref()).await.unwrap();
    let second = store.load_snapshot().unwrap();

    assert_eq!(first.entries, second.entries);
    assert_eq!(first.embedding_model, second.embedding_model);
}

#[tokio::test]
async fn questions_before_first_build_are_not_ready() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    let embedder = stub();
    let generator = Arc::new(RecordingGenerator::default());
    let responder = responder(&cfg, embedder.clone(), generator.clone());

    assert!(!responder.is_ready());
    let answer = responder.answer("When does admission open?").await;
    assert_eq!(answer, Answer::NotReady);
    assert_eq!(
        answer.into_text(&cfg.messages),
        "⏳ The system is still initializing. Please try again in a moment."
    );
    assert_eq!(generator.calls(), 0);

    build_index(&cfg, embedder.as_ref()).await.unwrap();
    assert!(responder.is_ready());
    assert!(matches!(
        responder.answer("When does admission open?").await,
        Answer::Generated(_)
    ));
}

#[tokio::test]
async fn rebuilt_index_is_visible_to_next_question() {
    let tmp = tempfile::tempdir().unwrap();
    write_doc(tmp.path(), "fees.txt", FEES);
    let cfg = config_in(tmp.path());
    let embedder = stub();
    let generator = Arc::new(RecordingGenerator::default());
    let responder = responder(&cfg, embedder.clone(), generator.clone());

    build_index(&cfg, embedder.as_ref()).await.unwrap();
    responder.answer("hostel mess timings").await;
    assert!(!generator.last_prompt().contains("Mess timings"));

    write_doc(tmp.path(), "hostel.txt", HOSTEL);
    build_index(&cfg, embedder.as_ref()).await.unwrap();
    responder.answer("hostel mess timings").await;
    assert!(generator.last_prompt().contains("Mess timings"));
}

#[tokio::test]
async fn unrelated_question_below_similarity_floor_has_no_context() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let mut cfg = config_in(tmp.path());
    cfg.retrieval.min_similarity = Some(0.5);
    let embedder = stub();
    build_index(&cfg, embedder.as_ref()).await.unwrap();

    let generator = Arc::new(RecordingGenerator::default());
    let responder = responder(&cfg, embedder, generator.clone());
    let answer = responder.answer("zebra quantum xylophone").await;

    assert_eq!(answer, Answer::NoContext);
    assert_eq!(
        answer.into_text(&cfg.messages),
        "Apologies! There is no information available regarding your query."
    );
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn empty_question_is_still_answered() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    let embedder = stub();
    build_index(&cfg, embedder.as_ref()).await.unwrap();

    let responder = responder(&cfg, embedder, Arc::new(RecordingGenerator::default()));
    assert!(matches!(responder.answer("").await, Answer::Generated(_)));
}

#[tokio::test]
async fn empty_source_directory_skips_build() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("pdfs")).unwrap();
    let cfg = config_in(tmp.path());

    let result = build_index(&cfg, stub().as_ref()).await.unwrap();
    assert!(matches!(
        result,
        IndexBuildResult::Skipped(SkipReason::Ingest(IngestError::NoDocuments { .. }))
    ));
    assert!(!IndexStore::new(&cfg.index).is_ready());
}

#[tokio::test]
async fn missing_source_directory_skips_build() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config_in(tmp.path());

    let result = build_index(&cfg, stub().as_ref()).await.unwrap();
    assert!(matches!(
        result,
        IndexBuildResult::Skipped(SkipReason::Ingest(IngestError::SourceMissing(_)))
    ));
    assert!(!result.is_built());
}

#[tokio::test]
async fn documents_without_text_skip_build() {
    let tmp = tempfile::tempdir().unwrap();
    write_doc(tmp.path(), "blank.txt", "   \n\n  ");
    let cfg = config_in(tmp.path());

    let result = build_index(&cfg, stub().as_ref()).await.unwrap();
    assert!(matches!(result, IndexBuildResult::Skipped(SkipReason::NoText { .. })));
}

#[tokio::test]
async fn unreadable_document_is_skipped_and_rest_indexed() {
    let tmp = tempfile::tempdir().unwrap();
    write_doc(tmp.path(), "fees.txt", FEES);
    write_doc(tmp.path(), "scan.pdf", "not really a pdf");
    let cfg = config_in(tmp.path());

    let IndexBuildResult::Built(report) = build_index(&cfg, stub().as_ref()).await.unwrap() else {
        panic!("fees.txt alone should still build");
    };
    assert_eq!(report.documents, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("scan.pdf"));
}

#[tokio::test]
async fn failed_rebuild_keeps_previous_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    let embedder = stub();
    let store = IndexStore::new(&cfg.index);

    build_index(&cfg, embedder.as_ref()).await.unwrap();
    let before = store.load_snapshot().unwrap();

    let err = build_index(&cfg, &FailingEmbedder).await.unwrap_err();
    assert!(matches!(err, BuildError::Embedding(_)));
    assert_eq!(store.load_snapshot().unwrap(), before);

    let responder = responder(&cfg, embedder, Arc::new(RecordingGenerator::default()));
    assert!(matches!(
        responder.answer("When does admission open?").await,
        Answer::Generated(_)
    ));
}

#[tokio::test]
async fn short_embedding_batch_fails_build() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());

    let err = build_index(&cfg, &ShortEmbedder).await.unwrap_err();
    assert!(matches!(err, BuildError::CountMismatch { .. }));
    assert!(!IndexStore::new(&cfg.index).is_ready());
}

#[tokio::test]
async fn generation_failure_becomes_provider_error() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    let embedder = stub();
    build_index(&cfg, embedder.as_ref()).await.unwrap();

    let responder = responder(&cfg, embedder, Arc::new(FailingGenerator));
    let answer = responder.answer("When does admission open?").await;
    assert_eq!(answer.outcome(), "provider_error");

    let text = answer.into_text(&cfg.messages);
    assert!(text.starts_with("❌ Error retrieving answer: "));
    assert!(text.contains("429"));
}

#[tokio::test]
async fn query_embedding_failure_becomes_provider_error() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    build_index(&cfg, stub().as_ref()).await.unwrap();

    // Same model id as the index so the failure comes from the embed call.
    struct DownStub;
    #[async_trait::async_trait]
    impl Embedder for DownStub {
        fn model_id(&self) -> &str {
            "stub-bow-4096"
        }
        async fn embed_documents(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vec<f32>>, docqa::SemanticError> {
            FailingEmbedder.embed_documents(texts).await
        }
        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, docqa::SemanticError> {
            FailingEmbedder.embed_query(text).await
        }
    }

    let generator = Arc::new(RecordingGenerator::default());
    let responder = responder(&cfg, Arc::new(DownStub), generator.clone());
    let answer = responder.answer("When does admission open?").await;
    assert!(matches!(answer, Answer::ProviderError(ref detail) if detail.contains("503")));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn index_from_another_embedding_model_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    college_corpus(tmp.path());
    let cfg = config_in(tmp.path());
    build_index(&cfg, &StubEmbedder::new(64)).await.unwrap();

    let responder = responder(
        &cfg,
        Arc::new(StubEmbedder::new(128)),
        Arc::new(RecordingGenerator::default()),
    );
    match responder.answer("When does admission open?").await {
        Answer::ProviderError(detail) => {
            assert!(detail.contains("stub-bow-64"));
            assert!(detail.contains("stub-bow-128"));
        }
        other => panic!("expected a provider error, got {other:?}"),
    }
}
