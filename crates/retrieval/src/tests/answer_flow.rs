use crate::document::Document;
use crate::embeddings::HashEmbedder;
use crate::engine::RagEngine;
use crate::index::SqliteIndex;
use docqa_core::config::RetrievalConfig;
use docqa_core::{AppError, AppResult};
use docqa_history::{ChatTurn, HistoryStore, SqliteHistoryStore};
use docqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use futures::stream;
use std::sync::{Arc, Mutex};

/// LLM stub that records every prompt it receives and replays canned
/// answers in order.
struct RecordingLlm {
    prompts: Mutex<Vec<String>>,
    answers: Mutex<Vec<String>>,
}

impl RecordingLlm {
    fn new(answers: &[&str]) -> Self {
        let mut queued: Vec<String> = answers.iter().map(|a| a.to_string()).collect();
        queued.reverse();
        Self {
            prompts: Mutex::new(Vec::new()),
            answers: Mutex::new(queued),
        }
    }

    fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for RecordingLlm {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| "canned answer".to_string());
        Ok(LlmResponse {
            content: answer,
            model: request.model.clone(),
            usage: LlmUsage::default(),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| "canned answer".to_string());

        // Emit the answer word by word, as a real provider would
        let model = request.model.clone();
        let chunks: Vec<AppResult<LlmStreamChunk>> = answer
            .split_inclusive(' ')
            .map(|piece| {
                Ok(LlmStreamChunk {
                    content: piece.to_string(),
                    model: model.clone(),
                    done: false,
                    usage: None,
                })
            })
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// LLM stub whose every completion fails.
struct FailingLlm;

#[async_trait::async_trait]
impl LlmClient for FailingLlm {
    fn provider_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Generation("model unavailable".to_string()))
    }

    async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
        Err(AppError::Generation("model unavailable".to_string()))
    }
}

/// History store whose writes fail while reads keep working.
struct ReadOnlyStore {
    inner: SqliteHistoryStore,
}

impl HistoryStore for ReadOnlyStore {
    fn append(&self, _session_id: &str, _question: &str, _answer: &str) -> AppResult<ChatTurn> {
        Err(AppError::Persistence("history database is full".to_string()))
    }

    fn query_recent(&self, session_id: &str, limit: usize) -> AppResult<Vec<ChatTurn>> {
        self.inner.query_recent(session_id, limit)
    }
}

fn test_settings() -> RetrievalConfig {
    RetrievalConfig {
        collection: "documents".to_string(),
        chunk_size: 1000,
        chunk_overlap: 200,
        top_k: 5,
        top_n: 3,
        history_window: 5,
    }
}

fn build_engine(llm: Arc<dyn LlmClient>) -> RagEngine {
    RagEngine::new(
        test_settings(),
        "test-model",
        Arc::new(HashEmbedder::new(128)),
        Arc::new(SqliteIndex::in_memory().unwrap()),
        llm,
    )
    .unwrap()
}

fn sample_document() -> Document {
    let mut pages = Vec::new();
    for page in 0..3 {
        let mut text = String::new();
        for sentence in 0..40 {
            text.push_str(&format!(
                "Page {} sentence {} covers routine project background material. ",
                page + 1,
                sentence
            ));
        }
        pages.push(text);
    }
    // A phrase that appears nowhere else, for retrieval assertions.
    pages[1].push_str("The deployment password rotation happens every fourteen days. ");
    Document {
        name: "handbook.txt".to_string(),
        pages,
    }
}

#[tokio::test]
async fn test_ingest_then_retrieve_unique_phrase() {
    let llm = Arc::new(RecordingLlm::new(&["Every fourteen days."]));
    let engine = build_engine(llm.clone());
    let store = SqliteHistoryStore::in_memory().unwrap();

    let count = engine.ingest(&sample_document()).await.unwrap();
    assert!(count > 3, "expected multiple chunks, got {}", count);

    let outcome = engine
        .answer(
            "how often does the deployment password rotation happen",
            "s1",
            &store,
        )
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Every fourteen days.");
    assert_eq!(outcome.session_id, "s1");

    // The retrieved context in the prompt includes the one chunk that
    // mentions the phrase.
    let prompts = llm.recorded_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("deployment password rotation"));
    assert!(prompts[0].contains("Question: how often does the deployment password rotation happen"));
}

#[tokio::test]
async fn test_followup_prompt_carries_previous_turn() {
    let llm = Arc::new(RecordingLlm::new(&["First answer text.", "Second answer text."]));
    let engine = build_engine(llm.clone());
    let store = SqliteHistoryStore::in_memory().unwrap();

    engine.ingest(&sample_document()).await.unwrap();

    engine
        .answer("what is the rotation schedule", "s1", &store)
        .await
        .unwrap();
    engine.answer("and who owns it", "s1", &store).await.unwrap();

    let prompts = llm.recorded_prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("Q: "));
    assert!(prompts[1].contains("Q: what is the rotation schedule\nA: First answer text."));
}

#[tokio::test]
async fn test_sessions_keep_separate_histories() {
    let llm = Arc::new(RecordingLlm::new(&["a1", "a2", "a3"]));
    let engine = build_engine(llm.clone());
    let store = SqliteHistoryStore::in_memory().unwrap();

    engine.ingest(&sample_document()).await.unwrap();

    engine.answer("alpha question", "s1", &store).await.unwrap();
    engine.answer("beta question", "s2", &store).await.unwrap();
    engine.answer("gamma question", "s2", &store).await.unwrap();

    let prompts = llm.recorded_prompts();
    // The third prompt is in session s2 and sees only s2's history.
    assert!(prompts[2].contains("Q: beta question"));
    assert!(!prompts[2].contains("alpha question"));
}

#[tokio::test]
async fn test_generation_failure_persists_no_turn() {
    let engine = build_engine(Arc::new(FailingLlm));
    let store = SqliteHistoryStore::in_memory().unwrap();

    engine.ingest(&sample_document()).await.unwrap();

    let err = engine.answer("anything", "s1", &store).await.unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));

    // No partial turn survives the failure.
    assert!(store.query_recent("s1", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_still_returns_answer() {
    let engine = build_engine(Arc::new(RecordingLlm::new(&["the answer"])));
    let store = ReadOnlyStore {
        inner: SqliteHistoryStore::in_memory().unwrap(),
    };

    engine.ingest(&sample_document()).await.unwrap();

    let outcome = engine.answer("a question", "s1", &store).await.unwrap();
    assert_eq!(outcome.answer, "the answer");
}

#[tokio::test]
async fn test_blank_inputs_are_rejected() {
    let engine = build_engine(Arc::new(RecordingLlm::new(&[])));
    let store = SqliteHistoryStore::in_memory().unwrap();

    for (question, session) in [("", "s1"), ("   ", "s1"), ("fine", ""), ("fine", "  ")] {
        let err = engine.answer(question, session, &store).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

#[tokio::test]
async fn test_empty_completion_is_a_generation_error() {
    let engine = build_engine(Arc::new(RecordingLlm::new(&["   "])));
    let store = SqliteHistoryStore::in_memory().unwrap();

    engine.ingest(&sample_document()).await.unwrap();

    let err = engine.answer("a question", "s1", &store).await.unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));
    assert!(store.query_recent("s1", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_document_ingests_zero_chunks() {
    let engine = build_engine(Arc::new(RecordingLlm::new(&[])));

    let document = Document {
        name: "empty.txt".to_string(),
        pages: vec![String::new()],
    };
    assert_eq!(engine.ingest(&document).await.unwrap(), 0);
}

#[tokio::test]
async fn test_streamed_answer_accumulates_chunks_and_persists_one_turn() {
    let engine = build_engine(Arc::new(RecordingLlm::new(&[
        "The rotation happens every fourteen days.",
    ])));
    let store = SqliteHistoryStore::in_memory().unwrap();

    engine.ingest(&sample_document()).await.unwrap();

    let mut seen = Vec::new();
    let mut collect = |chunk: &str| seen.push(chunk.to_string());
    let outcome = engine
        .answer_stream("how often is the rotation", "s1", &store, &mut collect)
        .await
        .unwrap();

    // Multiple chunks arrived and their concatenation is the answer
    assert!(seen.len() > 1);
    assert_eq!(seen.concat().trim(), outcome.answer);
    assert_eq!(outcome.answer, "The rotation happens every fourteen days.");

    let turns = store.query_recent("s1", 10).unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].answer, outcome.answer);
}

#[tokio::test]
async fn test_stream_failure_persists_no_turn() {
    let engine = build_engine(Arc::new(FailingLlm));
    let store = SqliteHistoryStore::in_memory().unwrap();

    engine.ingest(&sample_document()).await.unwrap();

    let mut sink = |_: &str| {};
    let err = engine
        .answer_stream("anything", "s1", &store, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));
    assert!(store.query_recent("s1", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_question_without_ingested_documents_still_answers() {
    let llm = Arc::new(RecordingLlm::new(&["I cannot find that in the context."]));
    let engine = build_engine(llm.clone());
    let store = SqliteHistoryStore::in_memory().unwrap();

    let outcome = engine.answer("anything at all", "s1", &store).await.unwrap();
    assert_eq!(outcome.answer, "I cannot find that in the context.");

    // Context section is present but empty.
    let prompts = llm.recorded_prompts();
    assert!(prompts[0].contains("Context: \n"));
}
