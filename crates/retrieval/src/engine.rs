//! Retrieval-augmented question answering engine.

use crate::chunker::Chunker;
use crate::context::ContextBuilder;
use crate::document::Document;
use crate::embeddings::EmbeddingProvider;
use crate::index::{IndexedDocument, Metric, VectorIndex};
use crate::rerank::Reranker;
use docqa_core::config::RetrievalConfig;
use docqa_core::{AppError, AppResult};
use docqa_history::HistoryStore;
use docqa_llm::{LlmClient, LlmRequest};
use futures::StreamExt;
use std::sync::Arc;

const GENERATION_TEMPERATURE: f32 = 0.3;
const MAX_ANSWER_TOKENS: u32 = 1000;

/// The result of answering a question.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub session_id: String,
}

/// Ties the ingestion and query pipelines together over explicit,
/// injected resources. Callers own the index, embedder, and LLM client
/// and decide their lifetimes; the engine holds shared handles.
pub struct RagEngine {
    settings: RetrievalConfig,
    model: String,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LlmClient>,
    reranker: Reranker,
    context: ContextBuilder,
}

impl RagEngine {
    /// Build an engine and ensure its collection exists.
    ///
    /// Fails up front on invalid chunking parameters or a collection
    /// whose recorded dimensionality disagrees with the embedder.
    pub fn new(
        settings: RetrievalConfig,
        model: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmClient>,
    ) -> AppResult<Self> {
        let chunker = Chunker::new(settings.chunk_size, settings.chunk_overlap)?;
        index.ensure_collection(&settings.collection, embedder.dimensions(), Metric::Cosine)?;

        let reranker = Reranker::new(Arc::clone(&embedder));
        let context = ContextBuilder::new(settings.history_window);

        Ok(Self {
            settings,
            model: model.into(),
            chunker,
            embedder,
            index,
            llm,
            reranker,
            context,
        })
    }

    /// Ingest a document: chunk, embed, and add to the index.
    ///
    /// Returns the number of chunks stored. A document with no
    /// extractable text ingests zero chunks and is not an error.
    pub async fn ingest(&self, document: &Document) -> AppResult<usize> {
        let chunks = self.chunker.split(document);
        if chunks.is_empty() {
            tracing::info!(source = %document.name, "Document produced no chunks");
            return Ok(0);
        }

        tracing::info!(
            source = %document.name,
            chunk_count = chunks.len(),
            "Embedding document chunks"
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let documents: Vec<IndexedDocument> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedDocument { chunk, embedding })
            .collect();

        let count = documents.len();
        self.index.insert(&self.settings.collection, &documents)?;

        tracing::info!(source = %document.name, count, "Document ingested");
        Ok(count)
    }

    /// Answer a question within a conversation session.
    ///
    /// Runs the full retrieval pipeline and persists the resulting
    /// question/answer turn. A persistence failure after a successful
    /// generation is logged but does not discard the answer.
    pub async fn answer(
        &self,
        question: &str,
        session_id: &str,
        store: &dyn HistoryStore,
    ) -> AppResult<AnswerOutcome> {
        let question = question.trim();
        let session_id = session_id.trim();
        let prompt = self.assemble_prompt(question, session_id, store).await?;

        let request = LlmRequest::new(prompt, &self.model)
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(MAX_ANSWER_TOKENS);

        let response = self.llm.complete(&request).await?;
        self.finish(question, session_id, response.content.trim().to_string(), store)
    }

    /// Answer a question, forwarding generated text to `on_chunk` as it
    /// arrives.
    ///
    /// Final-answer semantics match [`answer`](Self::answer): the full
    /// accumulated text is validated and persisted as one turn, and a
    /// stream failure aborts without writing anything.
    pub async fn answer_stream(
        &self,
        question: &str,
        session_id: &str,
        store: &dyn HistoryStore,
        on_chunk: &mut dyn FnMut(&str),
    ) -> AppResult<AnswerOutcome> {
        let question = question.trim();
        let session_id = session_id.trim();
        let prompt = self.assemble_prompt(question, session_id, store).await?;

        let request = LlmRequest::new(prompt, &self.model)
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(MAX_ANSWER_TOKENS)
            .with_streaming();

        let mut stream = self.llm.stream(&request).await?;
        let mut answer = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if !chunk.content.is_empty() {
                on_chunk(&chunk.content);
                answer.push_str(&chunk.content);
            }
        }

        self.finish(question, session_id, answer.trim().to_string(), store)
    }

    /// Validate inputs, run retrieval, and assemble the generation prompt.
    async fn assemble_prompt(
        &self,
        question: &str,
        session_id: &str,
        store: &dyn HistoryStore,
    ) -> AppResult<String> {
        if question.is_empty() {
            return Err(AppError::Validation("Question must not be empty".to_string()));
        }
        if session_id.is_empty() {
            return Err(AppError::Validation(
                "Session id must not be empty".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed(question).await?;
        let hits = self.index.search(
            &self.settings.collection,
            &query_embedding,
            self.settings.top_k,
        )?;

        tracing::debug!(
            retrieved = hits.len(),
            top_k = self.settings.top_k,
            "Retrieved candidate chunks"
        );

        let candidates: Vec<_> = hits.into_iter().map(|hit| hit.chunk).collect();
        let mut reranked = self.reranker.score_and_sort(question, candidates).await;
        reranked.truncate(self.settings.top_n);

        let doc_context = reranked
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let chat_history = self.context.build(session_id, store)?;

        Ok(build_prompt(&doc_context, &chat_history, question))
    }

    /// Validate the generated answer and persist the completed turn.
    fn finish(
        &self,
        question: &str,
        session_id: &str,
        answer: String,
        store: &dyn HistoryStore,
    ) -> AppResult<AnswerOutcome> {
        if answer.is_empty() {
            return Err(AppError::Generation(
                "Model returned an empty answer".to_string(),
            ));
        }

        if let Err(e) = store.append(session_id, question, &answer) {
            tracing::error!(
                session_id,
                error = %e,
                "Failed to persist chat turn, answer is returned but not recorded"
            );
        }

        Ok(AnswerOutcome {
            answer,
            session_id: session_id.to_string(),
        })
    }
}

fn build_prompt(doc_context: &str, chat_history: &str, question: &str) -> String {
    format!(
        "Based on the following context and chat history, provide a relevant and accurate answer.\n\
         If the answer cannot be found in the context, say so.\n\
         \n\
         Context: {doc_context}\n\
         \n\
         Previous conversation:\n\
         {chat_history}\n\
         \n\
         Question: {question}"
    )
}
