//! Process-wide retrieval state with an explicit lifecycle.
//!
//! [`KnowledgeEngine::initialize`] loads the knowledge base, segments it,
//! embeds every chunk and builds the index before anything can be queried.
//! The built state is an immutable [`KnowledgeSnapshot`]; a rebuild
//! constructs a complete new snapshot and only then swaps it in, so readers
//! never observe a half-built index.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::chunking::{ChunkCorpus, ChunkingParams};
use crate::config::Settings;
use crate::error::EngineResult;
use crate::knowledge::KnowledgeBase;
use crate::retrieval::{GenerationInput, RetrievalResult, Retriever};
use crate::vector::{
    EmbeddingGenerator, IndexKind, VectorIndex, build_index, create_embedder, validate_batch,
};

/// Everything one index generation is built from. Read-only once built.
#[derive(Debug)]
pub struct KnowledgeSnapshot {
    knowledge: KnowledgeBase,
    corpus: ChunkCorpus,
    index: Box<dyn VectorIndex>,
}

impl KnowledgeSnapshot {
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn corpus(&self) -> &ChunkCorpus {
        &self.corpus
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }
}

/// Summary of the live snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub records: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub index_kind: IndexKind,
    pub embedding_model: String,
}

/// Owning handle over the embedder and the current snapshot.
///
/// Queries take a cheap `Arc` clone of the snapshot and run without holding
/// the lock, so they may proceed concurrently with a rebuild.
pub struct KnowledgeEngine {
    settings: Settings,
    chunking: ChunkingParams,
    embedder: Arc<dyn EmbeddingGenerator>,
    snapshot: RwLock<Arc<KnowledgeSnapshot>>,
}

impl std::fmt::Debug for KnowledgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeEngine")
            .field("embedder", &self.embedder.model_name())
            .field("snapshot", &self.snapshot.read())
            .finish()
    }
}

impl KnowledgeEngine {
    /// Builds the engine from settings: validates them, creates the
    /// configured embedder and loads `[knowledge].path`.
    pub fn initialize(settings: &Settings) -> EngineResult<Self> {
        settings.validate()?;
        let embedder = create_embedder(&settings.embedding)?;
        let knowledge = KnowledgeBase::load_csv(&settings.knowledge.path)?;
        Self::with_embedder(settings, knowledge, embedder)
    }

    /// Builds the engine around an already constructed embedder.
    pub fn with_embedder(
        settings: &Settings,
        knowledge: KnowledgeBase,
        embedder: Arc<dyn EmbeddingGenerator>,
    ) -> EngineResult<Self> {
        settings.validate()?;
        let chunking = ChunkingParams::from_config(&settings.chunking)?;
        let snapshot = build_snapshot(settings, &chunking, embedder.as_ref(), knowledge)?;

        Ok(Self {
            settings: settings.clone(),
            chunking,
            embedder,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Replaces the knowledge base.
    ///
    /// The new snapshot is fully built before it becomes visible. On error the
    /// current snapshot stays in place.
    pub fn rebuild(&self, knowledge: KnowledgeBase) -> EngineResult<()> {
        let snapshot = build_snapshot(
            &self.settings,
            &self.chunking,
            self.embedder.as_ref(),
            knowledge,
        )?;
        *self.snapshot.write() = Arc::new(snapshot);
        tracing::info!("Swapped in rebuilt knowledge index");
        Ok(())
    }

    /// The snapshot queries currently run against.
    pub fn snapshot(&self) -> Arc<KnowledgeSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Retrieves with the configured `k` and threshold.
    pub fn retrieve(&self, query: &str) -> EngineResult<RetrievalResult> {
        let retrieval = &self.settings.retrieval;
        self.retrieve_with(query, retrieval.k, retrieval.threshold)
    }

    pub fn retrieve_with(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
    ) -> EngineResult<RetrievalResult> {
        let snapshot = self.snapshot();
        Retriever::new(self.embedder.as_ref(), snapshot.index(), snapshot.corpus())
            .retrieve(query, k, threshold)
    }

    /// Retrieves with the configured defaults and assembles the context.
    pub fn context_for(&self, query: &str) -> EngineResult<GenerationInput> {
        let result = self.retrieve(query)?;
        Ok(GenerationInput::new(
            query,
            &result,
            &self.settings.retrieval.separator,
        ))
    }

    pub fn stats(&self) -> EngineStats {
        let snapshot = self.snapshot();
        EngineStats {
            records: snapshot.knowledge.len(),
            chunks: snapshot.corpus.len(),
            dimension: self.embedder.dimension().get(),
            index_kind: snapshot.index.kind(),
            embedding_model: self.embedder.model_name().to_string(),
        }
    }
}

fn build_snapshot(
    settings: &Settings,
    chunking: &ChunkingParams,
    embedder: &dyn EmbeddingGenerator,
    knowledge: KnowledgeBase,
) -> EngineResult<KnowledgeSnapshot> {
    let start = Instant::now();
    let documents = knowledge.documents();
    let corpus = ChunkCorpus::from_documents(&documents, chunking)?;
    tracing::info!(
        "Segmented {} records into {} chunks",
        documents.len(),
        corpus.len()
    );

    let texts: Vec<&str> = corpus.texts().collect();
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(settings.embedding.batch_size) {
        let embeddings = embedder.generate_embeddings(batch)?;
        validate_batch(embedder.dimension(), batch.len(), &embeddings)?;
        vectors.extend(embeddings);
    }

    let index = build_index(settings.index.kind, &vectors, settings.index.ivf_params())?;
    tracing::info!(
        "Built {} index over {} vectors ({}d) in {:.2?}",
        index.kind(),
        index.len(),
        embedder.dimension(),
        start.elapsed()
    );

    Ok(KnowledgeSnapshot {
        knowledge,
        corpus,
        index,
    })
}
