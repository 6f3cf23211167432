//! Index behavior shared by every implementation, checked through the
//! public API on real chunk vectors.

use crate::common::ct_scanner;
use fmea_rag::{
    ChunkCorpus, ChunkingParams, EmbeddingGenerator, FlatIndex, HashEmbedder, IndexKind,
    IvfFlatIndex, IvfParams, KnowledgeBase, KnowledgeEngine, RetrievalError, Retriever,
    VectorDimension, VectorError, VectorIndex,
};

fn sheet_vectors(chunk_size: usize, overlap: usize) -> (ChunkCorpus, Vec<Vec<f32>>) {
    let (_workspace, settings) = ct_scanner();
    let knowledge = KnowledgeBase::load_csv(&settings.knowledge.path).unwrap();
    let params = ChunkingParams::new(chunk_size, overlap, 2).unwrap();
    let corpus = ChunkCorpus::from_documents(&knowledge.documents(), &params).unwrap();
    let texts: Vec<&str> = corpus.texts().collect();
    let vectors = HashEmbedder::default().generate_embeddings(&texts).unwrap();
    (corpus, vectors)
}

fn assert_self_retrieval(index: &dyn VectorIndex, vectors: &[Vec<f32>]) {
    for (i, vector) in vectors.iter().enumerate() {
        let hits = index.search(vector, 1).unwrap();
        assert_eq!(
            hits[0].chunk.as_index(),
            i,
            "chunk {i} is not its own nearest neighbor"
        );
        assert_eq!(hits[0].distance, 0.0);
    }
}

#[test]
fn test_flat_self_retrieval_on_small_windows() {
    // Small windows give several overlapping chunks per record
    let (corpus, vectors) = sheet_vectors(6, 2);
    assert!(corpus.len() > 5);

    let index = FlatIndex::build(&vectors).unwrap();
    assert_eq!(index.len(), corpus.len());
    assert_self_retrieval(&index, &vectors);
}

#[test]
fn test_ivf_self_retrieval_with_single_cell() {
    let (_corpus, vectors) = sheet_vectors(6, 2);
    let params = IvfParams {
        clusters: Some(4),
        search_cells: 1,
        seed: 7,
    };
    let index = IvfFlatIndex::build(&vectors, params).unwrap();
    assert_eq!(index.cell_count(), 4);
    assert_self_retrieval(&index, &vectors);
}

#[test]
fn test_ivf_all_cells_match_flat() {
    let (_corpus, vectors) = sheet_vectors(6, 2);
    let flat = FlatIndex::build(&vectors).unwrap();
    let ivf = IvfFlatIndex::build(
        &vectors,
        IvfParams {
            clusters: Some(3),
            search_cells: 3,
            seed: 42,
        },
    )
    .unwrap();

    let query = HashEmbedder::default()
        .generate_embeddings(&["tube cooling overload"])
        .unwrap()
        .remove(0);
    let expected = flat.search(&query, 5).unwrap();
    assert_eq!(ivf.search(&query, 5).unwrap(), expected);
}

#[test]
fn test_search_contract_edges() {
    let (_corpus, vectors) = sheet_vectors(128, 32);
    for kind in [IndexKind::Flat, IndexKind::IvfFlat] {
        let index = fmea_rag::vector::build_index(kind, &vectors, IvfParams::default()).unwrap();

        // k larger than the corpus clamps
        let hits = index.search(&vectors[1], 100).unwrap();
        assert!(hits.len() <= vectors.len());
        assert!(hits.windows(2).all(|p| p[0].distance <= p[1].distance));

        assert!(matches!(
            index.search(&vectors[1], 0),
            Err(VectorError::InvalidK(0))
        ));
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(VectorError::DimensionMismatch {
                expected: 384,
                actual: 2
            })
        ));
    }
}

#[test]
fn test_flat_k_clamps_to_corpus() {
    let (_corpus, vectors) = sheet_vectors(128, 32);
    let index = FlatIndex::build(&vectors).unwrap();
    assert_eq!(index.search(&vectors[0], 100).unwrap().len(), 5);
}

#[test]
fn test_empty_index_returns_nothing() {
    for kind in [IndexKind::Flat, IndexKind::IvfFlat] {
        let index = fmea_rag::vector::build_index(kind, &[], IvfParams::default()).unwrap();
        assert!(index.is_empty());
        assert!(index.dimension().is_none());
        assert!(index.search(&[0.5; 384], 3).unwrap().is_empty());
    }
}

#[test]
fn test_ragged_vectors_rejected() {
    let vectors = vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]];
    assert!(matches!(
        FlatIndex::build(&vectors),
        Err(VectorError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_swapped_embedder_is_fatal() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();
    let snapshot = engine.snapshot();

    let narrow = HashEmbedder::new(VectorDimension::new(64).unwrap());
    let retriever = Retriever::new(&narrow, snapshot.index(), snapshot.corpus());
    assert!(matches!(
        retriever.retrieve("Gantry Motor", 3, 0.25),
        Err(RetrievalError::DimensionMismatch {
            expected: 384,
            actual: 64
        })
    ));
}
