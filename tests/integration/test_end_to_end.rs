//! Full pipeline: CSV sheet -> chunks -> hashing embedder -> index -> context.

use crate::common::{HEADER_ONLY_SHEET, TestWorkspace, ct_scanner, hash_settings};
use fmea_rag::{
    IndexKind, KnowledgeBase, KnowledgeEngine, NOT_ENOUGH_DATA, RetrievalError, RetrievalResult,
};

#[test]
fn test_gantry_motor_lookup() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();

    let result = engine.retrieve_with("Gantry Motor", 3, 0.2).unwrap();
    let chunks = result.chunks();
    assert!(!chunks.is_empty());
    assert!(chunks.len() <= 3);
    assert!(
        chunks[0].text.contains("bearing seizure"),
        "top chunk was: {}",
        chunks[0].text
    );
    assert_eq!(chunks[0].document, 0);
}

#[test]
fn test_unrelated_query_yields_sentinel() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();

    let result = engine
        .retrieve_with("Quantum Flux Capacitor", 3, 0.9)
        .unwrap();
    assert_eq!(result, RetrievalResult::NotEnoughData);
    assert_eq!(result.texts(), vec![NOT_ENOUGH_DATA]);
}

#[test]
fn test_unreachable_threshold_always_sentinel() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();

    for query in ["Gantry Motor", "X-ray Tube", "anode cracking", ""] {
        let result = engine.retrieve_with(query, 5, 1.1).unwrap();
        assert!(
            result.is_not_enough_data(),
            "query {query:?} cleared an unreachable threshold"
        );
    }
}

#[test]
fn test_relevance_ordering_and_bounds() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();

    let result = engine
        .retrieve_with("detector temperature calibration", 5, 0.0)
        .unwrap();
    let chunks = result.chunks();
    assert_eq!(chunks.len(), 5);
    for pair in chunks.windows(2) {
        assert!(pair[0].relevance.get() >= pair[1].relevance.get());
    }
    for chunk in chunks {
        let relevance = chunk.relevance.get();
        assert!(relevance > 0.0 && relevance <= 1.0);
        assert!((relevance - 1.0 / (1.0 + chunk.distance)).abs() < 1e-6);
    }
    assert_eq!(chunks[0].document, 2);
}

#[test]
fn test_default_policy_constants() {
    let (_workspace, settings) = ct_scanner();
    assert_eq!(settings.retrieval.k, 3);
    assert_eq!(settings.retrieval.threshold, 0.25);

    let engine = KnowledgeEngine::initialize(&settings).unwrap();
    let result = engine.retrieve("Gantry Motor").unwrap();
    assert!(result.chunks().len() <= 3);
    assert!(result.chunks().iter().all(|c| c.relevance.get() >= 0.25));
}

#[test]
fn test_threshold_is_tunable() {
    let (_workspace, mut settings) = ct_scanner();
    settings.retrieval.threshold = 0.99;
    let engine = KnowledgeEngine::initialize(&settings).unwrap();

    let strict = engine.retrieve("Gantry Motor").unwrap();
    assert!(strict.is_not_enough_data());
    let relaxed = engine.retrieve_with("Gantry Motor", 3, 0.2).unwrap();
    assert!(!relaxed.is_not_enough_data());
}

#[test]
fn test_retrieve_is_idempotent() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();

    let first = engine.retrieve_with("x-ray tube overload", 3, 0.0).unwrap();
    let second = engine.retrieve_with("x-ray tube overload", 3, 0.0).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_context_for_gantry_motor() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();

    let input = engine.context_for("Gantry Motor").unwrap();
    assert_eq!(input.query, "Gantry Motor");
    assert!(input.has_evidence());
    assert!(input.context.starts_with("Item/Function: Gantry Motor"));
    let separator = settings.retrieval.separator.as_str();
    let retrieved = engine.retrieve("Gantry Motor").unwrap();
    assert_eq!(
        input.context.split(separator).count(),
        retrieved.chunks().len()
    );
}

#[test]
fn test_empty_knowledge_base_yields_sentinel() {
    let workspace = TestWorkspace::new();
    let csv = workspace.add_file("empty.csv", HEADER_ONLY_SHEET);
    let engine = KnowledgeEngine::initialize(&hash_settings(&csv)).unwrap();

    assert_eq!(engine.stats().chunks, 0);
    let input = engine.context_for("Gantry Motor").unwrap();
    assert_eq!(input.context, NOT_ENOUGH_DATA);
    assert!(!input.has_evidence());
}

#[test]
fn test_ivf_index_end_to_end() {
    let (_workspace, mut settings) = ct_scanner();
    settings.index.kind = IndexKind::IvfFlat;
    settings.index.search_cells = 1;
    let engine = KnowledgeEngine::initialize(&settings).unwrap();
    assert_eq!(engine.stats().index_kind, IndexKind::IvfFlat);

    // The record's own wording always lands in its own cell
    let own_text = engine.snapshot().corpus().chunks()[0].text.clone();
    let result = engine.retrieve_with(&own_text, 1, 1.0).unwrap();
    assert!(result.texts()[0].contains("bearing seizure"));
}

#[test]
fn test_rebuild_with_new_sheet() {
    let (_workspace, settings) = ct_scanner();
    let engine = KnowledgeEngine::initialize(&settings).unwrap();
    assert_eq!(engine.stats().records, 5);

    let smaller = KnowledgeBase::from_reader(
        "Item/Function,Failure Mode,Effects of Failure,Potential Cause(s),Recommended Actions\n\
         Collimator,blade jam,Unshaped beam,Debris in the guide rail,Blade travel check\n"
            .as_bytes(),
        "inline.csv",
    )
    .unwrap();
    engine.rebuild(smaller).unwrap();

    assert_eq!(engine.stats().records, 1);
    let result = engine.retrieve_with("Gantry Motor", 3, 0.0).unwrap();
    assert!(result.texts()[0].contains("blade jam"));
}

#[test]
fn test_missing_knowledge_file() {
    let workspace = TestWorkspace::new();
    let settings = hash_settings(&workspace.path().join("absent.csv"));
    let err = KnowledgeEngine::initialize(&settings).unwrap_err();
    assert_eq!(err.status_code(), "FILE_READ_ERROR");
}

#[test]
fn test_missing_column_is_fatal() {
    let workspace = TestWorkspace::new();
    let csv = workspace.add_file(
        "partial.csv",
        "Item/Function,Failure Mode,Effects of Failure\nGantry Motor,bearing seizure,stop\n",
    );
    let err = KnowledgeEngine::initialize(&hash_settings(&csv)).unwrap_err();
    assert!(matches!(err, RetrievalError::Knowledge(_)));
    assert_eq!(err.status_code(), "MISSING_COLUMN");
}
