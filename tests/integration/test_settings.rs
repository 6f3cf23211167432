//! Settings files feeding the engine.

use crate::common::{CT_SCANNER_SHEET, TestWorkspace};
use fmea_rag::{IndexKind, KnowledgeEngine, RetrievalError, Settings};

#[test]
fn test_engine_from_settings_file() {
    let workspace = TestWorkspace::new();
    let csv = workspace.add_file("data/ct_scanner.csv", CT_SCANNER_SHEET);
    let config = workspace.add_file(
        ".fmea/settings.toml",
        &format!(
            r#"
[knowledge]
path = "{}"

[embedding]
model = "hash"
hash_dimension = 128

[index]
kind = "ivf_flat"
clusters = 2

[retrieval]
k = 2
threshold = 0.3
"#,
            csv.display()
        ),
    );

    let settings = Settings::load_from(&config).unwrap();
    assert_eq!(settings.index.kind, IndexKind::IvfFlat);
    assert_eq!(settings.retrieval.separator, "\n---\n");

    let engine = KnowledgeEngine::initialize(&settings).unwrap();
    let stats = engine.stats();
    assert_eq!(stats.records, 5);
    assert_eq!(stats.dimension, 128);
    assert_eq!(stats.embedding_model, "hash");

    let result = engine.retrieve("Gantry Motor").unwrap();
    assert!(result.chunks().len() <= 2);
}

#[test]
fn test_template_round_trips() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join(".fmea").join("settings.toml");
    Settings::write_template(&path, false).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, Settings::default());
}

#[test]
fn test_invalid_chunking_fails_before_loading() {
    let workspace = TestWorkspace::new();
    let mut settings = Settings::default();
    settings.embedding.model = "hash".to_string();
    settings.knowledge.path = workspace.path().join("never-read.csv");
    settings.chunking.chunk_size = 16;
    settings.chunking.overlap = 16;

    let err = KnowledgeEngine::initialize(&settings).unwrap_err();
    assert!(matches!(err, RetrievalError::Configuration { .. }));
    assert_eq!(err.status_code(), "CONFIG_ERROR");
}

#[test]
fn test_unknown_embedding_model() {
    let workspace = TestWorkspace::new();
    let csv = workspace.add_file("fmea.csv", CT_SCANNER_SHEET);
    let mut settings = Settings::default();
    settings.embedding.model = "NotARealModel".to_string();
    settings.knowledge.path = csv;

    let err = KnowledgeEngine::initialize(&settings).unwrap_err();
    assert_eq!(err.status_code(), "EMBEDDING_ERROR");
}
