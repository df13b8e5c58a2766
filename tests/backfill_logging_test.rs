//! Logging of a backfill run configured from a TOML file
//!
//! Kept in its own test binary: it installs the global subscriber.

use std::io::Write;
use std::sync::Arc;
use storefeed::adapters::api::DryRunTransport;
use storefeed::adapters::database::PipelineStorage;
use storefeed::adapters::memory::{InMemoryStorage, InMemoryStore, ENTITY_ID_FIELD};
use storefeed::adapters::source::NoSession;
use storefeed::config::load_config;
use storefeed::core::export::{
    AttemptTracker, BackfillSettings, EventAssembler, HistoricalBackfillJob,
};
use storefeed::core::mapping::{EmbeddedMappingSource, FieldMapper, InMemoryMappingCache};
use storefeed::domain::{RawRecord, StoreId, WebsiteId};
use storefeed::logging::{init_logging_from_config, LOG_FILE_NAME};
use tempfile::{NamedTempFile, TempDir};

#[tokio::test]
async fn test_configured_log_file_receives_phase_events() {
    std::env::remove_var("RUST_LOG");
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let toml_content = format!(
        r#"
[application]
log_level = "info"

[api]
endpoint = "https://events.example.com/v1/batch"
token = "token"

[export]
batch_size = 10
elements = ["product"]

[postgresql]
connection_string = "postgresql://shop:pw@localhost:5432/shop"

[logging]
local_enabled = true
local_path = "{}"
local_rotation = "never"
"#,
        log_path.to_string_lossy()
    );
    let mut config_file = NamedTempFile::new().unwrap();
    config_file.write_all(toml_content.as_bytes()).unwrap();
    config_file.flush().unwrap();

    let config = load_config(config_file.path()).expect("Failed to load config");
    let guard = init_logging_from_config(None, &config).expect("Failed to initialize logging");
    assert!(guard.has_file_sink());

    let store = StoreId::new(1);
    let shop = Arc::new(
        InMemoryStore::new()
            .with_store(store, WebsiteId::new(1), "Main Store")
            .with_records(
                "product",
                store,
                vec![RawRecord::new()
                    .with(ENTITY_ID_FIELD, 20)
                    .with("sku", "A")
                    .with("created_at", "2013-01-01 00:00:00")],
            ),
    );
    let mapper = Arc::new(FieldMapper::new(
        Arc::new(EmbeddedMappingSource),
        Arc::new(InMemoryMappingCache::new()),
    ));
    let assembler = EventAssembler::new(
        mapper,
        shop.clone(),
        shop.clone(),
        shop.clone(),
        Arc::new(NoSession),
    );
    let storage = PipelineStorage::from_backend(Arc::new(InMemoryStorage::new()));
    let tracker = AttemptTracker::new(Arc::new(DryRunTransport), storage.attempts.clone());
    let job = HistoricalBackfillJob::new(
        BackfillSettings::from_config(&config),
        shop.clone(),
        shop,
        assembler,
        storage,
        tracker,
    );

    let summary = job.perform(store, false).await;
    assert!(summary.is_successful(), "run failed: {:?}", summary.error);

    // Dropping the guard flushes the non-blocking writer
    drop(guard);

    let contents: String = std::fs::read_dir(&log_path)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_NAME))
        .map(|entry| std::fs::read_to_string(entry.path()).unwrap())
        .collect();

    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("log line is JSON"))
        .collect();

    for phase in ["convert", "batch", "send"] {
        assert!(
            lines
                .iter()
                .any(|l| l["fields"]["phase"] == phase && l["fields"]["website_id"] == "1"),
            "no log line for phase {phase}"
        );
    }
}
