//! Integration tests for the historical backfill job
//!
//! These tests run the whole convert, batch and send pipeline against
//! in-memory store data and storage, with scripted transports standing in
//! for the ingestion API.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefeed::adapters::api::{ApiTransport, TransportResponse};
use storefeed::adapters::database::{PipelineStorage, QueueStorage, StateStorage};
use storefeed::adapters::memory::{InMemoryStorage, InMemoryStore, ENTITY_ID_FIELD};
use storefeed::adapters::source::NoSession;
use storefeed::core::export::{
    AttemptTracker, BackfillSettings, EventAssembler, HistoricalBackfillJob, JobSummary,
    RetryPolicy,
};
use storefeed::core::mapping::{EmbeddedMappingSource, FieldMapper, InMemoryMappingCache};
use storefeed::core::state::{HistoricalPushStatus, JobPhase, JobRunState, PushStatus};
use storefeed::domain::{RawRecord, StoreId, StorefeedError, TransportError, WebsiteId};

const STORE: StoreId = StoreId::new(1);
const WEBSITE: WebsiteId = WebsiteId::new(1);

/// Ingestion API double: records payloads, answers with queued statuses
/// (then 200), and can be switched off to simulate an outage
struct RecordingTransport {
    statuses: Mutex<VecDeque<u16>>,
    payloads: Mutex<Vec<Value>>,
    down: AtomicBool,
}

impl RecordingTransport {
    fn new() -> Self {
        Self::with_statuses(&[])
    }

    fn with_statuses(statuses: &[u16]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            payloads: Mutex::new(Vec::new()),
            down: AtomicBool::new(false),
        }
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.payloads
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.as_array().map(Vec::len).unwrap_or(0))
            .collect()
    }
}

#[async_trait]
impl ApiTransport for RecordingTransport {
    async fn post_batch(&self, payload: &Value) -> storefeed::domain::Result<TransportResponse> {
        if self.down.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionFailed("connection refused".to_string()).into());
        }
        self.payloads.lock().unwrap().push(payload.clone());
        let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
        Ok(TransportResponse {
            status,
            body: if status == 200 {
                String::new()
            } else {
                format!("{{\"error\":\"status {status}\"}}")
            },
        })
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

fn order(id: u64, created_at: &str) -> RawRecord {
    RawRecord::new()
        .with(ENTITY_ID_FIELD, id)
        .with("increment_id", format!("1000000{id}"))
        .with("grand_total", "19.90")
        .with("created_at", created_at)
        .with("updated_at", created_at)
        .with("customer_email", "guest@example.com")
        .with("customer_firstname", "Gus")
        .with("customer_lastname", "Guest")
        .with("store_id", 1)
}

fn product(id: u64, sku: &str) -> RawRecord {
    RawRecord::new()
        .with(ENTITY_ID_FIELD, id)
        .with("sku", sku)
        .with("name", format!("Product {sku}"))
        .with("price", "5.00")
        .with("created_at", "2013-01-01 00:00:00")
        .with("updated_at", "2013-01-02 00:00:00")
}

/// Store 1 (website 1): three orders, the first with two line items, and
/// two products. Five events in total.
fn shop() -> InMemoryStore {
    InMemoryStore::new()
        .with_store(STORE, WEBSITE, "Main Store")
        .with_store(StoreId::new(9), WebsiteId::new(2), "Other Website")
        .with_records(
            "order",
            STORE,
            vec![
                order(1, "2013-03-01 10:00:00"),
                order(2, "2013-03-02 11:00:00"),
                order(3, "2013-03-03 12:00:00"),
            ],
        )
        .with_sub_records(
            "order",
            "items",
            "1",
            vec![
                RawRecord::new().with("item_id", 11).with("sku", "A").with("qty_ordered", "1.0000"),
                RawRecord::new().with("item_id", 12).with("sku", "B").with("qty_ordered", "3.0000"),
            ],
        )
        .with_records("product", STORE, vec![product(20, "A"), product(21, "B")])
}

fn settings(max_retries: usize) -> BackfillSettings {
    BackfillSettings {
        batch_size: 2,
        elements: vec!["order".to_string(), "product".to_string()],
        resume_phases: true,
        max_execution_time: Duration::from_secs(300),
        memory_limit_mb: 256,
        retry: RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        },
    }
}

fn job(
    shop: InMemoryStore,
    backend: &Arc<InMemoryStorage>,
    transport: Arc<RecordingTransport>,
    settings: BackfillSettings,
) -> HistoricalBackfillJob {
    let storage = PipelineStorage::from_backend(backend.clone());
    job_with_storage(shop, storage, transport, settings)
}

fn job_with_storage(
    shop: InMemoryStore,
    storage: PipelineStorage,
    transport: Arc<RecordingTransport>,
    settings: BackfillSettings,
) -> HistoricalBackfillJob {
    let shop = Arc::new(shop);
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
    let tracker = AttemptTracker::new(transport, storage.attempts.clone());

    HistoricalBackfillJob::new(settings, shop.clone(), shop, assembler, storage, tracker)
}

/// State storage that refuses to checkpoint a given phase
struct CheckpointFailingState {
    inner: Arc<InMemoryStorage>,
    refused: JobPhase,
}

#[async_trait]
impl StateStorage for CheckpointFailingState {
    async fn load_run_state(
        &self,
        website_id: WebsiteId,
    ) -> storefeed::domain::Result<Option<JobRunState>> {
        self.inner.load_run_state(website_id).await
    }

    async fn save_run_state(&self, state: &JobRunState) -> storefeed::domain::Result<()> {
        if state.phase == self.refused {
            return Err(StorefeedError::Database("connection reset".to_string()));
        }
        self.inner.save_run_state(state).await
    }

    async fn load_push_status(
        &self,
        website_id: WebsiteId,
    ) -> storefeed::domain::Result<Option<HistoricalPushStatus>> {
        self.inner.load_push_status(website_id).await
    }

    async fn save_push_status(
        &self,
        status: &HistoricalPushStatus,
    ) -> storefeed::domain::Result<()> {
        self.inner.save_push_status(status).await
    }

    async fn list_push_statuses(&self) -> storefeed::domain::Result<Vec<HistoricalPushStatus>> {
        self.inner.list_push_statuses().await
    }
}

async fn push_status(backend: &InMemoryStorage) -> Option<PushStatus> {
    backend
        .load_push_status(WEBSITE)
        .await
        .unwrap()
        .map(|s| s.status)
}

async fn recorded_phase(backend: &InMemoryStorage) -> Option<JobPhase> {
    backend
        .load_run_state(WEBSITE)
        .await
        .unwrap()
        .map(|s| s.phase)
}

fn assert_completed(summary: &JobSummary) {
    assert!(summary.is_successful(), "run failed: {:?}", summary.error);
    assert_eq!(summary.status, PushStatus::Complete);
}

#[tokio::test]
async fn test_full_backfill_pushes_every_record_in_order() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    let job = job(shop(), &backend, transport.clone(), settings(3));

    let summary = job.perform(STORE, false).await;

    assert_completed(&summary);
    assert_eq!(summary.website_id, Some(WEBSITE));
    assert_eq!(summary.started_at, Some(JobPhase::Convert));
    assert_eq!(
        summary.completed_phases,
        vec![JobPhase::Convert, JobPhase::Batch, JobPhase::Send]
    );
    assert_eq!(summary.events_queued, 5);
    assert_eq!(summary.batches_built, 3);
    assert_eq!(summary.batches_sent, 3);
    assert_eq!(summary.attempts, 3);
    assert_eq!(summary.rejected_attempts, 0);

    assert_eq!(transport.batch_sizes(), vec![2, 2, 1]);
    let payloads = transport.payloads.lock().unwrap().clone();
    let first = &payloads[0][0];
    assert_eq!(first["order_number"], "10000001");
    assert_eq!(first["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(first["customer"]["email"], "guest@example.com");
    assert_eq!(first["catalog"]["name"], "Main Store");
    assert_eq!(payloads[2][0]["code"], "B");

    assert_eq!(push_status(&backend).await, Some(PushStatus::Complete));
    assert_eq!(recorded_phase(&backend).await, Some(JobPhase::Complete));
    assert!(backend.all_errors().is_empty());

    let pending = backend.pending_counts(WEBSITE).await.unwrap();
    assert_eq!(pending.unbatched_events, 0);
    assert_eq!(pending.unsent_batches, 0);
}

#[tokio::test]
async fn test_completed_website_is_skipped_unless_forced() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    let job = job(shop(), &backend, transport.clone(), settings(0));

    assert_completed(&job.perform(STORE, false).await);

    let skipped = job.perform(STORE, false).await;
    assert!(skipped.skipped);
    assert!(skipped.is_successful());
    assert_eq!(skipped.status, PushStatus::Complete);
    assert_eq!(transport.batch_sizes().len(), 3);

    let forced = job.perform(STORE, true).await;
    assert_completed(&forced);
    assert!(!forced.skipped);
    assert_eq!(forced.events_queued, 5);
    assert_eq!(transport.batch_sizes().len(), 6);
}

#[tokio::test]
async fn test_transport_outage_halts_send_and_resume_finishes() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    transport.set_down(true);

    let failed = job(shop(), &backend, transport.clone(), settings(3))
        .perform(STORE, false)
        .await;

    let error = failed.error.clone().expect("outage should halt the run");
    assert_eq!(error.phase, Some(JobPhase::Send));
    assert_eq!(error.category, "TRANSPORT");
    assert!(failed.failed_on_transport());
    assert_eq!(failed.completed_phases, vec![JobPhase::Convert, JobPhase::Batch]);
    assert!(backend.all_attempts().is_empty());
    assert_eq!(push_status(&backend).await, Some(PushStatus::Failed));
    assert_eq!(recorded_phase(&backend).await, Some(JobPhase::Send));

    transport.set_down(false);
    let resumed = job(shop(), &backend, transport.clone(), settings(3))
        .perform(STORE, false)
        .await;

    assert_completed(&resumed);
    assert_eq!(resumed.started_at, Some(JobPhase::Send));
    assert_eq!(resumed.completed_phases, vec![JobPhase::Send]);
    assert_eq!(resumed.events_queued, 0);
    assert_eq!(resumed.batches_sent, 3);
    assert_eq!(transport.batch_sizes(), vec![2, 2, 1]);
}

#[tokio::test]
async fn test_restart_without_resume_rebuilds_from_convert() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    transport.set_down(true);
    let failed = job(shop(), &backend, transport.clone(), settings(0))
        .perform(STORE, false)
        .await;
    assert_eq!(backend.batch_count(), 3);
    assert!(!failed.is_successful());

    transport.set_down(false);
    let mut restart = settings(0);
    restart.resume_phases = false;
    let summary = job(shop(), &backend, transport.clone(), restart)
        .perform(STORE, false)
        .await;

    assert_completed(&summary);
    assert_eq!(summary.started_at, Some(JobPhase::Convert));
    // Unsent batches of the failed run were cleared before converting again
    assert_eq!(summary.batches_sent, 3);
    assert_eq!(transport.batch_sizes(), vec![2, 2, 1]);
}

#[tokio::test]
async fn test_rejected_batches_are_retried_then_completed() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::with_statuses(&[500, 500]));
    let summary = job(shop(), &backend, transport.clone(), settings(1))
        .perform(STORE, false)
        .await;

    assert_completed(&summary);
    assert_eq!(summary.batches_sent, 3);
    // batch 1: 500, 500 (gives up); batch 2: 200; batch 3: 200
    assert_eq!(summary.attempts, 4);
    assert_eq!(summary.rejected_attempts, 2);
    assert_eq!(backend.all_errors().len(), 2);
    assert_eq!(backend.all_attempts().len(), 4);

    let pending = backend.pending_counts(WEBSITE).await.unwrap();
    assert_eq!(pending.unsent_batches, 0);
}

#[tokio::test]
async fn test_guest_order_without_timestamps_is_sent() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    let bare = InMemoryStore::new()
        .with_store(STORE, WEBSITE, "Main Store")
        .with_records(
            "order",
            STORE,
            vec![RawRecord::new().with(ENTITY_ID_FIELD, 5)],
        );

    let summary = job(bare, &backend, transport.clone(), settings(0))
        .perform(STORE, false)
        .await;

    assert_completed(&summary);
    assert_eq!(summary.events_queued, 1);
    assert_eq!(transport.batch_sizes(), vec![1]);

    let payloads = transport.payloads.lock().unwrap();
    let customer = &payloads[0][0]["customer"];
    assert_eq!(customer["id"], 0);
    assert_eq!(customer["first_name"], "GUEST");
    assert_eq!(customer["create_date"], "");
    assert_eq!(customer["change_date"], "");
}

#[tokio::test]
async fn test_unparsable_date_fails_convert() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    let broken = InMemoryStore::new()
        .with_store(STORE, WEBSITE, "Main Store")
        .with_records(
            "order",
            STORE,
            vec![RawRecord::new()
                .with(ENTITY_ID_FIELD, 5)
                .with("created_at", "yesterday")],
        );

    let summary = job(broken, &backend, transport.clone(), settings(0))
        .perform(STORE, false)
        .await;

    let error = summary.error.expect("convert should fail");
    assert_eq!(error.phase, Some(JobPhase::Convert));
    assert_eq!(error.category, "FORMATTING");
    assert!(summary.completed_phases.is_empty());
    assert_eq!(push_status(&backend).await, Some(PushStatus::Failed));
    assert_eq!(recorded_phase(&backend).await, Some(JobPhase::Convert));
    assert!(transport.batch_sizes().is_empty());
}

#[tokio::test]
async fn test_failed_checkpoint_marks_website_failed() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    let storage = PipelineStorage {
        state: Arc::new(CheckpointFailingState {
            inner: backend.clone(),
            refused: JobPhase::Batch,
        }),
        queue: backend.clone(),
        attempts: backend.clone(),
    };

    let summary = job_with_storage(shop(), storage, transport.clone(), settings(0))
        .perform(STORE, false)
        .await;

    let error = summary.error.expect("checkpoint should fail");
    assert_eq!(error.phase, Some(JobPhase::Convert));
    assert_eq!(error.category, "DATABASE");
    assert_eq!(summary.status, PushStatus::Failed);
    assert!(summary.completed_phases.is_empty());
    assert_eq!(push_status(&backend).await, Some(PushStatus::Failed));
    assert_eq!(recorded_phase(&backend).await, Some(JobPhase::Convert));
    assert!(transport.batch_sizes().is_empty());
}

#[tokio::test]
async fn test_unknown_store_is_reported() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());

    let summary = job(shop(), &backend, transport, settings(0))
        .perform(StoreId::new(404), false)
        .await;

    let error = summary.error.expect("unknown store should fail");
    assert_eq!(error.phase, None);
    assert_eq!(error.category, "VALIDATION");
    assert_eq!(summary.website_id, None);
    assert!(backend.list_push_statuses().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_the_stores_website_is_pushed() {
    let backend = Arc::new(InMemoryStorage::new());
    let transport = Arc::new(RecordingTransport::new());
    let shop = shop().with_records("order", StoreId::new(9), vec![order(90, "2013-04-01 00:00:00")]);

    let summary = job(shop, &backend, transport, settings(0))
        .perform(StoreId::new(9), false)
        .await;

    assert_completed(&summary);
    assert_eq!(summary.website_id, Some(WebsiteId::new(2)));
    assert_eq!(summary.events_queued, 1);
    assert_eq!(push_status(&backend).await, None);
}
