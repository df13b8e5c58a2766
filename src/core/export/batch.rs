//! Batch building
//!
//! Events are chunked into fixed-size batches in the order they were queued.
//! Nothing is reordered or deduplicated; only the last batch may be short.

use crate::domain::{BatchId, NormalizedEvent, Result, StorefeedError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered group of events sent in one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub events: Vec<NormalizedEvent>,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// Create a batch with a freshly generated id
    pub fn new(events: Vec<NormalizedEvent>) -> Self {
        Self {
            id: BatchId::generate(),
            events,
            created_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Wire payload: a JSON array of event objects
    pub fn to_payload(&self) -> Value {
        Value::Array(self.events.iter().map(NormalizedEvent::to_payload).collect())
    }
}

/// Chunks events into batches of at most `max_size`
///
/// # Errors
///
/// Returns a validation error if `max_size` is zero.
///
/// # Example
///
/// ```
/// use storefeed::core::export::build_batches;
/// use storefeed::domain::NormalizedEvent;
///
/// let events: Vec<_> = (0..5).map(|_| NormalizedEvent::new("order")).collect();
/// let batches = build_batches(events, 2).unwrap();
///
/// let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
/// assert_eq!(sizes, vec![2, 2, 1]);
/// ```
pub fn build_batches(events: Vec<NormalizedEvent>, max_size: usize) -> Result<Vec<Batch>> {
    if max_size == 0 {
        return Err(StorefeedError::Validation(
            "batch size must be greater than zero".to_string(),
        ));
    }

    let mut batches = Vec::with_capacity(events.len().div_ceil(max_size));
    let mut events = events.into_iter().peekable();
    while events.peek().is_some() {
        batches.push(Batch::new(events.by_ref().take(max_size).collect()));
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, MappedField};
    use serde_json::json;

    fn event(n: i64) -> NormalizedEvent {
        let mut event = NormalizedEvent::new("order");
        event.insert_field("id", MappedField::new("id", FieldValue::Int(n)));
        event
    }

    fn ids(batch: &Batch) -> Vec<i64> {
        batch
            .events
            .iter()
            .map(|e| match e.field("id").unwrap().value {
                FieldValue::Int(n) => n,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_chunks_in_order_with_short_tail() {
        let batches = build_batches((1..=5).map(event).collect(), 2).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(ids(&batches[0]), vec![1, 2]);
        assert_eq!(ids(&batches[1]), vec![3, 4]);
        assert_eq!(ids(&batches[2]), vec![5]);
    }

    #[test]
    fn test_exact_multiple() {
        let batches = build_batches((1..=6).map(event).collect(), 3).unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 3));
    }

    #[test]
    fn test_preserves_count_and_order() {
        let batches = build_batches((1..=101).map(event).collect(), 10).unwrap();
        let flattened: Vec<i64> = batches.iter().flat_map(ids).collect();
        assert_eq!(flattened, (1..=101).collect::<Vec<_>>());
        assert!(batches[..batches.len() - 1].iter().all(|b| b.len() == 10));
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(build_batches(Vec::new(), 10).unwrap().is_empty());
    }

    #[test]
    fn test_zero_size_is_validation_error() {
        let err = build_batches(vec![event(1)], 0).unwrap_err();
        assert!(matches!(err, StorefeedError::Validation(_)));
    }

    #[test]
    fn test_batch_ids_are_unique() {
        let batches = build_batches((1..=4).map(event).collect(), 1).unwrap();
        let mut ids: Vec<_> = batches.iter().map(|b| b.id).collect();
        ids.sort_by_key(|id| id.to_string());
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_payload_is_array_of_events() {
        let batch = Batch::new(vec![event(7), event(8)]);
        assert_eq!(batch.to_payload(), json!([{"id": 7}, {"id": 8}]));
    }
}
