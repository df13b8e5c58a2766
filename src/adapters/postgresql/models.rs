//! PostgreSQL row models
//!
//! Column-level representations of the pipeline tables and their
//! conversions to and from the domain types. Integer columns are signed in
//! PostgreSQL; out-of-range values are reported as database errors.

use crate::core::export::batch::Batch;
use crate::core::state::{HistoricalPushStatus, JobPhase, JobRunState, PushStatus};
use crate::domain::{
    Attempt, AttemptId, BatchError, BatchId, NormalizedEvent, Result, StoreId, StorefeedError,
    WebsiteId,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::str::FromStr;
use tokio_postgres::Row;
use uuid::Uuid;

pub(crate) fn website_param(website_id: WebsiteId) -> Result<i32> {
    i32::try_from(website_id.value())
        .map_err(|_| StorefeedError::Database(format!("website id {website_id} out of range")))
}

pub(crate) fn store_param(store_id: StoreId) -> Result<i32> {
    i32::try_from(store_id.value())
        .map_err(|_| StorefeedError::Database(format!("store id {store_id} out of range")))
}

fn website_column(value: i32) -> Result<WebsiteId> {
    u32::try_from(value)
        .map(WebsiteId::new)
        .map_err(|_| StorefeedError::Database(format!("negative website id {value}")))
}

/// Row of `storefeed_job_state`
#[derive(Debug, Clone)]
pub struct PostgreSQLRunState {
    pub website_id: i32,
    pub store_ids: Value,
    pub phase: String,
    pub updated_at: DateTime<Utc>,
}

impl PostgreSQLRunState {
    pub fn from_domain(state: &JobRunState) -> Result<Self> {
        Ok(Self {
            website_id: website_param(state.website_id)?,
            store_ids: serde_json::to_value(&state.store_ids)?,
            phase: state.phase.as_str().to_string(),
            updated_at: state.updated_at,
        })
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            website_id: row.get("website_id"),
            store_ids: row.get("store_ids"),
            phase: row.get("phase"),
            updated_at: row.get("updated_at"),
        }
    }

    pub fn to_domain(&self) -> Result<JobRunState> {
        Ok(JobRunState {
            website_id: website_column(self.website_id)?,
            store_ids: serde_json::from_value(self.store_ids.clone())?,
            phase: JobPhase::from_str(&self.phase)?,
            updated_at: self.updated_at,
        })
    }
}

/// Row of `storefeed_push_status`
#[derive(Debug, Clone)]
pub struct PostgreSQLPushStatus {
    pub website_id: i32,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl PostgreSQLPushStatus {
    pub fn from_domain(status: &HistoricalPushStatus) -> Result<Self> {
        Ok(Self {
            website_id: website_param(status.website_id)?,
            status: status.status.as_str().to_string(),
            updated_at: status.updated_at,
        })
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            website_id: row.get("website_id"),
            status: row.get("status"),
            updated_at: row.get("updated_at"),
        }
    }

    pub fn to_domain(&self) -> Result<HistoricalPushStatus> {
        Ok(HistoricalPushStatus {
            website_id: website_column(self.website_id)?,
            status: PushStatus::from_str(&self.status)?,
            updated_at: self.updated_at,
        })
    }
}

/// Row of `storefeed_batch`
#[derive(Debug, Clone)]
pub struct PostgreSQLBatch {
    pub id: Uuid,
    pub events: Value,
    pub created_at: DateTime<Utc>,
}

impl PostgreSQLBatch {
    pub fn from_domain(batch: &Batch) -> Result<Self> {
        Ok(Self {
            id: *batch.id.as_uuid(),
            events: serde_json::to_value(&batch.events)?,
            created_at: batch.created_at,
        })
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            events: row.get("events"),
            created_at: row.get("created_at"),
        }
    }

    pub fn to_domain(&self) -> Result<Batch> {
        let events: Vec<NormalizedEvent> = serde_json::from_value(self.events.clone())?;
        Ok(Batch {
            id: BatchId::from_uuid(self.id),
            events,
            created_at: self.created_at,
        })
    }
}

/// Row of `storefeed_batch_attempt`
#[derive(Debug, Clone)]
pub struct PostgreSQLAttempt {
    pub id: i64,
    pub batch_id: Uuid,
    pub http_code: i32,
    pub total_time: f64,
    pub created_dt: DateTime<Utc>,
}

impl PostgreSQLAttempt {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            batch_id: row.get("batch_id"),
            http_code: row.get("http_code"),
            total_time: row.get("total_time"),
            created_dt: row.get("created_dt"),
        }
    }

    pub fn to_domain(&self) -> Result<Attempt> {
        let http_code = u16::try_from(self.http_code).map_err(|_| {
            StorefeedError::Database(format!("invalid http code {}", self.http_code))
        })?;
        Ok(Attempt {
            id: AttemptId::new(self.id),
            batch_id: BatchId::from_uuid(self.batch_id),
            http_code,
            total_time: self.total_time,
            created_dt: self.created_dt,
        })
    }
}

/// Row of `storefeed_batch_error`
pub fn batch_error_from_row(row: &Row) -> BatchError {
    BatchError {
        attempt_id: AttemptId::new(row.get("attempt_id")),
        details: row.get("details"),
        created_dt: row.get("created_dt"),
    }
}
