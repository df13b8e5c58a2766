//! Store records read straight from the shop's PostgreSQL tables
//!
//! Table and column names come from [`SourceConfig`], which only accepts
//! plain SQL identifiers. Rows are fetched whole as JSON (`row_to_json`) and
//! projected onto the requested attributes here, so a mapping that names a
//! column the table lacks yields an empty value instead of a failed query.

use super::traits::{CustomerDirectory, RecordSource, StoreDirectory};
use crate::adapters::postgresql::PostgreSQLClient;
use crate::config::{ElementTableConfig, SourceConfig};
use crate::core::mapping::ElementKey;
use crate::domain::{RawRecord, Result, StoreId, StorefeedError, WebsiteId};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio_postgres::Row;

/// [`RecordSource`], [`StoreDirectory`] and [`CustomerDirectory`] over
/// PostgreSQL
pub struct PostgresRecordSource {
    client: Arc<PostgreSQLClient>,
    config: SourceConfig,
}

impl PostgresRecordSource {
    pub fn new(client: Arc<PostgreSQLClient>, config: SourceConfig) -> Self {
        Self { client, config }
    }

    fn table(&self, key: &ElementKey) -> Result<&ElementTableConfig> {
        self.config.table_for(key).ok_or_else(|| {
            StorefeedError::Configuration(format!("no source table configured for '{key}'"))
        })
    }

    fn id_param(value: u32) -> Result<i32> {
        i32::try_from(value)
            .map_err(|_| StorefeedError::Validation(format!("id {value} out of range")))
    }
}

/// Keep only the requested attributes plus the primary key
fn project(row: &Row, id_column: &str, attributes: &[String]) -> Result<RawRecord> {
    let value: Value = row.get("record");
    let full = RawRecord::from_value(value)
        .ok_or_else(|| StorefeedError::Database("row_to_json returned a non-object".to_string()))?;

    let mut record = RawRecord::new();
    for field in attributes.iter().map(String::as_str).chain([id_column]) {
        if let Some(value) = full.get(field) {
            record.insert(field, value.clone());
        }
    }
    Ok(record)
}

fn select_rows(table: &ElementTableConfig, filter_column: Option<&str>) -> String {
    let filter = filter_column
        .map(|column| format!(" WHERE t.{column} = $1"))
        .unwrap_or_default();
    format!(
        "SELECT row_to_json(t)::jsonb AS record FROM {} t{filter} ORDER BY t.{}",
        table.table, table.id_column
    )
}

#[async_trait]
impl RecordSource for PostgresRecordSource {
    async fn fetch_records(
        &self,
        element: &str,
        store_id: StoreId,
        attributes: &[String],
    ) -> Result<Vec<RawRecord>> {
        let table = self.table(&ElementKey::simple(element))?;

        let rows = match &table.store_column {
            Some(column) => {
                let query = select_rows(table, Some(&format!("{column}::int4")));
                let store = Self::id_param(store_id.value())?;
                self.client.query(&query, &[&store]).await?
            }
            None => self.client.query(&select_rows(table, None), &[]).await?,
        };

        tracing::debug!(
            element,
            store_id = %store_id,
            table = %table.table,
            rows = rows.len(),
            "Fetched store records"
        );

        rows.iter()
            .map(|row| project(row, &table.id_column, attributes))
            .collect()
    }

    async fn fetch_sub_records(
        &self,
        element: &str,
        sub_element: &str,
        parent: &RawRecord,
        attributes: &[String],
    ) -> Result<Vec<RawRecord>> {
        let parent_table = self.table(&ElementKey::simple(element))?;
        let table = self.table(&ElementKey::composite(element, sub_element))?;
        let Some(parent_column) = &table.parent_column else {
            return Err(StorefeedError::Configuration(format!(
                "source table for '{element}|{sub_element}' has no parent_column"
            )));
        };

        let Some(parent_id) = parent.numeric_id(&parent_table.id_column) else {
            tracing::warn!(
                element,
                sub_element,
                id_column = %parent_table.id_column,
                "Parent record has no numeric id, no sub-records fetched"
            );
            return Ok(Vec::new());
        };
        let parent_id = i64::try_from(parent_id)
            .map_err(|_| StorefeedError::Validation(format!("id {parent_id} out of range")))?;

        let query = select_rows(table, Some(&format!("{parent_column}::int8")));
        let rows = self.client.query(&query, &[&parent_id]).await?;

        rows.iter()
            .map(|row| project(row, &table.id_column, attributes))
            .collect()
    }
}

#[async_trait]
impl StoreDirectory for PostgresRecordSource {
    async fn website_for_store(&self, store_id: StoreId) -> Result<Option<WebsiteId>> {
        let store = &self.config.store;
        let query = format!(
            "SELECT {}::int8 AS website_id FROM {} WHERE {}::int4 = $1",
            store.website_column, store.table, store.id_column
        );
        let row = self
            .client
            .query_opt(&query, &[&Self::id_param(store_id.value())?])
            .await?;

        row.map(|row| {
            let website: i64 = row.get("website_id");
            u32::try_from(website)
                .map(WebsiteId::new)
                .map_err(|_| StorefeedError::Database(format!("invalid website id {website}")))
        })
        .transpose()
    }

    async fn store_ids(&self, website_id: WebsiteId) -> Result<Vec<StoreId>> {
        let store = &self.config.store;
        let query = format!(
            "SELECT {id}::int8 AS store_id FROM {table} WHERE {website}::int4 = $1 ORDER BY {id}",
            id = store.id_column,
            table = store.table,
            website = store.website_column
        );
        let rows = self
            .client
            .query(&query, &[&Self::id_param(website_id.value())?])
            .await?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.get("store_id");
                u32::try_from(id)
                    .map(StoreId::new)
                    .map_err(|_| StorefeedError::Database(format!("invalid store id {id}")))
            })
            .collect()
    }

    async fn store_name(&self, store_id: StoreId) -> Result<Option<String>> {
        let store = &self.config.store;
        let query = format!(
            "SELECT {}::text AS name FROM {} WHERE {}::int4 = $1",
            store.name_column, store.table, store.id_column
        );
        let row = self
            .client
            .query_opt(&query, &[&Self::id_param(store_id.value())?])
            .await?;

        Ok(row.map(|row| row.get::<_, Option<String>>("name").unwrap_or_default()))
    }
}

#[async_trait]
impl CustomerDirectory for PostgresRecordSource {
    async fn load_customer(
        &self,
        customer_id: u64,
        attributes: &[String],
    ) -> Result<Option<RawRecord>> {
        let table = self.table(&ElementKey::simple(crate::core::format::CUSTOMER_ELEMENT))?;
        let id = i64::try_from(customer_id)
            .map_err(|_| StorefeedError::Validation(format!("id {customer_id} out of range")))?;

        let query = format!(
            "SELECT row_to_json(t)::jsonb AS record FROM {} t WHERE t.{}::int8 = $1",
            table.table, table.id_column
        );
        let row = self.client.query_opt(&query, &[&id]).await?;

        row.map(|row| project(&row, &table.id_column, attributes))
            .transpose()
    }
}
