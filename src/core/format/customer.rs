//! Customer formatter
//!
//! Resolves who an event belongs to. The order of precedence is:
//!
//! 1. the record's own numeric `customer_id`
//! 2. the customer logged into the current session
//! 3. the anonymous visitor (record `visitor_id`, then the session's)
//! 4. id `0`
//!
//! Registered customers are loaded from the [`CustomerDirectory`] and mapped
//! through the `customer` element. Everyone else gets a synthetic guest
//! record.

use super::date::format_date;
use super::visit::format_cookies;
use crate::adapters::source::{CustomerDirectory, SessionProvider};
use crate::core::mapping::{ElementKey, FieldMapper};
use crate::domain::{Customer, FieldValue, NormalizedEvent, RawRecord, Result};
use std::sync::Arc;

/// Element whose mapping shapes registered customers
pub const CUSTOMER_ELEMENT: &str = "customer";

/// Record fields a guest checkout carries
pub const CHECKOUT_FIELDS: [&str; 4] = [
    "created_at",
    "customer_email",
    "customer_firstname",
    "customer_lastname",
];

/// Record fields read during identity resolution
pub const RESOLUTION_FIELDS: [&str; 6] = [
    "customer_id",
    "visitor_id",
    "created_at",
    "customer_email",
    "customer_firstname",
    "customer_lastname",
];

/// Builds [`Customer`] sub-objects
pub struct CustomerFormatter {
    mapper: Arc<FieldMapper>,
    customers: Arc<dyn CustomerDirectory>,
    session: Arc<dyn SessionProvider>,
}

impl CustomerFormatter {
    pub fn new(
        mapper: Arc<FieldMapper>,
        customers: Arc<dyn CustomerDirectory>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            mapper,
            customers,
            session,
        }
    }

    /// Customer for a record
    ///
    /// The returned id is always set, `0` when nothing identifies the
    /// visitor. With `include_session` the session cookie projection is
    /// attached.
    ///
    /// # Errors
    ///
    /// Returns a formatting error if a non-empty date cannot be parsed, and
    /// propagates mapping and directory failures. A guest with no known
    /// timestamp gets empty dates.
    pub async fn format_customer(
        &self,
        record: &RawRecord,
        include_session: bool,
    ) -> Result<Customer> {
        let mut customer = self
            .resolve(record)
            .await
            .map_err(|e| e.with_origin("CustomerFormatter::format_customer"))?;

        if include_session {
            customer.cookies = Some(format_cookies(self.session.as_ref()));
        }
        Ok(customer)
    }

    async fn resolve(&self, record: &RawRecord) -> Result<Customer> {
        let customer_id = record
            .numeric_id("customer_id")
            .or_else(|| self.session.logged_in_customer_id());

        if let Some(customer_id) = customer_id {
            if let Some(customer) = self.registered(customer_id).await? {
                return Ok(customer);
            }
            tracing::warn!(
                customer_id,
                "Customer not found in directory, formatting as guest"
            );
        }

        self.guest(record)
    }

    async fn registered(&self, customer_id: u64) -> Result<Option<Customer>> {
        let element = ElementKey::simple(CUSTOMER_ELEMENT);
        let attributes = self.mapper.attributes_to_select(&element)?;

        let Some(row) = self
            .customers
            .load_customer(customer_id, &attributes)
            .await?
        else {
            return Ok(None);
        };

        let event = self.mapper.map_element(&element, &row)?;
        Ok(Some(Customer {
            id: customer_id,
            create_date: field_text(&event, "create_date"),
            change_date: field_text(&event, "change_date"),
            email: field_text(&event, "email"),
            first_name: field_text(&event, "first_name"),
            last_name: field_text(&event, "last_name"),
            cookies: None,
        }))
    }

    fn guest(&self, record: &RawRecord) -> Result<Customer> {
        let visitor = self.session.visitor();
        let id = record
            .numeric_id("visitor_id")
            .or_else(|| visitor.as_ref().and_then(|v| v.visitor_id))
            .unwrap_or(0);

        if CHECKOUT_FIELDS.iter().all(|field| record.has_value(field)) {
            let created = format_date(&record.get_string("created_at"))?;
            return Ok(Customer {
                id,
                create_date: created.clone(),
                change_date: created,
                email: record.get_string("customer_email"),
                first_name: record.get_string("customer_firstname"),
                last_name: record.get_string("customer_lastname"),
                cookies: None,
            });
        }

        let fallback = Some(record.get_string("created_at")).filter(|s| !s.is_empty());
        let first_visit = visitor
            .as_ref()
            .and_then(|v| v.first_visit_at.clone())
            .or_else(|| fallback.clone());
        let last_visit = visitor
            .as_ref()
            .and_then(|v| v.last_visit_at.clone())
            .or(fallback);

        Ok(Customer {
            id,
            create_date: guest_date(first_visit)?,
            change_date: guest_date(last_visit)?,
            email: String::new(),
            first_name: Customer::GUEST_FIRST_NAME.to_string(),
            last_name: Customer::GUEST_LAST_NAME.to_string(),
            cookies: None,
        })
    }
}

/// Guest timestamps may be unknown; those stay empty
fn guest_date(value: Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => format_date(&value),
        _ => Ok(String::new()),
    }
}

/// Text form of a mapped field; missing fields are empty
fn field_text(event: &NormalizedEvent, local_key: &str) -> String {
    match event.field(local_key).map(|f| &f.value) {
        Some(FieldValue::String(s)) => s.clone(),
        Some(FieldValue::Int(i)) => i.to_string(),
        Some(FieldValue::Float(f)) => f.to_string(),
        Some(FieldValue::Bool(true)) => "1".to_string(),
        Some(FieldValue::Bool(false)) | None => String::new(),
    }
}
