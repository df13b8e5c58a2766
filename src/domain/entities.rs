//! Normalized sub-objects attached to events
//!
//! These are the fixed-shape objects the entity formatters produce. Every
//! string field is always present; "unknown" is the empty string, never null.

use serde::{Deserialize, Serialize};

/// Customer identity attached to order and cart events
///
/// `id` is `0` for anonymous visitors without a numeric visitor id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub create_date: String,
    pub change_date: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// Session cookie projection, attached when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Cookies>,
}

impl Customer {
    /// Placeholder first name for synthetic guest records
    pub const GUEST_FIRST_NAME: &'static str = "GUEST";

    /// Placeholder last name for synthetic guest records
    pub const GUEST_LAST_NAME: &'static str = "USER";

    /// Whether this is the synthetic guest placeholder
    pub fn is_guest_placeholder(&self) -> bool {
        self.first_name == Self::GUEST_FIRST_NAME && self.last_name == Self::GUEST_LAST_NAME
    }
}

/// Store reference sent as the event's catalog
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogRef {
    pub id: String,
    pub name: String,
}

impl CatalogRef {
    /// The empty reference used when no valid store id is known
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty reference
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.name.is_empty()
    }
}

/// Visitor session identifiers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Visit {
    pub visit_id: String,
    pub visitor_id: String,
    pub pageview_id: String,
    pub last_pageview_id: String,
}

/// Projection of the analytics vendor's session cookies
///
/// Field names are the cookie names as set by the vendor's tracking script.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cookies {
    pub jirafe_ratr: String,
    pub jirafe_lnd: String,
    pub jirafe_ref: String,
    pub jirafe_vis: String,
    pub jirafe_reftyp: String,
    pub jirafe_typ: String,
    pub jirafe_vid: String,
}

impl Cookies {
    /// Cookie names in projection order
    pub const NAMES: [&'static str; 7] = [
        "jirafe_ratr",
        "jirafe_lnd",
        "jirafe_ref",
        "jirafe_vis",
        "jirafe_reftyp",
        "jirafe_typ",
        "jirafe_vid",
    ];
}
