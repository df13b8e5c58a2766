//! Domain identifier types with validation
//!
//! Newtype wrappers for the store-side identifiers (websites, stores) and the
//! identifiers Storefeed generates itself (batches, attempts). Store-side ids
//! are numeric in the host platform; parsing rejects anything else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier from its numeric value
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Returns the numeric value
            pub const fn value(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u32>()
                    .map(Self)
                    .map_err(|_| format!("{} must be numeric, got '{}'", $label, s))
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(
    /// Website identifier
    ///
    /// A website groups one or more stores; historical push status is
    /// tracked per website.
    ///
    /// # Examples
    ///
    /// ```
    /// use storefeed::domain::ids::WebsiteId;
    /// use std::str::FromStr;
    ///
    /// let website_id = WebsiteId::from_str("3").unwrap();
    /// assert_eq!(website_id.value(), 3);
    /// assert!(WebsiteId::from_str("main").is_err());
    /// ```
    WebsiteId,
    "Website ID"
);

numeric_id!(
    /// Store (store view) identifier
    StoreId,
    "Store ID"
);

/// Batch identifier
///
/// Generated when a batch is built; attempts reference their batch by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Generates a fresh random batch id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid batch ID '{s}': {e}"))
    }
}

/// Attempt identifier assigned by attempt storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(i64);

impl AttemptId {
    /// Creates an attempt id from its storage value
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the storage value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
