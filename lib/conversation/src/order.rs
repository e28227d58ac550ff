//! Customization orders.
//!
//! A confirmed flow produces one order id shared by all of its items; each
//! item is handed to the [`OrderSink`] individually.

use crate::error::OrderSinkError;
use chrono::{DateTime, Utc};
use posh_support_core::OrderId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Sequence value before the first order of the process.
pub const FIRST_ORDER_SEQUENCE: u64 = 1000;

/// A case engraved with a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameItem {
    /// Phone model or print the name goes on.
    pub model: String,
    /// Name to engrave. At most 20 letters and spaces.
    pub engraved_name: String,
}

/// A case printed with a customer photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoItem {
    /// Phone model or theme of the case.
    pub theme: String,
    /// File name of the photo sent by the customer.
    pub photo_filename: String,
}

/// One confirmed customization item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Customization {
    Name(NameItem),
    Photo(PhotoItem),
}

/// Which customization flow an order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Name,
    Photo,
}

impl Customization {
    /// Returns the flow this item belongs to.
    #[must_use]
    pub fn kind(&self) -> OrderKind {
        match self {
            Self::Name(_) => OrderKind::Name,
            Self::Photo(_) => OrderKind::Photo,
        }
    }
}

/// Process-wide order id source.
///
/// The sequence is shared by every conversation and never reused within
/// the process. It is not persisted, so it restarts after a restart.
#[derive(Debug)]
pub struct OrderIdGenerator {
    last: AtomicU64,
}

impl OrderIdGenerator {
    /// Creates a generator whose first id uses sequence 1001.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_after(FIRST_ORDER_SEQUENCE)
    }

    /// Creates a generator whose first id uses `last + 1`.
    #[must_use]
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Allocates the next order id, stamped with `now`.
    pub fn next(&self, now: DateTime<Utc>) -> OrderId {
        let sequence = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        OrderId::new(now, sequence)
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination for confirmed customization items.
///
/// Called once per item, never batched.
pub trait OrderSink: Send + Sync {
    /// Stores one item of the order `order_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the item could not be stored.
    fn record(&self, order_id: &OrderId, item: &Customization)
    -> Result<(), Report<OrderSinkError>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Sink that keeps every record in memory.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        records: Mutex<Vec<(OrderId, Customization)>>,
        fail: bool,
    }

    impl RecordingSink {
        pub(crate) fn failing() -> Self {
            Self {
                records: Mutex::default(),
                fail: true,
            }
        }

        pub(crate) fn records(&self) -> Vec<(OrderId, Customization)> {
            self.records.lock().unwrap().clone()
        }
    }

    impl OrderSink for RecordingSink {
        fn record(
            &self,
            order_id: &OrderId,
            item: &Customization,
        ) -> Result<(), Report<OrderSinkError>> {
            if self.fail {
                return Err(OrderSinkError::StorageFailed {
                    reason: "sink offline".to_string(),
                }
                .into());
            }
            self.records.lock().unwrap().push((*order_id, item.clone()));
            Ok(())
        }
    }
}
