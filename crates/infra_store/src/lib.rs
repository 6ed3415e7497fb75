//! # infra_store: Quote Persistence
//!
//! SQLite-backed sink for completed quotes. The pricing pipeline never calls
//! into this crate; the service layer snapshots a final
//! [`PricingState`](delivery_core::PricingState) into a [`DeliveryRecord`]
//! and saves it here.
//!
//! - [`DeliveryStore::save`]: insert keyed by ticket id
//! - [`DeliveryStore::get`]: read by ticket id, [`StoreError::NotFound`] when absent
//! - [`DeliveryStore::list_recent`]: every record, newest first

pub mod error;
pub mod record;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use record::DeliveryRecord;
pub use store::DeliveryStore;
