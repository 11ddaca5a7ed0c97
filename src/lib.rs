//! Async adapter over a callback-driven remote document store.
//!
//! The underlying store speaks in registration calls and callbacks: one-shot
//! operations take a completion callback, subscriptions take a per-event
//! callback and return a cancel function. This crate bridges both shapes
//! into ordinary async Rust:
//!
//! - every one-shot operation on [`DocStoreClient`] is a future that
//!   resolves exactly once, even against a source that fires its callback
//!   twice;
//! - every subscription becomes a [`futures::Stream`] paired with a
//!   [`ListenerHandle`] whose `cancel` is idempotent and race-free.
//!
//! Failures surface through the closed [`OperationError`] taxonomy, one
//! variant per operation category, each optionally carrying the underlying
//! store error as its cause.
//!
//! ```no_run
//! use docstore_bridge::{CollectionRef, DocStoreClient, FieldMap, FieldValue};
//!
//! # async fn demo() -> Result<(), docstore_bridge::OperationError> {
//! let client = DocStoreClient::with_in_memory();
//! let cities = CollectionRef::from_string("cities").unwrap();
//!
//! let mut fields = FieldMap::default();
//! fields.insert("name", FieldValue::from_string("Tokyo"));
//! let id = client.add(&cities, fields).await?;
//!
//! let document = cities.doc(Some(&id)).unwrap();
//! let stored = client.fetch_one(&document).await?;
//! assert_eq!(stored.get("name").and_then(FieldValue::as_str), Some("Tokyo"));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod convert;
pub mod error;
pub mod model;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod value;

mod client;

pub use adapter::{CancelFn, EventSink, ListenerHandle, ListenerStream, Resolver, SingleResult};
pub use client::DocStoreClient;
pub use convert::{ConvertError, DataConverter, PassthroughConverter};
pub use error::{Cause, ErrorCategory, OperationError, OperationResult};
pub use model::{CollectionRef, DocumentRef, PathError, ResourcePath, Timestamp};
pub use query::{FieldFilter, FilterOperator, OrderBy, OrderDirection, QueryDescriptor};
pub use snapshot::DocumentSnapshot;
pub use store::{
    Completion, MemoryStore, RemoteStore, RemoteStoreError, StoreErrorKind, StoreResult,
};
pub use value::{ArrayValue, FieldMap, FieldValue, ValueKind};
