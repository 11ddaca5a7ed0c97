use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::adapter::{CancelFn, EventSink, Resolver};
use crate::model::DocumentRef;
use crate::query::QueryDescriptor;
use crate::snapshot::DocumentSnapshot;
use crate::value::FieldMap;

mod memory;

pub use memory::MemoryStore;

/// Failure reported by a remote store implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteStoreError {
    kind: StoreErrorKind,
    message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    PermissionDenied,
    Unavailable,
    Internal,
}

impl RemoteStoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::PermissionDenied, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Internal, message)
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

impl Display for RemoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            StoreErrorKind::NotFound => "not-found",
            StoreErrorKind::PermissionDenied => "permission-denied",
            StoreErrorKind::Unavailable => "unavailable",
            StoreErrorKind::Internal => "internal",
        };
        write!(f, "{} ({kind})", self.message)
    }
}

impl Error for RemoteStoreError {}

pub type StoreResult<T> = Result<T, RemoteStoreError>;

/// One-shot completion callback passed to the store. Implementations should
/// invoke it exactly once; duplicate invocations are tolerated and ignored.
pub type Completion<T> = Resolver<StoreResult<T>>;

/// The abstract capability set of a callback-driven remote document store.
///
/// Implementations may invoke completions and event sinks on any execution
/// context, including synchronously during the registering call or from
/// background threads. The adapter imposes no scheduling of its own.
pub trait RemoteStore: Send + Sync + 'static {
    /// Reads one document. A missing document is a success whose snapshot
    /// reports `exists() == false`, not an error.
    fn fetch_document(&self, document: &DocumentRef, completion: Completion<DocumentSnapshot>);

    /// Reads every document matched by `query`. Zero matches is a success
    /// with an empty vector.
    fn run_query(&self, query: &QueryDescriptor, completion: Completion<Vec<DocumentSnapshot>>);

    /// Fully replaces the document's contents, creating it if absent.
    fn set_document(&self, document: &DocumentRef, fields: FieldMap, completion: Completion<()>);

    /// Merges the named top-level fields into an existing document. Fails
    /// with a not-found error when the document does not exist.
    fn merge_fields(&self, document: &DocumentRef, fields: FieldMap, completion: Completion<()>);

    /// Removes the document. Nested sub-collections are unaffected and
    /// deleting a missing document succeeds.
    fn delete_document(&self, document: &DocumentRef, completion: Completion<()>);

    /// Server-side aggregate count. `None` signals a malformed or absent
    /// aggregate result despite a successful call.
    fn count_documents(&self, query: &QueryDescriptor, completion: Completion<Option<i64>>);

    /// Subscribes to one document, pushing a snapshot per change until the
    /// returned cancel function runs.
    fn listen_document(
        &self,
        document: &DocumentRef,
        events: EventSink<DocumentSnapshot>,
    ) -> CancelFn;

    /// Subscribes to a query, pushing the full matching set per change.
    fn listen_query(
        &self,
        query: &QueryDescriptor,
        events: EventSink<Vec<DocumentSnapshot>>,
    ) -> CancelFn;
}
