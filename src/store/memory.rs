use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use crate::adapter::{CancelFn, EventSink};
use crate::model::DocumentRef;
use crate::query::{FieldFilter, FilterOperator, OrderBy, OrderDirection, QueryDescriptor};
use crate::snapshot::DocumentSnapshot;
use crate::store::{Completion, RemoteStore, RemoteStoreError};
use crate::value::{FieldMap, FieldValue, ValueKind};

enum ListenerEntry {
    Document {
        document: DocumentRef,
        sink: EventSink<DocumentSnapshot>,
    },
    Query {
        query: QueryDescriptor,
        sink: EventSink<Vec<DocumentSnapshot>>,
    },
}

struct MemoryInner {
    documents: Mutex<BTreeMap<String, FieldMap>>,
    listeners: Mutex<HashMap<u64, ListenerEntry>>,
    next_listener_id: AtomicU64,
}

/// Store implementation that keeps documents in process memory and pushes
/// change notifications to registered listeners. Useful for tests and demos
/// where no backend is available.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                documents: Mutex::new(BTreeMap::new()),
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    fn snapshot_of(&self, document: &DocumentRef) -> DocumentSnapshot {
        let documents = self.inner.documents.lock().unwrap();
        let fields = documents.get(&document.path().canonical_string()).cloned();
        DocumentSnapshot::new(document.clone(), fields)
    }

    fn evaluate_query(&self, query: &QueryDescriptor) -> Vec<DocumentSnapshot> {
        let documents = self.inner.documents.lock().unwrap();
        let mut matched = Vec::new();
        for (path, fields) in documents.iter() {
            let Ok(document) = DocumentRef::from_string(path) else {
                continue;
            };
            if document.parent().path() != query.collection().path() {
                continue;
            }
            if satisfies_filters(fields, query.filters()) {
                matched.push(DocumentSnapshot::new(document, Some(fields.clone())));
            }
        }

        matched.sort_by(|left, right| compare_snapshots(left, right, query.result_order_by()));

        if let Some(limit) = query.result_limit() {
            matched.truncate(limit as usize);
        }
        matched
    }

    /// Pushes fresh state to every listener affected by a change at
    /// `document`. Sinks are invoked outside the registry lock.
    fn notify(&self, document: &DocumentRef) {
        enum Pending {
            Document(EventSink<DocumentSnapshot>, DocumentSnapshot),
            Query(EventSink<Vec<DocumentSnapshot>>, Vec<DocumentSnapshot>),
        }

        let mut pending = Vec::new();
        {
            let listeners = self.inner.listeners.lock().unwrap();
            for entry in listeners.values() {
                match entry {
                    ListenerEntry::Document {
                        document: target,
                        sink,
                    } if target == document => {
                        pending.push(Pending::Document(sink.clone(), self.snapshot_of(target)));
                    }
                    ListenerEntry::Query { query, sink }
                        if query.collection().path() == document.parent().path() =>
                    {
                        pending.push(Pending::Query(sink.clone(), self.evaluate_query(query)));
                    }
                    _ => {}
                }
            }
        }

        for event in pending {
            match event {
                Pending::Document(sink, snapshot) => sink.emit(Ok(snapshot)),
                Pending::Query(sink, results) => sink.emit(Ok(results)),
            }
        }
    }

    fn register(&self, entry: ListenerEntry) -> CancelFn {
        let id = self
            .inner
            .next_listener_id
            .fetch_add(1, AtomicOrdering::SeqCst);
        self.inner.listeners.lock().unwrap().insert(id, entry);
        let inner = Arc::clone(&self.inner);
        Box::new(move || {
            inner.listeners.lock().unwrap().remove(&id);
        })
    }
}

impl RemoteStore for MemoryStore {
    fn fetch_document(&self, document: &DocumentRef, completion: Completion<DocumentSnapshot>) {
        completion.resolve(Ok(self.snapshot_of(document)));
    }

    fn run_query(&self, query: &QueryDescriptor, completion: Completion<Vec<DocumentSnapshot>>) {
        completion.resolve(Ok(self.evaluate_query(query)));
    }

    fn set_document(&self, document: &DocumentRef, fields: FieldMap, completion: Completion<()>) {
        {
            let mut documents = self.inner.documents.lock().unwrap();
            documents.insert(document.path().canonical_string(), fields);
        }
        completion.resolve(Ok(()));
        self.notify(document);
    }

    fn merge_fields(&self, document: &DocumentRef, fields: FieldMap, completion: Completion<()>) {
        let merged = {
            let mut documents = self.inner.documents.lock().unwrap();
            let canonical = document.path().canonical_string();
            match documents.get_mut(&canonical) {
                Some(existing) => {
                    for (key, value) in fields.into_fields() {
                        existing.insert(key, value);
                    }
                    true
                }
                None => false,
            }
        };
        if merged {
            completion.resolve(Ok(()));
            self.notify(document);
        } else {
            completion.resolve(Err(RemoteStoreError::not_found(format!(
                "document {} does not exist",
                document.path()
            ))));
        }
    }

    fn delete_document(&self, document: &DocumentRef, completion: Completion<()>) {
        {
            let mut documents = self.inner.documents.lock().unwrap();
            documents.remove(&document.path().canonical_string());
        }
        completion.resolve(Ok(()));
        self.notify(document);
    }

    fn count_documents(&self, query: &QueryDescriptor, completion: Completion<Option<i64>>) {
        let count = self.evaluate_query(query).len() as i64;
        completion.resolve(Ok(Some(count)));
    }

    fn listen_document(
        &self,
        document: &DocumentRef,
        events: EventSink<DocumentSnapshot>,
    ) -> CancelFn {
        // Initial snapshot, then one per change.
        events.emit(Ok(self.snapshot_of(document)));
        self.register(ListenerEntry::Document {
            document: document.clone(),
            sink: events,
        })
    }

    fn listen_query(
        &self,
        query: &QueryDescriptor,
        events: EventSink<Vec<DocumentSnapshot>>,
    ) -> CancelFn {
        events.emit(Ok(self.evaluate_query(query)));
        self.register(ListenerEntry::Query {
            query: query.clone(),
            sink: events,
        })
    }
}

fn satisfies_filters(fields: &FieldMap, filters: &[FieldFilter]) -> bool {
    filters.iter().all(|filter| match fields.get(filter.field()) {
        Some(value) => evaluate_filter(filter, value),
        None => false,
    })
}

fn evaluate_filter(filter: &FieldFilter, value: &FieldValue) -> bool {
    let ordering = compare_values(value, filter.value());
    match filter.operator() {
        FilterOperator::Equal => value == filter.value(),
        FilterOperator::NotEqual => value != filter.value(),
        FilterOperator::LessThan => ordering == Some(Ordering::Less),
        FilterOperator::LessThanOrEqual => {
            matches!(ordering, Some(Ordering::Less) | Some(Ordering::Equal))
        }
        FilterOperator::GreaterThan => ordering == Some(Ordering::Greater),
        FilterOperator::GreaterThanOrEqual => {
            matches!(ordering, Some(Ordering::Greater) | Some(Ordering::Equal))
        }
    }
}

fn compare_snapshots(
    left: &DocumentSnapshot,
    right: &DocumentSnapshot,
    order_by: &[OrderBy],
) -> Ordering {
    for order in order_by {
        let left_value = field_or_null(left, order.field());
        let right_value = field_or_null(right, order.field());
        let mut ordering = compare_values(&left_value, &right_value).unwrap_or(Ordering::Equal);
        if order.direction() == OrderDirection::Descending {
            ordering = ordering.reverse();
        }
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    // Stable fallback so unordered queries have a deterministic result.
    crate::model::ResourcePath::comparator(left.document().path(), right.document().path())
}

fn field_or_null(snapshot: &DocumentSnapshot, field: &str) -> FieldValue {
    snapshot
        .fields()
        .and_then(|fields| fields.get(field).cloned())
        .unwrap_or_else(FieldValue::null)
}

fn compare_values(left: &FieldValue, right: &FieldValue) -> Option<Ordering> {
    match (left.kind(), right.kind()) {
        (ValueKind::Null, ValueKind::Null) => Some(Ordering::Equal),
        (ValueKind::Boolean(a), ValueKind::Boolean(b)) => Some(a.cmp(b)),
        (ValueKind::Integer(a), ValueKind::Integer(b)) => Some(a.cmp(b)),
        (ValueKind::Double(a), ValueKind::Double(b)) => a.partial_cmp(b),
        (ValueKind::Integer(a), ValueKind::Double(b)) => (*a as f64).partial_cmp(b),
        (ValueKind::Double(a), ValueKind::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (ValueKind::String(a), ValueKind::String(b)) => Some(a.cmp(b)),
        (ValueKind::Reference(a), ValueKind::Reference(b)) => Some(a.cmp(b)),
        (ValueKind::Timestamp(a), ValueKind::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
