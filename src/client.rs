use std::sync::Arc;

use crate::adapter::{bridge, single_result, ListenerHandle, ListenerStream};
use crate::convert::DataConverter;
use crate::error::{classify, ErrorCategory, OperationError, OperationResult};
use crate::model::{CollectionRef, DocumentRef};
use crate::query::QueryDescriptor;
use crate::snapshot::DocumentSnapshot;
use crate::store::{MemoryStore, RemoteStore};
use crate::value::FieldMap;

/// The public operation surface over one remote document store.
///
/// Every one-shot operation registers a completion callback with the store
/// and resolves exactly once, on whatever execution context the store
/// completes on. Subscriptions return a stream plus a cancelable handle.
#[derive(Clone)]
pub struct DocStoreClient {
    store: Arc<dyn RemoteStore>,
}

impl DocStoreClient {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Returns a client backed by an in-memory store, for tests and demos.
    pub fn with_in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Reads the document's raw fields. A missing document is a `fetch-one`
    /// error, not an absent-value success.
    pub async fn fetch_one(&self, document: &DocumentRef) -> OperationResult<FieldMap> {
        let snapshot = self
            .fetch_snapshot(document, ErrorCategory::FetchOne)
            .await?;
        match snapshot.into_fields() {
            Some(fields) => Ok(fields),
            None => {
                log::debug!("fetch_one: document {} does not exist", document.path());
                Err(classify(ErrorCategory::FetchOne, None))
            }
        }
    }

    /// Reads and decodes one document with the supplied converter.
    pub async fn fetch_one_with<C>(
        &self,
        document: &DocumentRef,
        converter: &C,
    ) -> OperationResult<C::Model>
    where
        C: DataConverter,
    {
        let fields = self.fetch_one(document).await?;
        decode(converter, &fields)
    }

    /// Runs a query and returns the raw fields of every match. Zero matches
    /// is a success with an empty vector.
    pub async fn fetch_many(&self, query: &QueryDescriptor) -> OperationResult<Vec<FieldMap>> {
        let snapshots = single_result(|completion| self.store.run_query(query, completion))
            .await
            .map_err(|error| classify(ErrorCategory::FetchMany, Some(Arc::new(error))))?;
        Ok(snapshots
            .into_iter()
            .filter_map(DocumentSnapshot::into_fields)
            .collect())
    }

    /// Runs a query and decodes every match. Unlike collection
    /// subscriptions, the one-shot path is strict: the first decode failure
    /// fails the whole call.
    pub async fn fetch_many_with<C>(
        &self,
        query: &QueryDescriptor,
        converter: &C,
    ) -> OperationResult<Vec<C::Model>>
    where
        C: DataConverter,
    {
        let raw = self.fetch_many(query).await?;
        raw.iter().map(|fields| decode(converter, fields)).collect()
    }

    /// Creates a document with an auto-generated id and returns that id.
    /// The id resolves only after the write's completion callback fired.
    pub async fn add(&self, collection: &CollectionRef, fields: FieldMap) -> OperationResult<String> {
        let document = collection
            .doc(None)
            .map_err(|error| classify(ErrorCategory::Add, Some(Arc::new(error))))?;
        self.write(&document, fields, ErrorCategory::Add).await?;
        Ok(document.id().to_string())
    }

    /// Encodes `value` and creates a document with an auto-generated id.
    pub async fn add_with<C>(
        &self,
        collection: &CollectionRef,
        value: &C::Model,
        converter: &C,
    ) -> OperationResult<String>
    where
        C: DataConverter,
    {
        let fields = encode(converter, value, ErrorCategory::Add)?;
        self.add(collection, fields).await
    }

    /// Fully replaces the document's contents and returns its id.
    pub async fn set(&self, document: &DocumentRef, fields: FieldMap) -> OperationResult<String> {
        self.write(document, fields, ErrorCategory::Set).await?;
        Ok(document.id().to_string())
    }

    /// Encodes `value` and fully replaces the document's contents.
    pub async fn set_with<C>(
        &self,
        document: &DocumentRef,
        value: &C::Model,
        converter: &C,
    ) -> OperationResult<String>
    where
        C: DataConverter,
    {
        let fields = encode(converter, value, ErrorCategory::Set)?;
        self.set(document, fields).await
    }

    /// Merges the named top-level fields into an existing document. Fails
    /// without creating the document when it does not exist.
    pub async fn merge_update(
        &self,
        document: &DocumentRef,
        fields: FieldMap,
    ) -> OperationResult<String> {
        single_result(|completion| self.store.merge_fields(document, fields, completion))
            .await
            .map_err(|error| classify(ErrorCategory::MergeUpdate, Some(Arc::new(error))))?;
        Ok(document.id().to_string())
    }

    /// Removes the document and returns its id. Nested sub-collections are
    /// not touched.
    pub async fn delete(&self, document: &DocumentRef) -> OperationResult<String> {
        single_result(|completion| self.store.delete_document(document, completion))
            .await
            .map_err(|error| classify(ErrorCategory::Delete, Some(Arc::new(error))))?;
        Ok(document.id().to_string())
    }

    /// Reports whether the document exists. A missing document is a success
    /// with value `false`.
    pub async fn exists(&self, document: &DocumentRef) -> OperationResult<bool> {
        let snapshot = self
            .fetch_snapshot(document, ErrorCategory::ExistsCheck)
            .await?;
        Ok(snapshot.exists())
    }

    /// Counts the documents matched by `query` server-side. A success that
    /// carries no usable aggregate is `unknown` since no finer
    /// classification is derivable.
    pub async fn count(&self, query: &QueryDescriptor) -> OperationResult<i64> {
        let aggregate = single_result(|completion| self.store.count_documents(query, completion))
            .await
            .map_err(|error| classify(ErrorCategory::Count, Some(Arc::new(error))))?;
        match aggregate {
            Some(count) => Ok(count),
            None => Err(OperationError::Unknown),
        }
    }

    /// Subscribes to one document, emitting its raw fields per change.
    /// Existence loss is a terminal failure, not an empty value.
    pub fn listen_one(
        &self,
        document: &DocumentRef,
    ) -> (ListenerStream<FieldMap>, ListenerHandle) {
        let store = Arc::clone(&self.store);
        let target = document.clone();
        bridge(
            ErrorCategory::FetchOne,
            move |sink| store.listen_document(&target, sink),
            document_fields,
        )
    }

    /// Subscribes to one document, decoding every snapshot. A decode
    /// failure terminates the stream.
    pub fn listen_one_with<C>(
        &self,
        document: &DocumentRef,
        converter: C,
    ) -> (ListenerStream<C::Model>, ListenerHandle)
    where
        C: DataConverter,
        C::Model: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let target = document.clone();
        bridge(
            ErrorCategory::FetchOne,
            move |sink| store.listen_document(&target, sink),
            move |snapshot: DocumentSnapshot| {
                let fields = document_fields(snapshot)?;
                decode(&converter, &fields)
            },
        )
    }

    /// Subscribes to a query, emitting the full raw result set per change.
    pub fn listen_many(
        &self,
        query: &QueryDescriptor,
    ) -> (ListenerStream<Vec<FieldMap>>, ListenerHandle) {
        let store = Arc::clone(&self.store);
        let target = query.clone();
        bridge(
            ErrorCategory::FetchMany,
            move |sink| store.listen_query(&target, sink),
            |snapshots: Vec<DocumentSnapshot>| {
                Ok(snapshots
                    .into_iter()
                    .filter_map(DocumentSnapshot::into_fields)
                    .collect())
            },
        )
    }

    /// Subscribes to a query, decoding every match. An item that fails to
    /// decode is dropped from that emission rather than ending the stream,
    /// so one malformed document cannot break observation of the rest.
    pub fn listen_many_with<C>(
        &self,
        query: &QueryDescriptor,
        converter: C,
    ) -> (ListenerStream<Vec<C::Model>>, ListenerHandle)
    where
        C: DataConverter,
        C::Model: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let target = query.clone();
        bridge(
            ErrorCategory::FetchMany,
            move |sink| store.listen_query(&target, sink),
            move |snapshots: Vec<DocumentSnapshot>| {
                let mut decoded = Vec::with_capacity(snapshots.len());
                for snapshot in snapshots {
                    let path = snapshot.document().path().canonical_string();
                    let Some(fields) = snapshot.into_fields() else {
                        continue;
                    };
                    match converter.from_fields(&fields) {
                        Ok(model) => decoded.push(model),
                        Err(error) => {
                            log::warn!("dropping undecodable document {path}: {error}");
                        }
                    }
                }
                Ok(decoded)
            },
        )
    }

    async fn fetch_snapshot(
        &self,
        document: &DocumentRef,
        category: ErrorCategory,
    ) -> OperationResult<DocumentSnapshot> {
        single_result(|completion| self.store.fetch_document(document, completion))
            .await
            .map_err(|error| classify(category, Some(Arc::new(error))))
    }

    async fn write(
        &self,
        document: &DocumentRef,
        fields: FieldMap,
        category: ErrorCategory,
    ) -> OperationResult<()> {
        single_result(|completion| self.store.set_document(document, fields, completion))
            .await
            .map_err(|error| classify(category, Some(Arc::new(error))))
    }
}

fn document_fields(snapshot: DocumentSnapshot) -> OperationResult<FieldMap> {
    let path = snapshot.document().path().canonical_string();
    match snapshot.into_fields() {
        Some(fields) => Ok(fields),
        None => {
            log::debug!("document {path} no longer exists, ending subscription");
            Err(classify(ErrorCategory::FetchOne, None))
        }
    }
}

fn decode<C>(converter: &C, fields: &FieldMap) -> OperationResult<C::Model>
where
    C: DataConverter,
{
    converter
        .from_fields(fields)
        .map_err(|error| classify(ErrorCategory::Decode, Some(Arc::new(error))))
}

fn encode<C>(
    converter: &C,
    value: &C::Model,
    category: ErrorCategory,
) -> OperationResult<FieldMap>
where
    C: DataConverter,
{
    converter
        .to_fields(value)
        .map_err(|error| classify(category, Some(Arc::new(error))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CancelFn, EventSink};
    use crate::convert::{ConvertError, DataConverter};
    use crate::query::FilterOperator;
    use crate::store::{Completion, RemoteStoreError};
    use crate::value::FieldValue;
    use futures::FutureExt;
    use std::sync::Mutex;

    fn fields(entries: &[(&str, FieldValue)]) -> FieldMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct City {
        name: String,
        population: i64,
    }

    #[derive(Clone)]
    struct CityConverter;

    impl DataConverter for CityConverter {
        type Model = City;

        fn to_fields(&self, value: &City) -> Result<FieldMap, ConvertError> {
            Ok(fields(&[
                ("name", FieldValue::from_string(&value.name)),
                ("population", FieldValue::from_integer(value.population)),
            ]))
        }

        fn from_fields(&self, map: &FieldMap) -> Result<City, ConvertError> {
            let name = map
                .get("name")
                .and_then(FieldValue::as_str)
                .ok_or_else(|| ConvertError::new("missing name"))?
                .to_string();
            let population = map
                .get("population")
                .and_then(FieldValue::as_integer)
                .ok_or_else(|| ConvertError::new("missing population"))?;
            Ok(City { name, population })
        }
    }

    #[tokio::test]
    async fn set_then_fetch_roundtrip() {
        let client = DocStoreClient::with_in_memory();
        let document = DocumentRef::from_string("cities/sf").unwrap();
        let data = fields(&[("name", FieldValue::from_string("San Francisco"))]);

        let id = client.set(&document, data.clone()).await.expect("set");
        assert_eq!(id, "sf");
        let fetched = client.fetch_one(&document).await.expect("fetch");
        assert_eq!(fetched, data);
    }

    #[tokio::test]
    async fn typed_roundtrip_preserves_model() {
        let client = DocStoreClient::with_in_memory();
        let document = DocumentRef::from_string("cities/sf").unwrap();
        let city = City {
            name: "San Francisco".into(),
            population: 860_000,
        };

        client
            .set_with(&document, &city, &CityConverter)
            .await
            .expect("typed set");
        let fetched = client
            .fetch_one_with(&document, &CityConverter)
            .await
            .expect("typed fetch");
        assert_eq!(fetched, city);
    }

    #[tokio::test]
    async fn fetch_one_missing_document_is_an_error() {
        let client = DocStoreClient::with_in_memory();
        let document = DocumentRef::from_string("cities/nowhere").unwrap();
        let error = client.fetch_one(&document).await.unwrap_err();
        assert_eq!(error.code_str(), "docstore/fetch-one");
        assert!(error.cause().is_none());
    }

    #[tokio::test]
    async fn exists_returns_false_for_missing_document() {
        let client = DocStoreClient::with_in_memory();
        let document = DocumentRef::from_string("cities/nowhere").unwrap();
        assert!(!client.exists(&document).await.expect("exists"));

        client
            .set(&document, fields(&[("a", FieldValue::from_integer(1))]))
            .await
            .unwrap();
        assert!(client.exists(&document).await.expect("exists"));
    }

    #[tokio::test]
    async fn fetch_many_with_no_matches_is_empty_success() {
        let client = DocStoreClient::with_in_memory();
        let query = CollectionRef::from_string("cities").unwrap().query();
        let results = client.fetch_many(&query).await.expect("query");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn fetch_many_filters_results() {
        let client = DocStoreClient::with_in_memory();
        let cities = CollectionRef::from_string("cities").unwrap();
        client
            .set(
                &cities.doc(Some("sf")).unwrap(),
                fields(&[("state", FieldValue::from_string("CA"))]),
            )
            .await
            .unwrap();
        client
            .set(
                &cities.doc(Some("nyc")).unwrap(),
                fields(&[("state", FieldValue::from_string("NY"))]),
            )
            .await
            .unwrap();

        let query = cities.query().where_field(
            "state",
            FilterOperator::Equal,
            FieldValue::from_string("CA"),
        );
        let results = client.fetch_many(&query).await.expect("query");
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn one_shot_typed_fetch_is_strict_about_decoding() {
        let client = DocStoreClient::with_in_memory();
        let cities = CollectionRef::from_string("cities").unwrap();
        client
            .set(
                &cities.doc(Some("good")).unwrap(),
                fields(&[
                    ("name", FieldValue::from_string("SF")),
                    ("population", FieldValue::from_integer(1)),
                ]),
            )
            .await
            .unwrap();
        client
            .set(
                &cities.doc(Some("bad")).unwrap(),
                fields(&[("name", FieldValue::from_string("LA"))]),
            )
            .await
            .unwrap();

        let error = client
            .fetch_many_with(&cities.query(), &CityConverter)
            .await
            .unwrap_err();
        assert_eq!(error.code_str(), "docstore/decode");
    }

    #[tokio::test]
    async fn add_generates_id_and_persists() {
        let client = DocStoreClient::with_in_memory();
        let cities = CollectionRef::from_string("cities").unwrap();
        let id = client
            .add(&cities, fields(&[("name", FieldValue::from_string("Oakland"))]))
            .await
            .expect("add");
        assert_eq!(id.len(), 20);

        let document = cities.doc(Some(&id)).unwrap();
        assert!(client.exists(&document).await.unwrap());
    }

    #[tokio::test]
    async fn merge_update_on_missing_document_fails_without_creating() {
        let client = DocStoreClient::with_in_memory();
        let document = DocumentRef::from_string("cities/ghost").unwrap();
        let error = client
            .merge_update(&document, fields(&[("x", FieldValue::from_integer(1))]))
            .await
            .unwrap_err();
        assert_eq!(error.code_str(), "docstore/merge-update");
        assert!(!client.exists(&document).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let client = DocStoreClient::with_in_memory();
        let document = DocumentRef::from_string("cities/sf").unwrap();
        client
            .set(&document, fields(&[("a", FieldValue::from_integer(1))]))
            .await
            .unwrap();
        let id = client.delete(&document).await.expect("delete");
        assert_eq!(id, "sf");
        assert!(!client.exists(&document).await.unwrap());
    }

    #[tokio::test]
    async fn count_matches_query() {
        let client = DocStoreClient::with_in_memory();
        let cities = CollectionRef::from_string("cities").unwrap();
        for id in ["sf", "la"] {
            client
                .set(
                    &cities.doc(Some(id)).unwrap(),
                    fields(&[("state", FieldValue::from_string("CA"))]),
                )
                .await
                .unwrap();
        }
        assert_eq!(client.count(&cities.query()).await.unwrap(), 2);
    }

    /// Store stub whose one-shot operations are scripted by the test.
    #[derive(Default)]
    struct ScriptedStore {
        pending_set: Mutex<Option<Completion<()>>>,
        double_fetch: bool,
        count_result: Mutex<Option<Option<i64>>>,
    }

    impl RemoteStore for ScriptedStore {
        fn fetch_document(
            &self,
            document: &DocumentRef,
            completion: Completion<DocumentSnapshot>,
        ) {
            let snapshot = DocumentSnapshot::new(
                document.clone(),
                Some(fields(&[("n", FieldValue::from_integer(1))])),
            );
            if self.double_fetch {
                let duplicate = completion.clone();
                completion.resolve(Ok(snapshot.clone()));
                duplicate.resolve(Ok(DocumentSnapshot::new(document.clone(), None)));
            } else {
                completion.resolve(Ok(snapshot));
            }
        }

        fn run_query(
            &self,
            _query: &QueryDescriptor,
            completion: Completion<Vec<DocumentSnapshot>>,
        ) {
            completion.resolve(Ok(Vec::new()));
        }

        fn set_document(
            &self,
            _document: &DocumentRef,
            _fields: FieldMap,
            completion: Completion<()>,
        ) {
            *self.pending_set.lock().unwrap() = Some(completion);
        }

        fn merge_fields(
            &self,
            _document: &DocumentRef,
            _fields: FieldMap,
            completion: Completion<()>,
        ) {
            completion.resolve(Err(RemoteStoreError::unavailable("offline")));
        }

        fn delete_document(&self, _document: &DocumentRef, completion: Completion<()>) {
            completion.resolve(Ok(()));
        }

        fn count_documents(&self, _query: &QueryDescriptor, completion: Completion<Option<i64>>) {
            let scripted = self.count_result.lock().unwrap().take().unwrap_or(None);
            completion.resolve(Ok(scripted));
        }

        fn listen_document(
            &self,
            _document: &DocumentRef,
            _events: EventSink<DocumentSnapshot>,
        ) -> CancelFn {
            Box::new(|| {})
        }

        fn listen_query(
            &self,
            _query: &QueryDescriptor,
            _events: EventSink<Vec<DocumentSnapshot>>,
        ) -> CancelFn {
            Box::new(|| {})
        }
    }

    #[tokio::test]
    async fn double_callback_invocation_yields_single_outcome() {
        let store = Arc::new(ScriptedStore {
            double_fetch: true,
            ..Default::default()
        });
        let client = DocStoreClient::new(store);
        let document = DocumentRef::from_string("cities/sf").unwrap();
        // The second (not-found) resolution must be discarded.
        let result = client.fetch_one(&document).await.expect("first wins");
        assert_eq!(result.get("n"), Some(&FieldValue::from_integer(1)));
    }

    #[tokio::test]
    async fn add_resolves_only_after_write_completion() {
        let store = Arc::new(ScriptedStore::default());
        let client = DocStoreClient::new(Arc::clone(&store) as Arc<dyn RemoteStore>);
        let cities = CollectionRef::from_string("cities").unwrap();

        let mut pending = Box::pin(client.add(&cities, FieldMap::default()));
        // The id must not be produced while the write is still in flight.
        assert!((&mut pending).now_or_never().is_none());

        let completion = store.pending_set.lock().unwrap().take().expect("write registered");
        completion.resolve(Err(RemoteStoreError::unavailable("write rejected")));

        let error = pending.await.unwrap_err();
        assert_eq!(error.code_str(), "docstore/add");
        assert!(error.cause().is_some());
    }

    #[tokio::test]
    async fn declared_store_failure_keeps_operation_category() {
        let client = DocStoreClient::new(Arc::new(ScriptedStore::default()));
        let document = DocumentRef::from_string("cities/sf").unwrap();
        let error = client
            .merge_update(&document, FieldMap::default())
            .await
            .unwrap_err();
        assert_eq!(error.code_str(), "docstore/merge-update");
        assert!(error.cause().is_some());
    }

    #[tokio::test]
    async fn absent_aggregate_classifies_as_unknown() {
        let store = Arc::new(ScriptedStore::default());
        *store.count_result.lock().unwrap() = Some(None);
        let client = DocStoreClient::new(Arc::clone(&store) as Arc<dyn RemoteStore>);
        let query = CollectionRef::from_string("cities").unwrap().query();
        let error = client.count(&query).await.unwrap_err();
        assert_eq!(error.code_str(), "docstore/unknown");
    }
}
