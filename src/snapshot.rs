use crate::model::DocumentRef;
use crate::value::FieldMap;

/// A point-in-time read of one document's existence and contents.
///
/// Snapshots where `exists()` is false must never be decoded; read paths
/// treat them as a terminal not-found condition.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    document: DocumentRef,
    fields: Option<FieldMap>,
}

impl DocumentSnapshot {
    pub fn new(document: DocumentRef, fields: Option<FieldMap>) -> Self {
        Self { document, fields }
    }

    /// Whether the document existed in the store when the snapshot was taken.
    pub fn exists(&self) -> bool {
        self.fields.is_some()
    }

    pub fn fields(&self) -> Option<&FieldMap> {
        self.fields.as_ref()
    }

    pub fn into_fields(self) -> Option<FieldMap> {
        self.fields
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    pub fn id(&self) -> &str {
        self.document.id()
    }
}
