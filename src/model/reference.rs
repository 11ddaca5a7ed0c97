use std::fmt::{Display, Formatter};

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::model::{PathError, ResourcePath};
use crate::query::QueryDescriptor;

const AUTO_ID_LENGTH: usize = 20;

/// Addresses a set of documents grouped under a common path.
///
/// References are created by the caller and passed by reference into every
/// operation; the adapter never mutates or caches them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    path: ResourcePath,
}

impl CollectionRef {
    pub fn new(path: ResourcePath) -> Result<Self, PathError> {
        if path.is_empty() || path.len() % 2 == 0 {
            return Err(PathError::new(
                "collection references require an odd number of segments",
            ));
        }
        Ok(Self { path })
    }

    pub fn from_string(path: &str) -> Result<Self, PathError> {
        Self::new(ResourcePath::from_string(path)?)
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The last segment of the collection path.
    pub fn id(&self) -> &str {
        self.path
            .last_segment()
            .expect("collection path always has an id")
    }

    /// Returns a reference to the document identified by `document_id`,
    /// generating an auto id when `None` is supplied.
    pub fn doc(&self, document_id: Option<&str>) -> Result<DocumentRef, PathError> {
        let id = document_id
            .map(str::to_string)
            .unwrap_or_else(generate_auto_id);
        if id.is_empty() || id.contains('/') {
            return Err(PathError::new("document ids must be non-empty and contain no '/'"));
        }
        DocumentRef::new(self.path.child([id]))
    }

    /// Creates an unfiltered query descriptor targeting this collection.
    pub fn query(&self) -> QueryDescriptor {
        QueryDescriptor::new(self.clone())
    }
}

impl Display for CollectionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CollectionRef({})", self.path.canonical_string())
    }
}

/// Addresses a single document: its collection path plus document id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    path: ResourcePath,
}

impl DocumentRef {
    pub fn new(path: ResourcePath) -> Result<Self, PathError> {
        if path.len() < 2 || path.len() % 2 != 0 {
            return Err(PathError::new(
                "document references require an even number of segments",
            ));
        }
        Ok(Self { path })
    }

    pub fn from_string(path: &str) -> Result<Self, PathError> {
        Self::new(ResourcePath::from_string(path)?)
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The document identifier (the last path segment).
    pub fn id(&self) -> &str {
        self.path
            .last_segment()
            .expect("document path always has an id")
    }

    /// The collection containing this document.
    pub fn parent(&self) -> CollectionRef {
        CollectionRef::new(self.path.without_last())
            .expect("document parent path is always a collection")
    }
}

impl Display for DocumentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentRef({})", self.path.canonical_string())
    }
}

fn generate_auto_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(AUTO_ID_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_and_document_roundtrip() {
        let collection = CollectionRef::from_string("cities").unwrap();
        assert_eq!(collection.id(), "cities");
        let document = collection.doc(Some("sf")).unwrap();
        assert_eq!(document.id(), "sf");
        assert_eq!(document.parent().id(), "cities");
    }

    #[test]
    fn auto_id_generation() {
        let collection = CollectionRef::from_string("cities").unwrap();
        let document = collection.doc(None).unwrap();
        assert_eq!(document.id().len(), 20);
        assert_eq!(document.parent().id(), "cities");
    }

    #[test]
    fn rejects_collection_path_for_document() {
        assert!(DocumentRef::from_string("cities").is_err());
    }

    #[test]
    fn rejects_document_path_for_collection() {
        assert!(CollectionRef::from_string("cities/sf").is_err());
    }

    #[test]
    fn rejects_slash_in_document_id() {
        let collection = CollectionRef::from_string("cities").unwrap();
        assert!(collection.doc(Some("a/b")).is_err());
    }
}
