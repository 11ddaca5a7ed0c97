use std::collections::BTreeMap;

use crate::value::FieldValue;

/// The raw, untyped contents of one document: a mapping from unique string
/// keys to dynamically typed values. No ordering guarantee is part of the
/// contract even though the storage is sorted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldMap {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_entries_with_unique_keys() {
        let mut map = FieldMap::default();
        map.insert("count", FieldValue::from_integer(1));
        map.insert("count", FieldValue::from_integer(2));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("count"), Some(&FieldValue::from_integer(2)));
    }
}
