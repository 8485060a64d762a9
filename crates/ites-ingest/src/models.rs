//! Data models shared across the pipeline

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A sparse, ordered field-to-value record
///
/// Fields keep header order. Empty values are never stored: [`Document::insert`]
/// drops them, so serialized documents omit the key entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<(String, String)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; empty values are ignored
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.push((field.into(), value));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One protocol assertion: the query, the column it yields and the expected value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoTestCase {
    pub query: String,
    pub column: String,
    pub data_type: String,
    pub value: String,
    /// Value as rendered by the client; equals `value` unless the source says otherwise
    pub client_value: String,
    pub display_size: String,
}

impl ProtoTestCase {
    pub fn as_tuple(&self) -> (&str, &str, &str, &str, &str, &str) {
        (
            &self.query,
            &self.column,
            &self.data_type,
            &self.value,
            &self.client_value,
            &self.display_size,
        )
    }
}
