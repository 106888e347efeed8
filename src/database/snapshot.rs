use super::DatabaseError;
use serde::de::DeserializeOwned;
use serde_json::Value as SerdeValue;

/// An immutable view of a subtree, taken when it was read.
///
/// An empty location reads as JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    key: Option<String>,
    value: SerdeValue,
}

impl DataSnapshot {
    pub(crate) fn new(key: Option<String>, value: SerdeValue) -> Self {
        Self { key, value }
    }

    /// The key of the location this snapshot was read from. `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The raw value of the subtree.
    pub fn val(&self) -> &SerdeValue {
        &self.value
    }

    /// Returns `true` if anything is stored at this location.
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// Deserializes the subtree. Returns `Ok(None)` if the location is empty.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Option<T>, DatabaseError> {
        if self.value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(self.value.clone())?))
    }

    /// A snapshot of a descendant, by slash-separated relative path.
    pub fn child(&self, path: &str) -> DataSnapshot {
        let mut current = Some(&self.value);
        let mut key = self.key.clone();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.and_then(|value| match value {
                SerdeValue::Object(map) => map.get(segment),
                SerdeValue::Array(items) => {
                    segment.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                _ => None,
            });
            key = Some(segment.to_string());
        }

        DataSnapshot::new(key, current.cloned().unwrap_or(SerdeValue::Null))
    }

    /// The direct children of this snapshot, ordered by key.
    ///
    /// Keys generated by `push` are time-ordered, so children added that way come back in
    /// creation order. Scalars and empty locations have no children.
    pub fn each(&self) -> Vec<DataSnapshot> {
        match &self.value {
            SerdeValue::Object(map) => {
                let mut children: Vec<DataSnapshot> = map
                    .iter()
                    .map(|(k, v)| DataSnapshot::new(Some(k.clone()), v.clone()))
                    .collect();
                children.sort_by(|a, b| a.key.cmp(&b.key));
                children
            }
            SerdeValue::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| DataSnapshot::new(Some(i.to_string()), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}
