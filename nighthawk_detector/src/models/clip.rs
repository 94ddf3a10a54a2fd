//! Clips and their annotations.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered clip annotations (name → value).
///
/// Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: Vec<(String, String)>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an annotation, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Annotations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A detected clip, in samples of the detector input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clip {
    pub start_index: u64,
    pub length: u64,
    pub annotations: Annotations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces() {
        let mut a = Annotations::new();
        a.insert("Detector Score", "95.0");
        a.insert("Classification", "Call.AMRE");
        a.insert("Detector Score", "90.0");

        assert_eq!(a.len(), 2);
        assert_eq!(a.get("Detector Score"), Some("90.0"));
        assert_eq!(
            a.names().collect::<Vec<_>>(),
            vec!["Detector Score", "Classification"]
        );
    }

    #[test]
    fn serializes_in_insertion_order() {
        let mut a = Annotations::new();
        a.insert("Zeta", "1");
        a.insert("Alpha", "2");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"Zeta":"1","Alpha":"2"}"#);
    }
}
