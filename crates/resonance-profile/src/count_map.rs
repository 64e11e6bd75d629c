//! An insertion-ordered occurrence counter.
//!
//! Pattern digests break count ties first-seen-first, so the map must
//! remember insertion order. A plain `HashMap` loses it and a `BTreeMap`
//! replaces it with key order; this keeps a `Vec` of entries and serializes
//! as a JSON object, whose key order survives a round trip.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// String-keyed counter that preserves first-insertion order.
///
/// Counts never decrease; the only mutation is [`CountMap::increment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMap(Vec<(String, u64)>);

impl CountMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to the counter for `key`, creating it at the end of the
    /// insertion order if absent.
    pub fn increment(&mut self, key: &str) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += 1,
            None => self.0.push((key.to_string(), 1)),
        }
    }

    /// Returns the count for `key`, zero if absent.
    pub fn get(&self, key: &str) -> u64 {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns up to `n` entries with the highest counts.
    ///
    /// Sorting is stable, so equal counts keep their insertion order.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}

impl Serialize for CountMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in &self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CountMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountMapVisitor;

        impl<'de> Visitor<'de> for CountMapVisitor {
            type Value = CountMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of string keys to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                // Entries arrive in document order, which is the insertion
                // order the map was serialized with.
                while let Some((key, count)) = access.next_entry::<String, u64>()? {
                    entries.push((key, count));
                }
                Ok(CountMap(entries))
            }
        }

        deserializer.deserialize_map(CountMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_creates_then_counts() {
        let mut map = CountMap::new();
        assert_eq!(map.get("anxiety"), 0);

        map.increment("anxiety");
        map.increment("anxiety");
        map.increment("stuck");

        assert_eq!(map.get("anxiety"), 2);
        assert_eq!(map.get("stuck"), 1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn top_breaks_ties_by_insertion_order() {
        let mut map = CountMap::new();
        map.increment("fear");
        map.increment("anger");
        map.increment("numb");

        // All counts equal — first-seen entries win.
        let top = map.top(2);
        assert_eq!(top, vec![("fear", 1), ("anger", 1)]);
    }

    #[test]
    fn top_sorts_by_count_descending() {
        let mut map = CountMap::new();
        map.increment("fear");
        map.increment("anger");
        map.increment("anger");
        map.increment("numb");
        map.increment("numb");
        map.increment("numb");

        assert_eq!(map.top(2), vec![("numb", 3), ("anger", 2)]);
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let mut map = CountMap::new();
        map.increment("stuck");
        map.increment("anxiety");

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"stuck":1,"anxiety":1}"#);

        let back: CountMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
        assert_eq!(back.top(1), vec![("stuck", 1)]);
    }
}
