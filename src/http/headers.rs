//! Ordered, multi-valued, case-insensitive header container.
//!
//! # Responsibilities
//! - Preserve insertion order and duplicate values
//! - Convert to/from the CloudFront wire shape (`{name: [{key, value}]}`)
//! - Flatten to a last-write-wins map for the outbound origin fetch
//!
//! # Design Decisions
//! - Names are stored lowercased; lookup is O(n) over a Vec, which is fine
//!   for typical header counts
//! - The wire shape collapses each name to one record, except `set-cookie`:
//!   merging cookie values into one comma-joined record breaks client-side
//!   cookie parsing, so they stay separate records

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One `{key, value}` record of the wire shape. `key` carries the original
/// casing and is optional on input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireHeaderRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

/// Wire shape of a header map: each name maps to a list of records.
pub type WireHeaders = std::collections::BTreeMap<String, Vec<WireHeaderRecord>>;

/// Ordered sequence of `(name, value)` pairs with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new pair, keeping any existing pairs for the same name.
    pub fn append(&mut self, name: &str, value: &str) {
        self.entries
            .push((name.to_ascii_lowercase(), value.to_string()));
    }

    /// Replace all pairs for `name` with a single new pair.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, value.to_string()));
    }

    /// First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove all pairs for `name`.
    pub fn remove(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        self.entries.retain(|(n, _)| *n != name);
    }

    /// Iterate pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct names, in order of first appearance.
    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (n, _) in &self.entries {
            if !names.iter().any(|seen| *seen == n.as_str()) {
                names.push(n.as_str());
            }
        }
        names
    }

    /// Convert to the wire shape. Every name collapses to a single
    /// comma-joined record, except `set-cookie` which keeps one record
    /// per value.
    pub fn to_wire(&self) -> WireHeaders {
        let mut wire = WireHeaders::new();
        for name in self.names() {
            let values = self.get_all(name);
            let records = if name == "set-cookie" {
                values
                    .into_iter()
                    .map(|value| WireHeaderRecord {
                        key: Some(name.to_string()),
                        value: value.to_string(),
                    })
                    .collect()
            } else {
                vec![WireHeaderRecord {
                    key: Some(name.to_string()),
                    value: values.join(", "),
                }]
            };
            wire.insert(name.to_string(), records);
        }
        wire
    }

    /// Rebuild a container from the wire shape, appending every record.
    pub fn from_wire(wire: &WireHeaders) -> Self {
        let mut headers = Headers::new();
        for (name, records) in wire {
            for record in records {
                let name = record.key.as_deref().unwrap_or(name);
                headers.append(name, &record.value);
            }
        }
        headers
    }

    /// Flatten to a last-write-wins map, used only for the outbound fetch.
    pub fn to_flat_map(&self) -> HashMap<String, String> {
        let mut flat = HashMap::new();
        for (name, value) in self.entries() {
            flat.insert(name.to_string(), value.to_string());
        }
        flat
    }

    /// Merge two containers with `set` semantics; `other` wins.
    pub fn merge(&self, other: &Headers) -> Headers {
        let mut merged = Headers::new();
        for (name, value) in self.entries() {
            merged.set(name, value);
        }
        for (name, value) in other.entries() {
            merged.set(name, value);
        }
        merged
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Headers {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.append(name, value);
        }
        headers
    }
}
