use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder values for rendering one row.
///
/// Keys are stored ASCII-lowercased, so `ProductFamily`, `productfamily` and
/// `PRODUCTFAMILY` address the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationContext {
    values: BTreeMap<String, String>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized form of a placeholder key.
    pub fn normalize_key(key: &str) -> String {
        key.to_ascii_lowercase()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(Self::normalize_key(key), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&Self::normalize_key(key)).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(&Self::normalize_key(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(&Self::normalize_key(key))
    }

    /// Copy every entry of `other` into `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: &GenerationContext) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in key order (keys are the normalized form).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for GenerationContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k.as_ref(), v);
        }
        ctx
    }
}
