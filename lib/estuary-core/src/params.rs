//! Query parameter and header containers.
//!
//! Both containers keep their keys in a [`BTreeMap`], so iteration and the
//! encoded query string are deterministic.

use std::collections::BTreeMap;

use crate::Result;

/// Query parameters: each key maps to one or more values.
///
/// # Example
///
/// ```
/// use estuary_core::Params;
///
/// let mut params = Params::new();
/// params.set("root", "QmRoot");
/// params.add("tag", "a b");
/// params.add("tag", "c");
/// assert_eq!(params.encode().expect("encode"), "root=QmRoot&tag=a+b&tag=c");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: BTreeMap<String, Vec<String>>,
}

impl Params {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), vec![value.into()]);
    }

    /// Appends `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of `key`, in insertion order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map_or(&[], Vec::as_slice)
    }

    /// Removes `key`, returning its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.inner.remove(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// No keys at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates `(key, value)` pairs, keys sorted, values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Encodes as an `application/x-www-form-urlencoded` query string.
    pub fn encode(&self) -> Result<String> {
        let pairs: Vec<(&str, &str)> = self.iter().collect();
        serde_html_form::to_string(pairs).map_err(Into::into)
    }
}

/// Request headers. Single-valued: a later `set` overwrites an earlier one.
///
/// Names are case-insensitive and stored lowercased, so `Content-Type` and
/// `content-type` are the same header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: BTreeMap<String, String>,
}

impl Headers {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, overwriting any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(header_key(key), value.into());
    }

    /// Merges `other` into `self`; entries of `other` win.
    pub fn extend(&mut self, other: impl IntoIterator<Item = (String, String)>) {
        self.inner
            .extend(other.into_iter().map(|(k, v)| (header_key(k), v)));
    }

    /// Value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.inner.remove(&key.to_ascii_lowercase())
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// No headers at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates `(name, value)` pairs in name order, names lowercased.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (header_key(k), v.into()))
                .collect(),
        }
    }
}

fn header_key(key: impl Into<String>) -> String {
    let mut key = key.into();
    key.make_ascii_lowercase();
    key
}
