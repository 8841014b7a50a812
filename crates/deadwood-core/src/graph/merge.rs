//! Merge operators for results exchanged between modules
//!
//! Two operators with different roles:
//!
//! - `merge_sibling(a, b)` combines the results of two dependencies of the
//!   same module, where `a` is listed before `b`.
//! - `merge_parent(own, inherited)` combines a module's own result with
//!   what it inherited from its dependencies.
//!
//! In both the first argument wins on collision, and neither mutates its
//! inputs. Sibling merging is therefore not commutative.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::warn;

use crate::symbol::Symbol;

pub trait Merge: Sized {
    fn merge_sibling(&self, other: &Self) -> Self;
    fn merge_parent(&self, inherited: &Self) -> Self;
}

/// Union of values; collisions cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntermediateSet<T: Ord> {
    values: BTreeSet<T>,
}

impl<T: Ord> Default for IntermediateSet<T> {
    fn default() -> Self {
        Self {
            values: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> IntermediateSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> bool {
        self.values.insert(value)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.values.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Ord + Clone> FromIterator<T> for IntermediateSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<T: Ord + Clone> Merge for IntermediateSet<T> {
    fn merge_sibling(&self, other: &Self) -> Self {
        self.values.union(&other.values).cloned().collect()
    }

    fn merge_parent(&self, inherited: &Self) -> Self {
        self.merge_sibling(inherited)
    }
}

/// Keyed values; on collision the first argument's value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntermediateMap<K: Ord, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for IntermediateMap<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> IntermediateMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for IntermediateMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> Merge for IntermediateMap<K, V> {
    fn merge_sibling(&self, other: &Self) -> Self {
        let mut entries = other.entries.clone();
        entries.extend(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self { entries }
    }

    fn merge_parent(&self, inherited: &Self) -> Self {
        self.merge_sibling(inherited)
    }
}

/// A named value an extractor attaches to its module's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum IntermediateResult {
    Set(IntermediateSet<String>),
    Map(IntermediateMap<String, String>),
}

impl IntermediateResult {
    fn combine(&self, other: &Self, parent: bool) -> Self {
        match (self, other) {
            (IntermediateResult::Set(a), IntermediateResult::Set(b)) => IntermediateResult::Set(
                if parent {
                    a.merge_parent(b)
                } else {
                    a.merge_sibling(b)
                },
            ),
            (IntermediateResult::Map(a), IntermediateResult::Map(b)) => IntermediateResult::Map(
                if parent {
                    a.merge_parent(b)
                } else {
                    a.merge_sibling(b)
                },
            ),
            _ => {
                warn!("intermediate results of different kinds share a key; keeping the preferred one");
                self.clone()
            }
        }
    }
}

impl Merge for IntermediateResult {
    fn merge_sibling(&self, other: &Self) -> Self {
        self.combine(other, false)
    }

    fn merge_parent(&self, inherited: &Self) -> Self {
        self.combine(inherited, true)
    }
}

/// Intermediate results of one module keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntermediateResults {
    results: BTreeMap<String, IntermediateResult>,
}

impl IntermediateResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &str, result: IntermediateResult) {
        self.results.insert(key.to_string(), result);
    }

    pub fn get(&self, key: &str) -> Option<&IntermediateResult> {
        self.results.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn combine(&self, other: &Self, parent: bool) -> Self {
        let mut results = other.results.clone();
        for (key, mine) in &self.results {
            let merged = match other.results.get(key) {
                Some(theirs) if parent => mine.merge_parent(theirs),
                Some(theirs) => mine.merge_sibling(theirs),
                None => mine.clone(),
            };
            results.insert(key.clone(), merged);
        }
        Self { results }
    }
}

impl Merge for IntermediateResults {
    fn merge_sibling(&self, other: &Self) -> Self {
        self.combine(other, false)
    }

    fn merge_parent(&self, inherited: &Self) -> Self {
        self.combine(inherited, true)
    }
}

/// What a module hands down to the modules that depend on it: every symbol
/// analyzed in it or its transitive dependencies, and the merged
/// intermediate results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inheritance {
    pub symbols: IntermediateSet<Symbol>,
    pub intermediate: IntermediateResults,
}

impl Merge for Inheritance {
    fn merge_sibling(&self, other: &Self) -> Self {
        Self {
            symbols: self.symbols.merge_sibling(&other.symbols),
            intermediate: self.intermediate.merge_sibling(&other.intermediate),
        }
    }

    fn merge_parent(&self, inherited: &Self) -> Self {
        Self {
            symbols: self.symbols.merge_parent(&inherited.symbols),
            intermediate: self.intermediate.merge_parent(&inherited.intermediate),
        }
    }
}
