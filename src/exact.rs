//! Exact distinct counting baseline used to measure estimator error.
//!
//! Every distinct value is stored once, so memory grows with cardinality.

use std::borrow::Borrow;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::mem::size_of;

use hashbrown::HashSet;

#[derive(Clone, PartialEq, Eq)]
pub struct ExactCardinality<T: Hash + Eq> {
    seen: HashSet<T>,
}

impl<T: Hash + Eq> ExactCardinality<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Insert `item`, returning `true` if it was not seen before
    #[inline]
    pub fn insert(&mut self, item: T) -> bool {
        self.seen.insert(item)
    }

    #[inline]
    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.seen.contains(item)
    }

    /// Exact number of distinct items inserted
    #[inline]
    pub fn count(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Return memory size of the set table, not counting heap data owned by items
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.seen.capacity() * size_of::<T>()
    }
}

impl ExactCardinality<String> {
    /// Insert a borrowed string, allocating only when it was not seen before
    #[inline]
    pub fn insert_str(&mut self, item: &str) -> bool {
        if self.seen.contains(item) {
            return false;
        }
        self.seen.insert(item.to_owned())
    }
}

impl<T: Hash + Eq> Default for ExactCardinality<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> Extend<T> for ExactCardinality<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.seen.extend(iter);
    }
}

impl<T: Hash + Eq> FromIterator<T> for ExactCardinality<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            seen: iter.into_iter().collect(),
        }
    }
}

impl<T: Hash + Eq> Debug for ExactCardinality<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ count: {} }}", self.count())
    }
}
