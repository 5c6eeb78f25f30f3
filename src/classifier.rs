//! Uniqueness classification of candidate values (e.g. new passwords) against a
//! caller-owned [`MembershipFilter`].
//!
//! Candidates are processed in input order and every unique candidate is added
//! to the filter before the next one is looked at, so a value repeated within
//! one batch is `Unique` on its first occurrence and `AlreadyUsed` afterwards.

use std::fmt::{Display, Formatter};
use std::hash::Hash;

use hashbrown::HashMap;
use serde_json::Value;

use crate::filter::MembershipFilter;

/// Classification result for a single candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not text, empty, or whitespace only. The filter is not touched.
    InvalidInput,
    /// The filter (probably) contains the candidate already
    AlreadyUsed,
    /// First sighting, the candidate has been added to the filter
    Unique,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::InvalidInput => "invalid input",
            Status::AlreadyUsed => "already used",
            Status::Unique => "unique",
        })
    }
}

/// A value that may or may not carry text to classify
pub trait Candidate {
    /// Text of the candidate, `None` when the value is not text at all
    fn as_text(&self) -> Option<&str>;
}

impl Candidate for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Candidate for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }
}

impl<T: Candidate> Candidate for Option<T> {
    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(Candidate::as_text)
    }
}

impl Candidate for Value {
    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }
}

/// Classify a single candidate, adding it to `filter` when it is unique
pub fn classify_one<C>(filter: &mut MembershipFilter, candidate: &C) -> Status
where
    C: Candidate + ?Sized,
{
    let text = match candidate.as_text() {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Status::InvalidInput,
    };

    if filter.contains(text) {
        Status::AlreadyUsed
    } else {
        filter.add(text);
        Status::Unique
    }
}

/// Classify `candidates` in order, mutating `filter` as unique values are found.
///
/// Returns one entry per input occurrence. Use [`Classifications::last_wins`] to
/// collapse repeated values into a single entry.
pub fn classify<I>(filter: &mut MembershipFilter, candidates: I) -> Classifications<I::Item>
where
    I: IntoIterator,
    I::Item: Candidate,
{
    let results = candidates
        .into_iter()
        .map(|candidate| {
            let status = classify_one(filter, &candidate);
            (candidate, status)
        })
        .collect();
    Classifications(results)
}

/// Ordered classification results, one per input occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Classifications<T>(Vec<(T, Status)>);

impl<T> Classifications<T> {
    pub fn iter(&self) -> impl Iterator<Item = &(T, Status)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of results with given `status`
    pub fn count(&self, status: Status) -> usize {
        self.0.iter().filter(|(_, s)| *s == status).count()
    }

    pub fn into_vec(self) -> Vec<(T, Status)> {
        self.0
    }
}

impl<T: Hash + Eq> Classifications<T> {
    /// Collapse equal candidates into one entry holding the status of the last occurrence.
    ///
    /// Entries keep the position of the first occurrence.
    pub fn last_wins(self) -> Vec<(T, Status)> {
        let mut statuses: Vec<Option<Status>> = vec![None; self.0.len()];
        let mut first_seen: HashMap<&T, usize> = HashMap::with_capacity(self.0.len());
        for (idx, (candidate, status)) in self.0.iter().enumerate() {
            let first = *first_seen.entry(candidate).or_insert(idx);
            statuses[first] = Some(*status);
        }
        drop(first_seen);

        self.0
            .into_iter()
            .zip(statuses)
            .filter_map(|((candidate, _), status)| status.map(|status| (candidate, status)))
            .collect()
    }
}

impl<T> IntoIterator for Classifications<T> {
    type Item = (T, Status);
    type IntoIter = std::vec::IntoIter<(T, Status)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
