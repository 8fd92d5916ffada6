//! Pick complete transcripts out of step-level snapshots.
//!
//! Each API-Bank record is a snapshot of a transcript that grows step by
//! step. Only the last snapshot of each conversation is converted.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Indices of the last snapshot of every conversation in a flat file.
///
/// A boundary lies wherever a record's first user query differs from the
/// previous record's; the record before it is complete. The final record
/// always closes the last conversation.
#[must_use]
pub fn conversation_ends(first_queries: &[Option<&str>]) -> Vec<usize> {
    let mut ends: Vec<usize> = first_queries
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] != pair[1])
        .map(|(idx, _)| idx)
        .collect();
    if !first_queries.is_empty() {
        ends.push(first_queries.len() - 1);
    }
    ends
}

/// For every group, the index of its item with the greatest step.
///
/// Groups come out in first-seen order; equal steps keep the earliest item.
#[must_use]
pub fn latest_per_group<K, S>(items: impl IntoIterator<Item = (K, S)>) -> Vec<usize>
where
    K: Eq + Hash,
    S: PartialOrd,
{
    let mut slots: FxHashMap<K, usize> = FxHashMap::default();
    let mut best: Vec<(usize, S)> = Vec::new();
    for (idx, (key, step)) in items.into_iter().enumerate() {
        match slots.get(&key) {
            Some(&slot) => {
                if step > best[slot].1 {
                    best[slot] = (idx, step);
                }
            }
            None => {
                slots.insert(key, best.len());
                best.push((idx, step));
            }
        }
    }
    best.into_iter().map(|(idx, _)| idx).collect()
}
