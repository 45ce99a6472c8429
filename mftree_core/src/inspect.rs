//! Whole-tree statistics and consistency checks.

use crate::entry::{Entry, EntryId};
use serde::Serialize;
use std::collections::HashMap;

/// Summary of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Directories, including the root if it is one.
    pub directories: usize,
    /// Files.
    pub files: usize,
    /// Entries with the readonly flag set.
    pub readonly: usize,
    /// Deepest nesting below the root (the root alone is depth 0).
    pub max_depth: usize,
    /// Sum of all file sizes.
    pub total_file_bytes: i64,
}

impl TreeStats {
    /// Walk the tree under `root`.
    pub fn collect(root: &Entry) -> Self {
        let mut stats = TreeStats::default();
        let mut pending = vec![(root, 0usize)];

        while let Some((entry, depth)) = pending.pop() {
            if entry.is_dir() {
                stats.directories += 1;
            } else {
                stats.files += 1;
                stats.total_file_bytes += i64::from(entry.size_bytes());
            }
            if entry.is_readonly() {
                stats.readonly += 1;
            }
            stats.max_depth = stats.max_depth.max(depth);
            pending.extend(entry.children().iter().map(|child| (child, depth + 1)));
        }

        stats
    }

    /// Total number of entries.
    pub fn entries(&self) -> usize {
        self.directories + self.files
    }
}

/// Ids that appear on more than one entry, in ascending order.
///
/// Created entries always get fresh ids, so duplicates can only come from
/// the table itself.
pub fn duplicate_ids(root: &Entry) -> Vec<EntryId> {
    let mut counts: HashMap<EntryId, usize> = HashMap::new();
    let mut pending = vec![root];

    while let Some(entry) = pending.pop() {
        *counts.entry(entry.id()).or_insert(0) += 1;
        pending.extend(entry.children().iter());
    }

    let mut dups: Vec<EntryId> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(id, _)| id)
        .collect();
    dups.sort_unstable();
    dups
}
