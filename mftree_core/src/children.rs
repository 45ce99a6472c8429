//! Growable, order-preserving storage for a directory's children.

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Append-only list of child entries.
///
/// Capacity starts at zero and, whenever an append would overflow it, grows
/// to the next power of two that holds `len + 1` entries.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChildStore {
    entries: Vec<Entry>,
}

impl ChildStore {
    /// Create an empty store. Does not allocate.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a child and return its index.
    pub fn append(&mut self, child: Entry) -> Result<usize> {
        let len = self.entries.len();
        if len == self.entries.capacity() {
            self.grow(len + 1)?;
        }
        self.entries.push(child);
        Ok(len)
    }

    fn grow(&mut self, needed: usize) -> Result<()> {
        let new_cap = needed
            .checked_next_power_of_two()
            .ok_or(Error::OutOfMemory { requested: needed })?;
        self.entries
            .try_reserve_exact(new_cap - self.entries.len())
            .map_err(|_| Error::OutOfMemory { requested: new_cap })
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of children the store can hold before growing.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Child at `index`, in insertion order.
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Iterate children in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.entries.iter_mut()
    }

    /// Move every child out, leaving the store empty with no allocation.
    pub(crate) fn take_all(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }
}

impl<'a> IntoIterator for &'a ChildStore {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Drop for ChildStore {
    // Flatten the subtree onto a heap stack so dropping a deep tree cannot
    // recurse once per level.
    fn drop(&mut self) {
        let mut pending = self.take_all();
        while let Some(mut entry) = pending.pop() {
            pending.extend(entry.children_mut().take_all());
        }
    }
}
