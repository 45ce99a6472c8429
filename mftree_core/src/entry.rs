//! Namespace entries (inodes) and their kinds.

use crate::children::ChildStore;
use serde::Serialize;
use std::borrow::Cow;

/// Entry identifier, unique across a namespace.
pub type EntryId = i32;

/// Id carried by an entry that has not been populated yet.
pub const UNSET_ID: EntryId = -1;

/// Kind of entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A directory, which may own children.
    Directory,
    /// A regular file.
    File,
}

impl EntryKind {
    /// Convert to the table's flag byte.
    pub fn to_flag(self) -> u8 {
        match self {
            EntryKind::Directory => 1,
            EntryKind::File => 0,
        }
    }

    /// Parse the table's flag byte. Any nonzero value is a directory.
    pub fn from_flag(value: u8) -> Self {
        if value != 0 {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Get the string name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Directory => "directory",
            EntryKind::File => "file",
        }
    }
}

/// A single directory or file in the namespace tree.
///
/// Every entry is owned by exactly one parent (through its [`ChildStore`]) or
/// by whoever holds the root. Files never have children.
#[derive(Debug, PartialEq, Eq)]
pub struct Entry {
    pub(crate) id: EntryId,
    pub(crate) name: Vec<u8>,
    pub(crate) kind: EntryKind,
    pub(crate) readonly: bool,
    pub(crate) size: i32,
    pub(crate) children: ChildStore,
}

impl Entry {
    /// Create an unpopulated entry: id unset, no name, a writable empty file.
    ///
    /// The decoder and the creator fill this in before anyone else sees it.
    pub fn empty() -> Self {
        Self {
            id: UNSET_ID,
            name: Vec::new(),
            kind: EntryKind::File,
            readonly: false,
            size: 0,
            children: ChildStore::new(),
        }
    }

    /// Create a childless entry of size zero.
    pub(crate) fn leaf(id: EntryId, name: Vec<u8>, kind: EntryKind, readonly: bool) -> Self {
        Self {
            id,
            name,
            kind,
            readonly,
            ..Self::empty()
        }
    }

    /// Entry id.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Raw name bytes, without any terminator.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Name decoded as UTF-8, with invalid sequences replaced.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Entry kind.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// True for directories.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// True if the entry blocks creation of new children.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Size in bytes. Always 0 for directories.
    pub fn size_bytes(&self) -> i32 {
        match self.kind {
            EntryKind::Directory => 0,
            EntryKind::File => self.size,
        }
    }

    /// Children in insertion order. Always empty for files.
    pub fn children(&self) -> &ChildStore {
        &self.children
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn children_mut(&mut self) -> &mut ChildStore {
        &mut self.children
    }
}
