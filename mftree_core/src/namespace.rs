//! Namespace operations: create, find and release.

use crate::decode::{DecodeOptions, Decoder};
use crate::entry::{Entry, EntryId, EntryKind};
use crate::error::{Error, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Hands out entry ids in increasing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: Option<EntryId>,
}

impl IdAllocator {
    /// Allocator starting at id 0.
    pub fn new() -> Self {
        Self { next: Some(0) }
    }

    /// Allocator starting just past `max`.
    pub fn after(max: EntryId) -> Self {
        Self {
            next: max.checked_add(1),
        }
    }

    /// Next id to be handed out, or `None` once every id is used.
    pub fn peek(&self) -> Option<EntryId> {
        self.next
    }

    /// Take the next id.
    pub fn allocate(&mut self) -> Result<EntryId> {
        let id = self.next.ok_or(Error::IdSpaceExhausted)?;
        self.next = id.checked_add(1);
        Ok(id)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts reported by [`Entry::release`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseStats {
    /// Entry names released.
    pub names_released: usize,
    /// Child stores released.
    pub containers_released: usize,
}

impl Entry {
    /// Create a childless entry inside this directory.
    ///
    /// Fails with [`Error::NotADirectory`] on a file, readonly or not. A
    /// readonly directory is left untouched and `Ok(())` is returned.
    /// Otherwise the new entry takes the next id from `ids` and is appended
    /// after existing children. Look it up with [`Entry::find`] if you need it.
    pub fn create(
        &mut self,
        ids: &mut IdAllocator,
        name: impl Into<Vec<u8>>,
        readonly: bool,
        kind: EntryKind,
    ) -> Result<()> {
        let name = name.into();

        if !self.is_dir() {
            return Err(Error::not_a_directory(self.name_lossy()));
        }
        if self.readonly {
            debug!(
                "Not creating {:?} in readonly {:?}",
                String::from_utf8_lossy(&name),
                self.name_lossy()
            );
            return Ok(());
        }
        if name.is_empty() {
            return Err(Error::invalid_name("name cannot be empty"));
        }
        if name.contains(&0) {
            return Err(Error::invalid_name("name cannot contain null bytes"));
        }

        let id = ids.allocate()?;
        let child = Entry::leaf(id, name, kind, readonly);
        debug!(
            "Created {} {:?} (id {}) in {:?}",
            kind.as_str(),
            child.name_lossy(),
            id,
            self.name_lossy()
        );
        self.children.append(child)?;
        Ok(())
    }

    /// Find a direct child by exact name and kind.
    ///
    /// Scans children in insertion order and returns the first match.
    pub fn find(&self, name: &[u8], kind: EntryKind) -> Result<Option<&Entry>> {
        if !self.is_dir() {
            return Err(Error::not_a_directory(self.name_lossy()));
        }
        Ok(self
            .children
            .iter()
            .find(|child| child.kind == kind && child.name.as_slice() == name))
    }

    /// Mutable variant of [`Entry::find`].
    pub fn find_mut(&mut self, name: &[u8], kind: EntryKind) -> Result<Option<&mut Entry>> {
        if !self.is_dir() {
            return Err(Error::not_a_directory(self.name_lossy()));
        }
        Ok(self
            .children
            .iter_mut()
            .find(|child| child.kind == kind && child.name.as_slice() == name))
    }

    /// Release this entry and everything below it.
    pub fn release(self) -> ReleaseStats {
        self.release_with(|_| {})
    }

    /// Release the tree, calling `on_release` for each entry just before its
    /// own storage goes.
    ///
    /// Every descendant is released before its parent, and each entry exactly
    /// once.
    pub fn release_with(self, mut on_release: impl FnMut(&Entry)) -> ReleaseStats {
        let mut stats = ReleaseStats::default();
        let mut pending = vec![(self, false)];

        while let Some((mut entry, expanded)) = pending.pop() {
            if expanded {
                on_release(&entry);
                drop(std::mem::take(&mut entry.name));
                stats.names_released += 1;
                drop(entry.children.take_all());
                stats.containers_released += 1;
                continue;
            }
            let children = entry.children.take_all();
            pending.push((entry, true));
            pending.extend(children.into_iter().map(|child| (child, false)));
        }

        stats
    }
}

/// A decoded or freshly created namespace tree together with its id counter.
#[derive(Debug)]
pub struct Namespace {
    root: Entry,
    ids: IdAllocator,
}

impl Namespace {
    /// Create a namespace holding only a writable root directory.
    pub fn new(root_name: impl Into<Vec<u8>>) -> Result<Self> {
        let root_name = root_name.into();
        if root_name.is_empty() {
            return Err(Error::invalid_name("name cannot be empty"));
        }

        let mut ids = IdAllocator::new();
        let root = Entry::leaf(ids.allocate()?, root_name, EntryKind::Directory, false);
        Ok(Self { root, ids })
    }

    /// Decode a namespace from an in-memory table.
    pub fn from_table(data: &[u8], options: DecodeOptions) -> Result<Self> {
        let table = Decoder::decode_table(data, options)?;
        Ok(Self {
            root: table.root,
            ids: table.ids,
        })
    }

    /// Read a table file and decode it.
    pub fn open(path: impl AsRef<Path>, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Self::from_table(&data, options)
    }

    /// Root entry.
    pub fn root(&self) -> &Entry {
        &self.root
    }

    /// Id the next created entry will get.
    pub fn next_id(&self) -> Option<EntryId> {
        self.ids.peek()
    }

    /// Borrow the root and the id counter together, for calling
    /// [`Entry::create`] anywhere in the tree.
    pub fn parts_mut(&mut self) -> (&mut Entry, &mut IdAllocator) {
        (&mut self.root, &mut self.ids)
    }

    /// Resolve a directory by walking `components` from the root.
    pub fn lookup<C: AsRef<[u8]>>(&self, components: &[C]) -> Result<&Entry> {
        let mut dir = &self.root;
        for component in components {
            let component = component.as_ref();
            dir = dir
                .find(component, EntryKind::Directory)?
                .ok_or_else(|| Error::not_found(String::from_utf8_lossy(component)))?;
        }
        Ok(dir)
    }

    /// Mutable variant of [`Namespace::lookup`].
    pub fn lookup_mut<C: AsRef<[u8]>>(&mut self, components: &[C]) -> Result<&mut Entry> {
        descend_mut(&mut self.root, components)
    }

    /// Create an entry in the directory reached by `components`.
    pub fn create_at<C: AsRef<[u8]>>(
        &mut self,
        components: &[C],
        name: impl Into<Vec<u8>>,
        readonly: bool,
        kind: EntryKind,
    ) -> Result<()> {
        let dir = descend_mut(&mut self.root, components)?;
        dir.create(&mut self.ids, name, readonly, kind)
    }

    /// Give up the id counter and return the tree.
    pub fn into_root(self) -> Entry {
        self.root
    }

    /// Release the whole tree.
    pub fn release(self) -> ReleaseStats {
        self.root.release()
    }
}

fn descend_mut<'a, C: AsRef<[u8]>>(root: &'a mut Entry, components: &[C]) -> Result<&'a mut Entry> {
    let mut dir = root;
    for component in components {
        let component = component.as_ref();
        dir = dir
            .find_mut(component, EntryKind::Directory)?
            .ok_or_else(|| Error::not_found(String::from_utf8_lossy(component)))?;
    }
    Ok(dir)
}
