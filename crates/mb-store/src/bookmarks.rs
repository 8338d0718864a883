//! Write-through bookmark view over the persistent store.

use crate::PersistentStore;
use mb_core::Destination;
use mb_core::ShellResult;
use std::collections::BTreeMap;

/// In-memory bookmark mapping kept in lockstep with the snapshot file.
///
/// Every mutation writes the whole mapping through to disk and then reloads
/// it, so the view always reflects what actually persisted.
#[derive(Debug)]
pub struct Bookmarks {
    store: PersistentStore,
    entries: BTreeMap<String, Destination>,
}

impl Bookmarks {
    /// Loads the snapshot. A corrupt snapshot is recovered to an empty
    /// mapping with a warning instead of failing the whole shell.
    pub fn open(store: PersistentStore) -> Self {
        let entries = match store.load_bookmarks() {
            Ok(entries) => entries,
            Err(error) => {
                log::warn!("bookmark snapshot unreadable, starting empty: {error}");
                BTreeMap::new()
            }
        };

        Self { store, entries }
    }

    /// Adds or replaces a bookmark. Name is the unique key; last write wins.
    pub fn add(&mut self, name: &str, destination: Destination) -> ShellResult<()> {
        self.entries.insert(name.to_owned(), destination);
        self.store.save_bookmarks(&self.entries)?;
        self.refresh()
    }

    /// Removes a bookmark by name; returns whether it existed.
    pub fn remove(&mut self, name: &str) -> ShellResult<bool> {
        if self.entries.remove(name).is_none() {
            return Ok(false);
        }

        self.store.save_bookmarks(&self.entries)?;
        self.refresh()?;
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&Destination> {
        self.entries.get(name)
    }

    /// Bookmark-bar view, ordered by name.
    pub fn entries(&self) -> &BTreeMap<String, Destination> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn refresh(&mut self) -> ShellResult<()> {
        self.entries = self.store.load_bookmarks()?;
        Ok(())
    }
}
