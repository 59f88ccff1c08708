// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity mode-name lookup
//!
//! Each state owns one table mapping console mode names (`"blink"`) to the
//! state a `CHANGE_MODE` line should push. Tables are filled during setup
//! and only read afterwards.

use thiserror::Error;

/// Table already holds its configured number of entries
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("command table full ({capacity} entries), cannot add '{key}'")]
pub struct CommandTableFull {
    pub key: String,
    pub capacity: usize,
}

/// Bounded string-to-handle map with linear lookup and no removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable<H> {
    entries: Vec<(String, H)>,
    capacity: usize,
}

impl<H: Copy> CommandTable<H> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Register a mode name
    ///
    /// Existing entries are untouched when the table is full. If a key is
    /// added twice, the first entry wins on lookup.
    pub fn add(&mut self, key: &str, handle: H) -> Result<(), CommandTableFull> {
        if self.entries.len() >= self.capacity {
            return Err(CommandTableFull {
                key: key.to_string(),
                capacity: self.capacity,
            });
        }
        self.entries.push((key.to_string(), handle));
        Ok(())
    }

    /// Exact-match lookup
    pub fn get(&self, key: &str) -> Option<H> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, handle)| *handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registered names, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut table = CommandTable::with_capacity(4);
        table.add("blink", 3usize).unwrap();
        table.add("controller", 2).unwrap();

        assert_eq!(table.get("blink"), Some(3));
        assert_eq!(table.get("controller"), Some(2));
        assert_eq!(table.get("blin"), None);
        assert_eq!(table.get("Blink"), None);
    }

    #[test]
    fn test_exhaustion_keeps_existing_entries() {
        let mut table = CommandTable::with_capacity(2);
        table.add("a", 1u8).unwrap();
        table.add("b", 2).unwrap();

        let err = table.add("c", 3).unwrap_err();
        assert_eq!(err.capacity, 2);
        assert_eq!(err.key, "c");
        assert!(table.add("d", 4).is_err());

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(1));
        assert_eq!(table.get("b"), Some(2));
        assert_eq!(table.get("c"), None);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let mut table = CommandTable::with_capacity(3);
        table.add("blink", 1u8).unwrap();
        table.add("blink", 2).unwrap();
        assert_eq!(table.get("blink"), Some(1));
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["blink", "blink"]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut table: CommandTable<u8> = CommandTable::with_capacity(0);
        assert!(table.is_empty());
        assert!(table.add("blink", 1).is_err());
    }
}
