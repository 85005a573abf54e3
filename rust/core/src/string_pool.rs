// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deduplicating pool for node base names.

use rustc_hash::FxHashMap;

/// Interns strings, handing out dense `u32` ids.
///
/// Id 0 is always the empty string, so a zeroed name slot reads back as `""`.
/// The lookup map only lives during the build; [`StringPool::into_strings`]
/// drops it and keeps the string table.
#[derive(Debug)]
pub struct StringPool {
    strings: Vec<String>,
    lookup: FxHashMap<String, u32>,
}

impl StringPool {
    pub fn new() -> Self {
        let mut pool = Self {
            strings: Vec::new(),
            lookup: FxHashMap::default(),
        };
        pool.intern("");
        pool
    }

    /// Returns the id of `s`, adding it to the pool on first sight.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(s.to_owned());
        self.lookup.insert(s.to_owned(), id);
        id
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&str> {
        self.strings.get(id as usize).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Consumes the pool, discarding the lookup map.
    pub fn into_strings(self) -> Box<[String]> {
        self.strings.into_boxed_slice()
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_id_zero() {
        let mut pool = StringPool::new();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get(0), Some(""));
    }

    #[test]
    fn intern_deduplicates() {
        let mut pool = StringPool::new();
        let a = pool.intern("Basic Wall [");
        let b = pool.intern("Door");
        assert_eq!(pool.intern("Basic Wall ["), a);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 3);

        let strings = pool.into_strings();
        assert_eq!(&*strings[a as usize], "Basic Wall [");
        assert_eq!(&*strings[b as usize], "Door");
    }
}
