// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Order-maintaining list with rank-based access.
//!
//! Values are appended to a slot vector and never move while live; a
//! separate permutation (`order`) of slot indices is kept sorted. Removal
//! tombstones the slot. Once dead slots outnumber live ones (and pass
//! [`COMPACT_THRESHOLD`]) the slot vector is compacted and `order` remapped.

/// Minimum number of dead slots before a compaction is considered.
pub const COMPACT_THRESHOLD: usize = 64;

/// A sorted collection under a caller-supplied strict weak order `less`.
///
/// Equal elements are kept adjacent; a new value is inserted before any
/// existing values that compare equal to it.
///
/// # Example
///
/// ```
/// use lmv_core::SortedList;
///
/// let mut list = SortedList::new();
/// for v in [5, 1, 4, 2] {
///     list.add(v);
/// }
/// assert_eq!(list.get(0), Some(&1));
/// list.remove_at(0);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![2, 4, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct SortedList<T, F = fn(&T, &T) -> bool> {
    values: Vec<Option<T>>,
    order: Vec<usize>,
    less: F,
}

impl<T: PartialOrd> SortedList<T> {
    /// Creates a list ordered by `<`.
    pub fn new() -> Self {
        Self::with_less(|a: &T, b: &T| a < b)
    }
}

impl<T: PartialOrd> Default for SortedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> SortedList<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// Creates a list ordered by `less`, which must be a strict weak order.
    /// Inconsistent comparators are not detected.
    pub fn with_less(less: F) -> Self {
        Self {
            values: Vec::new(),
            order: Vec::new(),
            less,
        }
    }

    #[inline]
    fn at(&self, rank: usize) -> &T {
        match &self.values[self.order[rank]] {
            Some(value) => value,
            None => unreachable!("order references a removed slot"),
        }
    }

    /// First rank in `0..len` whose value is not less than `value`, or `len`.
    pub fn find_index(&self, value: &T) -> usize {
        self.find_index_in(value, 0, self.order.len())
    }

    /// Lower bound of `value` within ranks `begin..end`.
    pub fn find_index_in(&self, value: &T, mut begin: usize, mut end: usize) -> usize {
        while begin < end {
            let mid = begin + (end - begin) / 2;
            if (self.less)(self.at(mid), value) {
                begin = mid + 1;
            } else {
                end = mid;
            }
        }
        begin
    }

    /// Inserts `value` at its sorted rank and returns that rank.
    pub fn add(&mut self, value: T) -> usize {
        let rank = self.find_index(&value);
        self.values.push(Some(value));
        self.order.insert(rank, self.values.len() - 1);
        rank
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Alias of [`len`](Self::len).
    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Value at sorted position `rank`.
    #[inline]
    pub fn get(&self, rank: usize) -> Option<&T> {
        self.order
            .get(rank)
            .and_then(|&slot| self.values[slot].as_ref())
    }

    /// Removes and returns the value at sorted position `rank`.
    pub fn remove_at(&mut self, rank: usize) -> Option<T> {
        if rank >= self.order.len() {
            return None;
        }
        let slot = self.order.remove(rank);
        let value = self.values[slot].take();
        self.maybe_compact();
        value
    }

    /// Values in sorted order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        (0..self.order.len()).map(move |rank| self.at(rank))
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.order.clear();
    }

    /// Number of slots held, live or dead.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.values.len()
    }

    fn maybe_compact(&mut self) {
        let dead = self.values.len() - self.order.len();
        if dead < COMPACT_THRESHOLD || dead <= self.order.len() {
            return;
        }

        let mut remap = vec![usize::MAX; self.values.len()];
        let mut live = Vec::with_capacity(self.order.len());
        for (slot, value) in self.values.drain(..).enumerate() {
            if value.is_some() {
                remap[slot] = live.len();
                live.push(value);
            }
        }
        for slot in &mut self.order {
            *slot = remap[*slot];
        }
        self.values = live;
        tracing::trace!(dead, live = self.values.len(), "compacted sorted list");
    }
}
