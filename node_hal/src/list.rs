//! Generic owned sequence backing both registries.
//!
//! Equality is injected per list instance, so the same type stores
//! devices (keyed by identity) and interrupt entries (keyed by identity
//! plus attribute path). Lookups scan front to back and act on the first
//! match. The list never deduplicates; callers check [`List::contains`]
//! before inserting.

use std::ops::ControlFlow;
use thiserror::Error;

/// Equality function injected into a [`List`].
pub type EqFn<T> = fn(&T, &T) -> bool;

/// No element matched the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no matching element")]
pub struct NotFound;

/// Insertion-ordered sequence that exclusively owns its elements.
pub struct List<T> {
    items: Vec<T>,
    eq: EqFn<T>,
}

impl<T> List<T> {
    /// Create an empty list using `eq` for every lookup.
    pub fn new(eq: EqFn<T>) -> Self {
        Self {
            items: Vec::new(),
            eq,
        }
    }

    /// Add `item` at the tail.
    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Add `item` at the head.
    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    fn position(&self, probe: &T) -> Option<usize> {
        self.items.iter().position(|item| (self.eq)(item, probe))
    }

    /// First element equal to `probe`.
    pub fn find(&self, probe: &T) -> Option<&T> {
        self.position(probe).map(|idx| &self.items[idx])
    }

    /// First element equal to `probe`, mutably.
    pub fn find_mut(&mut self, probe: &T) -> Option<&mut T> {
        let idx = self.position(probe)?;
        self.items.get_mut(idx)
    }

    /// Copy of the first element equal to `probe`.
    pub fn search(&self, probe: &T) -> Option<T>
    where
        T: Clone,
    {
        self.find(probe).cloned()
    }

    /// Whether an element equal to `probe` is stored.
    pub fn contains(&self, probe: &T) -> bool {
        self.position(probe).is_some()
    }

    /// Remove and return the first element equal to `probe`.
    pub fn remove_matching(&mut self, probe: &T) -> Result<T, NotFound> {
        let idx = self.position(probe).ok_or(NotFound)?;
        Ok(self.items.remove(idx))
    }

    /// Replace the first element equal to `probe` with `value`.
    pub fn update_matching(&mut self, probe: &T, value: T) -> Result<(), NotFound> {
        let slot = self.find_mut(probe).ok_or(NotFound)?;
        *slot = value;
        Ok(())
    }

    /// Visit elements in insertion order until the visitor breaks.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&T) -> ControlFlow<()>,
    {
        for item in &self.items {
            if visitor(item).is_break() {
                break;
            }
        }
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterate mutably in insertion order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every element.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        key: &'static str,
        value: u32,
    }

    fn same_key(a: &Entry, b: &Entry) -> bool {
        a.key.eq_ignore_ascii_case(b.key)
    }

    fn probe(key: &'static str) -> Entry {
        Entry { key, value: 0 }
    }

    fn filled() -> List<Entry> {
        let mut list = List::new(same_key);
        list.append(Entry { key: "b", value: 2 });
        list.append(Entry { key: "c", value: 3 });
        list.prepend(Entry { key: "a", value: 1 });
        list
    }

    #[test]
    fn test_append_prepend_order() {
        let list = filled();
        let keys: Vec<_> = list.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_search_uses_injected_equality() {
        let list = filled();
        assert_eq!(list.search(&probe("B")).map(|e| e.value), Some(2));
        assert!(list.contains(&probe("C")));
        assert!(!list.contains(&probe("z")));
    }

    #[test]
    fn test_first_match_wins() {
        let mut list = filled();
        list.append(Entry { key: "a", value: 9 });
        assert_eq!(list.search(&probe("a")).map(|e| e.value), Some(1));

        let removed = list.remove_matching(&probe("a")).unwrap();
        assert_eq!(removed.value, 1);
        assert_eq!(list.search(&probe("a")).map(|e| e.value), Some(9));
    }

    #[test]
    fn test_remove_missing() {
        let mut list = filled();
        assert_eq!(list.remove_matching(&probe("z")), Err(NotFound));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_update_in_place() {
        let mut list = filled();
        list.update_matching(&probe("b"), Entry { key: "b", value: 20 })
            .unwrap();
        let keys: Vec<_> = list.iter().map(|e| (e.key, e.value)).collect();
        assert_eq!(keys, vec![("a", 1), ("b", 20), ("c", 3)]);
        assert_eq!(
            list.update_matching(&probe("q"), probe("q")),
            Err(NotFound)
        );
    }

    #[test]
    fn test_for_each_stops_early() {
        let list = filled();
        let mut seen = Vec::new();
        list.for_each(|e| {
            seen.push(e.key);
            if e.key == "b" {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_clear() {
        let mut list = filled();
        list.clear();
        assert!(list.is_empty());
    }
}
