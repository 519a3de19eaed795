//! # Registry
//!
//! Fixed-capacity, insertion-ordered container. Backs both the tick source's
//! callback list and the state machine's child-state set.
//!
//! Entries are never removed or reordered: iteration order is registration
//! order for the lifetime of the registry. Once full, `push` hands the
//! rejected item back and the existing content stays untouched.

use heapless::Vec;

/// Ordered list of at most `N` entries, stored inline (no heap).
#[derive(Debug, Clone)]
pub struct Registry<T, const N: usize> {
    entries: Vec<T, N>,
}

impl<T, const N: usize> Registry<T, N> {
    /// Create an empty registry. Usable in `static` initializers.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append `item` after every existing entry.
    ///
    /// # Returns
    /// - `Ok(())` — the item was stored
    /// - `Err(item)` — the registry is full; the item is handed back
    pub fn push(&mut self, item: T) -> Result<(), T> {
        self.entries.push(item)
    }

    /// Entries in registration order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Number of registered entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    /// Maximum number of entries (`N`).
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for Registry<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r, T, const N: usize> IntoIterator for &'r Registry<T, N> {
    type Item = &'r T;
    type IntoIter = core::slice::Iter<'r, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut registry: Registry<u8, 4> = Registry::new();
        for i in [3, 1, 2] {
            registry.push(i).unwrap();
        }
        let order: std::vec::Vec<u8> = registry.iter().copied().collect();
        assert_eq!(order, [3, 1, 2]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_full());
    }

    #[test]
    fn test_push_when_full_hands_item_back() {
        let mut registry: Registry<u8, 2> = Registry::new();
        registry.push(10).unwrap();
        registry.push(20).unwrap();
        assert!(registry.is_full());

        assert_eq!(registry.push(30), Err(30));
        let order: std::vec::Vec<u8> = registry.iter().copied().collect();
        assert_eq!(order, [10, 20], "Rejected push must not disturb content");
    }

    #[test]
    fn test_capacity_is_const_generic() {
        let registry: Registry<(), 7> = Registry::default();
        assert_eq!(registry.capacity(), 7);
        assert!(registry.is_empty());
    }
}
