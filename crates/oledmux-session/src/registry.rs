use std::collections::BTreeMap;
use std::ops::Bound;

use crate::producer::{TagIndex, TagSource};

/// The process-wide mapping from tag index to producer.
///
/// Built once at startup and then shared immutably (`Arc`) with every
/// screen for the lifetime of the process. Increment/decrement wrap within
/// the known set in key order, so the set does not have to be contiguous.
#[derive(Default)]
pub struct TagRegistry {
    tags: BTreeMap<TagIndex, Box<dyn TagSource>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer under `index`, replacing any previous entry.
    pub fn insert(&mut self, index: TagIndex, source: Box<dyn TagSource>) {
        self.tags.insert(index, source);
    }

    pub fn get(&self, index: TagIndex) -> Option<&dyn TagSource> {
        self.tags.get(&index).map(AsRef::as_ref)
    }

    pub fn contains(&self, index: TagIndex) -> bool {
        self.tags.contains_key(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// The registered index following `current`, wrapping to the first.
    ///
    /// Returns `None` only when no tags are registered.
    pub fn next_after(&self, current: TagIndex) -> Option<TagIndex> {
        self.tags
            .range((Bound::Excluded(current), Bound::Unbounded))
            .next()
            .or_else(|| self.tags.iter().next())
            .map(|(&index, _)| index)
    }

    /// The registered index preceding `current`, wrapping to the last.
    ///
    /// Returns `None` only when no tags are registered.
    pub fn prev_before(&self, current: TagIndex) -> Option<TagIndex> {
        self.tags
            .range(..current)
            .next_back()
            .or_else(|| self.tags.iter().next_back())
            .map(|(&index, _)| index)
    }
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.tags.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::producer::{Area, TagFrame};

    struct Silent;

    impl TagSource for Silent {
        fn start(&self, _area: Area, _cancel: CancellationToken) -> mpsc::Receiver<TagFrame> {
            let (_tx, rx) = mpsc::channel(1);
            rx
        }
    }

    fn registry_of(indices: &[TagIndex]) -> TagRegistry {
        let mut registry = TagRegistry::new();
        for &index in indices {
            registry.insert(index, Box::new(Silent));
        }
        registry
    }

    #[test]
    fn increment_wraps_to_first() {
        let registry = registry_of(&[1, 2, 3]);
        assert_eq!(registry.next_after(1), Some(2));
        assert_eq!(registry.next_after(2), Some(3));
        assert_eq!(registry.next_after(3), Some(1));
    }

    #[test]
    fn decrement_wraps_to_last() {
        let registry = registry_of(&[1, 2, 3]);
        assert_eq!(registry.prev_before(3), Some(2));
        assert_eq!(registry.prev_before(2), Some(1));
        assert_eq!(registry.prev_before(1), Some(3));
    }

    #[test]
    fn wrapping_handles_non_contiguous_sets() {
        let registry = registry_of(&[1, 5, 9]);
        assert_eq!(registry.next_after(1), Some(5));
        assert_eq!(registry.next_after(9), Some(1));
        assert_eq!(registry.prev_before(5), Some(1));
        assert_eq!(registry.prev_before(1), Some(9));
        // A current index between entries still lands on a neighbour.
        assert_eq!(registry.next_after(3), Some(5));
        assert_eq!(registry.prev_before(7), Some(5));
    }

    #[test]
    fn empty_registry_has_no_neighbours() {
        let registry = registry_of(&[]);
        assert_eq!(registry.next_after(1), None);
        assert_eq!(registry.prev_before(1), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_and_membership() {
        let registry = registry_of(&[2, 4]);
        assert!(registry.contains(2));
        assert!(!registry.contains(3));
        assert!(registry.get(4).is_some());
        assert!(registry.get(0).is_none());
        assert_eq!(registry.len(), 2);
    }
}
