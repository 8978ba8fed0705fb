use indexmap::IndexMap;

/// Mapping from external (source-format) ids to internal vertex indexes.
///
/// Built once at construction and immutable afterwards. An external id that
/// the upstream source assigned to more than one vertex is kept with a
/// poisoned slot so it stays permanently unresolvable instead of silently
/// resolving to an arbitrary duplicate.
#[derive(Debug, Clone, Default)]
pub struct ExternalIdIndex {
    entries: IndexMap<i64, Option<usize>>,
}

impl ExternalIdIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, usize)>) -> Self {
        let mut entries: IndexMap<i64, Option<usize>> = IndexMap::new();
        for (external, internal) in pairs {
            match entries.entry(external) {
                indexmap::map::Entry::Occupied(mut slot) => {
                    slot.insert(None);
                }
                indexmap::map::Entry::Vacant(slot) => {
                    slot.insert(Some(internal));
                }
            }
        }
        Self { entries }
    }

    pub fn resolve(&self, external: i64) -> Option<usize> {
        self.entries.get(&external).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_ids() {
        let index = ExternalIdIndex::from_pairs([(5, 2), (7, 0)]);
        assert_eq!(index.resolve(5), Some(2));
        assert_eq!(index.resolve(7), Some(0));
        assert_eq!(index.resolve(9), None);
    }

    #[test]
    fn duplicate_ids_become_unresolvable() {
        let index = ExternalIdIndex::from_pairs([(5, 2), (5, 3), (7, 0)]);
        assert_eq!(index.resolve(5), None);
        assert_eq!(index.resolve(7), Some(0));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn empty_index() {
        let index = ExternalIdIndex::empty();
        assert!(index.is_empty());
        assert_eq!(index.resolve(0), None);
    }
}
