use indexmap::IndexMap;
use std::collections::HashMap;

use loris_dsl::ast::Name;

/// Default register capacity when the caller does not override it.
pub const DEFAULT_REGISTER_SIZE: usize = 10000;

/// The finite name register of a configuration.
///
/// Labels are positive integers allocated monotonically, so the forward map
/// iterates in ascending label order. The forward and inverse maps stay
/// bijective: every tracked name occupies exactly one label.
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    capacity: usize,
    next_label: usize,
    names: IndexMap<usize, Name>,
    labels: HashMap<Name, usize>,
}

impl Register {
    /// Install `names` at labels `1..=n` in the given order.
    pub fn seed(names: impl IntoIterator<Item = Name>, capacity: usize) -> Self {
        let mut reg = Register {
            capacity,
            next_label: 1,
            names: IndexMap::new(),
            labels: HashMap::new(),
        };
        for name in names {
            let label = reg.next_label;
            reg.next_label += 1;
            reg.labels.insert(name.clone(), label);
            reg.names.insert(label, name);
        }
        reg
    }

    pub fn lookup(&self, label: usize) -> Option<&Name> {
        self.names.get(&label)
    }

    pub fn label_of(&self, name: &Name) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Mint a fresh name, place it at the next label, and return both.
    ///
    /// The minted name is the smallest `#k` not already tracked. It is a pure
    /// function of the register contents, so every copy of a configuration
    /// mints the same name — the canonical key depends on this.
    pub fn allocate_fresh(&mut self) -> (usize, Name) {
        let mut k = 1u32;
        while self.labels.contains_key(&Name::Fresh(k)) {
            k += 1;
        }
        let name = Name::Fresh(k);
        let label = self.next_label;
        self.next_label += 1;
        self.labels.insert(name.clone(), label);
        self.names.insert(label, name.clone());
        (label, name)
    }

    /// Labels in ascending order. Every rule that quantifies over the known
    /// names iterates this.
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.names.keys().copied()
    }

    /// `(label, name)` pairs in ascending label order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &Name)> {
        self.names.iter().map(|(l, n)| (*l, n))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn at_capacity(&self) -> bool {
        self.names.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Register {
        Register::seed([Name::free("a"), Name::free("b")], 8)
    }

    #[test]
    fn seed_assigns_labels_in_order() {
        let reg = seeded();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup(1), Some(&Name::free("a")));
        assert_eq!(reg.lookup(2), Some(&Name::free("b")));
        assert_eq!(reg.labels().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn forward_and_inverse_maps_agree() {
        let mut reg = seeded();
        reg.allocate_fresh();
        for (label, name) in reg.entries() {
            assert_eq!(reg.label_of(name), Some(label));
        }
    }

    #[test]
    fn allocate_fresh_is_deterministic() {
        let mut a = seeded();
        let mut b = a.clone();
        assert_eq!(a.allocate_fresh(), b.allocate_fresh());
        assert_eq!(a.allocate_fresh(), (4, Name::Fresh(2)));
    }

    #[test]
    fn allocate_fresh_skips_tracked_fresh_names() {
        let mut reg = Register::seed([Name::Fresh(1), Name::free("a")], 8);
        let (label, name) = reg.allocate_fresh();
        assert_eq!(label, 3);
        assert_eq!(name, Name::Fresh(2));
    }

    #[test]
    fn capacity_check() {
        let reg = Register::seed([Name::free("a"), Name::free("b")], 2);
        assert!(reg.at_capacity());
        assert!(!seeded().at_capacity());
    }
}
