//! Name → global slot mapping.

use std::collections::HashMap;

/// A name bound to a global slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub index: usize,
}

/// A single flat global scope.
///
/// Slots are handed out in definition order starting at 0 and are never
/// reclaimed. Redefining a name binds it to a fresh slot.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    store: HashMap<String, Symbol>,
    num_definitions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to the next unused slot.
    pub fn define(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            index: self.num_definitions,
        };
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.store.get(name)
    }

    /// Number of slots handed out so far.
    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_assigns_increasing_slots() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("a").index, 0);
        assert_eq!(table.define("b").index, 1);
        assert_eq!(table.num_definitions(), 2);
    }

    #[test]
    fn resolve_defined_and_missing() {
        let mut table = SymbolTable::new();
        table.define("a");
        table.define("b");
        assert_eq!(
            table.resolve("b"),
            Some(&Symbol {
                name: "b".to_string(),
                index: 1
            })
        );
        assert_eq!(table.resolve("c"), None);
    }

    #[test]
    fn redefinition_takes_new_slot() {
        let mut table = SymbolTable::new();
        table.define("x");
        table.define("y");
        let again = table.define("x");
        assert_eq!(again.index, 2);
        assert_eq!(table.resolve("x").map(|s| s.index), Some(2));
        assert_eq!(table.num_definitions(), 3);
    }
}
