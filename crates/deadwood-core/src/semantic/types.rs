//! Types declared in one compilation unit
//!
//! Declared types form a tree (top-level types and their member types)
//! stored in an arena, so nested-type lookup can walk from any type to its
//! enclosing ones without reference cycles.

use std::collections::HashMap;

use id_arena::{Arena, Id};

use crate::symbol::Symbol;
use crate::syntax::TypeKind;

pub type TypeId = Id<DeclaredType>;

#[derive(Debug)]
pub struct DeclaredType {
    pub id: TypeId,
    pub symbol: Symbol,
    pub name: String,
    pub kind: TypeKind,
    pub parent: Option<TypeId>,
    pub children: Vec<TypeId>,
}

#[derive(Debug)]
pub struct UnitTypes {
    arena: Arena<DeclaredType>,
    by_symbol: HashMap<Symbol, TypeId>,
}

impl Default for UnitTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTypes {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_symbol: HashMap::new(),
        }
    }

    pub fn declare(
        &mut self,
        symbol: Symbol,
        name: &str,
        kind: TypeKind,
        parent: Option<TypeId>,
    ) -> TypeId {
        let id = self.arena.alloc_with_id(|id| DeclaredType {
            id,
            symbol: symbol.clone(),
            name: name.to_string(),
            kind,
            parent,
            children: Vec::new(),
        });

        if let Some(parent_id) = parent {
            self.arena[parent_id].children.push(id);
        }
        self.by_symbol.insert(symbol, id);

        id
    }

    pub fn get(&self, id: TypeId) -> &DeclaredType {
        &self.arena[id]
    }

    pub fn lookup(&self, symbol: &str) -> Option<TypeId> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    /// The member type of `owner` called `name`, if this unit declares one.
    pub fn nested(&self, owner: &str, name: &str) -> Option<&Symbol> {
        let owner = self.lookup(owner)?;
        self.arena[owner]
            .children
            .iter()
            .map(|&c| &self.arena[c])
            .find(|t| t.name == name)
            .map(|t| &t.symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.arena.iter().map(|(_, t)| &t.symbol)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn ancestors(&self, id: TypeId) -> AncestorIter<'_> {
        AncestorIter {
            types: self,
            current: Some(id),
        }
    }
}

pub struct AncestorIter<'a> {
    types: &'a UnitTypes,
    current: Option<TypeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = &'a DeclaredType;

    fn next(&mut self) -> Option<Self::Item> {
        let current_id = self.current?;
        let declared = &self.types.arena[current_id];
        self.current = declared.parent;
        Some(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::new_unchecked(name)
    }

    #[test]
    fn declares_top_level_and_nested_types() {
        let mut types = UnitTypes::new();
        let outer = types.declare(sym("p.Outer"), "Outer", TypeKind::Class, None);
        let inner = types.declare(sym("p.Outer$Inner"), "Inner", TypeKind::Class, Some(outer));

        assert_eq!(types.len(), 2);
        assert_eq!(types.get(inner).parent, Some(outer));
        assert_eq!(types.get(outer).children, vec![inner]);
        assert!(types.get(outer).parent.is_none());
        assert!(types.contains("p.Outer$Inner"));
        assert!(!types.contains("p.Inner"));
    }

    #[test]
    fn nested_only_finds_direct_members() {
        let mut types = UnitTypes::new();
        let outer = types.declare(sym("p.Outer"), "Outer", TypeKind::Class, None);
        let inner = types.declare(sym("p.Outer$Inner"), "Inner", TypeKind::Class, Some(outer));
        types.declare(sym("p.Outer$Inner$Deep"), "Deep", TypeKind::Enum, Some(inner));

        assert_eq!(
            types.nested("p.Outer", "Inner").map(Symbol::as_str),
            Some("p.Outer$Inner")
        );
        assert!(types.nested("p.Outer", "Deep").is_none());
        assert!(types.nested("p.Missing", "Inner").is_none());
    }

    #[test]
    fn ancestors_walk_to_top_level() {
        let mut types = UnitTypes::new();
        let a = types.declare(sym("A"), "A", TypeKind::Class, None);
        let b = types.declare(sym("A$B"), "B", TypeKind::Interface, Some(a));
        let c = types.declare(sym("A$B$C"), "C", TypeKind::Class, Some(b));

        let names: Vec<&str> = types.ancestors(c).map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }
}
