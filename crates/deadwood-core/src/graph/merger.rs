//! Folding module results along the build graph
//!
//! Each module inherits the sibling-merge of its direct dependencies'
//! stored results, in declared order. Its own stored result is then its own
//! contribution parent-merged over that inheritance, so precedence always
//! favours the nearest module and, among siblings, the one listed first.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::merge::{Inheritance, Merge};
use crate::graph::module::ModuleResult;

#[derive(Debug, Default)]
pub struct Merger {
    stored: HashMap<String, Arc<Inheritance>>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sibling-merge of the stored results of `dependencies`, first listed wins.
    pub fn inherited(&self, dependencies: &[String]) -> Inheritance {
        dependencies
            .iter()
            .filter_map(|name| self.stored.get(name))
            .fold(None, |merged: Option<Inheritance>, next| match merged {
                None => Some(next.as_ref().clone()),
                Some(merged) => Some(merged.merge_sibling(next)),
            })
            .unwrap_or_default()
    }

    /// Stores `own.merge_parent(inherited)` for the module that produced `result`.
    pub fn store(&mut self, result: &ModuleResult, inherited: &Inheritance) -> Arc<Inheritance> {
        let stored = Arc::new(result.own_inheritance().merge_parent(inherited));
        self.stored.insert(result.name.clone(), Arc::clone(&stored));
        stored
    }

    pub fn stored(&self, module: &str) -> Option<&Inheritance> {
        self.stored.get(module).map(Arc::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::merge::{IntermediateMap, IntermediateResult};
    use crate::graph::module::ModuleContext;
    use crate::symbol::Symbol;

    const KEY: &str = "generators";

    fn module(
        merger: &mut Merger,
        name: &str,
        dependencies: &[&str],
        entries: &[(&str, &str)],
        symbols: &[&str],
    ) {
        let dependencies: Vec<String> = dependencies.iter().map(|d| d.to_string()).collect();
        let inherited = merger.inherited(&dependencies);

        let mut ctx = ModuleContext::new(name, Arc::new(inherited.clone()));
        for symbol in symbols {
            ctx.add_declared_symbol(symbol);
        }
        if !entries.is_empty() {
            let map: IntermediateMap<String, String> = entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            ctx.put_intermediate(KEY, IntermediateResult::Map(map));
        }

        merger.store(&ctx.seal(), &inherited);
    }

    fn lookup(merger: &Merger, module: &str, key: &str) -> Option<String> {
        match merger.stored(module)?.intermediate.get(KEY)? {
            IntermediateResult::Map(map) => map.get(key).cloned(),
            IntermediateResult::Set(_) => None,
        }
    }

    #[test]
    fn diamond_prefers_first_sibling_and_own_result() {
        let mut merger = Merger::new();
        module(&mut merger, "a", &[], &[("w", "a"), ("z", "a")], &["p.A"]);
        module(&mut merger, "b", &["a"], &[("x", "b")], &["p.B"]);
        module(&mut merger, "c", &["a"], &[("x", "c"), ("y", "c")], &["p.C"]);
        module(&mut merger, "d", &["b", "c"], &[("z", "d")], &["p.D"]);

        assert_eq!(lookup(&merger, "d", "x").as_deref(), Some("b"));
        assert_eq!(lookup(&merger, "d", "y").as_deref(), Some("c"));
        assert_eq!(lookup(&merger, "d", "z").as_deref(), Some("d"));
        assert_eq!(lookup(&merger, "d", "w").as_deref(), Some("a"));

        let symbols = &merger.stored("d").expect("stored").symbols;
        for symbol in ["p.A", "p.B", "p.C", "p.D"] {
            assert!(symbols.contains(symbol), "{symbol} should be inherited");
        }
    }

    #[test]
    fn dependency_order_decides_sibling_precedence() {
        let mut merger = Merger::new();
        module(&mut merger, "b", &[], &[("x", "b")], &[]);
        module(&mut merger, "c", &[], &[("x", "c")], &[]);
        module(&mut merger, "bc", &["b", "c"], &[], &[]);
        module(&mut merger, "cb", &["c", "b"], &[], &[]);

        assert_eq!(lookup(&merger, "bc", "x").as_deref(), Some("b"));
        assert_eq!(lookup(&merger, "cb", "x").as_deref(), Some("c"));
    }

    #[test]
    fn module_without_dependencies_inherits_nothing() {
        let merger = Merger::new();
        let inherited = merger.inherited(&[]);

        assert!(inherited.symbols.is_empty());
        assert!(inherited.intermediate.is_empty());
        assert!(!inherited.symbols.contains(&Symbol::new_unchecked("p.A")));
    }
}
