//! Lexical scope stack for one compilation unit
//!
//! Scopes are pushed when the walk enters a type declaration, an executable
//! member or a block and popped when it leaves. Every lookup walks the stack
//! from the innermost scope outwards.

use std::collections::HashSet;

use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Type,
    Executable,
    Block,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Declared type owning a type scope; `None` for anonymous and local classes.
    pub owner: Option<Symbol>,
    type_params: HashSet<String>,
    bindings: HashSet<String>,
    local_types: HashSet<String>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            owner: None,
            type_params: HashSet::new(),
            bindings: HashSet::new(),
            local_types: HashSet::new(),
        }
    }

    pub fn for_type(owner: Option<Symbol>) -> Self {
        Self {
            owner,
            ..Self::new(ScopeKind::Type)
        }
    }

    pub fn with_type_params<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.type_params
            .extend(names.into_iter().map(str::to_string));
        self
    }

    pub fn bind(&mut self, name: &str) {
        self.bindings.insert(name.to_string());
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains(name)
    }

    pub fn has_type_param(&self, name: &str) -> bool {
        self.type_params.contains(name)
    }
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Binds a variable in the innermost scope, visible from here to the end of that scope.
    pub fn bind(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bind(name);
        }
    }

    pub fn declare_local_type(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.local_types.insert(name.to_string());
        }
    }

    fn innermost(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().rev()
    }

    pub fn is_type_variable(&self, name: &str) -> bool {
        self.innermost().any(|s| s.has_type_param(name))
    }

    pub fn is_binding(&self, name: &str) -> bool {
        self.innermost().any(|s| s.has_binding(name))
    }

    pub fn is_local_type(&self, name: &str) -> bool {
        self.innermost().any(|s| s.local_types.contains(name))
    }

    /// The innermost named type, which every reference at this point is attributed to.
    pub fn depender(&self) -> Option<&Symbol> {
        self.innermost().find_map(|s| s.owner.as_ref())
    }

    /// Whether the innermost scope declares members of a named type.
    pub fn in_named_type_body(&self) -> bool {
        self.scopes
            .last()
            .is_some_and(|s| s.kind == ScopeKind::Type && s.owner.is_some())
    }
}
