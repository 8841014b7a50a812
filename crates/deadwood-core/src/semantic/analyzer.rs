//! Per-unit dependency analysis
//!
//! Walks one compilation unit with a scope stack, records every type it
//! declares and queues every reference that may denote a type. Nothing is
//! resolved during the walk: the queue is drained once the whole unit has
//! been seen, so a reference to a type declared further down the file
//! resolves exactly like one declared above it.
//!
//! Shadowing is decided at the reference site instead. Variables hide types
//! of the same name, so a qualifier whose head is a visible binding is never
//! queued. Fields are visible across their whole type body, locals only from
//! their declaration to the end of the enclosing block. Pattern variables
//! are visible only where their condition is known to be true: the body of
//! an `if` or `while`, the true branch of `?:`, the right operand of `&&` and
//! the body of a pattern `case`.

use std::fmt;

use tracing::debug;

use crate::semantic::imports::ImportTable;
use crate::semantic::resolver::{
    Inventory, ReferenceKind, Resolver, RootNamespace, UnitContext, names_type_variable,
};
use crate::semantic::scope::{Scope, ScopeKind, ScopeStack};
use crate::semantic::types::UnitTypes;
use crate::symbol::Symbol;
use crate::syntax::{
    Annotation, CompilationUnit, Conditional, Executable, Node, TypeDecl, TypeParam, TypeRef,
    Variable,
};

pub const DEFAULT_MAX_SCOPE_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("scope nesting exceeds the limit of {limit}")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Identifier chain resolved through the regular lookup order.
    Name(Vec<String>),
    /// Member chain starting at a statically imported member of `owner`.
    StaticMember { owner: String, members: Vec<String> },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Name(names) => f.write_str(&names.join(".")),
            Target::StaticMember { owner, members } => {
                write!(f, "{owner}.{}", members.join("."))
            }
        }
    }
}

/// A reference captured during the walk, attributed to the innermost named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub depender: Symbol,
    pub target: Target,
    pub kind: ReferenceKind,
    pub line: usize,
}

/// Outcome of analyzing one unit.
///
/// References to member types of the unit itself are already resolved;
/// the rest wait for the inventory of the whole module.
#[derive(Debug)]
pub struct UnitAnalysis {
    pub context: UnitContext,
    pub dependencies: Vec<(Symbol, Symbol)>,
    pub pending: Vec<UnresolvedReference>,
}

impl UnitAnalysis {
    pub fn declared(&self) -> impl Iterator<Item = &Symbol> {
        self.context.types.symbols()
    }

    /// Every edge of the unit, resolving pending references against `inventory`.
    pub fn resolve(
        &self,
        inventory: &dyn Inventory,
        root: Option<&RootNamespace>,
    ) -> Vec<(Symbol, Symbol)> {
        let mut resolver = Resolver::new(&self.context, inventory);
        if let Some(root) = root {
            resolver = resolver.with_root(root);
        }

        let mut edges = self.dependencies.clone();
        for reference in &self.pending {
            let resolved = match &reference.target {
                Target::Name(names) => resolver
                    .resolve_from(names, reference.kind, Some(&reference.depender))
                    .symbol()
                    .cloned(),
                Target::StaticMember { owner, members } => {
                    Some(resolver.resolve_static(owner, members))
                }
            };

            match resolved {
                Some(dependee) => edges.push((reference.depender.clone(), dependee)),
                None => debug!(
                    depender = %reference.depender,
                    reference = %reference.target,
                    line = reference.line,
                    "unresolved reference"
                ),
            }
        }
        edges
    }
}

#[derive(Debug, Clone)]
pub struct UnitAnalyzer {
    max_depth: usize,
}

impl Default for UnitAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitAnalyzer {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_SCOPE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn analyze(&self, unit: &CompilationUnit) -> Result<UnitAnalysis, UnitError> {
        let mut walk = Walk {
            package: unit.package.clone(),
            imports: ImportTable::from_imports(&unit.imports),
            types: UnitTypes::new(),
            scopes: ScopeStack::new(),
            queue: Vec::new(),
            patterns: Vec::new(),
            max_depth: self.max_depth,
        };

        for decl in &unit.types {
            walk.type_decl(decl)?;
        }

        Ok(walk.finish())
    }
}

struct Walk {
    package: Option<String>,
    imports: ImportTable,
    types: UnitTypes,
    scopes: ScopeStack,
    queue: Vec<UnresolvedReference>,
    /// Pattern variables collected by the conditions being walked, innermost last.
    patterns: Vec<Vec<String>>,
    max_depth: usize,
}

impl Walk {
    /// Runs `f` inside `scope`; the scope is popped whether `f` succeeds or not.
    /// Patterns matched inside never reach a condition outside the scope.
    fn with_scope<F>(&mut self, scope: Scope, f: F) -> Result<(), UnitError>
    where
        F: FnOnce(&mut Self) -> Result<(), UnitError>,
    {
        self.isolated(|walk| walk.within(scope, f))
    }

    fn isolated<F>(&mut self, f: F) -> Result<(), UnitError>
    where
        F: FnOnce(&mut Self) -> Result<(), UnitError>,
    {
        let outer = std::mem::take(&mut self.patterns);
        let result = f(self);
        self.patterns = outer;
        result
    }

    fn within<F>(&mut self, scope: Scope, f: F) -> Result<(), UnitError>
    where
        F: FnOnce(&mut Self) -> Result<(), UnitError>,
    {
        if self.scopes.depth() >= self.max_depth {
            return Err(UnitError::TooDeep {
                limit: self.max_depth,
            });
        }

        self.scopes.push(scope);
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn enqueue(&mut self, target: Target, kind: ReferenceKind, line: usize) {
        let Some(depender) = self.scopes.depender().cloned() else {
            return;
        };
        self.queue.push(UnresolvedReference {
            depender,
            target,
            kind,
            line,
        });
    }

    fn type_decl(&mut self, decl: &TypeDecl) -> Result<(), UnitError> {
        let owner = if self.scopes.is_empty() {
            let symbol = Symbol::top_level(self.package.as_deref(), &decl.name);
            self.types.declare(symbol.clone(), &decl.name, decl.kind, None);
            Some(symbol)
        } else if self.scopes.in_named_type_body() {
            let enclosing = self.scopes.depender().cloned();
            enclosing.map(|enclosing| {
                let symbol = enclosing.nested(&decl.name);
                let parent = self.types.lookup(enclosing.as_str());
                self.types.declare(symbol.clone(), &decl.name, decl.kind, parent);
                symbol
            })
        } else {
            self.scopes.declare_local_type(&decl.name);
            None
        };

        let mut scope = Scope::for_type(owner)
            .with_type_params(decl.type_params.iter().map(|p| p.name.as_str()));
        for component in &decl.components {
            scope.bind(&component.name);
        }
        hoist_fields(&mut scope, &decl.members);

        self.with_scope(scope, |walk| {
            for annotation in &decl.annotations {
                walk.annotation(annotation)?;
            }
            walk.type_params(&decl.type_params);
            for supertype in &decl.supertypes {
                walk.type_use(supertype);
            }
            for component in &decl.components {
                walk.variable(component)?;
            }
            walk.nodes(&decl.members)
        })
    }

    fn type_params(&mut self, params: &[TypeParam]) {
        for bound in params.iter().flat_map(|p| &p.bounds) {
            self.type_use(bound);
        }
    }

    fn executable(&mut self, executable: &Executable) -> Result<(), UnitError> {
        let scope = Scope::new(ScopeKind::Executable)
            .with_type_params(executable.type_params.iter().map(|p| p.name.as_str()));

        self.with_scope(scope, |walk| {
            for annotation in &executable.annotations {
                walk.annotation(annotation)?;
            }
            walk.type_params(&executable.type_params);
            if let Some(return_type) = &executable.return_type {
                walk.type_use(return_type);
            }
            for param in &executable.params {
                walk.scopes.bind(&param.name);
                walk.variable(param)?;
            }
            for thrown in &executable.throws {
                walk.type_use(thrown);
            }
            walk.nodes(&executable.default_value)?;
            walk.nodes(&executable.body)
        })
    }

    fn variable(&mut self, variable: &Variable) -> Result<(), UnitError> {
        for annotation in &variable.annotations {
            self.annotation(annotation)?;
        }
        if let Some(ty) = &variable.ty {
            self.type_use(ty);
        }
        self.nodes(&variable.init)
    }

    /// The true branch sees the condition's pattern variables. Both the
    /// condition and the true branch stay open to an enclosing condition, so
    /// `if (a && o instanceof T t)` and `if (o instanceof T t && a)` bind `t`
    /// in the body of the `if`.
    fn conditional(&mut self, conditional: &Conditional) -> Result<(), UnitError> {
        self.patterns.push(Vec::new());
        let condition = self.nodes(&conditional.condition);
        let introduced = self.patterns.pop().unwrap_or_default();
        condition?;
        if let Some(outer) = self.patterns.last_mut() {
            outer.extend(introduced.iter().cloned());
        }

        let mut scope = Scope::new(ScopeKind::Block);
        for name in &introduced {
            scope.bind(name);
        }
        self.within(scope, |walk| walk.nodes(&conditional.when_true))?;
        self.with_scope(Scope::new(ScopeKind::Block), |walk| {
            walk.nodes(&conditional.otherwise)
        })
    }

    fn annotation(&mut self, annotation: &Annotation) -> Result<(), UnitError> {
        self.type_use(&annotation.name);
        self.nodes(&annotation.args)
    }

    fn type_use(&mut self, ty: &TypeRef) {
        let names = ty.names();
        let shadowed = names_type_variable(&names, &self.scopes)
            || names
                .first()
                .is_some_and(|head| head.is_empty() || self.scopes.is_local_type(head));
        if !shadowed {
            self.enqueue(Target::Name(names), ReferenceKind::Type, ty.line);
        }

        for arg in ty.type_args() {
            self.type_use(arg);
        }
    }

    fn nodes(&mut self, nodes: &[Node]) -> Result<(), UnitError> {
        for node in nodes {
            self.node(node)?;
        }
        Ok(())
    }

    fn node(&mut self, node: &Node) -> Result<(), UnitError> {
        match node {
            Node::Type(decl) => self.type_decl(decl),
            Node::Executable(executable) => self.executable(executable),
            Node::Block(children) => {
                self.with_scope(Scope::new(ScopeKind::Block), |walk| walk.nodes(children))
            }
            Node::Field(field) => self.variable(field),
            Node::Local(local) => {
                self.scopes.bind(&local.name);
                self.variable(local)
            }
            Node::Pattern(binding) => {
                if let Some(introduced) = self.patterns.last_mut() {
                    introduced.push(binding.name.clone());
                }
                self.variable(binding)
            }
            Node::Conditional(conditional) => self.conditional(conditional),
            Node::Isolated(children) => self.isolated(|walk| walk.nodes(children)),
            Node::TypeUse(ty) => {
                self.type_use(ty);
                Ok(())
            }
            Node::Anonymous(members) => {
                let mut scope = Scope::for_type(None);
                hoist_fields(&mut scope, members);
                self.with_scope(scope, |walk| walk.nodes(members))
            }
            Node::Name(name, line) => {
                self.static_member(std::slice::from_ref(name), *line);
                Ok(())
            }
            Node::Qualified(qualifier) => {
                self.qualifier(&qualifier.names, qualifier.line);
                Ok(())
            }
            Node::Annotation(annotation) => self.annotation(annotation),
            Node::Expr(children) => self.nodes(children),
        }
    }

    /// Queues the chain if its head is a visible static import; returns whether it was.
    fn static_member(&mut self, names: &[String], line: usize) -> bool {
        let Some(head) = names.first() else {
            return false;
        };
        if self.scopes.is_binding(head) {
            return false;
        }
        let Some(owner) = self.imports.static_member(head) else {
            return false;
        };

        let target = Target::StaticMember {
            owner: owner.to_string(),
            members: names.to_vec(),
        };
        self.enqueue(target, ReferenceKind::Expression, line);
        true
    }

    fn qualifier(&mut self, names: &[String], line: usize) {
        let Some(head) = names.first() else {
            return;
        };
        if self.scopes.is_binding(head)
            || self.scopes.is_type_variable(head)
            || self.scopes.is_local_type(head)
        {
            return;
        }
        if !self.static_member(names, line) {
            self.enqueue(Target::Name(names.to_vec()), ReferenceKind::Expression, line);
        }
    }

    fn finish(self) -> UnitAnalysis {
        let Walk {
            package,
            imports,
            types,
            queue,
            ..
        } = self;
        let context = UnitContext {
            package,
            imports,
            types,
        };

        let resolver = Resolver::new(&context, &context.types);
        let mut dependencies = Vec::new();
        let mut pending = Vec::new();
        for reference in queue {
            let nested = match &reference.target {
                Target::Name(names) => {
                    resolver.resolve_nested(names, reference.kind, Some(&reference.depender))
                }
                Target::StaticMember { .. } => None,
            };
            match nested {
                Some(dependee) => dependencies.push((reference.depender.clone(), dependee)),
                None => pending.push(reference),
            }
        }

        UnitAnalysis {
            context,
            dependencies,
            pending,
        }
    }
}

fn hoist_fields(scope: &mut Scope, members: &[Node]) {
    for member in members {
        if let Node::Field(field) = member {
            scope.bind(&field.name);
        }
    }
}
