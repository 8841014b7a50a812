//! Name resolution
//!
//! Maps a textual type reference to the fully-qualified symbol it denotes.
//! The strategies run in a fixed order and the first success wins:
//!
//! 1. type parameters visible at the reference site (never a class)
//! 2. explicit qualifier, resolved recursively, then member lookup
//! 3. member types of the enclosing types, innermost first
//! 4. single-type imports
//! 5. types of the same package, only when known
//! 6. on-demand imports in declaration order, only when known
//! 7. the root namespace (`java.lang`)
//!
//! Nothing here is an error: a reference no strategy can place usually
//! names a library type outside the analyzed build.

use std::collections::{BTreeSet, HashSet};

use crate::semantic::imports::ImportTable;
use crate::semantic::scope::ScopeStack;
use crate::semantic::types::UnitTypes;
use crate::symbol::{PACKAGE_SEPARATOR, Symbol};

/// The set of symbols known to exist in the analyzed build.
pub trait Inventory {
    fn contains(&self, symbol: &str) -> bool;
}

impl Inventory for HashSet<Symbol> {
    fn contains(&self, symbol: &str) -> bool {
        HashSet::contains(self, symbol)
    }
}

impl Inventory for BTreeSet<Symbol> {
    fn contains(&self, symbol: &str) -> bool {
        BTreeSet::contains(self, symbol)
    }
}

impl Inventory for UnitTypes {
    fn contains(&self, symbol: &str) -> bool {
        UnitTypes::contains(self, symbol)
    }
}

/// Symbols visible to one compilation unit besides the build inventory.
#[derive(Debug, Default)]
pub struct UnitContext {
    pub package: Option<String>,
    pub imports: ImportTable,
    pub types: UnitTypes,
}

/// The implicitly imported namespace and the platform types known to live in it.
#[derive(Debug, Clone)]
pub struct RootNamespace {
    name: String,
    platform_types: HashSet<String>,
}

/// Public top-level types of `java.lang`.
const JAVA_LANG_TYPES: &[&str] = &[
    "AbstractMethodError",
    "Appendable",
    "ArithmeticException",
    "ArrayIndexOutOfBoundsException",
    "ArrayStoreException",
    "AssertionError",
    "AutoCloseable",
    "Boolean",
    "BootstrapMethodError",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "ClassCastException",
    "ClassCircularityError",
    "ClassFormatError",
    "ClassLoader",
    "ClassNotFoundException",
    "ClassValue",
    "CloneNotSupportedException",
    "Cloneable",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "EnumConstantNotPresentException",
    "Error",
    "Exception",
    "ExceptionInInitializerError",
    "Float",
    "FunctionalInterface",
    "IllegalAccessError",
    "IllegalAccessException",
    "IllegalArgumentException",
    "IllegalCallerException",
    "IllegalMonitorStateException",
    "IllegalStateException",
    "IllegalThreadStateException",
    "IncompatibleClassChangeError",
    "IndexOutOfBoundsException",
    "InheritableThreadLocal",
    "InstantiationError",
    "InstantiationException",
    "Integer",
    "InternalError",
    "InterruptedException",
    "Iterable",
    "LayerInstantiationException",
    "LinkageError",
    "Long",
    "MatchException",
    "Math",
    "Module",
    "ModuleLayer",
    "NegativeArraySizeException",
    "NoClassDefFoundError",
    "NoSuchFieldError",
    "NoSuchFieldException",
    "NoSuchMethodError",
    "NoSuchMethodException",
    "NullPointerException",
    "Number",
    "NumberFormatException",
    "Object",
    "OutOfMemoryError",
    "Override",
    "Package",
    "Process",
    "ProcessBuilder",
    "ProcessHandle",
    "Readable",
    "Record",
    "ReflectiveOperationException",
    "Runnable",
    "Runtime",
    "RuntimeException",
    "RuntimePermission",
    "SafeVarargs",
    "SecurityException",
    "SecurityManager",
    "Short",
    "StackOverflowError",
    "StackTraceElement",
    "StackWalker",
    "StrictMath",
    "String",
    "StringBuffer",
    "StringBuilder",
    "StringIndexOutOfBoundsException",
    "SuppressWarnings",
    "System",
    "Thread",
    "ThreadDeath",
    "ThreadGroup",
    "ThreadLocal",
    "Throwable",
    "TypeNotPresentException",
    "UnknownError",
    "UnsatisfiedLinkError",
    "UnsupportedClassVersionError",
    "UnsupportedOperationException",
    "VerifyError",
    "VirtualMachineError",
    "Void",
    "WrongThreadException",
];

impl Default for RootNamespace {
    fn default() -> Self {
        Self::java_lang()
    }
}

impl RootNamespace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            platform_types: HashSet::new(),
        }
    }

    pub fn java_lang() -> Self {
        let mut root = Self::new("java.lang");
        root.platform_types.extend(
            JAVA_LANG_TYPES
                .iter()
                .map(|name| format!("java.lang.{name}")),
        );
        root
    }

    pub fn with_platform_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platform_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_platform_type(&self, symbol: &str) -> bool {
        self.platform_types.contains(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Written in a type position: every segment names a type.
    Type,
    /// Qualifier of a member access: trailing segments may be fields.
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Symbol),
    /// A type variable; never a dependency.
    TypeVariable,
    Unresolved,
}

impl Resolution {
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Resolution::Resolved(symbol) => Some(symbol),
            _ => None,
        }
    }
}

/// Whether `names` is a single identifier naming a type parameter in scope.
pub fn names_type_variable(names: &[String], scopes: &ScopeStack) -> bool {
    match names {
        [simple] => scopes.is_type_variable(simple),
        _ => false,
    }
}

pub struct Resolver<'a> {
    unit: &'a UnitContext,
    inventory: &'a dyn Inventory,
    root: Option<&'a RootNamespace>,
}

impl<'a> Resolver<'a> {
    pub fn new(unit: &'a UnitContext, inventory: &'a dyn Inventory) -> Self {
        Self {
            unit,
            inventory,
            root: None,
        }
    }

    pub fn with_root(mut self, root: &'a RootNamespace) -> Self {
        self.root = Some(root);
        self
    }

    fn known(&self, symbol: &str) -> bool {
        self.unit.types.contains(symbol) || self.inventory.contains(symbol)
    }

    /// Resolves `names` as written at the current point of a walk.
    pub fn resolve(&self, names: &[String], kind: ReferenceKind, scopes: &ScopeStack) -> Resolution {
        if names_type_variable(names, scopes) {
            return Resolution::TypeVariable;
        }
        self.resolve_from(names, kind, scopes.depender())
    }

    /// Resolves `names` as seen from inside `site`, skipping the type-variable check.
    pub fn resolve_from(
        &self,
        names: &[String],
        kind: ReferenceKind,
        site: Option<&Symbol>,
    ) -> Resolution {
        let Some((head, rest)) = names.split_first() else {
            return Resolution::Unresolved;
        };

        if let Some(owner) = self.resolve_simple(head, kind, site) {
            return Resolution::Resolved(self.members(owner, rest, kind));
        }

        if rest.is_empty() {
            return Resolution::Unresolved;
        }
        self.package_qualified(names, kind)
            .map_or(Resolution::Unresolved, Resolution::Resolved)
    }

    /// Resolves `names` only through member types of the unit's own types.
    /// The unit's type table must be complete.
    pub fn resolve_nested(
        &self,
        names: &[String],
        kind: ReferenceKind,
        site: Option<&Symbol>,
    ) -> Option<Symbol> {
        let (head, rest) = names.split_first()?;
        let owner = self.nested_type(head, site)?;
        Some(self.members(owner, rest, kind))
    }

    /// Resolves the member chain `members` of the statically imported type `owner`.
    pub fn resolve_static(&self, owner: &str, members: &[String]) -> Symbol {
        let owner = self.binary_name(owner);
        self.members(owner, members, ReferenceKind::Expression)
    }

    fn resolve_simple(&self, name: &str, kind: ReferenceKind, site: Option<&Symbol>) -> Option<Symbol> {
        self.nested_type(name, site)
            .or_else(|| self.single_import(name))
            .or_else(|| self.same_package(name))
            .or_else(|| self.on_demand(name, kind))
            .or_else(|| self.root_namespace(name))
    }

    fn nested_type(&self, name: &str, site: Option<&Symbol>) -> Option<Symbol> {
        let types = &self.unit.types;
        let site = types.lookup(site?.as_str())?;
        types
            .ancestors(site)
            .find_map(|enclosing| types.nested(enclosing.symbol.as_str(), name))
            .cloned()
    }

    fn single_import(&self, name: &str) -> Option<Symbol> {
        self.unit
            .imports
            .single(name)
            .map(|path| self.binary_name(path))
    }

    fn same_package(&self, name: &str) -> Option<Symbol> {
        let candidate = Symbol::top_level(self.unit.package.as_deref(), name);
        self.known(candidate.as_str()).then_some(candidate)
    }

    fn on_demand(&self, name: &str, kind: ReferenceKind) -> Option<Symbol> {
        let imported = self.unit.imports.on_demand().iter().find_map(|prefix| {
            let in_package = Symbol::top_level(Some(prefix.as_str()), name);
            if self.known(in_package.as_str()) {
                return Some(in_package);
            }
            let owner = self.known_binary_name(prefix)?;
            let member = owner.nested(name);
            self.known(member.as_str()).then_some(member)
        });

        if imported.is_some() || kind == ReferenceKind::Type {
            return imported;
        }

        self.unit.imports.static_on_demand().iter().find_map(|owner| {
            let member = self.binary_name(owner).nested(name);
            self.known(member.as_str()).then_some(member)
        })
    }

    fn root_namespace(&self, name: &str) -> Option<Symbol> {
        let root = self.root?;
        let candidate = Symbol::top_level(Some(root.name()), name);
        (self.known(candidate.as_str()) || root.is_platform_type(candidate.as_str()))
            .then_some(candidate)
    }

    fn members(&self, mut owner: Symbol, members: &[String], kind: ReferenceKind) -> Symbol {
        for member in members {
            let candidate = owner.nested(member);
            if kind == ReferenceKind::Type || self.known(candidate.as_str()) {
                owner = candidate;
            } else {
                break;
            }
        }
        owner
    }

    fn package_qualified(&self, names: &[String], kind: ReferenceKind) -> Option<Symbol> {
        for split in (1..names.len()).rev() {
            let package = names[..split].join(".");
            let candidate = Symbol::top_level(Some(package.as_str()), &names[split]);
            if self.known(candidate.as_str()) {
                return Some(self.members(candidate, &names[split + 1..], kind));
            }
        }

        let looks_like_package = names[0].chars().next().is_some_and(char::is_lowercase);
        (kind == ReferenceKind::Type && looks_like_package)
            .then(|| Symbol::from_source_name(&names.join(".")))
    }

    /// Binary name of a dotted path the inventory knows in some nesting split.
    fn known_binary_name(&self, dotted: &str) -> Option<Symbol> {
        let segments: Vec<&str> = dotted.split(PACKAGE_SEPARATOR).collect();
        (0..segments.len()).rev().find_map(|top| {
            let mut symbol = Symbol::new_unchecked(segments[..=top].join("."));
            for nested in &segments[top + 1..] {
                symbol = symbol.nested(nested);
            }
            self.known(symbol.as_str()).then_some(symbol)
        })
    }

    /// Binary name of a dotted path that certainly names a type.
    fn binary_name(&self, dotted: &str) -> Symbol {
        self.known_binary_name(dotted)
            .unwrap_or_else(|| Symbol::from_source_name(dotted))
    }
}
