//! Tagged syntax tree for Java compilation units
//!
//! The parser lowers the concrete tree into these categories; everything the
//! dependency analysis does not distinguish collapses into [`Node::Expr`].

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Dotted path without the trailing `.*`.
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub type_params: Vec<TypeParam>,
    pub annotations: Vec<Annotation>,
    pub supertypes: Vec<TypeRef>,
    /// Record components, scoped like fields.
    pub components: Vec<Variable>,
    pub members: Vec<Node>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

/// A possibly qualified, possibly parameterized type such as `Map.Entry<K, List<V>>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub segments: Vec<TypeSegment>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSegment {
    pub name: String,
    pub args: Vec<TypeArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Type(TypeRef),
    Wildcard(Option<TypeRef>),
}

impl TypeRef {
    pub fn simple(name: &str, line: usize) -> Self {
        Self {
            segments: vec![TypeSegment {
                name: name.to_string(),
                args: Vec::new(),
            }],
            line,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.name.clone()).collect()
    }

    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn type_args(&self) -> impl Iterator<Item = &TypeRef> {
        self.segments
            .iter()
            .flat_map(|s| s.args.iter())
            .filter_map(|arg| match arg {
                TypeArg::Type(ty) => Some(ty),
                TypeArg::Wildcard(bound) => bound.as_ref(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: TypeRef,
    pub args: Vec<Node>,
}

/// A field, local, parameter, resource or pattern binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: Option<TypeRef>,
    pub annotations: Vec<Annotation>,
    pub init: Vec<Node>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableKind {
    Method,
    Constructor,
    Initializer,
    Lambda,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Executable {
    pub kind: ExecutableKind,
    pub name: Option<String>,
    pub type_params: Vec<TypeParam>,
    pub annotations: Vec<Annotation>,
    pub return_type: Option<TypeRef>,
    pub params: Vec<Variable>,
    pub throws: Vec<TypeRef>,
    /// Annotation element default value.
    pub default_value: Vec<Node>,
    pub body: Vec<Node>,
}

/// A branch point such as `if`, `while`, `?:` or `&&`.
///
/// Pattern variables bound by `condition` are visible in `when_true` only.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Vec<Node>,
    pub when_true: Vec<Node>,
    pub otherwise: Vec<Node>,
}

/// A dotted identifier chain used as the scope of a member access,
/// e.g. `Constants` in `Constants.FOO` or `pkg.Constants.More` in `pkg.Constants.More.BAR`.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    pub names: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Member or local type declaration.
    Type(TypeDecl),
    Executable(Executable),
    /// Introduces a lexical block; bindings declared inside end with it.
    Block(Vec<Node>),
    Field(Variable),
    Local(Variable),
    /// Variable of a type or record pattern.
    Pattern(Variable),
    Conditional(Conditional),
    /// Operand of `!` or `||`, or a call's arguments; pattern variables bound
    /// inside never reach an enclosing condition.
    Isolated(Vec<Node>),
    /// Type written in a type position.
    TypeUse(TypeRef),
    /// Body of an anonymous class or enum constant.
    Anonymous(Vec<Node>),
    /// Bare identifier in expression position.
    Name(String, usize),
    /// Identifier chain that may denote a type, followed by a member selection.
    Qualified(Qualifier),
    Annotation(Annotation),
    Expr(Vec<Node>),
}

impl CompilationUnit {
    pub fn type_count(&self) -> usize {
        fn count(decl: &TypeDecl) -> usize {
            1 + decl
                .members
                .iter()
                .map(|m| match m {
                    Node::Type(nested) => count(nested),
                    _ => 0,
                })
                .sum::<usize>()
        }
        self.types.iter().map(count).sum()
    }
}
