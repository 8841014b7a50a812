//! Parser module for Java source code
//!
//! Integrates with tree-sitter for parsing and lowers the concrete syntax
//! tree into the tagged [`syntax`](crate::syntax) tree the analyzer walks.

use std::time::Duration;

use tree_sitter::Node as TsNode;

use crate::syntax::{
    Annotation, CompilationUnit, Conditional, Executable, ExecutableKind, ImportDecl, Node,
    Qualifier, TypeArg, TypeDecl, TypeKind, TypeParam, TypeRef, TypeSegment, Variable,
};

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    fn at_start(message: impl Into<String>) -> Self {
        Self {
            line: 1,
            column: 1,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JavaParser {
    timeout: Option<Duration>,
    max_depth: usize,
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaParser {
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn parse(&self, source: &str) -> Result<CompilationUnit, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(tree_sitter_java::language())
            .map_err(|e| ParseError::at_start(format!("failed to load Java grammar: {e}")))?;
        if let Some(timeout) = self.timeout {
            parser.set_timeout_micros(timeout.as_micros().try_into().unwrap_or(u64::MAX));
        }

        let tree = parser.parse(source, None).ok_or_else(|| match self.timeout {
            Some(timeout) => {
                ParseError::at_start(format!("parsing timed out after {timeout:?}"))
            }
            None => ParseError::at_start("parsing was aborted"),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(syntax_error(root));
        }

        let mut lowering = Lowering {
            source: source.as_bytes(),
            depth: 0,
            max_depth: self.max_depth,
            too_deep: false,
        };
        let unit = lowering.program(root);

        if lowering.too_deep {
            return Err(ParseError::at_start(format!(
                "syntax nesting exceeds the limit of {}",
                self.max_depth
            )));
        }

        Ok(unit)
    }
}

fn syntax_error(root: TsNode<'_>) -> ParseError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing '{}'", node.kind())
    } else {
        "syntax error".to_string()
    };

    ParseError {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

fn first_error(node: TsNode<'_>) -> Option<TsNode<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn is_comment(kind: &str) -> bool {
    matches!(kind, "line_comment" | "block_comment" | "comment")
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "annotation_type_declaration"
            | "record_declaration"
    )
}

fn is_type_node(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "scoped_type_identifier"
            | "generic_type"
            | "array_type"
            | "annotated_type"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
            | "void_type"
    )
}

fn named_children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !is_comment(c.kind()))
        .collect()
}

fn field_children<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn has_token(node: TsNode<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == token)
}

fn line_of(node: TsNode<'_>) -> usize {
    node.start_position().row + 1
}

struct Lowering<'s> {
    source: &'s [u8],
    depth: usize,
    max_depth: usize,
    too_deep: bool,
}

impl Lowering<'_> {
    fn text(&self, node: TsNode<'_>) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth > self.max_depth {
            self.too_deep = true;
        }
        !self.too_deep
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn program(&mut self, root: TsNode<'_>) -> CompilationUnit {
        let mut unit = CompilationUnit::default();

        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    unit.package = named_children(child)
                        .into_iter()
                        .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
                        .map(|name| self.dotted(name));
                }
                "import_declaration" => {
                    if let Some(import) = self.import(child) {
                        unit.imports.push(import);
                    }
                }
                kind if is_type_declaration(kind) => unit.types.push(self.type_decl(child)),
                _ => {}
            }
        }

        unit
    }

    fn dotted(&self, node: TsNode<'_>) -> String {
        self.text(node).split_whitespace().collect::<String>()
    }

    fn import(&self, node: TsNode<'_>) -> Option<ImportDecl> {
        let children = named_children(node);
        let path = children
            .iter()
            .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
            .map(|name| self.dotted(*name))?;

        Some(ImportDecl {
            path,
            is_static: has_token(node, "static"),
            is_wildcard: children.iter().any(|c| c.kind() == "asterisk"),
            line: line_of(node),
        })
    }

    fn type_decl(&mut self, node: TsNode<'_>) -> TypeDecl {
        let kind = match node.kind() {
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            "annotation_type_declaration" => TypeKind::Annotation,
            "record_declaration" => TypeKind::Record,
            _ => TypeKind::Class,
        };

        let mut supertypes = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "superclass" => {
                    supertypes.extend(named_children(child).into_iter().filter_map(|t| self.type_ref(t)))
                }
                "super_interfaces" | "extends_interfaces" | "permits" => {
                    for list in named_children(child) {
                        supertypes.extend(
                            named_children(list)
                                .into_iter()
                                .filter_map(|t| self.type_ref(t)),
                        );
                    }
                }
                _ => {}
            }
        }

        let components = match (kind, node.child_by_field_name("parameters")) {
            (TypeKind::Record, Some(params)) => self.parameters(params),
            _ => Vec::new(),
        };

        let members = node
            .child_by_field_name("body")
            .map(|body| self.members(body))
            .unwrap_or_default();

        TypeDecl {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n))
                .unwrap_or_default(),
            kind,
            type_params: self.type_params(node.child_by_field_name("type_parameters")),
            annotations: self.modifier_annotations(node),
            supertypes,
            components,
            members,
            line: line_of(node),
        }
    }

    fn type_params(&mut self, node: Option<TsNode<'_>>) -> Vec<TypeParam> {
        let Some(node) = node else {
            return Vec::new();
        };

        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "type_parameter")
            .map(|param| {
                let children = named_children(param);
                let name = children
                    .iter()
                    .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                    .map(|n| self.text(*n))
                    .unwrap_or_default();
                let bounds = children
                    .iter()
                    .filter(|c| c.kind() == "type_bound")
                    .flat_map(|bound| named_children(*bound))
                    .filter_map(|t| self.type_ref(t))
                    .collect();
                TypeParam { name, bounds }
            })
            .collect()
    }

    fn modifier_annotations(&mut self, node: TsNode<'_>) -> Vec<Annotation> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "modifiers")
            .flat_map(named_children)
            .filter(|c| matches!(c.kind(), "annotation" | "marker_annotation"))
            .map(|a| self.annotation(a))
            .collect()
    }

    fn annotation(&mut self, node: TsNode<'_>) -> Annotation {
        let name = node
            .child_by_field_name("name")
            .map(|n| {
                let dotted = self.dotted(n);
                TypeRef {
                    segments: dotted
                        .split('.')
                        .map(|s| TypeSegment {
                            name: s.to_string(),
                            args: Vec::new(),
                        })
                        .collect(),
                    line: line_of(n),
                }
            })
            .unwrap_or_else(|| TypeRef::simple("", line_of(node)));

        let args = node
            .child_by_field_name("arguments")
            .map(|a| self.children(a))
            .unwrap_or_default();

        Annotation { name, args }
    }

    fn members(&mut self, body: TsNode<'_>) -> Vec<Node> {
        let mut members = Vec::new();
        for child in named_children(body) {
            self.member(child, &mut members);
        }
        members
    }

    fn member(&mut self, node: TsNode<'_>, out: &mut Vec<Node>) {
        match node.kind() {
            "field_declaration" | "constant_declaration" => {
                for variable in self.declarators(node) {
                    out.push(Node::Field(variable));
                }
            }
            "method_declaration" | "annotation_type_element_declaration" => {
                out.push(Node::Executable(self.method(node)))
            }
            "constructor_declaration" | "compact_constructor_declaration" => {
                out.push(Node::Executable(self.constructor(node)))
            }
            "block" => out.push(Node::Executable(self.initializer(node))),
            "static_initializer" => {
                if let Some(block) = named_children(node).into_iter().find(|c| c.kind() == "block") {
                    out.push(Node::Executable(self.initializer(block)));
                }
            }
            "enum_constant" => out.push(Node::Field(self.enum_constant(node))),
            "enum_body_declarations" => {
                for child in named_children(node) {
                    self.member(child, out);
                }
            }
            kind if is_type_declaration(kind) => out.push(Node::Type(self.type_decl(node))),
            _ => self.lower_into(node, out),
        }
    }

    fn declarators(&mut self, node: TsNode<'_>) -> Vec<Variable> {
        let ty = node.child_by_field_name("type").and_then(|t| self.type_ref(t));
        let annotations = self.modifier_annotations(node);

        field_children(node, "declarator")
            .into_iter()
            .map(|declarator| Variable {
                name: declarator
                    .child_by_field_name("name")
                    .map(|n| self.text(n))
                    .unwrap_or_default(),
                ty: ty.clone(),
                annotations: annotations.clone(),
                init: declarator
                    .child_by_field_name("value")
                    .map(|v| self.lower(v))
                    .unwrap_or_default(),
                line: line_of(declarator),
            })
            .collect()
    }

    fn enum_constant(&mut self, node: TsNode<'_>) -> Variable {
        let mut init = node
            .child_by_field_name("arguments")
            .map(|a| self.children(a))
            .unwrap_or_default();
        if let Some(body) = node.child_by_field_name("body") {
            init.push(Node::Anonymous(self.members(body)));
        }

        Variable {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n))
                .unwrap_or_default(),
            ty: None,
            annotations: self.modifier_annotations(node),
            init,
            line: line_of(node),
        }
    }

    fn method(&mut self, node: TsNode<'_>) -> Executable {
        Executable {
            kind: ExecutableKind::Method,
            name: node.child_by_field_name("name").map(|n| self.text(n)),
            type_params: self.type_params(node.child_by_field_name("type_parameters")),
            annotations: self.modifier_annotations(node),
            return_type: node.child_by_field_name("type").and_then(|t| self.type_ref(t)),
            params: node
                .child_by_field_name("parameters")
                .map(|p| self.parameters(p))
                .unwrap_or_default(),
            throws: self.throws(node),
            default_value: node
                .child_by_field_name("value")
                .map(|v| self.lower(v))
                .unwrap_or_default(),
            body: node
                .child_by_field_name("body")
                .map(|b| self.children(b))
                .unwrap_or_default(),
        }
    }

    fn constructor(&mut self, node: TsNode<'_>) -> Executable {
        Executable {
            kind: ExecutableKind::Constructor,
            name: node.child_by_field_name("name").map(|n| self.text(n)),
            type_params: self.type_params(node.child_by_field_name("type_parameters")),
            annotations: self.modifier_annotations(node),
            return_type: None,
            params: node
                .child_by_field_name("parameters")
                .map(|p| self.parameters(p))
                .unwrap_or_default(),
            throws: self.throws(node),
            default_value: Vec::new(),
            body: node
                .child_by_field_name("body")
                .map(|b| self.children(b))
                .unwrap_or_default(),
        }
    }

    fn initializer(&mut self, block: TsNode<'_>) -> Executable {
        Executable {
            kind: ExecutableKind::Initializer,
            name: None,
            type_params: Vec::new(),
            annotations: Vec::new(),
            return_type: None,
            params: Vec::new(),
            throws: Vec::new(),
            default_value: Vec::new(),
            body: self.children(block),
        }
    }

    fn lambda(&mut self, node: TsNode<'_>) -> Executable {
        let params = match node.child_by_field_name("parameters") {
            Some(p) if p.kind() == "formal_parameters" => self.parameters(p),
            Some(p) if p.kind() == "inferred_parameters" => named_children(p)
                .into_iter()
                .map(|ident| self.untyped_variable(ident))
                .collect(),
            Some(ident) => vec![self.untyped_variable(ident)],
            None => Vec::new(),
        };

        let body = match node.child_by_field_name("body") {
            Some(b) if b.kind() == "block" => self.children(b),
            Some(expr) => self.lower(expr),
            None => Vec::new(),
        };

        Executable {
            kind: ExecutableKind::Lambda,
            name: None,
            type_params: Vec::new(),
            annotations: Vec::new(),
            return_type: None,
            params,
            throws: Vec::new(),
            default_value: Vec::new(),
            body,
        }
    }

    fn untyped_variable(&self, ident: TsNode<'_>) -> Variable {
        Variable {
            name: self.text(ident),
            ty: None,
            annotations: Vec::new(),
            init: Vec::new(),
            line: line_of(ident),
        }
    }

    fn throws(&mut self, node: TsNode<'_>) -> Vec<TypeRef> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "throws")
            .flat_map(named_children)
            .filter_map(|t| self.type_ref(t))
            .collect()
    }

    fn parameters(&mut self, node: TsNode<'_>) -> Vec<Variable> {
        let mut params = Vec::new();
        for param in named_children(node) {
            match param.kind() {
                "formal_parameter" => params.push(Variable {
                    name: param
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or_default(),
                    ty: param.child_by_field_name("type").and_then(|t| self.type_ref(t)),
                    annotations: self.modifier_annotations(param),
                    init: Vec::new(),
                    line: line_of(param),
                }),
                "spread_parameter" => {
                    let children = named_children(param);
                    let ty = children
                        .iter()
                        .find(|c| is_type_node(c.kind()))
                        .and_then(|t| self.type_ref(*t));
                    let name = children
                        .iter()
                        .find(|c| c.kind() == "variable_declarator")
                        .and_then(|d| d.child_by_field_name("name"))
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    params.push(Variable {
                        name,
                        ty,
                        annotations: self.modifier_annotations(param),
                        init: Vec::new(),
                        line: line_of(param),
                    });
                }
                _ => {}
            }
        }
        params
    }

    fn type_ref(&mut self, node: TsNode<'_>) -> Option<TypeRef> {
        if !self.enter() {
            self.leave();
            return None;
        }
        let result = self.type_ref_inner(node);
        self.leave();
        result
    }

    fn type_ref_inner(&mut self, node: TsNode<'_>) -> Option<TypeRef> {
        match node.kind() {
            "type_identifier" | "identifier" => {
                let name = self.text(node);
                (name != "var").then(|| TypeRef::simple(&name, line_of(node)))
            }
            "scoped_type_identifier" => {
                let children = named_children(node);
                let (last, rest) = children.split_last()?;
                let mut ty = rest
                    .iter()
                    .find(|c| {
                        matches!(
                            c.kind(),
                            "type_identifier" | "scoped_type_identifier" | "generic_type"
                        )
                    })
                    .and_then(|q| self.type_ref(*q))?;
                ty.segments.push(TypeSegment {
                    name: self.text(*last),
                    args: Vec::new(),
                });
                Some(ty)
            }
            "generic_type" => {
                let children = named_children(node);
                let mut ty = children
                    .iter()
                    .find(|c| matches!(c.kind(), "type_identifier" | "scoped_type_identifier"))
                    .and_then(|base| self.type_ref(*base))?;
                if let Some(args) = children.iter().find(|c| c.kind() == "type_arguments") {
                    let args = self.type_args(*args);
                    if let Some(last) = ty.segments.last_mut() {
                        last.args = args;
                    }
                }
                Some(ty)
            }
            "array_type" => node
                .child_by_field_name("element")
                .and_then(|element| self.type_ref(element)),
            "annotated_type" => named_children(node)
                .into_iter()
                .find(|c| is_type_node(c.kind()))
                .and_then(|t| self.type_ref(t)),
            _ => None,
        }
    }

    fn type_args(&mut self, node: TsNode<'_>) -> Vec<TypeArg> {
        let mut args = Vec::new();
        for child in named_children(node) {
            if child.kind() == "wildcard" {
                let bound = named_children(child)
                    .into_iter()
                    .find(|c| is_type_node(c.kind()))
                    .and_then(|t| self.type_ref(t));
                args.push(TypeArg::Wildcard(bound));
            } else if let Some(ty) = self.type_ref(child) {
                args.push(TypeArg::Type(ty));
            }
        }
        args
    }

    fn type_uses(&mut self, nodes: Vec<TsNode<'_>>, out: &mut Vec<Node>) {
        for node in nodes {
            if let Some(ty) = self.type_ref(node) {
                out.push(Node::TypeUse(ty));
            }
        }
    }

    /// Identifier chain such as `a.b.Constants`, or `None` when the
    /// expression involves anything but plain names.
    fn identifier_chain(&self, node: TsNode<'_>) -> Option<Vec<String>> {
        match node.kind() {
            "identifier" => Some(vec![self.text(node)]),
            "field_access" => {
                if has_token(node, "super") {
                    return None;
                }
                let mut chain = self.identifier_chain(node.child_by_field_name("object")?)?;
                let field = node.child_by_field_name("field")?;
                if field.kind() != "identifier" {
                    return None;
                }
                chain.push(self.text(field));
                Some(chain)
            }
            _ => None,
        }
    }

    fn scope_into(&mut self, scope: TsNode<'_>, out: &mut Vec<Node>) {
        match self.identifier_chain(scope) {
            Some(names) => out.push(Node::Qualified(Qualifier {
                names,
                line: line_of(scope),
            })),
            None => self.lower_into(scope, out),
        }
    }

    fn lower(&mut self, node: TsNode<'_>) -> Vec<Node> {
        let mut out = Vec::new();
        self.lower_into(node, &mut out);
        out
    }

    fn children(&mut self, node: TsNode<'_>) -> Vec<Node> {
        let mut out = Vec::new();
        for child in named_children(node) {
            self.lower_into(child, &mut out);
        }
        out
    }

    fn lower_into(&mut self, node: TsNode<'_>, out: &mut Vec<Node>) {
        if !self.enter() {
            self.leave();
            return;
        }
        self.lower_node(node, out);
        self.leave();
    }

    fn lower_node(&mut self, node: TsNode<'_>, out: &mut Vec<Node>) {
        match node.kind() {
            kind if is_comment(kind) => {}
            kind if is_type_declaration(kind) => out.push(Node::Type(self.type_decl(node))),
            kind if is_type_node(kind) => {
                if let Some(ty) = self.type_ref(node) {
                    out.push(Node::TypeUse(ty));
                }
            }
            "block" | "switch_block" | "for_statement" => out.push(Node::Block(self.children(node))),
            "local_variable_declaration" => {
                for variable in self.declarators(node) {
                    out.push(Node::Local(variable));
                }
            }
            "identifier" => out.push(Node::Name(self.text(node), line_of(node))),
            "field_access" => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.scope_into(object, out);
                }
            }
            "method_invocation" => {
                let mut parts = Vec::new();
                if let Some(object) = node.child_by_field_name("object") {
                    self.scope_into(object, &mut parts);
                }
                if let Some(args) = node.child_by_field_name("type_arguments") {
                    self.type_uses(named_children(args), &mut parts);
                }
                if let Some(args) = node.child_by_field_name("arguments") {
                    parts.push(Node::Isolated(self.children(args)));
                }
                out.push(Node::Expr(parts));
            }
            "method_reference" => {
                let mut parts = Vec::new();
                for (i, child) in named_children(node).into_iter().enumerate() {
                    match child.kind() {
                        "type_arguments" => self.type_uses(named_children(child), &mut parts),
                        _ if i == 0 => self.scope_into(child, &mut parts),
                        _ => {}
                    }
                }
                out.push(Node::Expr(parts));
            }
            "explicit_constructor_invocation" => {
                let mut parts = Vec::new();
                if let Some(object) = node.child_by_field_name("object") {
                    self.scope_into(object, &mut parts);
                }
                if let Some(args) = node.child_by_field_name("arguments") {
                    parts.push(Node::Isolated(self.children(args)));
                }
                out.push(Node::Expr(parts));
            }
            "object_creation_expression" => {
                let mut parts = Vec::new();
                for child in named_children(node) {
                    match child.kind() {
                        "type_arguments" => self.type_uses(named_children(child), &mut parts),
                        "argument_list" => parts.push(Node::Isolated(self.children(child))),
                        "class_body" => parts.push(Node::Anonymous(self.members(child))),
                        "annotation" | "marker_annotation" => {
                            parts.push(Node::Annotation(self.annotation(child)))
                        }
                        kind if is_type_node(kind) => {
                            if let Some(ty) = self.type_ref(child) {
                                parts.push(Node::TypeUse(ty));
                            }
                        }
                        _ => self.lower_into(child, &mut parts),
                    }
                }
                out.push(Node::Expr(parts));
            }
            "class_literal" => self.type_uses(named_children(node), out),
            "cast_expression" => {
                let mut parts = Vec::new();
                self.type_uses(field_children(node, "type"), &mut parts);
                if let Some(value) = node.child_by_field_name("value") {
                    self.lower_into(value, &mut parts);
                }
                out.push(Node::Expr(parts));
            }
            "instanceof_expression" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.lower_into(left, out);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.type_uses(vec![right], out);
                    if let Some(name) = node.child_by_field_name("name") {
                        out.push(Node::Pattern(self.untyped_variable(name)));
                    }
                }
                if let Some(pattern) = node.child_by_field_name("pattern") {
                    self.lower_into(pattern, out);
                }
            }
            "type_pattern" | "record_pattern_component" => {
                for child in named_children(node) {
                    if is_type_node(child.kind()) {
                        self.type_uses(vec![child], out);
                    } else if child.kind() == "identifier" {
                        out.push(Node::Pattern(self.untyped_variable(child)));
                    }
                }
            }
            "record_pattern" => {
                for child in named_children(node) {
                    match child.kind() {
                        "identifier" => out.push(Node::TypeUse(TypeRef::simple(
                            &self.text(child),
                            line_of(child),
                        ))),
                        "record_pattern_body" => {
                            for component in named_children(child) {
                                self.lower_into(component, out);
                            }
                        }
                        _ => self.type_uses(vec![child], out),
                    }
                }
            }
            "if_statement" | "ternary_expression" => out.push(Node::Conditional(Conditional {
                condition: self.field_nodes(node, "condition"),
                when_true: self.field_nodes(node, "consequence"),
                otherwise: self.field_nodes(node, "alternative"),
            })),
            "while_statement" => out.push(Node::Conditional(Conditional {
                condition: self.field_nodes(node, "condition"),
                when_true: self.field_nodes(node, "body"),
                otherwise: Vec::new(),
            })),
            "binary_expression" => match node.child_by_field_name("operator").map(|op| op.kind()) {
                Some("&&") => out.push(Node::Conditional(Conditional {
                    condition: self.field_nodes(node, "left"),
                    when_true: self.field_nodes(node, "right"),
                    otherwise: Vec::new(),
                })),
                Some("||") => out.push(Node::Isolated(self.children(node))),
                _ => self.expr_into(node, out),
            },
            "unary_expression" => {
                if node.child_by_field_name("operator").is_some_and(|op| op.kind() == "!") {
                    out.push(Node::Isolated(self.children(node)));
                } else {
                    self.expr_into(node, out);
                }
            }
            "switch_rule" | "switch_block_statement_group" => {
                let mut labels = Vec::new();
                let mut body = Vec::new();
                for child in named_children(node) {
                    if child.kind() == "switch_label" {
                        self.lower_into(child, &mut labels);
                    } else {
                        self.lower_into(child, &mut body);
                    }
                }
                if binds_pattern(&labels) {
                    out.push(Node::Conditional(Conditional {
                        condition: labels,
                        when_true: body,
                        otherwise: Vec::new(),
                    }));
                } else {
                    out.extend(labels);
                    out.extend(body);
                }
            }
            "lambda_expression" => out.push(Node::Executable(self.lambda(node))),
            "enhanced_for_statement" => {
                let mut parts = Vec::new();
                if let Some(value) = node.child_by_field_name("value") {
                    self.lower_into(value, &mut parts);
                }
                parts.push(Node::Local(Variable {
                    name: node
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or_default(),
                    ty: node.child_by_field_name("type").and_then(|t| self.type_ref(t)),
                    annotations: self.modifier_annotations(node),
                    init: Vec::new(),
                    line: line_of(node),
                }));
                if let Some(body) = node.child_by_field_name("body") {
                    self.lower_into(body, &mut parts);
                }
                out.push(Node::Block(parts));
            }
            "catch_clause" => {
                let mut parts = Vec::new();
                for child in named_children(node) {
                    if child.kind() == "catch_formal_parameter" {
                        for part in named_children(child) {
                            if part.kind() == "catch_type" {
                                self.type_uses(named_children(part), &mut parts);
                            }
                        }
                        if let Some(name) = child.child_by_field_name("name") {
                            parts.push(Node::Local(self.untyped_variable(name)));
                        }
                    }
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.lower_into(body, &mut parts);
                }
                out.push(Node::Block(parts));
            }
            "try_with_resources_statement" => {
                let mut guarded = Vec::new();
                if let Some(resources) = node.child_by_field_name("resources") {
                    for resource in named_children(resources) {
                        match resource.child_by_field_name("name") {
                            Some(name) => guarded.push(Node::Local(Variable {
                                name: self.text(name),
                                ty: resource
                                    .child_by_field_name("type")
                                    .and_then(|t| self.type_ref(t)),
                                annotations: self.modifier_annotations(resource),
                                init: resource
                                    .child_by_field_name("value")
                                    .map(|v| self.lower(v))
                                    .unwrap_or_default(),
                                line: line_of(resource),
                            })),
                            None => guarded.extend(self.children(resource)),
                        }
                    }
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.lower_into(body, &mut guarded);
                }
                out.push(Node::Block(guarded));
                for child in named_children(node) {
                    if matches!(child.kind(), "catch_clause" | "finally_clause") {
                        self.lower_into(child, out);
                    }
                }
            }
            "annotation" | "marker_annotation" => out.push(Node::Annotation(self.annotation(node))),
            "element_value_pair" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.lower_into(value, out);
                }
            }
            "labeled_statement" => {
                for child in named_children(node).into_iter().skip(1) {
                    self.lower_into(child, out);
                }
            }
            "break_statement" | "continue_statement" | "this" | "super" | "receiver_parameter" => {}
            _ => self.expr_into(node, out),
        }
    }

    fn expr_into(&mut self, node: TsNode<'_>, out: &mut Vec<Node>) {
        let children = self.children(node);
        if !children.is_empty() {
            out.push(Node::Expr(children));
        }
    }

    fn field_nodes(&mut self, node: TsNode<'_>, field: &str) -> Vec<Node> {
        node.child_by_field_name(field)
            .map(|child| self.lower(child))
            .unwrap_or_default()
    }
}

fn binds_pattern(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Pattern(_) => true,
        Node::Expr(children) => binds_pattern(children),
        _ => false,
    })
}
