use std::collections::HashSet;
use std::ops::Range;

use tree_sitter::Node as TsNode;

/// Index of a node in a [`SyntaxTree`] arena.
pub type NodeId = usize;

/// The script shapes the extractors care about. Everything else lowers to
/// `Other`, keeping its children so walks still reach nested calls.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxKind {
    Program {
        body: Vec<NodeId>,
    },
    /// Static import, or a re-export with a `from` clause.
    Import {
        specifier: String,
        default_binding: Option<String>,
        /// Local names introduced by the statement, default included.
        bindings: Vec<String>,
    },
    DynamicImport {
        specifier: Option<String>,
    },
    ExportDefault {
        value: NodeId,
    },
    Declarator {
        name: Option<String>,
        value: Option<NodeId>,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    Object {
        properties: Vec<NodeId>,
    },
    /// Object entry. `key` is `None` for computed keys.
    Property {
        key: Option<String>,
        value: NodeId,
    },
    Array {
        elements: Vec<NodeId>,
    },
    Identifier(String),
    StringLiteral(String),
    Function {
        params: Vec<String>,
        body: NodeId,
    },
    Return {
        argument: Option<NodeId>,
    },
    /// Plain or compound assignment.
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    Update {
        target: NodeId,
    },
    Member {
        object: NodeId,
        property: String,
    },
    This,
    Template {
        elements: Vec<NodeId>,
    },
    /// Opening tag of a template element.
    Element {
        tag: String,
    },
    Other {
        children: Vec<NodeId>,
    },
}

impl SyntaxKind {
    /// Child nodes in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            SyntaxKind::Program { body } => body.clone(),
            SyntaxKind::ExportDefault { value } => vec![*value],
            SyntaxKind::Declarator { value, .. } => value.iter().copied().collect(),
            SyntaxKind::Call { callee, arguments } => {
                let mut out = Vec::with_capacity(arguments.len() + 1);
                out.push(*callee);
                out.extend(arguments.iter().copied());
                out
            }
            SyntaxKind::Object { properties } => properties.clone(),
            SyntaxKind::Property { value, .. } => vec![*value],
            SyntaxKind::Array { elements } => elements.clone(),
            SyntaxKind::Function { body, .. } => vec![*body],
            SyntaxKind::Return { argument } => argument.iter().copied().collect(),
            SyntaxKind::Assignment { target, value } => vec![*target, *value],
            SyntaxKind::Update { target } => vec![*target],
            SyntaxKind::Member { object, .. } => vec![*object],
            SyntaxKind::Template { elements } => elements.clone(),
            SyntaxKind::Other { children } => children.clone(),
            SyntaxKind::Import { .. }
            | SyntaxKind::DynamicImport { .. }
            | SyntaxKind::Identifier(_)
            | SyntaxKind::StringLiteral(_)
            | SyntaxKind::This
            | SyntaxKind::Element { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// Byte range in the text that was parsed. Metadata only; never walked.
    pub span: Range<usize>,
}

/// Returned by a walk visitor to descend into or skip a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    Skip,
}

/// Arena-backed syntax tree of one file: the lowered script program plus
/// the template's element tags when the file is a component.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    program: NodeId,
    template: Option<NodeId>,
}

impl SyntaxTree {
    /// Lower a tree-sitter parse of `source`. `template_tags` holds element
    /// names with their spans, in document order.
    pub fn lower(
        tree: &tree_sitter::Tree,
        source: &str,
        template_tags: Vec<(String, Range<usize>)>,
    ) -> Self {
        let mut builder = Builder {
            nodes: Vec::new(),
            source,
        };
        let program = builder.lower(tree.root_node());

        let template = if template_tags.is_empty() {
            None
        } else {
            let start = template_tags.first().map(|(_, s)| s.start).unwrap_or(0);
            let end = template_tags.last().map(|(_, s)| s.end).unwrap_or(0);
            let mut elements = Vec::with_capacity(template_tags.len());
            for (tag, span) in template_tags {
                elements.push(builder.push(SyntaxKind::Element { tag }, span));
            }
            Some(builder.push(SyntaxKind::Template { elements }, start..end))
        };

        Self {
            nodes: builder.nodes,
            program,
            template,
        }
    }

    pub fn program(&self) -> NodeId {
        self.program
    }

    pub fn template(&self) -> Option<NodeId> {
        self.template
    }

    pub fn kind(&self, id: NodeId) -> Option<&SyntaxKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    /// Byte range of a node in the parsed text.
    pub fn span(&self, id: NodeId) -> Option<Range<usize>> {
        self.nodes.get(id).map(|n| n.span.clone())
    }

    /// Top-level statements of the script program.
    pub fn statements(&self) -> &[NodeId] {
        match self.kind(self.program) {
            Some(SyntaxKind::Program { body }) => body,
            _ => &[],
        }
    }

    /// Pre-order walk from `start`. Each node is visited at most once, so
    /// the walk terminates even if the arena holds shared children.
    pub fn walk<F>(&self, start: NodeId, mut visit: F)
    where
        F: FnMut(NodeId, &SyntaxKind) -> Walk,
    {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if visit(id, &node.kind) == Walk::Skip {
                continue;
            }
            stack.extend(node.kind.children().into_iter().rev());
        }
    }

    /// First node under `start` (inclusive, pre-order) matching `pred`.
    pub fn find<P>(&self, start: NodeId, mut pred: P) -> Option<NodeId>
    where
        P: FnMut(&SyntaxKind) -> bool,
    {
        let mut found = None;
        self.walk(start, |id, kind| {
            if found.is_some() {
                return Walk::Skip;
            }
            if pred(kind) {
                found = Some(id);
                return Walk::Skip;
            }
            Walk::Continue
        });
        found
    }

    /// Value of the property named `key` in an object node.
    pub fn property(&self, object: NodeId, key: &str) -> Option<NodeId> {
        let Some(SyntaxKind::Object { properties }) = self.kind(object) else {
            return None;
        };
        properties.iter().find_map(|&p| match self.kind(p) {
            Some(SyntaxKind::Property {
                key: Some(k),
                value,
            }) if k == key => Some(*value),
            _ => None,
        })
    }

    /// Named keys of an object node, in source order.
    pub fn keys(&self, object: NodeId) -> Vec<(String, NodeId)> {
        let Some(SyntaxKind::Object { properties }) = self.kind(object) else {
            return Vec::new();
        };
        properties
            .iter()
            .filter_map(|&p| match self.kind(p) {
                Some(SyntaxKind::Property {
                    key: Some(k),
                    value,
                }) => Some((k.clone(), *value)),
                _ => None,
            })
            .collect()
    }

    pub fn string_value(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(SyntaxKind::StringLiteral(s)) => Some(s),
            _ => None,
        }
    }

    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(SyntaxKind::Identifier(s)) => Some(s),
            _ => None,
        }
    }
}

struct Builder<'s> {
    nodes: Vec<SyntaxNode>,
    source: &'s str,
}

impl<'s> Builder<'s> {
    fn push(&mut self, kind: SyntaxKind, span: Range<usize>) -> NodeId {
        self.nodes.push(SyntaxNode { kind, span });
        self.nodes.len() - 1
    }

    fn text(&self, node: TsNode<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    fn empty(&mut self, node: TsNode<'_>) -> NodeId {
        self.push(
            SyntaxKind::Other {
                children: Vec::new(),
            },
            node.byte_range(),
        )
    }

    fn lower_all(&mut self, nodes: Vec<TsNode<'_>>) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            out.push(self.lower(node));
        }
        out
    }

    fn lower(&mut self, node: TsNode<'_>) -> NodeId {
        let kind = match node.kind() {
            "program" => SyntaxKind::Program {
                body: self.lower_all(named_children(node)),
            },
            "import_statement" => self.lower_import(node),
            "export_statement" => self.lower_export(node),
            "call_expression" => self.lower_call(node),
            "object" => {
                let mut properties = Vec::new();
                for child in named_children(node) {
                    properties.push(self.lower_property(child));
                }
                SyntaxKind::Object { properties }
            }
            "array" => SyntaxKind::Array {
                elements: self.lower_all(named_children(node)),
            },
            "identifier" | "property_identifier" | "shorthand_property_identifier" => {
                SyntaxKind::Identifier(self.text(node).to_string())
            }
            "string" => SyntaxKind::StringLiteral(unquote(self.text(node))),
            "template_string"
                if named_children(node)
                    .iter()
                    .all(|c| c.kind() != "template_substitution") =>
            {
                SyntaxKind::StringLiteral(unquote(self.text(node)))
            }
            "arrow_function"
            | "function"
            | "function_expression"
            | "function_declaration"
            | "generator_function"
            | "generator_function_declaration"
            | "method_definition" => self.lower_function(node),
            "return_statement" => SyntaxKind::Return {
                argument: match named_children(node).first() {
                    Some(&arg) => Some(self.lower(arg)),
                    None => None,
                },
            },
            "assignment_expression" | "augmented_assignment_expression" => {
                match (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) {
                    (Some(left), Some(right)) => SyntaxKind::Assignment {
                        target: self.lower(left),
                        value: self.lower(right),
                    },
                    _ => SyntaxKind::Other {
                        children: self.lower_all(named_children(node)),
                    },
                }
            }
            "update_expression" => match node.child_by_field_name("argument") {
                Some(arg) => SyntaxKind::Update {
                    target: self.lower(arg),
                },
                None => SyntaxKind::Other {
                    children: Vec::new(),
                },
            },
            "member_expression" => match (
                node.child_by_field_name("object"),
                node.child_by_field_name("property"),
            ) {
                (Some(object), Some(property)) => SyntaxKind::Member {
                    object: self.lower(object),
                    property: self.text(property).to_string(),
                },
                _ => SyntaxKind::Other {
                    children: self.lower_all(named_children(node)),
                },
            },
            "this" => SyntaxKind::This,
            "variable_declarator" => {
                let name = node
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                    .map(|n| self.text(n).to_string());
                let value = match node.child_by_field_name("value") {
                    Some(v) => Some(self.lower(v)),
                    None => None,
                };
                SyntaxKind::Declarator { name, value }
            }
            // Wrappers that do not change what a value is
            "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression" => {
                if let Some(&inner) = named_children(node).first() {
                    return self.lower(inner);
                }
                SyntaxKind::Other {
                    children: Vec::new(),
                }
            }
            _ => SyntaxKind::Other {
                children: self.lower_all(named_children(node)),
            },
        };
        self.push(kind, node.byte_range())
    }

    fn lower_import(&mut self, node: TsNode<'_>) -> SyntaxKind {
        let Some(source) = node.child_by_field_name("source") else {
            return SyntaxKind::Other {
                children: Vec::new(),
            };
        };
        let specifier = unquote(self.text(source));
        let mut default_binding = None;
        let mut bindings = Vec::new();

        for clause in named_children(node) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for part in named_children(clause) {
                match part.kind() {
                    "identifier" => {
                        let name = self.text(part).to_string();
                        default_binding = Some(name.clone());
                        bindings.push(name);
                    }
                    "named_imports" => {
                        for spec in named_children(part) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let local = spec
                                .child_by_field_name("alias")
                                .or_else(|| spec.child_by_field_name("name"));
                            if let Some(local) = local {
                                bindings.push(self.text(local).to_string());
                            }
                        }
                    }
                    "namespace_import" => {
                        for id in named_children(part) {
                            if id.kind() == "identifier" {
                                bindings.push(self.text(id).to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        SyntaxKind::Import {
            specifier,
            default_binding,
            bindings,
        }
    }

    fn lower_export(&mut self, node: TsNode<'_>) -> SyntaxKind {
        // `export { a } from './a'` and `export * from './a'` bind nothing locally
        if let Some(source) = node.child_by_field_name("source") {
            return SyntaxKind::Import {
                specifier: unquote(self.text(source)),
                default_binding: None,
                bindings: Vec::new(),
            };
        }
        if let Some(value) = node.child_by_field_name("value") {
            return SyntaxKind::ExportDefault {
                value: self.lower(value),
            };
        }
        SyntaxKind::Other {
            children: self.lower_all(named_children(node)),
        }
    }

    fn lower_call(&mut self, node: TsNode<'_>) -> SyntaxKind {
        let function = node.child_by_field_name("function");
        let args = node
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default();

        if function.is_some_and(|f| f.kind() == "import") {
            let specifier = args
                .first()
                .filter(|a| a.kind() == "string")
                .map(|a| unquote(self.text(*a)));
            return SyntaxKind::DynamicImport { specifier };
        }

        let callee = match function {
            Some(f) => self.lower(f),
            None => self.empty(node),
        };
        SyntaxKind::Call {
            callee,
            arguments: self.lower_all(args),
        }
    }

    fn lower_property(&mut self, node: TsNode<'_>) -> NodeId {
        let kind = match node.kind() {
            "pair" => {
                let key = node
                    .child_by_field_name("key")
                    .and_then(|k| self.key_name(k));
                let value = match node.child_by_field_name("value") {
                    Some(v) => self.lower(v),
                    None => self.empty(node),
                };
                SyntaxKind::Property { key, value }
            }
            "shorthand_property_identifier" => {
                let name = self.text(node).to_string();
                let value = self.push(SyntaxKind::Identifier(name.clone()), node.byte_range());
                SyntaxKind::Property {
                    key: Some(name),
                    value,
                }
            }
            "method_definition" => {
                let key = node
                    .child_by_field_name("name")
                    .and_then(|k| self.key_name(k));
                let function = self.lower_function(node);
                let value = self.push(function, node.byte_range());
                SyntaxKind::Property { key, value }
            }
            _ => return self.lower(node),
        };
        self.push(kind, node.byte_range())
    }

    fn key_name(&self, key: TsNode<'_>) -> Option<String> {
        match key.kind() {
            "property_identifier" | "identifier" | "number" => Some(self.text(key).to_string()),
            "string" => Some(unquote(self.text(key))),
            _ => None,
        }
    }

    fn lower_function(&mut self, node: TsNode<'_>) -> SyntaxKind {
        let mut params = Vec::new();
        // Single bare arrow parameter: `state => ...`
        if let Some(param) = node.child_by_field_name("parameter") {
            params.push(self.text(param).to_string());
        }
        if let Some(list) = node.child_by_field_name("parameters") {
            for param in named_children(list) {
                let target = param.child_by_field_name("pattern").unwrap_or(param);
                if target.kind() == "identifier" {
                    params.push(self.text(target).to_string());
                }
            }
        }
        let body = match node.child_by_field_name("body") {
            Some(body) => self.lower(body),
            None => self.empty(node),
        };
        SyntaxKind::Function { params, body }
    }
}

/// Named, non-comment children of a tree-sitter node.
fn named_children<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

/// Strip one pair of matching quotes.
fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn lower(source: &str) -> SyntaxTree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        SyntaxTree::lower(&tree, source, Vec::new())
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("\"./b.js\""), "./b.js");
        assert_eq!(unquote("`c`"), "c");
        assert_eq!(unquote("d"), "d");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_lower_imports() {
        let tree = lower(
            "import Foo, { bar as baz, qux } from './foo.js';\n\
             import * as ns from 'pkg';\n\
             import 'side-effect';\n\
             export { x } from './x.js';\n",
        );
        let imports: Vec<_> = tree
            .statements()
            .iter()
            .filter_map(|&id| match tree.kind(id) {
                Some(SyntaxKind::Import {
                    specifier,
                    default_binding,
                    bindings,
                }) => Some((specifier.clone(), default_binding.clone(), bindings.clone())),
                _ => None,
            })
            .collect();

        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].0, "./foo.js");
        assert_eq!(imports[0].1.as_deref(), Some("Foo"));
        assert_eq!(imports[0].2, vec!["Foo", "baz", "qux"]);
        assert_eq!(imports[1].2, vec!["ns"]);
        assert_eq!(imports[2].0, "side-effect");
        assert!(imports[2].2.is_empty());
        assert_eq!(imports[3].0, "./x.js");
    }

    #[test]
    fn test_lower_dynamic_import() {
        let tree = lower("const X = () => import('./X.vue');");
        let found = tree.find(tree.program(), |k| {
            matches!(k, SyntaxKind::DynamicImport { specifier: Some(s) } if s == "./X.vue")
        });
        assert!(found.is_some());
    }

    #[test]
    fn test_object_properties_and_methods() {
        let tree = lower("const o = { a: 1, 'b': 2, c, d() { return 1 }, [e]: 3 };");
        let object = tree
            .find(tree.program(), |k| matches!(k, SyntaxKind::Object { .. }))
            .unwrap();
        let keys: Vec<String> = tree.keys(object).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);

        let d = tree.property(object, "d").unwrap();
        assert!(matches!(tree.kind(d), Some(SyntaxKind::Function { .. })));
    }

    #[test]
    fn test_type_wrappers_are_transparent() {
        let tree = lower("const o = ({ a: 1 } as const);");
        let value = tree
            .statements()
            .iter()
            .find_map(|&s| {
                tree.find(s, |k| matches!(k, SyntaxKind::Declarator { .. }))
            })
            .and_then(|d| match tree.kind(d) {
                Some(SyntaxKind::Declarator { value, .. }) => *value,
                _ => None,
            })
            .unwrap();
        assert!(matches!(tree.kind(value), Some(SyntaxKind::Object { .. })));
    }

    #[test]
    fn test_assignment_and_update() {
        let tree = lower("this.a = 1; this.b += 2; this.c++;");
        let mut assignments = 0;
        let mut updates = 0;
        tree.walk(tree.program(), |_, kind| {
            match kind {
                SyntaxKind::Assignment { .. } => assignments += 1,
                SyntaxKind::Update { .. } => updates += 1,
                _ => {}
            }
            Walk::Continue
        });
        assert_eq!(assignments, 2);
        assert_eq!(updates, 1);
    }

    #[test]
    fn test_spans_cover_source_text() {
        let source = "const routes = [{ path: '/a' }];\n";
        let tree = lower(source);
        let array = tree
            .find(tree.program(), |k| matches!(k, SyntaxKind::Array { .. }))
            .unwrap();
        let span = tree.span(array).unwrap();
        assert_eq!(&source[span], "[{ path: '/a' }]");
        assert!(tree.span(usize::MAX).is_none());
    }

    #[test]
    fn test_walk_visits_each_node_once() {
        // Two parents sharing a child, and a back-reference to the root.
        let tree = SyntaxTree {
            nodes: vec![
                SyntaxNode {
                    kind: SyntaxKind::Other {
                        children: vec![1, 2],
                    },
                    span: 0..0,
                },
                SyntaxNode {
                    kind: SyntaxKind::Other {
                        children: vec![3, 0],
                    },
                    span: 0..0,
                },
                SyntaxNode {
                    kind: SyntaxKind::Other { children: vec![3] },
                    span: 0..0,
                },
                SyntaxNode {
                    kind: SyntaxKind::This,
                    span: 0..0,
                },
            ],
            program: 0,
            template: None,
        };
        let mut seen = Vec::new();
        tree.walk(0, |id, _| {
            seen.push(id);
            Walk::Continue
        });
        assert_eq!(seen, vec![0, 1, 3, 2]);
    }

    #[test]
    fn test_walk_skip_prunes_children() {
        let tree = lower("foo(bar(baz()));");
        let mut calls = 0;
        tree.walk(tree.program(), |_, kind| {
            if matches!(kind, SyntaxKind::Call { .. }) {
                calls += 1;
                return Walk::Skip;
            }
            Walk::Continue
        });
        assert_eq!(calls, 1);
    }
}
