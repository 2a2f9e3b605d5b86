use std::collections::HashMap;

use adherence_core::analyzer::Extraction;
use adherence_core::resolve::{ImportResolver, ImportTarget};
use adherence_core::types::{Edge, Relation, SymbolKind, SymbolNode};

use crate::syntax::{SyntaxKind, SyntaxTree};

/// Everything an extraction pass reads about the file being analyzed.
pub struct ExtractContext<'a> {
    pub tree: &'a SyntaxTree,
    pub path: &'a str,
    pub resolver: &'a ImportResolver<'a>,
}

/// One top-level import statement, resolved.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub target: ImportTarget,
    pub default_binding: Option<String>,
    pub bindings: Vec<String>,
}

impl<'a> ExtractContext<'a> {
    pub fn imports(&self) -> Vec<ResolvedImport> {
        self.tree
            .statements()
            .iter()
            .filter_map(|&id| match self.tree.kind(id) {
                Some(SyntaxKind::Import {
                    specifier,
                    default_binding,
                    bindings,
                }) => Some(ResolvedImport {
                    target: self.resolver.resolve(self.path, specifier),
                    default_binding: default_binding.clone(),
                    bindings: bindings.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Every locally bound import name mapped to its target.
    pub fn bindings(&self) -> HashMap<String, ImportTarget> {
        self.imports()
            .into_iter()
            .flat_map(|import| {
                let target = import.target;
                import
                    .bindings
                    .into_iter()
                    .map(move |name| (name, target.clone()))
            })
            .collect()
    }

    /// Default-import names mapped to their targets.
    pub fn default_bindings(&self) -> HashMap<String, ImportTarget> {
        self.imports()
            .into_iter()
            .filter_map(|import| import.default_binding.map(|name| (name, import.target)))
            .collect()
    }
}

/// Emit an IMPORTS or IMPORTS_PACKAGE edge for every top-level import.
/// Package imports also yield an ExternalPackage symbol.
pub fn scan_imports(ctx: &ExtractContext<'_>, out: &mut Extraction) {
    for import in ctx.imports() {
        match import.target {
            ImportTarget::Local(path) => {
                out.edges.push(Edge::new(ctx.path, path, Relation::Imports));
            }
            ImportTarget::Package(name) => {
                out.symbols.push(
                    SymbolNode::global(SymbolKind::ExternalPackage, &name, ctx.path)
                        .with_purpose(format!("External package `{name}`")),
                );
                out.edges
                    .push(Edge::new(ctx.path, name, Relation::ImportsPackage));
            }
        }
    }
}
