use std::collections::HashMap;

use adherence_core::analyzer::Extraction;
use adherence_core::types::{Edge, Relation, SymbolKind, SymbolNode};

use crate::extract::ExtractContext;
use crate::syntax::{NodeId, SyntaxKind, Walk};
use crate::Conventions;

/// Props, emitted events, store hooks and child components of a UI component.
pub fn extract(ctx: &ExtractContext<'_>, conventions: &Conventions, out: &mut Extraction) {
    let tree = ctx.tree;
    let bindings = ctx.bindings();
    let mut props = Vec::new();
    let mut events = Vec::new();

    tree.walk(tree.program(), |_, kind| {
        match kind {
            SyntaxKind::Call { callee, arguments } => {
                let Some(name) = tree.identifier(*callee) else {
                    return Walk::Continue;
                };
                let first = arguments.first().copied();
                if name == conventions.props_macro {
                    props.extend(first.map(|a| declared_names(ctx, a)).unwrap_or_default());
                } else if name == conventions.emits_macro {
                    events.extend(first.map(|a| declared_names(ctx, a)).unwrap_or_default());
                } else if conventions.store_hook.is_match(name) {
                    if let Some(target) = bindings.get(name) {
                        out.edges
                            .push(Edge::new(ctx.path, target.id(), Relation::UsesStoreFile));
                    }
                }
            }
            SyntaxKind::ExportDefault { value } => {
                if let Some(options) = options_object(ctx, *value) {
                    if let Some(p) = tree.property(options, "props") {
                        props.extend(declared_names(ctx, p));
                    }
                    if let Some(e) = tree.property(options, "emits") {
                        events.extend(declared_names(ctx, e));
                    }
                }
            }
            _ => {}
        }
        Walk::Continue
    });

    for name in props {
        let symbol = SymbolNode::scoped(SymbolKind::Prop, ctx.path, &name, ctx.path)
            .with_purpose(format!("Input property `{name}`"));
        out.edges
            .push(Edge::new(ctx.path, symbol.id.clone(), Relation::DefinesProp));
        out.symbols.push(symbol);
    }
    for name in events {
        let symbol = SymbolNode::scoped(SymbolKind::Event, ctx.path, &name, ctx.path)
            .with_purpose(format!("Emitted event `{name}`"));
        out.edges
            .push(Edge::new(ctx.path, symbol.id.clone(), Relation::DefinesEvent));
        out.symbols.push(symbol);
    }

    uses_components(ctx, &bindings, out);
}

/// Names declared by an array of strings or by the keys of an object.
fn declared_names(ctx: &ExtractContext<'_>, id: NodeId) -> Vec<String> {
    let tree = ctx.tree;
    match tree.kind(id) {
        Some(SyntaxKind::Array { elements }) => elements
            .iter()
            .filter_map(|&e| tree.string_value(e).map(str::to_string))
            .collect(),
        Some(SyntaxKind::Object { .. }) => tree.keys(id).into_iter().map(|(k, _)| k).collect(),
        _ => Vec::new(),
    }
}

/// The options object of `export default { ... }` or `export default defineComponent({ ... })`.
fn options_object(ctx: &ExtractContext<'_>, value: NodeId) -> Option<NodeId> {
    let tree = ctx.tree;
    match tree.kind(value)? {
        SyntaxKind::Object { .. } => Some(value),
        SyntaxKind::Call { arguments, .. } => arguments
            .first()
            .copied()
            .filter(|&a| matches!(tree.kind(a), Some(SyntaxKind::Object { .. }))),
        _ => None,
    }
}

/// One USES_COMPONENT edge per template element whose tag names an import.
/// Tags match case-insensitively with hyphens ignored, so `<my-card>` is `MyCard`.
fn uses_components(
    ctx: &ExtractContext<'_>,
    bindings: &HashMap<String, adherence_core::resolve::ImportTarget>,
    out: &mut Extraction,
) {
    let Some(template) = ctx.tree.template() else {
        return;
    };
    let by_tag: HashMap<String, &str> = bindings
        .iter()
        .map(|(name, target)| (normalize_tag(name), target.id()))
        .collect();

    ctx.tree.walk(template, |_, kind| {
        if let SyntaxKind::Element { tag } = kind {
            if let Some(target) = by_tag.get(&normalize_tag(tag)) {
                out.edges
                    .push(Edge::new(ctx.path, *target, Relation::UsesComponent));
            }
        }
        Walk::Continue
    });
}

fn normalize_tag(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("MyCard"), "mycard");
        assert_eq!(normalize_tag("my-card"), "mycard");
        assert_eq!(normalize_tag("BaseButton"), normalize_tag("base-button"));
    }
}
