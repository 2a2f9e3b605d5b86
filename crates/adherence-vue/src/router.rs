use std::collections::HashMap;

use tracing::debug;

use adherence_core::analyzer::Extraction;
use adherence_core::resolve::ImportTarget;
use adherence_core::types::{Edge, Relation, SymbolKind, SymbolNode};

use crate::extract::ExtractContext;
use crate::syntax::{NodeId, SyntaxKind, Walk};

/// Routes declared in a router configuration and the components they render.
pub fn extract(ctx: &ExtractContext<'_>, out: &mut Extraction) {
    let Some(routes) = routes_array(ctx) else {
        return;
    };
    let defaults = ctx.default_bindings();
    collect_routes(ctx, &defaults, routes, "", out);
}

/// The route table: a declarator named `routes`, else a `routes:` property,
/// else the first array assigned to any declarator.
fn routes_array(ctx: &ExtractContext<'_>) -> Option<NodeId> {
    let tree = ctx.tree;
    let is_array = |id: NodeId| matches!(tree.kind(id), Some(SyntaxKind::Array { .. }));
    let mut named = None;
    let mut property = None;
    let mut any = None;

    tree.walk(tree.program(), |_, kind| {
        match kind {
            SyntaxKind::Declarator {
                name,
                value: Some(value),
            } if is_array(*value) => {
                if named.is_none() && name.as_deref() == Some("routes") {
                    named = Some(*value);
                }
                any.get_or_insert(*value);
            }
            SyntaxKind::Property {
                key: Some(key),
                value,
            } if key == "routes" && is_array(*value) => {
                property.get_or_insert(*value);
            }
            _ => {}
        }
        Walk::Continue
    });

    named.or(property).or(any)
}

fn collect_routes(
    ctx: &ExtractContext<'_>,
    defaults: &HashMap<String, ImportTarget>,
    array: NodeId,
    parent: &str,
    out: &mut Extraction,
) {
    let tree = ctx.tree;
    let Some(SyntaxKind::Array { elements }) = tree.kind(array) else {
        return;
    };

    for &route in elements {
        if !matches!(tree.kind(route), Some(SyntaxKind::Object { .. })) {
            continue;
        }
        let path = tree
            .property(route, "path")
            .and_then(|p| tree.string_value(p))
            .map(|p| join_path(parent, p));
        let name = tree.property(route, "name").and_then(|n| tree.string_value(n));
        let component = tree
            .property(route, "component")
            .and_then(|c| component_target(ctx, defaults, c));

        if let (Some(path), Some(component)) = (&path, component) {
            let mut symbol = SymbolNode::scoped(SymbolKind::Route, ctx.path, path, ctx.path)
                .with_purpose(format!("Route `{path}`"));
            symbol.route_path = Some(path.clone());
            symbol.route_name = name.map(str::to_string);

            out.edges.push(Edge::new(
                symbol.id.clone(),
                component.id(),
                Relation::RendersComponent,
            ));
            out.edges
                .push(Edge::new(ctx.path, symbol.id.clone(), Relation::DefinesRoute));
            out.symbols.push(symbol);
        } else {
            debug!(
                file = ctx.path,
                span = ?tree.span(route),
                "route entry without a path or a resolvable component"
            );
        }

        if let Some(children) = tree.property(route, "children") {
            let base = path.as_deref().unwrap_or(parent);
            collect_routes(ctx, defaults, children, base, out);
        }
    }
}

/// Full path of a route: absolute paths stand alone, relative ones extend
/// the parent's path.
fn join_path(parent: &str, path: &str) -> String {
    if path.starts_with('/') || parent.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{path}", parent.trim_end_matches('/'))
    }
}

/// A component given as a default-imported identifier or as a dynamic
/// import, bare or wrapped in a function.
fn component_target(
    ctx: &ExtractContext<'_>,
    defaults: &HashMap<String, ImportTarget>,
    value: NodeId,
) -> Option<ImportTarget> {
    let tree = ctx.tree;
    if let Some(name) = tree.identifier(value) {
        return defaults.get(name).cloned();
    }
    let import = tree.find(value, |k| {
        matches!(k, SyntaxKind::DynamicImport { specifier: Some(_) })
    })?;
    match tree.kind(import)? {
        SyntaxKind::DynamicImport {
            specifier: Some(specifier),
        } => Some(ctx.resolver.resolve(ctx.path, specifier)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/users"), "/users");
        assert_eq!(join_path("", "users"), "users");
        assert_eq!(join_path("/users", "edit"), "/users/edit");
        assert_eq!(join_path("/users/", "edit"), "/users/edit");
        assert_eq!(join_path("/users", "/about"), "/about");
        assert_eq!(join_path("/users", ""), "/users");
        assert_eq!(join_path("/", "home"), "/home");
    }
}
