use std::collections::HashSet;

use adherence_core::analyzer::Extraction;
use adherence_core::types::{Edge, Relation, SymbolKind, SymbolNode};

use crate::extract::ExtractContext;
use crate::syntax::{NodeId, SyntaxKind, Walk};

/// Store, state fields, getters and actions of a state store file, plus
/// the reads, writes and calls made from getter and action bodies.
pub fn extract(ctx: &ExtractContext<'_>, factory: &str, out: &mut Extraction) {
    let tree = ctx.tree;
    let Some(call) = tree.find(tree.program(), |kind| match kind {
        SyntaxKind::Call { callee, .. } => tree.identifier(*callee) == Some(factory),
        _ => false,
    }) else {
        return;
    };
    let Some(SyntaxKind::Call { arguments, .. }) = tree.kind(call) else {
        return;
    };
    let Some(store) = arguments.first().and_then(|&a| {
        tree.string_value(a).or_else(|| tree.identifier(a))
    }) else {
        return;
    };

    out.symbols.push(
        SymbolNode::global(SymbolKind::Store, store, ctx.path)
            .with_purpose(format!("State store `{store}`")),
    );
    out.edges.push(Edge::new(ctx.path, store, Relation::Defines));

    let Some(options) = arguments
        .get(1)
        .copied()
        .filter(|&o| matches!(tree.kind(o), Some(SyntaxKind::Object { .. })))
    else {
        return;
    };

    let state_keys: Vec<String> = tree
        .property(options, "state")
        .and_then(|s| state_object(ctx, s))
        .map(|o| tree.keys(o).into_iter().map(|(k, _)| k).collect())
        .unwrap_or_default();
    let getters = tree
        .property(options, "getters")
        .map(|g| tree.keys(g))
        .unwrap_or_default();
    let actions = tree
        .property(options, "actions")
        .map(|a| tree.keys(a))
        .unwrap_or_default();

    let members = [
        (SymbolKind::StateField, state_keys.iter().map(String::as_str).collect::<Vec<_>>()),
        (SymbolKind::Getter, getters.iter().map(|(k, _)| k.as_str()).collect()),
        (SymbolKind::Action, actions.iter().map(|(k, _)| k.as_str()).collect()),
    ];
    for (kind, names) in members {
        for name in names {
            let symbol = SymbolNode::scoped(kind, store, name, ctx.path);
            out.edges
                .push(Edge::new(store, symbol.id.clone(), Relation::Defines));
            out.symbols.push(symbol);
        }
    }

    let scope = StoreScope {
        store,
        state: state_keys.iter().map(String::as_str).collect(),
        actions: actions.iter().map(|(k, _)| k.as_str()).collect(),
    };
    for (name, value) in &getters {
        let id = SymbolNode::scoped(SymbolKind::Getter, store, name, ctx.path).id;
        scope.analyze_member(ctx, &id, name, *value, true, out);
    }
    for (name, value) in &actions {
        let id = SymbolNode::scoped(SymbolKind::Action, store, name, ctx.path).id;
        scope.analyze_member(ctx, &id, name, *value, false, out);
    }
}

/// The object holding initial state: a literal, or the object an arrow
/// or function returns.
fn state_object(ctx: &ExtractContext<'_>, state: NodeId) -> Option<NodeId> {
    let tree = ctx.tree;
    match tree.kind(state)? {
        SyntaxKind::Object { .. } => Some(state),
        SyntaxKind::Function { body, .. } => match tree.kind(*body)? {
            SyntaxKind::Object { .. } => Some(*body),
            _ => {
                let ret = tree.find(*body, |k| {
                    matches!(k, SyntaxKind::Return { argument: Some(_) })
                })?;
                match tree.kind(ret)? {
                    SyntaxKind::Return {
                        argument: Some(arg),
                    } if matches!(tree.kind(*arg), Some(SyntaxKind::Object { .. })) => Some(*arg),
                    _ => None,
                }
            }
        },
        _ => None,
    }
}

struct StoreScope<'a> {
    store: &'a str,
    state: HashSet<&'a str>,
    actions: HashSet<&'a str>,
}

impl StoreScope<'_> {
    /// Walk one getter or action body. `this` is always a receiver; a
    /// getter's first parameter is one as well.
    fn analyze_member(
        &self,
        ctx: &ExtractContext<'_>,
        member_id: &str,
        member_name: &str,
        value: NodeId,
        is_getter: bool,
        out: &mut Extraction,
    ) {
        let tree = ctx.tree;
        let Some(SyntaxKind::Function { params, body }) = tree.kind(value) else {
            return;
        };
        let param_receiver = if is_getter { params.first() } else { None };
        let is_receiver = |id: NodeId| match tree.kind(id) {
            Some(SyntaxKind::This) => true,
            Some(SyntaxKind::Identifier(name)) => param_receiver == Some(name),
            _ => false,
        };

        // Pre-order: an assignment is seen before its target member.
        let mut writes: HashSet<NodeId> = HashSet::new();
        tree.walk(*body, |id, kind| {
            match kind {
                SyntaxKind::Assignment { target, .. } | SyntaxKind::Update { target } => {
                    writes.insert(*target);
                }
                SyntaxKind::Member { object, property } if is_receiver(*object) => {
                    if self.state.contains(property.as_str()) {
                        let relation = if writes.contains(&id) {
                            Relation::ModifiesState
                        } else {
                            Relation::ReadsState
                        };
                        let field =
                            SymbolNode::scoped(SymbolKind::StateField, self.store, property, ctx.path);
                        out.edges.push(Edge::new(member_id, field.id, relation));
                    }
                }
                SyntaxKind::Call { callee, .. } => {
                    if let Some(SyntaxKind::Member { object, property }) = tree.kind(*callee) {
                        if is_receiver(*object)
                            && property != member_name
                            && self.actions.contains(property.as_str())
                        {
                            let action =
                                SymbolNode::scoped(SymbolKind::Action, self.store, property, ctx.path);
                            out.edges.push(Edge::new(member_id, action.id, Relation::Calls));
                        }
                    }
                }
                _ => {}
            }
            Walk::Continue
        });
    }
}
