use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::config::{Config, RulesConfig};
use crate::layer::LayerClassifier;
use crate::types::{
    ArchitecturalLayer, Edge, FileKind, FileNode, Relation, Violation, ViolationKind,
};

/// A placement rule with its path pattern compiled.
pub struct CompiledPlacementRule {
    pub file_kind: FileKind,
    pub purpose: String,
    pub pattern: Regex,
}

/// Serialized form of a placement rule; the pattern is kept as regex text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementRuleView {
    pub file_kind: FileKind,
    pub purpose: String,
    pub path_pattern: String,
}

/// Holds the layer hierarchy, placement rules, and dependency allow-lists,
/// and evaluates files and edges against them.
pub struct PolicyEngine {
    layers: LayerClassifier,
    placement: Vec<CompiledPlacementRule>,
    allowed: BTreeMap<String, BTreeSet<String>>,
    source_extensions: Vec<String>,
    rules: RulesConfig,
}

/// Compile placement rule configs into regex-based rules.
fn compile_placement(config: &Config) -> Result<Vec<CompiledPlacementRule>> {
    config
        .placement
        .iter()
        .map(|cfg| {
            let pattern = Regex::new(&cfg.pattern).with_context(|| {
                format!(
                    "invalid placement pattern for {} / '{}'",
                    cfg.file_kind, cfg.purpose
                )
            })?;
            Ok(CompiledPlacementRule {
                file_kind: cfg.file_kind,
                purpose: cfg.purpose.clone(),
                pattern,
            })
        })
        .collect()
}

impl PolicyEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let layers = LayerClassifier::new(&config.layers);
        let placement = compile_placement(config)?;

        // Every layer may import from itself, whether or not it has a rule.
        let mut allowed: BTreeMap<String, BTreeSet<String>> = layers
            .layers()
            .iter()
            .map(|l| (l.name.clone(), BTreeSet::from([l.name.clone()])))
            .collect();
        for (layer, targets) in &config.dependencies {
            let entry = allowed
                .entry(layer.clone())
                .or_insert_with(|| BTreeSet::from([layer.clone()]));
            entry.extend(targets.iter().cloned());
        }

        Ok(Self {
            layers,
            placement,
            allowed,
            source_extensions: config.project.source_extensions.clone(),
            rules: config.rules.clone(),
        })
    }

    pub fn layer_classifier(&self) -> &LayerClassifier {
        &self.layers
    }

    pub fn layers(&self) -> &[ArchitecturalLayer] {
        self.layers.layers()
    }

    pub fn placement_rules(&self) -> Vec<PlacementRuleView> {
        self.placement
            .iter()
            .map(|r| PlacementRuleView {
                file_kind: r.file_kind,
                purpose: r.purpose.clone(),
                path_pattern: r.pattern.as_str().to_string(),
            })
            .collect()
    }

    pub fn dependency_rules(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.allowed
    }

    /// Check a file against the first placement rule matching its kind and purpose.
    pub fn check_placement(&self, file: &FileNode) -> Option<Violation> {
        let rule = self
            .placement
            .iter()
            .find(|r| r.file_kind == file.file_kind && r.purpose == file.purpose)?;
        if rule.pattern.is_match(&file.path) {
            return None;
        }
        Some(Violation {
            kind: ViolationKind::PlacementViolation,
            severity: self.rules.severity_of(ViolationKind::PlacementViolation),
            file: file.path.clone(),
            edge: None,
            message: format!(
                "{} ({}, {}) is misplaced: expected path matching `{}`",
                file.path,
                file.file_kind,
                file.purpose,
                rule.pattern.as_str()
            ),
            suggestion: Some(format!(
                "Move the file to a location matching `{}`.",
                rule.pattern.as_str()
            )),
        })
    }

    /// Check one edge against the layer hierarchy and the allow-lists.
    pub fn check_dependency(&self, edge: &Edge) -> Vec<Violation> {
        let mut violations = Vec::new();
        if edge.relation != Relation::Imports || !self.is_source_module(&edge.target) {
            return violations;
        }
        let (Some(from), Some(to)) = (
            self.layers.classify(&edge.source),
            self.layers.classify(&edge.target),
        ) else {
            return violations;
        };
        let severity = self.rules.severity_of(ViolationKind::DependencyViolation);

        if from.rank < to.rank {
            violations.push(Violation {
                kind: ViolationKind::DependencyViolation,
                severity,
                file: edge.source.clone(),
                edge: Some(edge.clone()),
                message: format!(
                    "Layer `{}` (rank {}) must not import from higher layer `{}` (rank {}): {} -> {}",
                    from.name, from.rank, to.name, to.rank, edge.source, edge.target
                ),
                suggestion: Some(format!(
                    "Move the shared logic down into `{}` or below, or invert the dependency.",
                    from.name
                )),
            });
            if self.rules.deduplicate_dependency_violations {
                return violations;
            }
        }

        let permitted = self.allowed.get(&from.name);
        if !permitted.is_some_and(|set| set.contains(&to.name)) {
            let listed = permitted
                .map(|set| set.iter().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            violations.push(Violation {
                kind: ViolationKind::DependencyViolation,
                severity,
                file: edge.source.clone(),
                edge: Some(edge.clone()),
                message: format!(
                    "Layer `{}` may only import from [{}], but {} imports {} in layer `{}`",
                    from.name, listed, edge.source, edge.target, to.name
                ),
                suggestion: None,
            });
        }

        violations
    }

    /// Check every edge. Must run after all edges are known.
    pub fn check_dependencies<'a>(&self, edges: impl IntoIterator<Item = &'a Edge>) -> Vec<Violation> {
        edges
            .into_iter()
            .flat_map(|edge| self.check_dependency(edge))
            .collect()
    }

    fn is_source_module(&self, target: &str) -> bool {
        target
            .rsplit_once('.')
            .is_some_and(|(_, ext)| self.source_extensions.iter().any(|e| e == ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlacementRuleConfig;
    use crate::types::Severity;

    fn engine() -> PolicyEngine {
        PolicyEngine::new(&Config::default()).unwrap()
    }

    fn file(path: &str, kind: FileKind, purpose: &str) -> FileNode {
        FileNode {
            id: path.to_string(),
            path: path.to_string(),
            hash: String::new(),
            file_kind: kind,
            purpose: purpose.to_string(),
            layer: None,
        }
    }

    fn import(from: &str, to: &str) -> Edge {
        Edge::new(from, to, Relation::Imports)
    }

    #[test]
    fn test_shared_ui_component_never_misplaced() {
        let policy = engine();
        let f = file(
            "src/shared/ui/button/Button.vue",
            FileKind::UiComponent,
            "UI Primitive",
        );
        assert!(policy.check_placement(&f).is_none());
    }

    #[test]
    fn test_feature_component_outside_ui_is_misplaced() {
        let policy = engine();
        let f = file(
            "src/features/auth/LoginForm.vue",
            FileKind::UiComponent,
            "Feature Implementation",
        );
        let v = policy.check_placement(&f).expect("should be misplaced");
        assert_eq!(v.kind, ViolationKind::PlacementViolation);
        assert_eq!(v.severity, Severity::Warning);
        assert!(v.message.contains("^src/features/[^/]+/ui/"));

        let ok = file(
            "src/features/auth/ui/LoginForm.vue",
            FileKind::UiComponent,
            "Feature Implementation",
        );
        assert!(policy.check_placement(&ok).is_none());
    }

    #[test]
    fn test_no_rule_never_flagged() {
        let policy = engine();
        let f = file(
            "anywhere/format.js",
            FileKind::Utility,
            "Represents artifact at anywhere/format.js",
        );
        assert!(policy.check_placement(&f).is_none());
    }

    #[test]
    fn test_first_matching_rule_applies() {
        let mut config = Config::default();
        config.placement = vec![
            PlacementRuleConfig {
                file_kind: FileKind::UiComponent,
                purpose: "UI Primitive".to_string(),
                pattern: "^src/shared/ui/".to_string(),
            },
            PlacementRuleConfig {
                file_kind: FileKind::UiComponent,
                purpose: "UI Primitive".to_string(),
                pattern: "^nowhere/".to_string(),
            },
        ];
        let policy = PolicyEngine::new(&config).unwrap();
        let f = file("src/shared/ui/Icon.vue", FileKind::UiComponent, "UI Primitive");
        assert!(policy.check_placement(&f).is_none());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let mut config = Config::default();
        config.placement[0].pattern = "([".to_string();
        assert!(PolicyEngine::new(&config).is_err());
    }

    #[test]
    fn test_upward_import_reports_both_checks() {
        let policy = engine();
        let edge = import("src/shared/lib/a.js", "src/features/auth/model/authStore.js");
        let violations = policy.check_dependency(&edge);
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .all(|v| v.kind == ViolationKind::DependencyViolation));
        assert!(violations[0].message.contains("must not import from higher layer"));
        assert!(violations[1].message.contains("may only import from [shared]"));
        assert_eq!(violations[0].edge.as_ref(), Some(&edge));
    }

    #[test]
    fn test_upward_import_deduplicated() {
        let mut config = Config::default();
        config.rules.deduplicate_dependency_violations = true;
        let policy = PolicyEngine::new(&config).unwrap();
        let edge = import("src/entities/user/api.js", "src/pages/home/ui/HomePage.vue");
        assert_eq!(policy.check_dependency(&edge).len(), 1);
    }

    #[test]
    fn test_downward_and_same_layer_imports_pass() {
        let policy = engine();
        assert!(policy
            .check_dependency(&import("src/pages/home/ui/HomePage.vue", "src/shared/ui/Button.vue"))
            .is_empty());
        assert!(policy
            .check_dependency(&import("src/features/a/ui/A.vue", "src/features/b/ui/B.vue"))
            .is_empty());
    }

    #[test]
    fn test_allow_list_without_rank_inversion() {
        let mut config = Config::default();
        // pages may no longer use widgets, although widgets rank lower
        config
            .dependencies
            .insert("pages".to_string(), vec!["shared".to_string()]);
        let policy = PolicyEngine::new(&config).unwrap();
        let violations = policy.check_dependency(&import(
            "src/pages/home/ui/HomePage.vue",
            "src/widgets/header/ui/Header.vue",
        ));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("[pages, shared]"));
    }

    #[test]
    fn test_exempt_edges() {
        let policy = engine();
        // package imports
        assert!(policy
            .check_dependency(&Edge::new("src/shared/a.js", "vue", Relation::ImportsPackage))
            .is_empty());
        // non-source targets
        assert!(policy
            .check_dependency(&import("src/shared/a.js", "src/app/styles/main.css"))
            .is_empty());
        // unlayered endpoints
        assert!(policy
            .check_dependency(&import("src/main.js", "src/app/router/index.js"))
            .is_empty());
        assert!(policy
            .check_dependency(&import("src/shared/a.js", "src/legacy/b.js"))
            .is_empty());
        // other relations
        assert!(policy
            .check_dependency(&Edge::new(
                "src/shared/ui/A.vue",
                "src/app/X.vue",
                Relation::UsesComponent
            ))
            .is_empty());
    }

    #[test]
    fn test_allow_lists_are_reflexive() {
        let mut config = Config::default();
        config.dependencies.clear();
        let policy = PolicyEngine::new(&config).unwrap();
        for layer in policy.layers() {
            assert!(policy.dependency_rules()[&layer.name].contains(&layer.name));
        }
        assert!(policy
            .check_dependency(&import("src/app/main.js", "src/app/router/index.js"))
            .is_empty());
    }

    #[test]
    fn test_placement_rules_keep_pattern_text() {
        let policy = engine();
        let rules = policy.placement_rules();
        assert_eq!(rules[0].path_pattern, "^src/shared/ui/");
        assert_eq!(rules[5].path_pattern, r"^src/app/main\.(js|mjs|ts)$");
    }
}
