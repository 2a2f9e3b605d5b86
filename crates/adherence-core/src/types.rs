use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified kind of a discovered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileKind {
    #[serde(rename = "UIComponent")]
    UiComponent,
    StateStore,
    RouterConfig,
    EntryPoint,
    Utility,
    StyleSheet,
    StaticData,
    BinaryAsset,
    Other,
}

impl FileKind {
    /// Kinds whose content is script (or carries a script block) and gets parsed.
    pub fn is_parseable(&self) -> bool {
        matches!(
            self,
            FileKind::UiComponent
                | FileKind::StateStore
                | FileKind::RouterConfig
                | FileKind::EntryPoint
                | FileKind::Utility
        )
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::UiComponent => "UIComponent",
            FileKind::StateStore => "StateStore",
            FileKind::RouterConfig => "RouterConfig",
            FileKind::EntryPoint => "EntryPoint",
            FileKind::Utility => "Utility",
            FileKind::StyleSheet => "StyleSheet",
            FileKind::StaticData => "StaticData",
            FileKind::BinaryAsset => "BinaryAsset",
            FileKind::Other => "Other",
        };
        write!(f, "{name}")
    }
}

/// A discovered file. Its id is the forward-slash path relative to the source root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub path: String,
    pub hash: String,
    pub file_kind: FileKind,
    pub purpose: String,
    pub layer: Option<String>,
}

/// Kind of a named element owned by a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Prop,
    Event,
    StateField,
    Getter,
    Action,
    Route,
    ExternalPackage,
    Store,
}

impl SymbolKind {
    /// Section name used when composing `<owner>#<section>.<name>` ids.
    pub fn section(&self) -> &'static str {
        match self {
            SymbolKind::Prop => "props",
            SymbolKind::Event => "emits",
            SymbolKind::StateField => "state",
            SymbolKind::Getter => "getters",
            SymbolKind::Action => "actions",
            SymbolKind::Route => "routes",
            SymbolKind::ExternalPackage => "packages",
            SymbolKind::Store => "stores",
        }
    }
}

/// A named element owned by exactly one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolNode {
    pub id: String,
    pub symbol_kind: SymbolKind,
    pub name: String,
    /// Path of the owning file.
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_name: Option<String>,
}

impl SymbolNode {
    /// Build a symbol whose id is `<scope>#<section>.<name>`.
    pub fn scoped(kind: SymbolKind, scope: &str, name: &str, owner: &str) -> Self {
        Self {
            id: format!("{scope}#{}.{name}", kind.section()),
            symbol_kind: kind,
            name: name.to_string(),
            owner: owner.to_string(),
            purpose: None,
            route_path: None,
            route_name: None,
        }
    }

    /// Build a symbol whose id is its bare name (stores, external packages).
    pub fn global(kind: SymbolKind, name: &str, owner: &str) -> Self {
        Self {
            id: name.to_string(),
            symbol_kind: kind,
            name: name.to_string(),
            owner: owner.to_string(),
            purpose: None,
            route_path: None,
            route_name: None,
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// Any node of the architecture graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "snake_case")]
pub enum Node {
    File(FileNode),
    Symbol(SymbolNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::File(f) => &f.id,
            Node::Symbol(s) => &s.id,
        }
    }
}

/// Kind of a directed relation between two node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Imports,
    ImportsPackage,
    Defines,
    DefinesProp,
    DefinesEvent,
    DefinesRoute,
    UsesComponent,
    UsesStoreFile,
    RendersComponent,
    ReadsState,
    ModifiesState,
    Calls,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relation::Imports => "IMPORTS",
            Relation::ImportsPackage => "IMPORTS_PACKAGE",
            Relation::Defines => "DEFINES",
            Relation::DefinesProp => "DEFINES_PROP",
            Relation::DefinesEvent => "DEFINES_EVENT",
            Relation::DefinesRoute => "DEFINES_ROUTE",
            Relation::UsesComponent => "USES_COMPONENT",
            Relation::UsesStoreFile => "USES_STORE_FILE",
            Relation::RendersComponent => "RENDERS_COMPONENT",
            Relation::ReadsState => "READS_STATE",
            Relation::ModifiesState => "MODIFIES_STATE",
            Relation::Calls => "CALLS",
        };
        write!(f, "{name}")
    }
}

/// A directed, typed relation. Targets may point at ids with no node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, relation: Relation) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
        }
    }
}

/// A layer in the architecture hierarchy. Rank 0 is the most foundational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitecturalLayer {
    pub rank: u32,
    pub name: String,
    pub path_prefix: String,
}

/// Severity of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(anyhow::anyhow!("unknown severity: {s}")),
        }
    }
}

/// Kind of a recorded violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    PlacementViolation,
    DependencyViolation,
    ParsingError,
    ReadError,
}

impl ViolationKind {
    /// Key used in `[rules.severities]`.
    pub fn config_key(&self) -> &'static str {
        match self {
            ViolationKind::PlacementViolation => "placement",
            ViolationKind::DependencyViolation => "dependency",
            ViolationKind::ParsingError => "parsing",
            ViolationKind::ReadError => "read",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::PlacementViolation => "PLACEMENT_VIOLATION",
            ViolationKind::DependencyViolation => "DEPENDENCY_VIOLATION",
            ViolationKind::ParsingError => "PARSING_ERROR",
            ViolationKind::ReadError => "READ_ERROR",
        };
        write!(f, "{name}")
    }
}

/// A diagnostic finding. Violations never block a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<Edge>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("info".parse::<Severity>().unwrap(), Severity::Info);
        assert!("unknown".parse::<Severity>().is_err());
    }

    #[test]
    fn test_symbol_ids() {
        let field = SymbolNode::scoped(SymbolKind::StateField, "counter", "count", "a.js");
        assert_eq!(field.id, "counter#state.count");
        let prop = SymbolNode::scoped(SymbolKind::Prop, "src/A.vue", "title", "src/A.vue");
        assert_eq!(prop.id, "src/A.vue#props.title");
        let pkg = SymbolNode::global(SymbolKind::ExternalPackage, "vue", "src/A.vue");
        assert_eq!(pkg.id, "vue");
    }

    #[test]
    fn test_wire_names() {
        let edge = Edge::new("a", "b", Relation::ModifiesState);
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["relation"], "MODIFIES_STATE");

        let kind = serde_json::to_value(FileKind::UiComponent).unwrap();
        assert_eq!(kind, "UIComponent");
        let parsed: FileKind = serde_json::from_str("\"StateStore\"").unwrap();
        assert_eq!(parsed, FileKind::StateStore);

        let kind = serde_json::to_value(ViolationKind::ParsingError).unwrap();
        assert_eq!(kind, "PARSING_ERROR");
    }

    #[test]
    fn test_node_is_tagged() {
        let node = Node::Symbol(SymbolNode::global(SymbolKind::Store, "counter", "a.js"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["node_type"], "symbol");
        assert_eq!(json["symbol_kind"], "Store");
        assert!(json.get("route_path").is_none());
    }

    #[test]
    fn test_parseable_kinds() {
        assert!(FileKind::UiComponent.is_parseable());
        assert!(FileKind::Utility.is_parseable());
        assert!(!FileKind::StaticData.is_parseable());
        assert!(!FileKind::StyleSheet.is_parseable());
        assert!(!FileKind::BinaryAsset.is_parseable());
    }
}
