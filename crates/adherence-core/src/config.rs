use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::types::{FileKind, Severity, ViolationKind};

pub const CONFIG_FILE: &str = ".adherence.toml";

/// Top-level configuration from `.adherence.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub conventions: ConventionsConfig,
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerConfig>,
    #[serde(default = "default_placement")]
    pub placement: Vec<PlacementRuleConfig>,
    #[serde(default = "default_dependencies")]
    pub dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            conventions: ConventionsConfig::default(),
            layers: default_layers(),
            placement: default_placement(),
            dependencies: default_dependencies(),
            rules: RulesConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Glob patterns, relative to the source root, selecting files to analyze.
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Import specifier prefixes rewritten to source-root-relative paths.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
    /// Extensions treated as intra-project source modules.
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
}

fn default_include() -> Vec<String> {
    vec![
        "src/**/*.{js,mjs,ts,vue,json,css}".to_string(),
        "public/data/**/*.{json,webp}".to_string(),
    ]
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}

fn default_aliases() -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    m.insert("@/".to_string(), "src/".to_string());
    m
}

fn default_source_extensions() -> Vec<String> {
    ["js", "mjs", "ts", "vue"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            aliases: default_aliases(),
            source_extensions: default_source_extensions(),
        }
    }
}

/// Naming and placement conventions the classifier and extractors rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConventionsConfig {
    #[serde(default = "default_shared_ui_prefix")]
    pub shared_ui_prefix: String,
    #[serde(default = "default_features_prefix")]
    pub features_prefix: String,
    #[serde(default = "default_pages_prefix")]
    pub pages_prefix: String,
    /// File stem suffixes marking a state store under a `model/` directory.
    #[serde(default = "default_store_suffixes")]
    pub store_suffixes: Vec<String>,
    #[serde(default = "default_store_factory")]
    pub store_factory: String,
    #[serde(default = "default_store_hook_pattern")]
    pub store_hook_pattern: String,
    #[serde(default = "default_props_macro")]
    pub props_macro: String,
    #[serde(default = "default_emits_macro")]
    pub emits_macro: String,
}

fn default_shared_ui_prefix() -> String {
    "src/shared/ui/".to_string()
}
fn default_features_prefix() -> String {
    "src/features/".to_string()
}
fn default_pages_prefix() -> String {
    "src/pages/".to_string()
}
fn default_store_suffixes() -> Vec<String> {
    vec!["Store".to_string(), ".store".to_string(), "-store".to_string()]
}
fn default_store_factory() -> String {
    "defineStore".to_string()
}
fn default_store_hook_pattern() -> String {
    r"^use[A-Z]\w*Store$".to_string()
}
fn default_props_macro() -> String {
    "defineProps".to_string()
}
fn default_emits_macro() -> String {
    "defineEmits".to_string()
}

impl Default for ConventionsConfig {
    fn default() -> Self {
        Self {
            shared_ui_prefix: default_shared_ui_prefix(),
            features_prefix: default_features_prefix(),
            pages_prefix: default_pages_prefix(),
            store_suffixes: default_store_suffixes(),
            store_factory: default_store_factory(),
            store_hook_pattern: default_store_hook_pattern(),
            props_macro: default_props_macro(),
            emits_macro: default_emits_macro(),
        }
    }
}

/// One ranked layer of the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub rank: u32,
    pub prefix: String,
}

fn default_layers() -> Vec<LayerConfig> {
    [
        ("shared", "src/shared/"),
        ("entities", "src/entities/"),
        ("features", "src/features/"),
        ("widgets", "src/widgets/"),
        ("pages", "src/pages/"),
        ("app", "src/app/"),
    ]
    .iter()
    .enumerate()
    .map(|(rank, (name, prefix))| LayerConfig {
        name: name.to_string(),
        rank: rank as u32,
        prefix: prefix.to_string(),
    })
    .collect()
}

/// Binds a (file kind, purpose) pair to a required path pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRuleConfig {
    pub file_kind: FileKind,
    pub purpose: String,
    pub pattern: String,
}

fn default_placement() -> Vec<PlacementRuleConfig> {
    let rule = |file_kind, purpose: &str, pattern: &str| PlacementRuleConfig {
        file_kind,
        purpose: purpose.to_string(),
        pattern: pattern.to_string(),
    };
    vec![
        rule(FileKind::UiComponent, "UI Primitive", r"^src/shared/ui/"),
        rule(
            FileKind::UiComponent,
            "Feature Implementation",
            r"^src/features/[^/]+/ui/",
        ),
        rule(FileKind::UiComponent, "Page Layout", r"^src/pages/[^/]+/ui/"),
        rule(
            FileKind::StateStore,
            "Business Entity State",
            r"^src/(entities|features)/[^/]+/model/",
        ),
        rule(
            FileKind::RouterConfig,
            "Application Routing",
            r"^src/app/router/",
        ),
        rule(
            FileKind::EntryPoint,
            "Application Entry Point",
            r"^src/app/main\.(js|mjs|ts)$",
        ),
    ]
}

fn default_dependencies() -> BTreeMap<String, Vec<String>> {
    let order = ["shared", "entities", "features", "widgets", "pages", "app"];
    order
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let allowed = order[..=i].iter().map(|s| s.to_string()).collect();
            (name.to_string(), allowed)
        })
        .collect()
}

/// Rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_severities")]
    pub severities: HashMap<String, Severity>,
    /// Report only the first dependency violation per edge when both the rank
    /// check and the allow-list check reject it.
    #[serde(default)]
    pub deduplicate_dependency_violations: bool,
}

fn default_severities() -> HashMap<String, Severity> {
    let mut m = HashMap::new();
    m.insert("placement".to_string(), Severity::Warning);
    m.insert("dependency".to_string(), Severity::Error);
    m.insert("parsing".to_string(), Severity::Warning);
    m.insert("read".to_string(), Severity::Error);
    m
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            severities: default_severities(),
            deduplicate_dependency_violations: false,
        }
    }
}

impl RulesConfig {
    pub fn severity_of(&self, kind: ViolationKind) -> Severity {
        self.severities
            .get(kind.config_key())
            .copied()
            .unwrap_or(match kind {
                ViolationKind::PlacementViolation | ViolationKind::ParsingError => {
                    Severity::Warning
                }
                ViolationKind::DependencyViolation | ViolationKind::ReadError => Severity::Error,
            })
    }
}

/// Metadata stamped into the protocol document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Output path used when none is given on the command line, relative to the source root.
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_schema() -> String {
    "./adherence-protocol.schema.json".to_string()
}
fn default_protocol() -> String {
    "architecture-adherence-protocol".to_string()
}
fn default_version() -> String {
    "1.0.0".to_string()
}
fn default_output() -> String {
    "scripts/architecture/adherence-protocol.json".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            protocol: default_protocol(),
            version: default_version(),
            output: default_output(),
        }
    }
}

impl Config {
    /// Load configuration from a `.adherence.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `adherence --init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.adherence.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!("using config {}", config_path.display());
                        config
                    }
                    Err(e) => {
                        tracing::warn!(
                            "failed to load config from '{}': {e:#}. Using defaults.",
                            config_path.display()
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `adherence --init`.
    pub fn default_toml() -> String {
        r#"# Adherence - Architecture Adherence Configuration

[project]
include = ["src/**/*.{js,mjs,ts,vue,json,css}", "public/data/**/*.{json,webp}"]
exclude = ["**/node_modules/**"]
source_extensions = ["js", "mjs", "ts", "vue"]

[project.aliases]
"@/" = "src/"

[conventions]
shared_ui_prefix = "src/shared/ui/"
features_prefix = "src/features/"
pages_prefix = "src/pages/"
store_suffixes = ["Store", ".store", "-store"]
store_factory = "defineStore"
store_hook_pattern = '^use[A-Z]\w*Store$'
props_macro = "defineProps"
emits_macro = "defineEmits"

# Layers ordered by rank: 0 is the most foundational.
# A file belongs to the layer with the longest matching prefix.
[[layers]]
name = "shared"
rank = 0
prefix = "src/shared/"

[[layers]]
name = "entities"
rank = 1
prefix = "src/entities/"

[[layers]]
name = "features"
rank = 2
prefix = "src/features/"

[[layers]]
name = "widgets"
rank = 3
prefix = "src/widgets/"

[[layers]]
name = "pages"
rank = 4
prefix = "src/pages/"

[[layers]]
name = "app"
rank = 5
prefix = "src/app/"

# Placement rules: the first rule matching a file's kind and purpose applies.
[[placement]]
file_kind = "UIComponent"
purpose = "UI Primitive"
pattern = '^src/shared/ui/'

[[placement]]
file_kind = "UIComponent"
purpose = "Feature Implementation"
pattern = '^src/features/[^/]+/ui/'

[[placement]]
file_kind = "UIComponent"
purpose = "Page Layout"
pattern = '^src/pages/[^/]+/ui/'

[[placement]]
file_kind = "StateStore"
purpose = "Business Entity State"
pattern = '^src/(entities|features)/[^/]+/model/'

[[placement]]
file_kind = "RouterConfig"
purpose = "Application Routing"
pattern = '^src/app/router/'

[[placement]]
file_kind = "EntryPoint"
purpose = "Application Entry Point"
pattern = '^src/app/main\.(js|mjs|ts)$'

# Layers each layer may import from. A layer may always import from itself.
[dependencies]
shared = ["shared"]
entities = ["shared", "entities"]
features = ["shared", "entities", "features"]
widgets = ["shared", "entities", "features", "widgets"]
pages = ["shared", "entities", "features", "widgets", "pages"]
app = ["shared", "entities", "features", "widgets", "pages", "app"]

[rules]
deduplicate_dependency_violations = false

[rules.severities]
placement = "warning"
dependency = "error"
parsing = "warning"
read = "error"

[report]
schema = "./adherence-protocol.schema.json"
protocol = "architecture-adherence-protocol"
version = "1.0.0"
output = "scripts/architecture/adherence-protocol.json"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.layers.len(), 6);
        assert_eq!(config.layers[0].name, "shared");
        assert_eq!(config.layers[5].rank, 5);
        assert_eq!(config.placement.len(), 6);
        assert_eq!(
            config.dependencies["features"],
            vec!["shared", "entities", "features"]
        );
        assert_eq!(config.project.aliases["@/"], "src/");
        assert!(!config.rules.deduplicate_dependency_violations);
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.layers.len(), defaults.layers.len());
        assert_eq!(config.placement.len(), defaults.placement.len());
        for (a, b) in config.placement.iter().zip(&defaults.placement) {
            assert_eq!(a.pattern, b.pattern);
            assert_eq!(a.file_kind, b.file_kind);
        }
        assert_eq!(config.dependencies, defaults.dependencies);
        assert_eq!(
            config.conventions.store_hook_pattern,
            defaults.conventions.store_hook_pattern
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml_str = r#"
[rules]
deduplicate_dependency_violations = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.rules.deduplicate_dependency_violations);
        assert_eq!(config.layers.len(), 6);
        assert_eq!(
            config.rules.severity_of(ViolationKind::DependencyViolation),
            Severity::Error
        );
    }

    #[test]
    fn test_deserialize_custom_layers() {
        let toml_str = r#"
[[layers]]
name = "core"
rank = 0
prefix = "src/core/"

[[layers]]
name = "ui"
rank = 1
prefix = "src/ui/"

[[placement]]
file_kind = "UIComponent"
purpose = "UI Primitive"
pattern = '^src/ui/'

[dependencies]
ui = ["core"]

[rules.severities]
placement = "error"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.layers[1].prefix, "src/ui/");
        assert_eq!(config.placement[0].file_kind, FileKind::UiComponent);
        assert_eq!(config.dependencies["ui"], vec!["core"]);
        assert_eq!(
            config.rules.severity_of(ViolationKind::PlacementViolation),
            Severity::Error
        );
        // Missing key falls back to the built-in default
        assert_eq!(
            config.rules.severity_of(ViolationKind::ReadError),
            Severity::Error
        );
    }

    #[test]
    fn test_load_or_default_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[report]\nversion = \"2.0.0\"\n",
        )
        .unwrap();
        let nested = dir.path().join("packages/web");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load_or_default(&nested);
        assert_eq!(config.report.version, "2.0.0");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[[layers]]\nname = 3\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }
}
