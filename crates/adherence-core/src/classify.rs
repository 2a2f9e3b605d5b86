use crate::config::ConventionsConfig;
use crate::types::FileKind;

pub const UI_PRIMITIVE: &str = "UI Primitive";
pub const FEATURE_IMPLEMENTATION: &str = "Feature Implementation";
pub const PAGE_LAYOUT: &str = "Page Layout";
pub const BUSINESS_ENTITY_STATE: &str = "Business Entity State";
pub const APPLICATION_ROUTING: &str = "Application Routing";
pub const APPLICATION_ENTRY_POINT: &str = "Application Entry Point";

const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "ts"];
const BINARY_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "gif", "png", "pdf"];

/// Classifies file paths into file kinds and purposes from path heuristics.
pub struct FileClassifier {
    conventions: ConventionsConfig,
}

impl FileClassifier {
    pub fn new(conventions: &ConventionsConfig) -> Self {
        Self {
            conventions: conventions.clone(),
        }
    }

    /// Classify a relative, forward-slash path.
    pub fn classify(&self, path: &str) -> FileKind {
        let normalized = path.replace('\\', "/");
        let (stem, extension) = split_file_name(&normalized);
        let extension = extension.to_ascii_lowercase();
        let rooted = format!("/{normalized}");

        match extension.as_str() {
            "vue" => FileKind::UiComponent,
            "css" => FileKind::StyleSheet,
            ext if SCRIPT_EXTENSIONS.contains(&ext) => {
                if rooted.contains("/model/") && self.has_store_suffix(stem) {
                    FileKind::StateStore
                } else if rooted.contains("/app/router") {
                    FileKind::RouterConfig
                } else if rooted.contains("/app/main") {
                    FileKind::EntryPoint
                } else {
                    FileKind::Utility
                }
            }
            "json" => FileKind::StaticData,
            ext if BINARY_EXTENSIONS.contains(&ext) => FileKind::BinaryAsset,
            _ => FileKind::Other,
        }
    }

    /// Derive a human-readable purpose from the file kind and path prefix.
    pub fn purpose(&self, kind: FileKind, path: &str) -> String {
        let c = &self.conventions;
        let purpose = match kind {
            FileKind::UiComponent if path.starts_with(&c.shared_ui_prefix) => Some(UI_PRIMITIVE),
            FileKind::UiComponent if path.starts_with(&c.features_prefix) => {
                Some(FEATURE_IMPLEMENTATION)
            }
            FileKind::UiComponent if path.starts_with(&c.pages_prefix) => Some(PAGE_LAYOUT),
            FileKind::StateStore => Some(BUSINESS_ENTITY_STATE),
            FileKind::RouterConfig => Some(APPLICATION_ROUTING),
            FileKind::EntryPoint => Some(APPLICATION_ENTRY_POINT),
            _ => None,
        };
        match purpose {
            Some(p) => p.to_string(),
            None => format!("Represents artifact at {path}"),
        }
    }

    fn has_store_suffix(&self, stem: &str) -> bool {
        self.conventions
            .store_suffixes
            .iter()
            .any(|suffix| stem.len() > suffix.len() && stem.ends_with(suffix.as_str()))
    }
}

/// Split the last path segment into (stem, extension).
fn split_file_name(path: &str) -> (&str, &str) {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(dot) => (&name[..dot], &name[dot + 1..]),
    }
}
