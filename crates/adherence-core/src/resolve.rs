use std::collections::{BTreeMap, HashSet};

/// Where an import specifier points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// A source-root-relative path inside the project.
    Local(String),
    /// A bare package specifier.
    Package(String),
}

impl ImportTarget {
    pub fn id(&self) -> &str {
        match self {
            ImportTarget::Local(p) | ImportTarget::Package(p) => p,
        }
    }
}

const PROBE_SUFFIXES: &[&str] = &[".js", ".ts", ".mjs", ".vue", "/index.js", "/index.ts"];

/// Resolves import specifiers relative to the importing file.
pub struct ImportResolver<'a> {
    aliases: &'a BTreeMap<String, String>,
    known_files: &'a HashSet<String>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(aliases: &'a BTreeMap<String, String>, known_files: &'a HashSet<String>) -> Self {
        Self {
            aliases,
            known_files,
        }
    }

    /// Resolve `specifier` as written in the file at `importer`.
    pub fn resolve(&self, importer: &str, specifier: &str) -> ImportTarget {
        if specifier.starts_with('.') {
            let dir = importer.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
            let joined = if dir.is_empty() {
                specifier.to_string()
            } else {
                format!("{dir}/{specifier}")
            };
            return ImportTarget::Local(self.complete_extension(normalize(&joined)));
        }

        // Longest alias first so `@/shared/` can shadow `@/`.
        let alias = self
            .aliases
            .iter()
            .filter(|(prefix, _)| specifier.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len());
        if let Some((prefix, replacement)) = alias {
            let rewritten = format!("{replacement}{}", &specifier[prefix.len()..]);
            return ImportTarget::Local(self.complete_extension(normalize(&rewritten)));
        }

        ImportTarget::Package(specifier.to_string())
    }

    /// Map an extension-less path onto a discovered file when one exists.
    fn complete_extension(&self, path: String) -> String {
        if self.known_files.contains(&path) {
            return path;
        }
        PROBE_SUFFIXES
            .iter()
            .map(|suffix| format!("{path}{suffix}"))
            .find(|candidate| self.known_files.contains(candidate))
            .unwrap_or(path)
    }
}

/// Collapse `.` and `..` segments of a forward-slash path.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
