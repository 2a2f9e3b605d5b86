use crate::error::FileError;
use crate::resolve::ImportResolver;
use crate::types::{Edge, FileKind, SymbolNode};

/// A discovered file handed to an analyzer.
pub struct SourceFile<'a> {
    /// Source-root-relative, forward-slash path (the file's node id).
    pub path: &'a str,
    pub kind: FileKind,
    pub content: &'a str,
}

/// Symbols and edges extracted from one file.
#[derive(Debug, Default)]
pub struct Extraction {
    pub symbols: Vec<SymbolNode>,
    pub edges: Vec<Edge>,
    /// True when the primary parse failed and the permissive fallback was used.
    pub used_fallback: bool,
}

/// Trait that each source dialect analyzer must implement.
pub trait SourceAnalyzer: Send + Sync {
    /// Analyzer name (e.g., "vue")
    fn name(&self) -> &'static str;

    /// Whether files of this kind are handled.
    fn supports(&self, kind: FileKind) -> bool;

    /// Parse the file and extract graph fragments. A parse failure returns
    /// `FileError::Parse` and yields no extraction.
    fn analyze(
        &self,
        file: &SourceFile<'_>,
        resolver: &ImportResolver<'_>,
    ) -> Result<Extraction, FileError>;
}
