use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use adherence_core::analyzer::{Extraction, SourceAnalyzer, SourceFile};
use adherence_core::config::ConventionsConfig;
use adherence_core::error::FileError;
use adherence_core::resolve::ImportResolver;
use adherence_core::types::FileKind;

pub mod component;
pub mod extract;
pub mod parse;
pub mod router;
pub mod sfc;
pub mod store;
pub mod syntax;

use extract::ExtractContext;
use parse::ScriptParser;
use sfc::SfcSplitter;
use syntax::SyntaxTree;

/// Naming conventions the extractors match against, compiled.
pub struct Conventions {
    pub props_macro: String,
    pub emits_macro: String,
    pub store_factory: String,
    pub store_hook: Regex,
}

impl Conventions {
    pub fn from_config(config: &ConventionsConfig) -> Result<Self> {
        Ok(Self {
            props_macro: config.props_macro.clone(),
            emits_macro: config.emits_macro.clone(),
            store_factory: config.store_factory.clone(),
            store_hook: Regex::new(&config.store_hook_pattern).with_context(|| {
                format!("invalid store hook pattern: {}", config.store_hook_pattern)
            })?,
        })
    }
}

/// A parsed file ready for extraction.
pub struct ParsedSource {
    pub tree: SyntaxTree,
    /// The primary parse failed and the permissive one succeeded.
    pub used_fallback: bool,
}

/// Analyzer for `.vue` single-file components and JavaScript/TypeScript modules.
pub struct VueAnalyzer {
    parser: ScriptParser,
    splitter: SfcSplitter,
    conventions: Conventions,
}

impl VueAnalyzer {
    pub fn new(config: &ConventionsConfig) -> Result<Self> {
        Ok(Self {
            parser: ScriptParser::new(),
            splitter: SfcSplitter::new()?,
            conventions: Conventions::from_config(config)?,
        })
    }

    /// Parse a file into a syntax tree. Components are split into blocks
    /// first. If the strict parse fails, the script alone is retried
    /// permissively; only when both fail is the file reported unparseable.
    pub fn parse_file(&self, path: &str, content: &str) -> Result<ParsedSource, FileError> {
        let is_component = path.ends_with(".vue");

        let primary = if is_component {
            self.splitter.split(content).and_then(|blocks| {
                let tree = self.parser.parse_strict(&blocks.script)?;
                Ok(SyntaxTree::lower(&tree, &blocks.script, blocks.template_tags))
            })
        } else {
            self.parser
                .parse_strict(content)
                .map(|tree| SyntaxTree::lower(&tree, content, Vec::new()))
        };
        let primary_err = match primary {
            Ok(tree) => {
                return Ok(ParsedSource {
                    tree,
                    used_fallback: false,
                })
            }
            Err(e) => e,
        };

        debug!(path, reason = %primary_err, "primary parse failed, retrying permissively");
        let script = if is_component {
            self.splitter.script_lenient(content)
        } else {
            content.to_string()
        };
        match self.parser.parse_permissive(&script) {
            Ok(tree) => Ok(ParsedSource {
                tree: SyntaxTree::lower(&tree, &script, Vec::new()),
                used_fallback: true,
            }),
            Err(fallback_err) => Err(FileError::Parse {
                path: path.into(),
                reason: format!("{primary_err}; fallback parse: {fallback_err}"),
            }),
        }
    }
}

impl SourceAnalyzer for VueAnalyzer {
    fn name(&self) -> &'static str {
        "vue"
    }

    fn supports(&self, kind: FileKind) -> bool {
        kind.is_parseable()
    }

    fn analyze(
        &self,
        file: &SourceFile<'_>,
        resolver: &ImportResolver<'_>,
    ) -> Result<Extraction, FileError> {
        let parsed = self.parse_file(file.path, file.content)?;
        let ctx = ExtractContext {
            tree: &parsed.tree,
            path: file.path,
            resolver,
        };
        let mut out = Extraction {
            used_fallback: parsed.used_fallback,
            ..Default::default()
        };

        extract::scan_imports(&ctx, &mut out);
        match file.kind {
            FileKind::UiComponent => component::extract(&ctx, &self.conventions, &mut out),
            FileKind::StateStore => store::extract(&ctx, &self.conventions.store_factory, &mut out),
            FileKind::RouterConfig => router::extract(&ctx, &mut out),
            _ => {}
        }
        Ok(out)
    }
}
