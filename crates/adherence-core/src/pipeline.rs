use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::analyzer::{Extraction, SourceAnalyzer, SourceFile};
use crate::classify::FileClassifier;
use crate::config::Config;
use crate::error::FileError;
use crate::graph::ArchitectureGraph;
use crate::hash;
use crate::policy::PolicyEngine;
use crate::resolve::ImportResolver;
use crate::types::{FileNode, SymbolKind, Violation, ViolationKind};

/// Full analysis output: the merged graph and every recorded violation.
pub struct Analysis {
    pub graph: ArchitectureGraph,
    pub violations: Vec<Violation>,
    pub file_count: usize,
}

/// Per-file result, produced in parallel and merged sequentially.
#[derive(Default)]
struct FileOutcome {
    file: Option<FileNode>,
    extraction: Extraction,
    violations: Vec<Violation>,
}

/// Reusable analysis pipeline: discover, classify, hash, parse, extract, validate.
pub struct AnalysisPipeline {
    analyzers: Vec<Box<dyn SourceAnalyzer>>,
    config: Config,
    classifier: FileClassifier,
    policy: PolicyEngine,
    include: GlobSet,
    exclude: GlobSet,
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("invalid glob '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build glob set")
}

impl AnalysisPipeline {
    pub fn new(analyzers: Vec<Box<dyn SourceAnalyzer>>, config: Config) -> Result<Self> {
        let classifier = FileClassifier::new(&config.conventions);
        let policy = PolicyEngine::new(&config)?;
        let include = build_globset(&config.project.include)?;
        let exclude = build_globset(&config.project.exclude)?;
        Ok(Self {
            analyzers,
            config,
            classifier,
            policy,
            include,
            exclude,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// List matching files as sorted, source-root-relative, forward-slash paths.
    pub fn discover(&self, root: &Path) -> Result<Vec<String>> {
        if !root.is_dir() {
            anyhow::bail!("source root '{}' is not a directory", root.display());
        }

        let mut files: Vec<String> = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!("skipping unreadable entry: {err}");
                    None
                }
            })
            .filter(|e| !e.file_type().is_dir())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(root).ok()?;
                Some(rel.to_string_lossy().replace('\\', "/"))
            })
            .filter(|rel| self.include.is_match(rel) && !self.exclude.is_match(rel))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Run a full analysis over the tree rooted at `root`.
    pub fn analyze(&self, root: &Path) -> Result<Analysis> {
        let files = self.discover(root)?;
        tracing::debug!("discovered {} files under {}", files.len(), root.display());

        let known: HashSet<String> = files.iter().cloned().collect();
        let resolver = ImportResolver::new(&self.config.project.aliases, &known);

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|rel| self.process_file(root, rel, &resolver))
            .collect();

        let mut graph = ArchitectureGraph::new();
        let mut violations = Vec::new();
        for outcome in outcomes {
            if let Some(file) = outcome.file {
                graph.add_file(file);
            }
            for symbol in outcome.extraction.symbols {
                let is_store = symbol.symbol_kind == SymbolKind::Store;
                let (id, owner) = (symbol.id.clone(), symbol.owner.clone());
                if !graph.add_symbol(symbol) && is_store {
                    tracing::warn!(
                        "store `{id}` in {owner} is already defined; keeping the first definition"
                    );
                }
            }
            for edge in &outcome.extraction.edges {
                graph.add_edge(edge);
            }
            violations.extend(outcome.violations);
        }

        // Dependency validation needs every edge from every file.
        let edges = graph.edges();
        violations.extend(self.policy.check_dependencies(&edges));

        Ok(Analysis {
            graph,
            violations,
            file_count: files.len(),
        })
    }

    fn process_file(&self, root: &Path, rel: &str, resolver: &ImportResolver<'_>) -> FileOutcome {
        let mut outcome = FileOutcome::default();
        let abs = root.join(rel);

        let bytes = match std::fs::read(&abs) {
            Ok(b) => b,
            Err(source) => {
                let err = FileError::Read { path: abs, source };
                tracing::warn!("{err}");
                outcome
                    .violations
                    .push(self.file_violation(ViolationKind::ReadError, rel, &err));
                return outcome;
            }
        };

        let kind = self.classifier.classify(rel);
        let hash = hash::digest(&bytes);
        let purpose = self.classifier.purpose(kind, rel);
        let layer = self
            .policy
            .layer_classifier()
            .classify(rel)
            .map(|l| l.name.clone());
        let file = FileNode {
            id: rel.to_string(),
            path: rel.to_string(),
            hash,
            file_kind: kind,
            purpose,
            layer,
        };
        outcome.violations.extend(self.policy.check_placement(&file));
        outcome.file = Some(file);

        if !kind.is_parseable() {
            return outcome;
        }
        let Some(analyzer) = self.analyzers.iter().find(|a| a.supports(kind)) else {
            return outcome;
        };

        let result = match std::str::from_utf8(&bytes) {
            Ok(content) => analyzer.analyze(
                &SourceFile {
                    path: rel,
                    kind,
                    content,
                },
                resolver,
            ),
            Err(_) => Err(FileError::Encoding {
                path: rel.to_string(),
            }),
        };

        match result {
            Ok(extraction) => {
                if extraction.used_fallback {
                    tracing::debug!(
                        "{rel}: {} analyzer parsed with the permissive fallback",
                        analyzer.name()
                    );
                }
                outcome.extraction = extraction;
            }
            Err(err) => {
                tracing::warn!("{} analyzer: {err}", analyzer.name());
                outcome
                    .violations
                    .push(self.file_violation(ViolationKind::ParsingError, rel, &err));
            }
        }
        outcome
    }

    fn file_violation(&self, kind: ViolationKind, rel: &str, err: &FileError) -> Violation {
        Violation {
            kind,
            severity: self.config.rules.severity_of(kind),
            file: rel.to_string(),
            edge: None,
            message: err.to_string(),
            suggestion: None,
        }
    }
}
