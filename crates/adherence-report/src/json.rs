use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use adherence_core::config::ReportConfig;
use adherence_core::pipeline::Analysis;
use adherence_core::policy::{PlacementRuleView, PolicyEngine};
use adherence_core::types::{ArchitecturalLayer, Edge, Node, Violation, ViolationKind};

/// The protocol document: policy tables, violations, and the graph.
#[derive(Debug, Serialize)]
pub struct ProtocolDocument<'a> {
    #[serde(rename = "$schema")]
    pub schema: &'a str,
    pub protocol: &'a str,
    pub version: &'a str,
    pub generated_at: String,
    pub layers: &'a [ArchitecturalLayer],
    pub placement_rules: Vec<PlacementRuleView>,
    pub dependency_rules: &'a BTreeMap<String, BTreeSet<String>>,
    pub violations: &'a [Violation],
    pub nodes: Vec<&'a Node>,
    pub edges: Vec<Edge>,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub symbols: usize,
    pub edges: usize,
    pub dangling_edges: usize,
    pub violations: BTreeMap<ViolationKind, usize>,
}

impl Summary {
    pub fn of(analysis: &Analysis) -> Self {
        let nodes = analysis.graph.nodes();
        let files = nodes.iter().filter(|n| matches!(n, Node::File(_))).count();
        let mut violations = BTreeMap::new();
        for v in &analysis.violations {
            *violations.entry(v.kind).or_insert(0) += 1;
        }
        Self {
            files,
            symbols: nodes.len() - files,
            edges: analysis.graph.edge_count(),
            dangling_edges: analysis.graph.dangling_edge_count(),
            violations,
        }
    }
}

/// Assemble the document for one run.
pub fn build_document<'a>(
    analysis: &'a Analysis,
    policy: &'a PolicyEngine,
    report: &'a ReportConfig,
    generated_at: DateTime<Utc>,
) -> ProtocolDocument<'a> {
    ProtocolDocument {
        schema: &report.schema,
        protocol: &report.protocol,
        version: &report.version,
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        layers: policy.layers(),
        placement_rules: policy.placement_rules(),
        dependency_rules: policy.dependency_rules(),
        violations: &analysis.violations,
        nodes: analysis.graph.nodes(),
        edges: analysis.graph.edges(),
        summary: Summary::of(analysis),
    }
}

/// Serialize the document, pretty-printed unless `compact`.
pub fn format_document(doc: &ProtocolDocument<'_>, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(doc)
    } else {
        serde_json::to_string_pretty(doc)
    };
    json.context("failed to serialize protocol document")
}

/// Write the document to `path`, creating parent directories.
pub fn write_document(doc: &ProtocolDocument<'_>, path: &Path, compact: bool) -> Result<()> {
    let json = format_document(doc, compact)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("wrote protocol document to {}", path.display());
    Ok(())
}
