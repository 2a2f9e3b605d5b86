use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adherence_core::analyzer::SourceAnalyzer;
use adherence_core::config::{Config, CONFIG_FILE};
use adherence_core::pipeline::AnalysisPipeline;
use adherence_core::types::Severity;
use adherence_report::{json, text};
use adherence_vue::VueAnalyzer;

#[derive(Parser)]
#[command(name = "adherence")]
#[command(about = "Generate an architecture adherence protocol for a Vue source tree")]
#[command(version)]
struct Cli {
    /// Project root to analyze
    #[arg(default_value = ".")]
    root: PathBuf,
    /// Where to write the protocol document (defaults to report.output under the root)
    output: Option<PathBuf>,
    /// Config file path (defaults to .adherence.toml in the root or an ancestor)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write single-line JSON
    #[arg(long)]
    compact: bool,
    /// Exit with code 1 if any violation is at or above this severity
    #[arg(long)]
    fail_on: Option<String>,
    /// Create a default .adherence.toml in the root and exit
    #[arg(long)]
    init: bool,
    /// Overwrite an existing config with --init
    #[arg(long, requires = "init")]
    force: bool,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = if cli.init {
        cmd_init(&cli.root, cli.force)
    } else {
        cmd_generate(&cli)
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    }
}

/// Run the analysis and write the document. Returns false when the
/// `--fail-on` gate trips.
fn cmd_generate(cli: &Cli) -> Result<bool> {
    let fail_on: Option<Severity> = cli.fail_on.as_deref().map(str::parse).transpose()?;
    let config = load_config(&cli.root, cli.config.as_deref())?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.root.join(&config.report.output));

    let analyzers: Vec<Box<dyn SourceAnalyzer>> = vec![Box::new(
        VueAnalyzer::new(&config.conventions).context("failed to initialize Vue analyzer")?,
    )];
    let pipeline = AnalysisPipeline::new(analyzers, config)?;
    let analysis = pipeline.analyze(&cli.root)?;
    info!(
        "analyzed {} files: {} nodes, {} edges, {} violations",
        analysis.file_count,
        analysis.graph.node_count(),
        analysis.graph.edge_count(),
        analysis.violations.len()
    );

    let doc = json::build_document(
        &analysis,
        pipeline.policy(),
        &pipeline.config().report,
        chrono::Utc::now(),
    );
    json::write_document(&doc, &output, cli.compact)?;
    print!("{}", text::format_summary(&analysis, &output));

    match fail_on {
        Some(fail_on) => {
            let (verdict, passed) = text::format_check(&analysis, fail_on);
            print!("{verdict}");
            Ok(passed)
        }
        None => Ok(true),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<bool> {
    let target = root.join(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{} already exists. Use --force to overwrite.", target.display());
    }
    std::fs::write(&target, Config::default_toml())
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("Created {} with default configuration.", target.display());
    Ok(true)
}

fn load_config(root: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Ok(Config::load_or_default(root)),
    }
}
