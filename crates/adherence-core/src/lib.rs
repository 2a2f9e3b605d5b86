pub mod analyzer;
pub mod classify;
pub mod config;
pub mod error;
pub mod graph;
pub mod hash;
pub mod layer;
pub mod pipeline;
pub mod policy;
pub mod resolve;
pub mod types;

pub use analyzer::{Extraction, SourceAnalyzer, SourceFile};
pub use classify::FileClassifier;
pub use config::Config;
pub use error::FileError;
pub use graph::ArchitectureGraph;
pub use layer::LayerClassifier;
pub use pipeline::{Analysis, AnalysisPipeline};
pub use policy::PolicyEngine;
pub use resolve::{ImportResolver, ImportTarget};
pub use types::*;
