use std::path::PathBuf;

use thiserror::Error;

/// Failure processing a single file. Caught at the file boundary and recorded
/// as a violation; never aborts a run.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}
