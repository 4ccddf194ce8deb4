//! Storage Layer
//!
//! One JSON object per line, appended and flushed as each command
//! completes, in per-vehicle directories.

mod record;
mod writer;

pub use record::ObdRecord;
pub use writer::{output_file_name, read_records, JsonLinesWriter};

use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
