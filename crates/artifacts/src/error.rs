// ---------------------------------------------------------------------------
// ArtifactError: typed failures for reading and writing pipeline artifacts
// ---------------------------------------------------------------------------

use std::path::PathBuf;

use demand::DemandError;

/// Errors raised while persisting or loading artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed CSV (bad quoting, wrong field count, unparseable number).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Bitcode encoding failed.
    #[error("Encoding error: {0}")]
    Encode(String),
    /// Bitcode or lz4 decoding failed.
    #[error("Decoding error: {0}")]
    Decode(String),
    /// Bad magic, truncated header or checksum mismatch.
    #[error("Corrupt artifact: {0}")]
    Corrupt(String),
    /// Model file written by a newer build.
    #[error("Version mismatch: file is v{found}, but this build only supports up to v{expected_max}")]
    VersionMismatch { expected_max: u32, found: u32 },
    /// A required column is absent from a table header.
    #[error("Missing column `{column}` in {table}")]
    MissingColumn { table: String, column: String },
    /// A field failed core validation (e.g. an unparseable timestamp).
    #[error(transparent)]
    Demand(#[from] DemandError),
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<bitcode::Error> for ArtifactError {
    fn from(e: bitcode::Error) -> Self {
        ArtifactError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
