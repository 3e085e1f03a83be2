use std::path::PathBuf;
use thiserror::Error;

/// Resource errors: the only kind that aborts a run rather than being
/// accumulated as a per-line [`crate::diagnostics::Diagnostic`].
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fatal(#[from] FatalError),
}
