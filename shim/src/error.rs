//! Error types for the launcher.
//!
//! Each pipeline stage has its own error enum next to the code that raises
//! it. [`ShimError`] wraps them with the stage that failed, which is all the
//! user sees before the launcher exits with status 1.

use thiserror::Error;

use crate::cache::CacheError;
use crate::delegate::ExecutionError;
use crate::fetch::FetchError;
use crate::manifest::ManifestError;
use crate::release::LocateError;

/// Errors that abort an invocation before or during delegation.
#[derive(Debug, Error)]
pub enum ShimError {
    /// The version manifest could not be resolved.
    #[error("failed to fetch config: {0}")]
    Manifest(#[from] ManifestError),

    /// The cache directory could not be prepared.
    #[error("failed to get cache directory: {0}")]
    Cache(#[from] CacheError),

    /// The release asset for the version could not be found.
    #[error("failed to find release asset: {0}")]
    Locate(#[from] LocateError),

    /// The release asset could not be downloaded into the cache.
    #[error("failed to download binary: {0}")]
    Fetch(#[from] FetchError),

    /// The cached tool could not be run.
    #[error("failed to execute binary: {0}")]
    Execute(#[from] ExecutionError),
}

/// Result type alias using [`ShimError`].
pub type Result<T> = std::result::Result<T, ShimError>;
