//! Fixed launcher configuration.
//!
//! The shim deliberately has no configuration file, environment variable, or
//! command-line flag of its own: every argument belongs to the delegated tool.
//! The values here are compiled in, and [`ShimConfig`] exists so tests can
//! point the pipeline at other endpoints.

use std::time::Duration;

/// Location of the version manifest.
pub const MANIFEST_URL: &str = "https://storage.googleapis.com/minimal-shim-config/config.json";

/// Base URL of the GitHub REST API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Name of the tool, its cache directory, and its release asset.
pub const TOOL_NAME: &str = "minimal";

/// Prefix applied to a version to form its release tag.
pub const RELEASE_TAG_PREFIX: &str = "release-";

/// Upper bound on the whole manifest request.
pub const MANIFEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Owner and name of the repository hosting releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRepo {
    /// Account or organisation owning the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl ReleaseRepo {
    /// Creates repository coordinates from owner and name.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl Default for ReleaseRepo {
    fn default() -> Self {
        Self::new("gominimal", "minimal")
    }
}

impl std::fmt::Display for ReleaseRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything the pipeline needs to know that is not derived at run time.
#[derive(Debug, Clone)]
pub struct ShimConfig {
    /// URL of the JSON version manifest.
    pub manifest_url: String,
    /// Base URL of the release host API, without a trailing slash.
    pub api_base: String,
    /// Repository whose releases carry the tool.
    pub repo: ReleaseRepo,
    /// Tool name; also the expected asset name.
    pub tool_name: String,
    /// Global timeout for the manifest request.
    pub manifest_timeout: Duration,
}

impl ShimConfig {
    /// The asset name to look for in a release.
    #[must_use]
    pub fn asset_name(&self) -> &str {
        &self.tool_name
    }
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            manifest_url: MANIFEST_URL.to_owned(),
            api_base: GITHUB_API_BASE.to_owned(),
            repo: ReleaseRepo::default(),
            tool_name: TOOL_NAME.to_owned(),
            manifest_timeout: MANIFEST_TIMEOUT,
        }
    }
}
