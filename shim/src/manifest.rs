//! Remote version manifest retrieval and parsing.
//!
//! The manifest is a small JSON document, `{"version": "<string>"}`, naming
//! the release every launcher should run. It is fetched on every invocation
//! and never persisted, so intermediate caches are asked not to serve a
//! stale copy.

use serde::Deserialize;

use crate::config::ShimConfig;

/// Errors arising while resolving the desired version.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The request could not be completed.
    #[error("HTTP GET {url} failed: {reason}")]
    Fetch {
        /// The manifest URL.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with something other than 200 OK.
    #[error("unexpected status code {status} from {url}")]
    Status {
        /// The manifest URL.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },

    /// The body is not a JSON object with a string `version` field.
    #[error("failed to decode JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The `version` field is missing or empty.
    #[error("version field is empty in config")]
    Invalid,
}

/// The validated manifest payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionManifest {
    version: String,
}

impl VersionManifest {
    /// The desired tool version, never empty.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Wire shape of the manifest; a missing field reads as empty.
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    version: String,
}

/// Source of the raw manifest body.
///
/// Abstractions allow tests to supply manifests without network access.
#[cfg_attr(test, mockall::automock)]
pub trait ManifestSource {
    /// Retrieves the raw manifest body; decoding is left to the parser.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Fetch`] when the request fails and
    /// [`ManifestError::Status`] for any status other than 200.
    fn fetch_manifest(&self) -> Result<Vec<u8>, ManifestError>;
}

/// Manifest source backed by a single `ureq` request.
pub struct HttpManifestSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpManifestSource {
    /// Creates a source for the configured manifest URL and timeout.
    #[must_use]
    pub fn new(config: &ShimConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.manifest_timeout))
            .http_status_as_error(false)
            .build();
        Self {
            url: config.manifest_url.clone(),
            agent: ureq::Agent::new_with_config(agent_config),
        }
    }
}

impl std::fmt::Debug for HttpManifestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpManifestSource")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ManifestSource for HttpManifestSource {
    fn fetch_manifest(&self) -> Result<Vec<u8>, ManifestError> {
        log::debug!("fetching version manifest from {}", self.url);
        let response = self
            .agent
            .get(&self.url)
            .header("Cache-Control", "max-age=0")
            .call()
            .map_err(|e| self.fetch_error(&e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(ManifestError::Status {
                url: self.url.clone(),
                status,
            });
        }

        response
            .into_body()
            .read_to_vec()
            .map_err(|e| self.fetch_error(&e))
    }
}

impl HttpManifestSource {
    fn fetch_error(&self, err: &ureq::Error) -> ManifestError {
        ManifestError::Fetch {
            url: self.url.clone(),
            reason: err.to_string(),
        }
    }
}

/// Parses and validates a manifest body.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] for malformed JSON (including bytes
/// that are not UTF-8) or a non-string `version`, and [`ManifestError::Invalid`] when `version` is missing or
/// empty.
///
/// # Examples
///
/// ```
/// use minimal_shim::manifest::parse_manifest;
///
/// let manifest = parse_manifest(br#"{"version":"2.3.1"}"#).expect("valid manifest");
/// assert_eq!(manifest.version(), "2.3.1");
/// ```
pub fn parse_manifest(body: &[u8]) -> Result<VersionManifest, ManifestError> {
    let raw: RawManifest = serde_json::from_slice(body)?;
    if raw.version.is_empty() {
        return Err(ManifestError::Invalid);
    }
    Ok(VersionManifest {
        version: raw.version,
    })
}

/// Fetches and validates the manifest in a single attempt.
///
/// # Errors
///
/// Propagates any [`ManifestError`] from the source or the parser.
pub fn fetch_version(source: &dyn ManifestSource) -> Result<VersionManifest, ManifestError> {
    let body = source.fetch_manifest()?;
    let manifest = parse_manifest(&body)?;
    log::debug!("manifest requests version {}", manifest.version());
    Ok(manifest)
}
