//! Release and asset lookup on the release host.
//!
//! A version `V` is published as the release tagged `release-V`; the tool
//! binary is the asset whose name equals the tool name exactly.

use serde::Deserialize;
use std::io::Read;

use crate::config::RELEASE_TAG_PREFIX;
use crate::fetch::FetchError;

/// Errors arising while locating the asset for a version.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// No release carries the derived tag.
    #[error("release not found: {tag}")]
    ReleaseNotFound {
        /// The tag that was queried.
        tag: String,
    },

    /// The release query failed for any reason other than a missing release.
    #[error("failed to get release {tag}: {reason}")]
    Query {
        /// The tag that was queried.
        tag: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The release exists but has no asset with the expected name.
    #[error("asset {asset} not found in release {tag}")]
    AssetNotFound {
        /// The asset name searched for.
        asset: String,
        /// The release tag searched.
        tag: String,
    },
}

/// A tagged release and its assets, in the order the host lists them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// The release tag.
    pub tag_name: String,
    /// Downloadable files attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// Host-assigned asset identifier.
    pub id: u64,
    /// File name of the asset.
    pub name: String,
    /// API URL of the asset.
    #[serde(default)]
    pub url: String,
}

/// The asset selected for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    /// Host-assigned asset identifier.
    pub id: u64,
    /// File name of the asset.
    pub name: String,
}

impl From<&ReleaseAsset> for AssetHandle {
    fn from(asset: &ReleaseAsset) -> Self {
        Self {
            id: asset.id,
            name: asset.name.clone(),
        }
    }
}

/// Response to an asset download request.
pub enum AssetBody {
    /// The asset content.
    Stream {
        /// Reader over the response body.
        reader: Box<dyn Read + Send>,
        /// Declared body length, when the host sent one.
        content_length: Option<u64>,
    },
    /// The host answered with a redirect instead of content.
    Redirect {
        /// The redirect target, if the response named one.
        location: Option<String>,
    },
}

impl std::fmt::Debug for AssetBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream { content_length, .. } => f
                .debug_struct("Stream")
                .field("content_length", content_length)
                .finish_non_exhaustive(),
            Self::Redirect { location } => f
                .debug_struct("Redirect")
                .field("location", location)
                .finish(),
        }
    }
}

/// Authenticated access to releases and their assets.
///
/// Abstractions allow tests to mock the release host without network access.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseApi {
    /// Fetches the release carrying `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::ReleaseNotFound`] when the host reports the tag
    /// as missing and [`LocateError::Query`] for any other failure.
    fn release_by_tag(&self, tag: &str) -> Result<Release, LocateError>;

    /// Requests the content of an asset without following redirects.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] if the request fails.
    fn open_asset(&self, asset_id: u64) -> Result<AssetBody, FetchError>;

    /// Requests a redirect target without sending credentials.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] if the request fails.
    fn follow_redirect(&self, location: &str) -> Result<AssetBody, FetchError>;
}

/// Derives the release tag for a version.
///
/// # Examples
///
/// ```
/// use minimal_shim::release::release_tag;
///
/// assert_eq!(release_tag("2.3.1"), "release-2.3.1");
/// ```
#[must_use]
pub fn release_tag(version: &str) -> String {
    format!("{RELEASE_TAG_PREFIX}{version}")
}

/// Finds the first asset of the release for `version` named `asset_name`.
///
/// Matching is exact and case-sensitive.
///
/// # Errors
///
/// Propagates release query failures and returns
/// [`LocateError::AssetNotFound`] when no asset matches.
pub fn find_asset(
    api: &dyn ReleaseApi,
    version: &str,
    asset_name: &str,
) -> Result<AssetHandle, LocateError> {
    let tag = release_tag(version);
    log::debug!("looking up asset {asset_name} in release {tag}");
    let release = api.release_by_tag(&tag)?;

    release
        .assets
        .iter()
        .find(|asset| asset.name == asset_name)
        .map(AssetHandle::from)
        .ok_or_else(|| LocateError::AssetNotFound {
            asset: asset_name.to_owned(),
            tag,
        })
}
