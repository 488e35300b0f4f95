//! GitHub REST implementation of [`ReleaseApi`].
//!
//! Every API call carries the launcher's bearer token. Asset downloads are
//! requested with redirect following disabled; GitHub answers them with a
//! redirect to its storage host, which [`ReleaseApi::follow_redirect`] then
//! fetches without the token.

use crate::config::{ReleaseRepo, ShimConfig};
use crate::credential::Credential;
use crate::fetch::FetchError;
use crate::release::{AssetBody, LocateError, Release, ReleaseApi};

/// User agent sent with every request; GitHub rejects requests without one.
const USER_AGENT: &str = concat!("minimal-shim/", env!("CARGO_PKG_VERSION"));

/// REST API version the response shapes are written against.
const API_VERSION: &str = "2022-11-28";

/// Release API client for a single GitHub repository.
pub struct GitHubReleaseApi {
    api_base: String,
    repo: ReleaseRepo,
    credential: Credential,
    agent: ureq::Agent,
}

impl GitHubReleaseApi {
    /// Creates a client for the configured repository.
    #[must_use]
    pub fn new(config: &ShimConfig, credential: Credential) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .build();
        Self {
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            repo: config.repo.clone(),
            credential,
            agent: ureq::Agent::new_with_config(agent_config),
        }
    }

    /// URL of the release lookup for `tag`.
    ///
    /// # Examples
    ///
    /// ```
    /// use minimal_shim::config::ShimConfig;
    /// use minimal_shim::credential::Credential;
    /// use minimal_shim::github::GitHubReleaseApi;
    ///
    /// let api = GitHubReleaseApi::new(&ShimConfig::default(), Credential::embedded());
    /// assert_eq!(
    ///     api.release_url("release-2.3.1"),
    ///     "https://api.github.com/repos/gominimal/minimal/releases/tags/release-2.3.1"
    /// );
    /// ```
    #[must_use]
    pub fn release_url(&self, tag: &str) -> String {
        format!(
            "{}/repos/{}/{}/releases/tags/{tag}",
            self.api_base, self.repo.owner, self.repo.name
        )
    }

    /// URL of the asset download for `asset_id`.
    #[must_use]
    pub fn asset_url(&self, asset_id: u64) -> String {
        format!(
            "{}/repos/{}/{}/releases/assets/{asset_id}",
            self.api_base, self.repo.owner, self.repo.name
        )
    }
}

impl std::fmt::Debug for GitHubReleaseApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubReleaseApi")
            .field("api_base", &self.api_base)
            .field("repo", &self.repo)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl ReleaseApi for GitHubReleaseApi {
    fn release_by_tag(&self, tag: &str) -> Result<Release, LocateError> {
        let url = self.release_url(tag);
        log::debug!("querying release {tag} at {url}");
        let query_error = |reason: String| LocateError::Query {
            tag: tag.to_owned(),
            reason,
        };

        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.credential.bearer())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| query_error(e.to_string()))?;

        match response.status().as_u16() {
            200 => {}
            404 => {
                return Err(LocateError::ReleaseNotFound {
                    tag: tag.to_owned(),
                });
            }
            status => return Err(query_error(format!("unexpected status code {status}"))),
        }

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| query_error(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| query_error(format!("invalid release JSON: {e}")))
    }

    fn open_asset(&self, asset_id: u64) -> Result<AssetBody, FetchError> {
        let url = self.asset_url(asset_id);
        log::debug!("requesting asset {asset_id} at {url}");
        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.credential.bearer())
            .header("Accept", "application/octet-stream")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| request_error(&url, &e))?;
        asset_body(&url, response)
    }

    fn follow_redirect(&self, location: &str) -> Result<AssetBody, FetchError> {
        let response = self
            .agent
            .get(location)
            .header("Accept", "application/octet-stream")
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| request_error(location, &e))?;
        asset_body(location, response)
    }
}

/// Classifies a download response as content or redirect.
fn asset_body(
    url: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<AssetBody, FetchError> {
    let status = response.status().as_u16();
    match status {
        200..=299 => {
            let body = response.into_body();
            let content_length = body.content_length();
            Ok(AssetBody::Stream {
                reader: Box::new(body.into_reader()),
                content_length,
            })
        }
        300..=399 => {
            let location = response
                .headers()
                .get("location")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            Ok(AssetBody::Redirect { location })
        }
        _ => Err(FetchError::Request {
            url: url.to_owned(),
            reason: format!("unexpected status code {status}"),
        }),
    }
}

/// Map a ureq error to a [`FetchError`].
fn request_error(url: &str, err: &ureq::Error) -> FetchError {
    FetchError::Request {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}
