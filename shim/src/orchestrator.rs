//! The per-invocation pipeline.
//!
//! Resolve the version, check the cache, download on a miss, delegate. The
//! steps run strictly in that order and the first error ends the invocation;
//! nothing is retried or resumed.

use std::ffi::OsString;
use std::io::Write;

use crate::cache::{CacheStore, exists};
use crate::config::ShimConfig;
use crate::delegate::{ProcessRunner, execute};
use crate::dirs::BaseDirs;
use crate::error::Result;
use crate::fetch::download;
use crate::manifest::{ManifestSource, fetch_version};
use crate::output::{DOWNLOAD_COMPLETE_MESSAGE, download_started_message, write_stderr_line};
use crate::release::{ReleaseApi, find_asset};

/// Exit status reported when the launcher fails before delegating.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Steps of a single invocation, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimState {
    /// Fetching the version manifest.
    ResolvingVersion,
    /// Looking for the artefact in the cache.
    CheckingCache,
    /// Locating and downloading the artefact after a cache miss.
    Downloading,
    /// Running the cached artefact.
    Delegating,
    /// The delegated process has exited.
    Done,
}

/// The collaborators of one invocation.
///
/// Production wiring lives in the `minimal` binary; tests substitute mocks for
/// any of the trait objects.
pub struct Shim<'a> {
    /// Fixed endpoints and names.
    pub config: &'a ShimConfig,
    /// Source of the version manifest.
    pub manifest: &'a dyn ManifestSource,
    /// Authenticated release host client.
    pub releases: &'a dyn ReleaseApi,
    /// Home directory resolver for the cache.
    pub dirs: &'a dyn BaseDirs,
    /// Runner for the delegated process.
    pub runner: &'a dyn ProcessRunner,
}

impl Shim<'_> {
    /// Runs the pipeline and returns the delegated process's exit code.
    ///
    /// Progress notices for a download are written to `stderr`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ShimError`](crate::error::ShimError) raised by any
    /// stage.
    pub fn run(&self, args: &[OsString], stderr: &mut dyn Write) -> Result<i32> {
        enter(ShimState::ResolvingVersion);
        let manifest = fetch_version(self.manifest)?;
        let version = manifest.version();

        enter(ShimState::CheckingCache);
        let cache = CacheStore::open(self.dirs, &self.config.tool_name)?;
        let binary = cache.resolve_cache_path(version);

        if exists(&binary) {
            log::debug!("cache hit for {binary}");
        } else {
            enter(ShimState::Downloading);
            write_stderr_line(
                stderr,
                download_started_message(&self.config.tool_name, version),
            );
            let asset = find_asset(self.releases, version, self.config.asset_name())?;
            download(self.releases, &asset, &binary)?;
            write_stderr_line(stderr, DOWNLOAD_COMPLETE_MESSAGE);
        }

        enter(ShimState::Delegating);
        let code = execute(self.runner, &binary, args)?;

        enter(ShimState::Done);
        Ok(code)
    }
}

fn enter(state: ShimState) {
    log::debug!("entering {state:?}");
}

/// Maps a run result to the launcher's exit status.
///
/// Errors are reported as a single line on `stderr`.
pub fn exit_code_for_run_result(result: Result<i32>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            write_stderr_line(stderr, format!("Error: {err}"));
            FAILURE_EXIT_CODE
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
