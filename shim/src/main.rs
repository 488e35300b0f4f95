//! `minimal` launcher entrypoint.
//!
//! Fetches the current `minimal` release into the user cache when needed and
//! runs it with this process's arguments and standard streams. The exit code
//! is the tool's own, or 1 if the launcher fails before the tool starts.

use std::ffi::OsString;

use minimal_shim::config::ShimConfig;
use minimal_shim::credential::Credential;
use minimal_shim::delegate::SystemProcessRunner;
use minimal_shim::dirs::SystemBaseDirs;
use minimal_shim::github::GitHubReleaseApi;
use minimal_shim::manifest::HttpManifestSource;
use minimal_shim::orchestrator::{Shim, exit_code_for_run_result};

fn main() {
    let config = ShimConfig::default();
    let manifest = HttpManifestSource::new(&config);
    let releases = GitHubReleaseApi::new(&config, Credential::embedded());
    let shim = Shim {
        config: &config,
        manifest: &manifest,
        releases: &releases,
        dirs: &SystemBaseDirs,
        runner: &SystemProcessRunner,
    };

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let mut stderr = std::io::stderr();
    let run_result = shim.run(&args, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    std::process::exit(exit_code);
}
