//! Self-updating launcher for the `minimal` tool.
//!
//! Each invocation resolves the desired tool version from a remote manifest,
//! makes sure the matching executable is present in the per-user cache
//! (downloading it from the release host on a miss), and then hands the
//! terminal over to that executable, propagating its exit code.
//!
//! # Modules
//!
//! - [`cache`] - Cache directory layout and hit detection
//! - [`config`] - Fixed endpoints, repository coordinates, and timeouts
//! - [`credential`] - Obfuscated access token decoding
//! - [`delegate`] - Child process execution and exit code propagation
//! - [`dirs`] - Home directory resolution abstraction
//! - [`error`] - Stage-level error types
//! - [`fetch`] - Atomic artefact download into the cache
//! - [`github`] - GitHub REST implementation of the release API
//! - [`manifest`] - Remote version manifest retrieval and parsing
//! - [`orchestrator`] - The per-invocation state sequence
//! - [`output`] - Diagnostic stream helpers
//! - [`release`] - Release and asset lookup

pub mod cache;
pub mod config;
pub mod credential;
pub mod delegate;
pub mod dirs;
pub mod error;
pub mod fetch;
pub mod github;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod release;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
