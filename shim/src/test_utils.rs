//! Shared test utilities for the launcher crate.
//!
//! Stub implementations of the pipeline's trait seams that record how they
//! were called, so tests can assert on ordering and on calls that must not
//! happen.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::delegate::ProcessRunner;
use crate::dirs::BaseDirs;
use crate::fetch::FetchError;
use crate::manifest::{ManifestError, ManifestSource};
use crate::release::{AssetBody, LocateError, Release, ReleaseApi, ReleaseAsset};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Builds a manifest body naming `version`.
#[must_use]
pub fn manifest_json(version: &str) -> String {
    serde_json::json!({ "version": version }).to_string()
}

/// How a [`StubManifestSource`] answers.
#[derive(Debug, Clone)]
pub enum ManifestReply {
    /// Serve this body with status 200.
    Body(String),
    /// Answer with a non-200 status.
    Status(u16),
    /// Fail at the transport level.
    Unreachable,
}

/// A manifest source returning a fixed reply and counting requests.
#[derive(Debug)]
pub struct StubManifestSource {
    reply: ManifestReply,
    calls: Cell<usize>,
}

impl StubManifestSource {
    /// Creates a source that always answers with `reply`.
    #[must_use]
    pub fn new(reply: ManifestReply) -> Self {
        Self {
            reply,
            calls: Cell::new(0),
        }
    }

    /// Creates a source serving a valid manifest for `version`.
    #[must_use]
    pub fn serving(version: &str) -> Self {
        Self::new(ManifestReply::Body(manifest_json(version)))
    }

    /// Number of manifest requests made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ManifestSource for StubManifestSource {
    fn fetch_manifest(&self) -> Result<Vec<u8>, ManifestError> {
        self.calls.set(self.calls.get() + 1);
        let url = "https://config.example.test/config.json".to_owned();
        match &self.reply {
            ManifestReply::Body(body) => Ok(body.clone().into_bytes()),
            ManifestReply::Status(status) => Err(ManifestError::Status {
                url,
                status: *status,
            }),
            ManifestReply::Unreachable => Err(ManifestError::Fetch {
                url,
                reason: "connection refused".to_owned(),
            }),
        }
    }
}

/// How a [`StubReleaseApi`] serves an asset.
#[derive(Debug, Clone)]
pub enum AssetReply {
    /// Serve these bytes.
    Bytes(Vec<u8>),
    /// Send some bytes, then fail mid-stream.
    Broken,
}

/// A single call made to a [`StubReleaseApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseCall {
    /// A release lookup for a tag.
    ReleaseByTag(String),
    /// An asset download request.
    OpenAsset(u64),
}

/// An in-memory release host.
#[derive(Debug, Default)]
pub struct StubReleaseApi {
    releases: HashMap<String, Release>,
    assets: HashMap<u64, AssetReply>,
    calls: RefCell<Vec<ReleaseCall>>,
}

impl StubReleaseApi {
    /// Creates a host with no releases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `tag` with a single asset named `asset_name`.
    #[must_use]
    pub fn with_release(
        mut self,
        tag: &str,
        asset_id: u64,
        asset_name: &str,
        reply: AssetReply,
    ) -> Self {
        let asset = ReleaseAsset {
            id: asset_id,
            name: asset_name.to_owned(),
            url: format!("https://api.example.test/assets/{asset_id}"),
        };
        self.releases
            .entry(tag.to_owned())
            .or_insert_with(|| Release {
                tag_name: tag.to_owned(),
                assets: Vec::new(),
            })
            .assets
            .push(asset);
        self.assets.insert(asset_id, reply);
        self
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ReleaseCall> {
        self.calls.borrow().clone()
    }

    /// Number of asset download requests made.
    #[must_use]
    pub fn downloads(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, ReleaseCall::OpenAsset(_)))
            .count()
    }
}

impl ReleaseApi for StubReleaseApi {
    fn release_by_tag(&self, tag: &str) -> Result<Release, LocateError> {
        self.calls
            .borrow_mut()
            .push(ReleaseCall::ReleaseByTag(tag.to_owned()));
        self.releases
            .get(tag)
            .cloned()
            .ok_or_else(|| LocateError::ReleaseNotFound {
                tag: tag.to_owned(),
            })
    }

    fn open_asset(&self, asset_id: u64) -> Result<AssetBody, FetchError> {
        self.calls.borrow_mut().push(ReleaseCall::OpenAsset(asset_id));
        match self.assets.get(&asset_id) {
            Some(AssetReply::Bytes(bytes)) => Ok(AssetBody::Stream {
                reader: Box::new(Cursor::new(bytes.clone())),
                content_length: Some(bytes.len() as u64),
            }),
            Some(AssetReply::Broken) => Ok(AssetBody::Stream {
                reader: Box::new(BrokenStream::default()),
                content_length: None,
            }),
            None => Err(FetchError::Request {
                url: format!("https://api.example.test/assets/{asset_id}"),
                reason: "unexpected status code 404".to_owned(),
            }),
        }
    }

    fn follow_redirect(&self, location: &str) -> Result<AssetBody, FetchError> {
        Err(FetchError::UnexpectedRedirect {
            location: location.to_owned(),
        })
    }
}

/// A reader that yields a few bytes and then fails.
#[derive(Debug, Default)]
pub struct BrokenStream {
    sent: bool,
}

impl Read for BrokenStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.sent || buf.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        self.sent = true;
        if let Some(first) = buf.first_mut() {
            *first = b'#';
        }
        Ok(1)
    }
}

/// A process runner that records invocations and returns a fixed exit code.
#[derive(Debug)]
pub struct RecordingRunner {
    code: i32,
    calls: RefCell<Vec<(PathBuf, Vec<OsString>)>>,
}

impl RecordingRunner {
    /// Creates a runner whose processes exit with `code`.
    #[must_use]
    pub fn exiting_with(code: i32) -> Self {
        Self {
            code,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Every program and argument list run so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(PathBuf, Vec<OsString>)> {
        self.calls.borrow().clone()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ExitStatus> {
        self.calls
            .borrow_mut()
            .push((program.to_path_buf(), args.to_vec()));
        Ok(exit_status(self.code))
    }
}

/// A fixed home directory that counts lookups.
#[derive(Debug)]
pub struct FixedHome {
    home: Option<PathBuf>,
    lookups: Cell<usize>,
}

impl FixedHome {
    /// Resolves the home directory to `home`.
    #[must_use]
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
            lookups: Cell::new(0),
        }
    }

    /// A user with no resolvable home directory.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            home: None,
            lookups: Cell::new(0),
        }
    }

    /// Number of home directory lookups, i.e. cache accesses.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl BaseDirs for FixedHome {
    fn home_dir(&self) -> Option<PathBuf> {
        self.lookups.set(self.lookups.get() + 1);
        self.home.clone()
    }
}
