//! Atomic artefact download into the cache.
//!
//! The body is streamed into an executable `<dest>.tmp`, synced, and renamed
//! onto `<dest>` only once the stream has completed. Any failure removes the
//! temporary file, so a file at `<dest>` is never partially written. There is
//! no lock: concurrent first runs may both download, and the last rename wins.
//!
//! Redirects are not treated as uniformly fatal. The release host answers an
//! asset request with one redirect to its storage backend, and [`download`]
//! follows exactly that hop without credentials. Any other redirect is
//! [`FetchError::UnexpectedRedirect`].

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{File, OpenOptions};
use std::io::Read;

use crate::cache::temp_path;
use crate::release::{AssetBody, AssetHandle, ReleaseApi};

/// Errors arising while downloading an artefact.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The download request failed.
    #[error("failed to download release asset from {url}: {reason}")]
    Request {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The host redirected somewhere the launcher will not follow.
    #[error("unexpected redirect URL: {location}")]
    UnexpectedRedirect {
        /// The redirect target, or a note that none was given.
        location: String,
    },

    /// The host sent no content.
    #[error("no response body from download")]
    EmptyBody,

    /// The temporary file could not be created or written.
    #[error("failed to write binary to {path}: {source}")]
    Write {
        /// The temporary file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The completed download could not be moved into place.
    #[error("failed to rename binary {from} to {to}: {source}")]
    Rename {
        /// The temporary file path.
        from: Utf8PathBuf,
        /// The final cache path.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Downloads `asset` to `dest`.
///
/// A redirect from the authenticated request is followed once without
/// credentials, which is how the release host hands off to its storage
/// backend. A missing redirect target or a second redirect is an error.
///
/// # Errors
///
/// Returns a [`FetchError`] describing the failed step; `dest` is untouched on
/// failure.
pub fn download(
    api: &dyn ReleaseApi,
    asset: &AssetHandle,
    dest: &Utf8Path,
) -> Result<(), FetchError> {
    log::debug!("downloading asset {} ({}) to {dest}", asset.name, asset.id);
    let body = match api.open_asset(asset.id)? {
        AssetBody::Redirect {
            location: Some(location),
        } => {
            log::trace!("asset {} redirected to storage", asset.id);
            api.follow_redirect(&location)?
        }
        body => body,
    };

    match body {
        AssetBody::Stream {
            content_length: Some(0),
            ..
        } => Err(FetchError::EmptyBody),
        AssetBody::Stream { reader, .. } => materialize(reader, dest).map(|written| {
            log::debug!("wrote {written} bytes to {dest}");
        }),
        AssetBody::Redirect { location } => Err(FetchError::UnexpectedRedirect {
            location: location.unwrap_or_else(|| "(no Location header)".to_owned()),
        }),
    }
}

/// Streams `reader` into `dest` via its temporary sibling.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`FetchError::Write`] if the temporary file cannot be written,
/// [`FetchError::EmptyBody`] if the stream was empty, and
/// [`FetchError::Rename`] if the final rename fails. The temporary file is
/// removed in every error case.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use minimal_shim::fetch::materialize;
///
/// let temp = tempfile::tempdir()?;
/// let dest = Utf8PathBuf::try_from(temp.path().join("minimal-1.0.0"))?;
/// let written = materialize(&b"#!/bin/sh\n"[..], &dest)?;
/// assert_eq!(written, 10);
/// assert!(dest.is_file());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn materialize(mut reader: impl Read, dest: &Utf8Path) -> Result<u64, FetchError> {
    let tmp = temp_path(dest);
    let mut file = create_executable(&tmp).map_err(|source| FetchError::Write {
        path: tmp.clone(),
        source,
    })?;

    let copied = std::io::copy(&mut reader, &mut file)
        .and_then(|n| file.sync_all().map(|()| n));
    drop(file);
    let written = match copied.and_then(|n| make_executable(&tmp).map(|()| n)) {
        Ok(written) => written,
        Err(source) => {
            discard(&tmp);
            return Err(FetchError::Write { path: tmp, source });
        }
    };

    if written == 0 {
        discard(&tmp);
        return Err(FetchError::EmptyBody);
    }

    if let Err(source) = std::fs::rename(tmp.as_std_path(), dest.as_std_path()) {
        discard(&tmp);
        return Err(FetchError::Rename {
            from: tmp,
            to: dest.to_owned(),
            source,
        });
    }

    Ok(written)
}

/// Creates or truncates `path` with mode `rwxr-xr-x`.
fn create_executable(path: &Utf8Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;

        options.mode(0o755);
    }
    options.open(path.as_std_path())
}

/// Sets `rwxr-xr-x` on the downloaded file.
///
/// The creation mode is narrowed by the umask and does not apply to a temp
/// file left behind by an earlier run.
#[cfg(unix)]
fn make_executable(path: &Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path.as_std_path(), std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Utf8Path) -> std::io::Result<()> {
    Ok(())
}

fn discard(tmp: &Utf8Path) {
    if let Err(err) = std::fs::remove_file(tmp.as_std_path()) {
        log::debug!("could not remove {tmp}: {err}");
    }
}
