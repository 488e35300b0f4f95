//! Per-user artefact cache.
//!
//! Artefacts live at `<home>/.cache/<tool>/<tool>-<version>`. The presence of
//! a regular file at that path is the whole cache protocol: there is no
//! metadata, no locking, and no eviction. Downloads are written to a `.tmp`
//! sibling first and renamed into place, so a file at the final path is
//! always complete.

use camino::{Utf8Path, Utf8PathBuf};

use crate::dirs::BaseDirs;

/// Suffix of the transient file a download is streamed into.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Errors arising while preparing the cache directory.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The home directory is unknown.
    #[error("failed to get home directory")]
    HomeNotFound,

    /// The home directory cannot be represented as UTF-8.
    #[error("home directory is not valid UTF-8: {path}")]
    NonUtf8Home {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// The cache directory could not be created.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The cache directory for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    root: Utf8PathBuf,
    tool_name: String,
}

impl CacheStore {
    /// Resolves `<home>/.cache/<tool_name>` and creates it if missing.
    ///
    /// Creation is idempotent; an existing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] when the home directory is unknown or not
    /// UTF-8, or when the directory cannot be created.
    pub fn open(dirs: &dyn BaseDirs, tool_name: &str) -> Result<Self, CacheError> {
        let home = dirs.home_dir().ok_or(CacheError::HomeNotFound)?;
        let home = Utf8PathBuf::from_path_buf(home).map_err(|path| CacheError::NonUtf8Home {
            path: path.display().to_string(),
        })?;
        Self::at(home.join(".cache").join(tool_name), tool_name)
    }

    /// Uses `root` as the cache directory, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CreateDir`] if the directory cannot be created.
    pub fn at(root: Utf8PathBuf, tool_name: &str) -> Result<Self, CacheError> {
        std::fs::create_dir_all(root.as_std_path()).map_err(|source| CacheError::CreateDir {
            path: root.clone(),
            source,
        })?;
        log::trace!("cache directory ready at {root}");
        Ok(Self {
            root,
            tool_name: tool_name.to_owned(),
        })
    }

    /// The cache directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the cached artefact for `version`.
    ///
    /// The version is used verbatim, so `1.0` and `1.0.0` are distinct
    /// entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use minimal_shim::cache::CacheStore;
    ///
    /// let temp = tempfile::tempdir()?;
    /// let root = Utf8PathBuf::try_from(temp.path().join("minimal"))?;
    /// let store = CacheStore::at(root.clone(), "minimal")?;
    /// assert_eq!(store.resolve_cache_path("2.3.1"), root.join("minimal-2.3.1"));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn resolve_cache_path(&self, version: &str) -> Utf8PathBuf {
        self.root.join(format!("{}-{version}", self.tool_name))
    }
}

/// Whether a complete artefact is present at `path`.
#[must_use]
pub fn exists(path: &Utf8Path) -> bool {
    path.is_file()
}

/// The transient sibling a download of `dest` is written to.
#[must_use]
pub fn temp_path(dest: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{dest}{TEMP_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirs::MockBaseDirs;
    use rstest::rstest;
    use std::path::PathBuf;

    fn utf8_temp() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, path)
    }

    fn dirs_with_home(home: Option<PathBuf>) -> MockBaseDirs {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().return_once(move || home);
        dirs
    }

    #[test]
    fn open_creates_cache_directory_under_home() {
        let (_temp, home) = utf8_temp();
        let dirs = dirs_with_home(Some(home.clone().into_std_path_buf()));

        let store = CacheStore::open(&dirs, "minimal").expect("cache opens");

        let expected = home.join(".cache").join("minimal");
        assert_eq!(store.root(), expected.as_path());
        assert!(expected.is_dir());
    }

    #[test]
    fn open_is_idempotent() {
        let (_temp, home) = utf8_temp();
        std::fs::create_dir_all(home.join(".cache").join("minimal")).expect("pre-create");
        let dirs = dirs_with_home(Some(home.into_std_path_buf()));

        assert!(CacheStore::open(&dirs, "minimal").is_ok());
    }

    #[test]
    fn open_fails_without_home_directory() {
        let dirs = dirs_with_home(None);
        let err = CacheStore::open(&dirs, "minimal").expect_err("expected failure");
        assert!(matches!(err, CacheError::HomeNotFound));
    }

    #[cfg(unix)]
    #[test]
    fn open_rejects_non_utf8_home() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let home = PathBuf::from(OsString::from_vec(vec![b'/', b't', b'm', b'p', b'/', 0xff]));
        let dirs = dirs_with_home(Some(home));

        let err = CacheStore::open(&dirs, "minimal").expect_err("expected failure");
        assert!(matches!(err, CacheError::NonUtf8Home { .. }), "unexpected error: {err}");
    }

    #[test]
    fn open_fails_when_a_file_blocks_the_directory() {
        let (_temp, home) = utf8_temp();
        std::fs::write(home.join(".cache"), b"not a directory").expect("write blocker");
        let dirs = dirs_with_home(Some(home.into_std_path_buf()));

        let err = CacheStore::open(&dirs, "minimal").expect_err("expected failure");
        assert!(matches!(err, CacheError::CreateDir { .. }), "unexpected error: {err}");
    }

    #[rstest]
    #[case::semver("2.3.1", "minimal-2.3.1")]
    #[case::leading_zero("02.3.1", "minimal-02.3.1")]
    #[case::upper_case("2.3.1-RC1", "minimal-2.3.1-RC1")]
    fn cache_path_concatenates_tool_and_version(#[case] version: &str, #[case] file_name: &str) {
        let (_temp, root) = utf8_temp();
        let store = CacheStore::at(root.clone(), "minimal").expect("cache opens");

        let first = store.resolve_cache_path(version);
        let second = store.resolve_cache_path(version);

        assert_eq!(first, root.join(file_name));
        assert_eq!(first, second);
    }

    #[test]
    fn exists_requires_a_regular_file() {
        let (_temp, root) = utf8_temp();
        let store = CacheStore::at(root, "minimal").expect("cache opens");
        let entry = store.resolve_cache_path("1.0.0");

        assert!(!exists(&entry));
        std::fs::create_dir(&entry).expect("create directory in place of artefact");
        assert!(!exists(&entry));
        std::fs::remove_dir(&entry).expect("remove directory");
        std::fs::write(&entry, b"binary").expect("write artefact");
        assert!(exists(&entry));
    }

    #[test]
    fn temp_path_appends_suffix() {
        let dest = Utf8Path::new("/home/u/.cache/minimal/minimal-2.3.1");
        assert_eq!(
            temp_path(dest),
            Utf8PathBuf::from("/home/u/.cache/minimal/minimal-2.3.1.tmp")
        );
    }
}
