//! Home directory resolution.
//!
//! Wraps `directories-next` behind a trait so cache layout logic can be tested
//! against arbitrary home directories.

use std::path::PathBuf;

/// Resolves platform base directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The current user's home directory, if it can be determined.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Base directories of the running user.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn system_base_dirs_follow_home_variable() {
        let temp = tempfile::tempdir().expect("temp dir");
        let home = temp.path().to_path_buf();
        let resolved = temp_env::with_var("HOME", Some(&home), || SystemBaseDirs.home_dir());
        assert_eq!(resolved, Some(home));
    }
}
