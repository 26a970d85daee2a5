//! Output directory management.
//!
//! Provides the fixed directory structure shared by every publish stage:
//!
//! ```text
//! <root>/
//! └── bin/
//!     ├── closure/     # materialized base module loader (cache)
//!     ├── support/     # materialized runtime-support library (cache)
//!     ├── js-debug/    # individual modules + manifest harness
//!     │   └── library/ # staged copies of the runtime libraries
//!     └── js-release/  # single optimized bundle
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the directory holding both output trees.
pub const OUTPUT_DIR_NAME: &str = "bin";
/// Name of the debug tree below [`OUTPUT_DIR_NAME`].
pub const DEBUG_DIR_NAME: &str = "js-debug";
/// Name of the release tree below [`OUTPUT_DIR_NAME`].
pub const RELEASE_DIR_NAME: &str = "js-release";
/// Directory inside the debug tree receiving the runtime libraries.
pub const LIBRARY_DIR_NAME: &str = "library";

/// Directory structure of one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// The `bin` directory.
    pub bin_dir: PathBuf,

    /// Debug tree. Overwritten file by file, never wiped.
    pub debug_dir: PathBuf,

    /// Release tree. Disposable: wiped at the start of every publish.
    pub release_dir: PathBuf,
}

impl OutputLayout {
    /// Build the layout below an output root (the directory containing `bin`).
    ///
    /// Does not touch the filesystem.
    pub fn under(output_root: &Path) -> Self {
        let bin_dir = output_root.join(OUTPUT_DIR_NAME);
        Self {
            debug_dir: bin_dir.join(DEBUG_DIR_NAME),
            release_dir: bin_dir.join(RELEASE_DIR_NAME),
            bin_dir,
        }
    }

    /// Directory inside the debug tree receiving the runtime libraries.
    pub fn debug_library_dir(&self) -> PathBuf {
        self.debug_dir.join(LIBRARY_DIR_NAME)
    }

    /// Create both trees for a new publish.
    ///
    /// The debug tree is created if missing. The release tree is deleted and
    /// recreated when `wipe_release` is set, otherwise only created.
    ///
    /// # Errors
    /// Returns [`Error::Filesystem`] if a directory cannot be removed or created.
    pub fn prepare(&self, wipe_release: bool) -> Result<()> {
        fs::create_dir_all(&self.debug_dir).map_err(Error::fs(&self.debug_dir))?;

        if wipe_release && self.release_dir.exists() {
            tracing::debug!("Wiping release tree {}", self.release_dir.display());
            fs::remove_dir_all(&self.release_dir).map_err(Error::fs(&self.release_dir))?;
        }
        fs::create_dir_all(&self.release_dir).map_err(Error::fs(&self.release_dir))?;

        Ok(())
    }
}
