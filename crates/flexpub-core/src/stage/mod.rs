//! Staging of the debug and release trees.
//!
//! This module provides:
//! - Confined copy operations ([`StagedFile`])
//! - Asset mirroring from the source tree into both output trees
//! - Whole-directory library staging
//! - HTML harness and stylesheet emission
//!
//! Copies inside one stage are independent and run on the rayon pool; they
//! only ever write disjoint destination paths.

mod harness;
mod library;
mod mirror;
mod staged_file;

pub use harness::{HarnessMode, render_harness, write_css, write_harness};
pub(crate) use library::walk_error;
pub use library::{list_js_files, stage_library};
pub use mirror::{ASSET_EXTENSIONS, MirrorSummary, is_asset, mirror};
pub use staged_file::{StagedFile, confine};

use rayon::prelude::*;

use crate::error::Result;

/// Copy every staged file, in parallel. Returns the number of bytes copied.
///
/// The first failure is returned; copies already running are allowed to finish.
pub fn copy_all(files: &[StagedFile]) -> Result<u64> {
    files
        .par_iter()
        .map(StagedFile::copy)
        .try_reduce(|| 0, |a, b| Ok(a + b))
}
