//! Optimizer invocation.
//!
//! The optimizer itself is an external program. This module collects its
//! inputs ([`OptimizerJob`]), runs it behind the [`Optimizer`] trait and
//! finishes the bundle with a source-map reference.

mod closure;
mod job;

pub use closure::{ClosureCompiler, OPTIMIZER_PROGRAMS, source_map_path};
pub use job::OptimizerJob;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::abort::AbortHandle;
use crate::error::{Error, Result};

/// Produces the release bundle from an [`OptimizerJob`].
///
/// Implementations block until the bundle is written, and must return
/// [`Error::Aborted`] promptly once `abort` fires.
pub trait Optimizer: Send + Sync {
    fn optimize(&self, job: &OptimizerJob, abort: &AbortHandle) -> Result<()>;
}

/// Append the source-map reference for `project` to `bundle`.
pub fn append_source_map(bundle: &Path, project: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(bundle)
        .map_err(Error::fs(bundle))?;
    write!(file, "\n//# sourceMappingURL=./{}.js.map\n", project).map_err(Error::fs(bundle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_append_source_map() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let bundle = temp.path().join("App.js");
        fs::write(&bundle, "var a=1;").expect("Failed to write bundle");

        append_source_map(&bundle, "App").expect("Failed to append");

        assert_eq!(
            fs::read_to_string(&bundle).expect("Failed to read"),
            "var a=1;\n//# sourceMappingURL=./App.js.map\n"
        );
    }

    #[test]
    fn test_append_source_map_requires_bundle() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let err = append_source_map(&temp.path().join("App.js"), "App").unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}
