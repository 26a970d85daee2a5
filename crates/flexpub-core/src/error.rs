//! Error types for flexpub-core.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for flexpub-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while publishing.
///
/// Every variant is fatal to the publish run: stages never retry and the
/// orchestrator surfaces the first error unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Directory creation, copy, read, write or rename failed.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A packaged runtime resource is missing or unreadable.
    #[error("resource materialization failed: {0}")]
    ResourceMaterialization(String),

    /// Duplicate provides or unresolved requires in the module graph.
    #[error("dependency resolution failed ({}): {message}", modules.join(", "))]
    DependencyResolution {
        modules: Vec<String>,
        message: String,
    },

    /// The external optimizer failed. Diagnostics are passed through verbatim.
    #[error("optimization failed:\n{0}")]
    Optimization(String),

    /// Invalid configuration detected while resolving the publish context.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The publish was cancelled.
    #[error("publish aborted")]
    Aborted,
}

impl Error {
    /// Returns a closure mapping an [`io::Error`] to [`Error::Filesystem`] for `path`.
    ///
    /// Meant for `map_err`: `fs::write(&p, data).map_err(Error::fs(&p))?`.
    pub fn fs(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> Error {
        let path = path.as_ref().to_path_buf();
        move |source| Error::Filesystem { path, source }
    }

    /// Build a dependency resolution error.
    pub(crate) fn dependency(
        modules: impl IntoIterator<Item = impl Into<String>>,
        message: impl Into<String>,
    ) -> Self {
        Error::DependencyResolution {
            modules: modules.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// A short recovery hint for the user, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Filesystem { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
                Some("check write permissions on the output directory")
            }
            Error::Filesystem { .. } => None,
            Error::ResourceMaterialization(_) => {
                Some("pass --closure-lib or add a resource directory to FLEXPUB_RESOURCE_PATH")
            }
            Error::DependencyResolution { .. } => {
                Some("recompile the project; every goog.require needs a matching goog.provide")
            }
            Error::Optimization(_) => Some("rerun without --strict-publish to relax optimizer checks"),
            Error::Config(_) => None,
            Error::Aborted => None,
        }
    }

    /// Render the error followed by its hint, if any.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{}\n  hint: {}", self, hint),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_helper_keeps_path() {
        let err = Error::fs("/tmp/out")(io::Error::new(io::ErrorKind::NotFound, "gone"));
        match err {
            Error::Filesystem { path, .. } => assert_eq!(path, PathBuf::from("/tmp/out")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dependency_error_names_modules() {
        let err = Error::dependency(["a/A.js", "b/A.js"], "symbol 'A' provided twice");
        let msg = err.to_string();
        assert!(msg.contains("a/A.js, b/A.js"));
        assert!(msg.contains("provided twice"));
    }

    #[test]
    fn test_with_hint() {
        let err = Error::ResourceMaterialization("closure".to_string());
        assert!(err.with_hint().contains("hint:"));
        assert_eq!(Error::Aborted.with_hint(), "publish aborted");
    }
}
