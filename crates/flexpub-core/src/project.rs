//! Boundary to the upstream compiler.
//!
//! The publisher never generates code. It consumes what the compiler left
//! behind: compiled modules in the debug tree, a flag saying whether the
//! runtime-support library is needed, and a CSS compilation session.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::PublishContext;
use crate::deps;
use crate::error::{Error, Result};

/// Stylesheet side of a compilation.
pub trait CssSession {
    /// Stylesheet encoded as the body of a JS array literal, optionally
    /// followed by `goog.require` statements for classes the styles reference.
    fn encoded_stylesheet(&self) -> String;

    /// Plain CSS written next to each harness.
    fn emit_stylesheet(&self) -> String;
}

/// A compiled project ready to publish.
pub trait CompiledProject {
    /// Main source file the project was compiled from.
    fn target_file(&self) -> &Path;

    /// Compiled module files. Defaults to every module in the debug tree.
    fn module_files(&self, ctx: &PublishContext) -> Result<Vec<PathBuf>> {
        deps::list_project_files(&ctx.layout.debug_dir)
    }

    /// Whether the entry module must import the runtime-support library.
    fn needs_runtime_support(&self) -> bool;

    /// CSS compilation session.
    fn css_session(&self) -> &dyn CssSession;
}

/// Session descriptor written by the compiler next to its output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionDescriptor {
    /// Whether the entry module needs the runtime-support import.
    pub needs_runtime_support: bool,

    /// Encoded stylesheet (see [`CssSession::encoded_stylesheet`]).
    pub encoded_css: String,

    /// Emitted plain CSS.
    pub css: String,
}

impl CssSession for SessionDescriptor {
    fn encoded_stylesheet(&self) -> String {
        self.encoded_css.clone()
    }

    fn emit_stylesheet(&self) -> String {
        self.css.clone()
    }
}

/// [`CompiledProject`] backed by a [`SessionDescriptor`].
#[derive(Debug, Clone)]
pub struct SessionProject {
    target_file: PathBuf,
    session: SessionDescriptor,
}

impl SessionProject {
    /// Create a project from an in-memory descriptor.
    pub fn new(target_file: impl Into<PathBuf>, session: SessionDescriptor) -> Self {
        Self {
            target_file: target_file.into(),
            session,
        }
    }

    /// Load the descriptor from `session_file`.
    ///
    /// A missing descriptor means the compiler produced no stylesheet and no
    /// support requirement.
    ///
    /// # Errors
    /// Returns [`Error::Filesystem`] if the file exists but cannot be read, or
    /// [`Error::Config`] if it is not a valid descriptor.
    pub fn load(target_file: impl Into<PathBuf>, session_file: &Path) -> Result<Self> {
        let session = if session_file.exists() {
            let text = fs::read_to_string(session_file).map_err(Error::fs(session_file))?;
            serde_json::from_str(&text).map_err(|e| {
                Error::Config(format!(
                    "invalid session descriptor {}: {}",
                    session_file.display(),
                    e
                ))
            })?
        } else {
            tracing::debug!(
                "No session descriptor at {}, assuming empty stylesheet",
                session_file.display()
            );
            SessionDescriptor::default()
        };

        Ok(Self::new(target_file, session))
    }

    /// The loaded descriptor.
    pub fn session(&self) -> &SessionDescriptor {
        &self.session
    }
}

impl CompiledProject for SessionProject {
    fn target_file(&self) -> &Path {
        &self.target_file
    }

    fn needs_runtime_support(&self) -> bool {
        self.session.needs_runtime_support
    }

    fn css_session(&self) -> &dyn CssSession {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_descriptor_defaults() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let project = SessionProject::load("App.mxml", &temp.path().join("App.session.json"))
            .expect("Failed to load");

        assert!(!project.needs_runtime_support());
        assert!(project.css_session().encoded_stylesheet().is_empty());
    }

    #[test]
    fn test_load_descriptor() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("App.session.json");
        fs::write(
            &path,
            r#"{ "needs-runtime-support": true, "encoded-css": "0,1];", "css": "body {}" }"#,
        )
        .expect("Failed to write descriptor");

        let project = SessionProject::load("App.mxml", &path).expect("Failed to load");
        assert!(project.needs_runtime_support());
        assert_eq!(project.css_session().encoded_stylesheet(), "0,1];");
        assert_eq!(project.css_session().emit_stylesheet(), "body {}");
        assert_eq!(project.target_file(), Path::new("App.mxml"));
    }

    #[test]
    fn test_invalid_descriptor() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("App.session.json");
        fs::write(&path, "not json").expect("Failed to write descriptor");

        assert!(matches!(
            SessionProject::load("App.mxml", &path),
            Err(Error::Config(_))
        ));
    }
}
