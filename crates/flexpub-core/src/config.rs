//! Typed publish configuration.
//!
//! [`PublishConfig`] is the raw, user-facing configuration: every field the
//! publisher recognises, loadable from a JSON file and overridable from the
//! command line. It is validated exactly once by
//! [`PublishContext::resolve`](crate::PublishContext::resolve).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration recognised by the publisher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct PublishConfig {
    /// Main source file of the application (e.g. `src/App.mxml`).
    pub target_file: PathBuf,

    /// Output path override. When it names a `.swf` file the project
    /// directory two levels up is used, matching `bin-release/app.swf`.
    pub output: Option<PathBuf>,

    /// Redirect every output into this directory and leave file management
    /// (including the release wipe) to its owner.
    pub redirect: Option<PathBuf>,

    /// Alternate runtime-library root containing `closure/goog/base.js`.
    /// When set, the packaged library is not materialized.
    pub closure_lib: Option<PathBuf>,

    /// Cache root for materialized runtime libraries. Defaults to `<output>/bin`.
    pub cache_dir: Option<PathBuf>,

    /// Extern (type-definition) files handed to the optimizer.
    pub external_js_lib: Vec<PathBuf>,

    /// Turn optimizer warnings into errors.
    pub strict_publish: bool,

    /// Extra directories searched for packaged runtime resources.
    pub resource_path: Vec<PathBuf>,

    /// Optimizer program. Looked up on `PATH` when unset.
    pub optimizer: Option<PathBuf>,

    /// Compile session descriptor. Defaults to `<js-debug>/<project>.session.json`.
    pub session: Option<PathBuf>,
}

impl PublishConfig {
    /// Create a configuration for a target file with every other field defaulted.
    pub fn new(target_file: impl Into<PathBuf>) -> Self {
        Self {
            target_file: target_file.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(Error::fs(path))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_kebab_case_fields() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("flexpub.json");
        fs::write(
            &path,
            r#"{
                "target-file": "src/App.mxml",
                "strict-publish": true,
                "external-js-lib": ["externs/jquery.js"]
            }"#,
        )
        .expect("Failed to write config");

        let config = PublishConfig::load(&path).expect("Failed to load config");
        assert_eq!(config.target_file, PathBuf::from("src/App.mxml"));
        assert!(config.strict_publish);
        assert_eq!(config.external_js_lib, vec![PathBuf::from("externs/jquery.js")]);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("flexpub.json");
        fs::write(&path, r#"{ "target-file": "App.mxml", "minify": true }"#)
            .expect("Failed to write config");

        let err = PublishConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
