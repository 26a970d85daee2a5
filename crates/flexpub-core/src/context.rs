//! Immutable per-run publish context.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PublishConfig;
use crate::error::{Error, Result};
use crate::paths::OutputLayout;

/// Extension of every emitted JavaScript file.
pub const OUTPUT_EXTENSION: &str = "js";

/// Everything a publish needs to know, resolved and validated once.
///
/// Stages borrow it read-only; nothing in the pipeline mutates it.
#[derive(Debug, Clone)]
pub struct PublishContext {
    /// Project name (target file stem). Also the entry module's symbol.
    pub project_name: String,

    /// Main source file of the application.
    pub target_file: PathBuf,

    /// Directory containing the target file; assets are mirrored from here.
    pub source_root: PathBuf,

    /// Output directory structure.
    pub layout: OutputLayout,

    /// Cache root receiving materialized runtime libraries.
    pub cache_root: PathBuf,

    /// Alternate runtime-library root, used verbatim instead of the cache.
    pub closure_lib: Option<PathBuf>,

    /// Extern files handed to the optimizer, in configuration order.
    pub externs: Vec<PathBuf>,

    /// Strict optimizer checks.
    pub strict: bool,

    /// Output is redirected; the release tree is not wiped.
    pub redirected: bool,

    /// Extra directories searched for packaged runtime resources.
    pub resource_path: Vec<PathBuf>,
}

impl PublishContext {
    /// Resolve and validate a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - The target file does not exist or has no usable stem
    /// - The output override names a `.swf` without two parent directories
    /// - The alternate runtime-library root lacks `closure/goog/base.js`
    /// - An extern file does not exist
    pub fn resolve(config: &PublishConfig) -> Result<Self> {
        let target_file = fs::canonicalize(&config.target_file).map_err(|e| {
            Error::Config(format!(
                "target file '{}' cannot be resolved: {}",
                config.target_file.display(),
                e
            ))
        })?;

        let project_name = target_file
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "cannot derive a project name from '{}'",
                    target_file.display()
                ))
            })?
            .to_string();

        let source_root = target_file
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Config("target file has no parent directory".to_string()))?;

        let output_root = Self::output_root(config, &source_root)?;
        let layout = OutputLayout::under(&output_root);
        let cache_root = config
            .cache_dir
            .clone()
            .unwrap_or_else(|| layout.bin_dir.clone());

        if let Some(lib) = &config.closure_lib {
            let base = lib.join("closure").join("goog").join("base.js");
            if !base.is_file() {
                return Err(Error::Config(format!(
                    "closure library root '{}' does not contain closure/goog/base.js",
                    lib.display()
                )));
            }
        }

        for extern_file in &config.external_js_lib {
            if !extern_file.is_file() {
                return Err(Error::Config(format!(
                    "extern file '{}' does not exist",
                    extern_file.display()
                )));
            }
        }

        Ok(Self {
            project_name,
            target_file,
            source_root,
            layout,
            cache_root,
            closure_lib: config.closure_lib.clone(),
            externs: config.external_js_lib.clone(),
            strict: config.strict_publish,
            redirected: config.redirect.is_some(),
            resource_path: config.resource_path.clone(),
        })
    }

    /// Pick the directory that receives `bin/`.
    ///
    /// Redirect wins over the output override, which wins over the default
    /// (the parent of the target file's directory).
    fn output_root(config: &PublishConfig, source_root: &Path) -> Result<PathBuf> {
        if let Some(dir) = &config.redirect {
            return Ok(dir.clone());
        }

        if let Some(output) = &config.output {
            let names_swf = output
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("swf"));
            if !names_swf {
                return Ok(output.clone());
            }
            return output
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "output '{}' has no project directory above it",
                        output.display()
                    ))
                });
        }

        Ok(source_root
            .parent()
            .unwrap_or(source_root)
            .to_path_buf())
    }

    /// File name of the entry module and of the release bundle.
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.project_name, OUTPUT_EXTENSION)
    }

    /// The compiled entry module inside the debug tree.
    pub fn entry_module(&self) -> PathBuf {
        self.layout.debug_dir.join(self.output_file_name())
    }

    /// The optimized bundle inside the release tree.
    pub fn release_bundle(&self) -> PathBuf {
        self.layout.release_dir.join(self.output_file_name())
    }

    /// Root holding `closure/goog`: the alternate root if configured, else the cache.
    pub fn closure_lib_root(&self) -> &Path {
        self.closure_lib.as_deref().unwrap_or(&self.cache_root)
    }

    /// Source directory of the base module loader (`…/closure/goog`).
    pub fn goog_source_dir(&self) -> PathBuf {
        self.closure_lib_root().join("closure").join("goog")
    }

    /// Staged copy of the base module loader inside the debug tree.
    pub fn goog_debug_dir(&self) -> PathBuf {
        self.layout.debug_library_dir().join("closure").join("goog")
    }

    /// Cache directory of the runtime-support library.
    pub fn support_source_dir(&self) -> PathBuf {
        self.cache_root.join("support")
    }

    /// Staged copy of the runtime-support library inside the debug tree.
    pub fn support_debug_dir(&self) -> PathBuf {
        self.layout.debug_library_dir().join("support")
    }

    /// Default location of the compile session descriptor.
    pub fn default_session_file(&self) -> PathBuf {
        self.layout
            .debug_dir
            .join(format!("{}.session.json", self.project_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, PathBuf) {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let src = temp.path().join("src");
        fs::create_dir_all(&src).expect("Failed to create src");
        let target = src.join("App.mxml");
        fs::write(&target, "<App/>").expect("Failed to write target");
        (temp, target)
    }

    #[test]
    fn test_default_output_root_is_project_dir() {
        let (temp, target) = project();
        let ctx = PublishContext::resolve(&PublishConfig::new(&target)).expect("Failed to resolve");

        let root = fs::canonicalize(temp.path()).expect("Failed to canonicalize");
        assert_eq!(ctx.project_name, "App");
        assert_eq!(ctx.layout.debug_dir, root.join("bin/js-debug"));
        assert_eq!(ctx.cache_root, root.join("bin"));
        assert_eq!(ctx.entry_module(), root.join("bin/js-debug/App.js"));
        assert_eq!(ctx.release_bundle(), root.join("bin/js-release/App.js"));
        assert!(!ctx.redirected);
    }

    #[test]
    fn test_swf_output_steps_up_two_levels() {
        let (temp, target) = project();
        let mut config = PublishConfig::new(&target);
        config.output = Some(temp.path().join("proj/bin-release/app.swf"));

        let ctx = PublishContext::resolve(&config).expect("Failed to resolve");
        assert_eq!(ctx.layout.bin_dir, temp.path().join("proj/bin"));
    }

    #[test]
    fn test_redirect_wins() {
        let (temp, target) = project();
        let mut config = PublishConfig::new(&target);
        config.output = Some(temp.path().join("elsewhere"));
        config.redirect = Some(temp.path().join("harness"));

        let ctx = PublishContext::resolve(&config).expect("Failed to resolve");
        assert_eq!(ctx.layout.bin_dir, temp.path().join("harness/bin"));
        assert!(ctx.redirected);
    }

    #[test]
    fn test_missing_target_rejected() {
        let err = PublishContext::resolve(&PublishConfig::new("/nonexistent/App.mxml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_extern_rejected() {
        let (temp, target) = project();
        let mut config = PublishConfig::new(&target);
        config.external_js_lib = vec![temp.path().join("externs/missing.js")];

        let err = PublishContext::resolve(&config).unwrap_err();
        assert!(err.to_string().contains("missing.js"));
    }

    #[test]
    fn test_closure_lib_must_contain_base() {
        let (temp, target) = project();
        let mut config = PublishConfig::new(&target);
        config.closure_lib = Some(temp.path().join("closure-lib"));
        assert!(PublishContext::resolve(&config).is_err());

        let goog = temp.path().join("closure-lib/closure/goog");
        fs::create_dir_all(&goog).expect("Failed to create goog dir");
        fs::write(goog.join("base.js"), "var goog = goog || {};").expect("Failed to write base");

        let ctx = PublishContext::resolve(&config).expect("Failed to resolve");
        assert_eq!(ctx.goog_source_dir(), goog);
    }
}
