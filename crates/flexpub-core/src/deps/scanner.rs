//! Extraction of module declarations from compiled JavaScript.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub(crate) const PROVIDE_CALL: &str = "goog.provide";
pub(crate) const REQUIRE_CALL: &str = "goog.require";
const INJECT_HTML_OPEN: &str = "<inject_html>";
const INJECT_HTML_CLOSE: &str = "</inject_html>";

/// Declarations found in one compiled module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedModule {
    /// File the declarations were read from.
    pub file: PathBuf,
    /// Location of the module inside the debug tree, relative to its root.
    pub debug_path: PathBuf,
    /// Symbols declared with `goog.provide`.
    pub provides: BTreeSet<String>,
    /// Symbols declared with `goog.require`.
    pub requires: BTreeSet<String>,
    /// Lines found between `<inject_html>` markers, without comment decoration.
    pub inject_html: Vec<String>,
}

impl ScannedModule {
    /// Read and scan `file`, recording it at `debug_path` in the debug tree.
    pub fn read(file: &Path, debug_path: &Path) -> Result<Self> {
        let source = fs::read_to_string(file).map_err(Error::fs(file))?;
        Ok(Self::scan(&source, file, debug_path))
    }

    /// Scan module source text.
    pub fn scan(source: &str, file: &Path, debug_path: &Path) -> Self {
        let mut provides = BTreeSet::new();
        let mut requires = BTreeSet::new();
        let mut inject_html = Vec::new();
        let mut in_inject = false;

        for line in source.lines() {
            if line.contains(INJECT_HTML_OPEN) {
                in_inject = true;
                continue;
            }
            if line.contains(INJECT_HTML_CLOSE) {
                in_inject = false;
                continue;
            }
            if in_inject {
                let tag = line.trim().trim_start_matches('*').trim();
                if !tag.is_empty() {
                    inject_html.push(tag.to_string());
                }
                continue;
            }

            let statement = line.trim_start();
            if let Some(symbol) = call_argument(statement, PROVIDE_CALL) {
                provides.insert(symbol.to_string());
            } else if let Some(symbol) = call_argument(statement, REQUIRE_CALL) {
                requires.insert(symbol.to_string());
            }
        }

        // A module never depends on itself.
        for symbol in &provides {
            requires.remove(symbol);
        }

        Self {
            file: file.to_path_buf(),
            debug_path: debug_path.to_path_buf(),
            provides,
            requires,
            inject_html,
        }
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        self.debug_path.to_string_lossy().replace('\\', "/")
    }
}

/// The quoted string argument of `call(...)` at the start of `statement`.
pub(crate) fn call_argument<'a>(statement: &'a str, call: &str) -> Option<&'a str> {
    let rest = statement.strip_prefix(call)?.trim_start();
    let rest = rest.strip_prefix('(')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    let symbol = &rest[..end];
    (!symbol.is_empty()).then_some(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> ScannedModule {
        ScannedModule::scan(source, Path::new("/debug/App.js"), Path::new("App.js"))
    }

    #[test]
    fn test_call_argument() {
        assert_eq!(call_argument("goog.provide('App');", PROVIDE_CALL), Some("App"));
        assert_eq!(call_argument("goog.require(\"a.B\")", REQUIRE_CALL), Some("a.B"));
        assert_eq!(call_argument("goog.require( 'x.Y' );", REQUIRE_CALL), Some("x.Y"));
        assert_eq!(call_argument("goog.require(name);", REQUIRE_CALL), None);
        assert_eq!(call_argument("goog.require('');", REQUIRE_CALL), None);
        assert_eq!(call_argument("goog.requireType('a');", REQUIRE_CALL), None);
    }

    #[test]
    fn test_scan_module() {
        let module = scan(
            "/**\n * @fileoverview App\n */\n\ngoog.provide('App');\n\n\
             goog.require('com.example.Model');\ngoog.require('goog.string');\n\n\
             App = function() {};\n",
        );

        assert_eq!(module.provides, BTreeSet::from(["App".to_string()]));
        assert_eq!(
            module.requires,
            BTreeSet::from(["com.example.Model".to_string(), "goog.string".to_string()])
        );
        assert_eq!(module.display_name(), "App.js");
    }

    #[test]
    fn test_self_require_dropped() {
        let module = scan("goog.provide('A');\ngoog.require('A');\n");
        assert!(module.requires.is_empty());
    }

    #[test]
    fn test_inject_html() {
        let module = scan(
            "/**\n * <inject_html>\n * \n \
             <script src=\"https://cdn.example.com/chart.js\"></script>\n \
             * </inject_html>\n */\ngoog.provide('Chart');\n",
        );

        assert_eq!(
            module.inject_html,
            vec!["<script src=\"https://cdn.example.com/chart.js\"></script>".to_string()]
        );
        assert!(module.provides.contains("Chart"));
    }

    #[test]
    fn test_commented_calls_ignored() {
        let module = scan("// goog.require('Old');\ngoog.provide('A');\n");
        assert!(module.requires.is_empty());
    }
}
