//! Dependency graph writer.
//!
//! This module provides:
//! - Scanning of compiled modules for `goog.provide` / `goog.require`
//! - Library symbol discovery from the shared library's `deps.js`
//! - Graph validation and load ordering (cycles tolerated)
//! - The `goog.addDependency` manifest used by the debug harness

mod graph;
mod library;
mod scanner;

pub use graph::{DependencyGraph, ModuleDependencyRecord};
pub use library::{BASE_SYMBOL, LibraryDependency, library_symbols, parse_add_dependency};
pub use scanner::ScannedModule;
pub(crate) use scanner::{REQUIRE_CALL, call_argument};

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::paths::LIBRARY_DIR_NAME;
use crate::stage::walk_error;

/// Every `*.js` file below `debug_dir`, skipping the staged `library/`
/// subtree, sorted by path.
pub fn list_project_files(debug_dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(debug_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == LIBRARY_DIR_NAME));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(debug_dir, e))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "js") {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Scan a single module, recording it at `debug_path` in the debug tree.
pub fn scan_module(file: &Path, debug_path: &Path) -> Result<ScannedModule> {
    ScannedModule::read(file, debug_path)
}

/// Scan `files` (all below `root`), placing each at `debug_prefix/<relative>`.
pub fn scan_tree(root: &Path, files: &[PathBuf], debug_prefix: &Path) -> Result<Vec<ScannedModule>> {
    files
        .par_iter()
        .map(|file| {
            let relative = file.strip_prefix(root).map_err(|_| Error::Filesystem {
                path: file.clone(),
                source: std::io::Error::other(format!("not below {}", root.display())),
            })?;
            scan_module(file, &debug_prefix.join(relative))
        })
        .collect()
}
