//! Whole-directory staging of the runtime libraries.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{StagedFile, copy_all};
use crate::error::{Error, Result};

/// Copy the whole library at `source_dir` into `dest_dir`.
///
/// Existing files are overwritten; files already in `dest_dir` but absent
/// from the source are left alone. Returns the staged destinations, sorted.
pub fn stage_library(source_dir: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::new();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(source_dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| walk_error_msg(entry.path(), "entry outside library root"))?;
        staged.push(StagedFile::new(entry.path(), dest_dir, relative)?);
    }

    let bytes = copy_all(&staged)?;
    tracing::debug!(
        "Staged {} library files ({} bytes) from {} into {}",
        staged.len(),
        bytes,
        source_dir.display(),
        dest_dir.display()
    );

    Ok(staged
        .into_iter()
        .map(|file| file.destination().to_path_buf())
        .collect())
}

/// Every `*.js` file below `dir`, sorted by path.
pub fn list_js_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "js") {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    Error::Filesystem { path, source }
}

fn walk_error_msg(path: &Path, msg: &str) -> Error {
    Error::Filesystem {
        path: path.to_path_buf(),
        source: std::io::Error::other(msg.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_stage_library_copies_everything() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let src = temp.path().join("goog");
        fs::create_dir_all(src.join("string")).expect("Failed to create dirs");
        fs::write(src.join("base.js"), "var goog = {};").expect("Failed to write base");
        fs::write(src.join("deps.js"), "").expect("Failed to write deps");
        fs::write(src.join("string/string.js"), "goog.provide('goog.string');")
            .expect("Failed to write string");
        fs::write(src.join("README"), "docs").expect("Failed to write readme");

        let dest = temp.path().join("out/library/closure/goog");
        let staged = stage_library(&src, &dest).expect("Failed to stage");

        assert_eq!(staged.len(), 4);
        assert!(dest.join("string/string.js").is_file());
        assert!(dest.join("README").is_file());
    }

    #[test]
    fn test_list_js_files_sorted() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp.path().join("b")).expect("Failed to create dir");
        fs::write(temp.path().join("b/z.js"), "").expect("write");
        fs::write(temp.path().join("a.js"), "").expect("write");
        fs::write(temp.path().join("a.css"), "").expect("write");

        let files = list_js_files(temp.path()).expect("Failed to list");
        assert_eq!(files, vec![temp.path().join("a.js"), temp.path().join("b/z.js")]);
    }

    #[test]
    fn test_missing_library_dir_is_error() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let err = stage_library(&temp.path().join("nope"), &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}
