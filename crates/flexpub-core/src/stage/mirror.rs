//! Asset mirroring from the project source tree into the output trees.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::library::walk_error;
use super::{StagedFile, confine, copy_all};
use crate::error::{Error, Result};

/// File extensions treated as assets. Everything else is source code the
/// compiler has already handled.
pub const ASSET_EXTENSIONS: &[&str] = &["png", "gif", "jpg", "json"];

/// What a mirror run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    /// Directories recreated per destination root.
    pub directories: usize,
    /// Asset files copied per destination root.
    pub files: usize,
}

/// Whether `path` has one of the [`ASSET_EXTENSIONS`] (case-sensitive).
pub fn is_asset(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext))
}

/// Mirror every directory and every asset below `source_root` into each of
/// `dest_roots`, preserving relative paths.
///
/// Subtrees that are a destination root or one of `skip_roots` (the `bin`
/// directory, the library cache) are not walked, so output nested inside the
/// sources is never mirrored into itself.
///
/// # Errors
/// Returns [`Error::Filesystem`] if the source cannot be walked or a
/// destination cannot be written.
pub fn mirror(
    source_root: &Path,
    dest_roots: &[PathBuf],
    skip_roots: &[PathBuf],
) -> Result<MirrorSummary> {
    let mut directories = Vec::new();
    let mut assets = Vec::new();

    let walker = WalkDir::new(source_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let path = entry.path();
            !dest_roots.iter().chain(skip_roots).any(|root| path == root)
        });

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(source_root, e))?;
        let relative = entry
            .path()
            .strip_prefix(source_root)
            .map(Path::to_path_buf)
            .map_err(|_| Error::Filesystem {
                path: entry.path().to_path_buf(),
                source: std::io::Error::other("entry outside source root"),
            })?;

        if entry.file_type().is_dir() {
            directories.push(relative);
        } else if entry.file_type().is_file() && is_asset(entry.path()) {
            assets.push((entry.into_path(), relative));
        } else {
            tracing::trace!("Not an asset: {}", entry.path().display());
        }
    }

    let mut staged = Vec::with_capacity(assets.len() * dest_roots.len());
    for root in dest_roots {
        for dir in &directories {
            let target = confine(root, dir)?;
            fs::create_dir_all(&target).map_err(Error::fs(&target))?;
        }
        for (source, relative) in &assets {
            staged.push(StagedFile::new(source, root, relative)?);
        }
    }

    copy_all(&staged)?;
    tracing::debug!(
        "Mirrored {} assets and {} directories from {} into {} trees",
        assets.len(),
        directories.len(),
        source_root.display(),
        dest_roots.len()
    );

    Ok(MirrorSummary {
        directories: directories.len(),
        files: assets.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(path, b"data").expect("Failed to write file");
    }

    #[test]
    fn test_is_asset() {
        assert!(is_asset(Path::new("logo.png")));
        assert!(is_asset(Path::new("data/config.json")));
        assert!(!is_asset(Path::new("App.mxml")));
        assert!(!is_asset(Path::new("Main.as")));
        assert!(!is_asset(Path::new("LOGO.PNG")));
        assert!(!is_asset(Path::new("jpg")));
    }

    #[test]
    fn test_mirror_only_copies_allowed_extensions() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let src = temp.path().join("src");
        touch(&src.join("App.mxml"));
        touch(&src.join("logo.png"));
        touch(&src.join("img/icon.gif"));
        touch(&src.join("img/photo.jpg"));
        touch(&src.join("img/photo.jpeg"));
        touch(&src.join("data/strings.json"));
        touch(&src.join("com/example/Main.as"));
        touch(&src.join("styles.css"));

        let debug = temp.path().join("bin/js-debug");
        let release = temp.path().join("bin/js-release");
        let summary = mirror(&src, &[debug.clone(), release.clone()], &[]).expect("Failed to mirror");

        assert_eq!(summary.files, 4);
        for root in [&debug, &release] {
            assert!(root.join("logo.png").is_file());
            assert!(root.join("img/icon.gif").is_file());
            assert!(root.join("img/photo.jpg").is_file());
            assert!(root.join("data/strings.json").is_file());
            assert!(!root.join("img/photo.jpeg").exists());
            assert!(!root.join("App.mxml").exists());
            assert!(!root.join("com/example/Main.as").exists());
            assert!(!root.join("styles.css").exists());
            // Directories are mirrored even when they hold no assets.
            assert!(root.join("com/example").is_dir());
        }
    }

    #[test]
    fn test_mirror_skips_nested_output() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let src = temp.path().to_path_buf();
        touch(&src.join("logo.png"));
        let debug = src.join("bin/js-debug");
        touch(&debug.join("previous.png"));

        mirror(&src, std::slice::from_ref(&debug), &[]).expect("Failed to mirror");
        assert!(debug.join("logo.png").is_file());
        assert!(!debug.join("bin/js-debug").exists());
    }

    #[test]
    fn test_mirror_skips_output_and_cache_inside_sources() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let src = temp.path().to_path_buf();
        touch(&src.join("img/logo.png"));
        let bin = src.join("bin");
        touch(&bin.join("closure/goog/deps.js"));
        touch(&bin.join("support/org/apache/flex/utils/Language.js"));
        touch(&bin.join("closure/goog/images/icon.png"));
        let debug = bin.join("js-debug");
        let release = bin.join("js-release");

        let summary = mirror(
            &src,
            &[debug.clone(), release.clone()],
            std::slice::from_ref(&bin),
        )
        .expect("Failed to mirror");

        assert_eq!(summary.files, 1);
        for root in [&debug, &release] {
            assert!(root.join("img/logo.png").is_file());
            assert!(!root.join("bin").exists());
            assert!(!root.join("closure").exists());
            assert!(!root.join("support").exists());
        }
    }

    #[test]
    fn test_mirror_missing_source_fails() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let err = mirror(&temp.path().join("missing"), &[temp.path().join("out")], &[]).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}
