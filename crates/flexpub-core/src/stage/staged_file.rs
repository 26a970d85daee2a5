//! Copy operations confined to an output root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// One copy from a source file to a destination below a fixed root.
///
/// The destination is built from a root-relative path that has been checked
/// component by component, so a `StagedFile` can never point outside its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    source: PathBuf,
    destination: PathBuf,
}

impl StagedFile {
    /// Stage `source` for copying to `root/relative`.
    ///
    /// # Errors
    /// Returns [`Error::Filesystem`] with [`io::ErrorKind::InvalidInput`] if
    /// `relative` is empty, absolute, or climbs out of `root`.
    pub fn new(source: impl Into<PathBuf>, root: &Path, relative: &Path) -> Result<Self> {
        Ok(Self {
            source: source.into(),
            destination: confine(root, relative)?,
        })
    }

    /// The file being copied.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Where it lands.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Perform the copy, creating parent directories as needed.
    pub fn copy(&self) -> Result<u64> {
        if let Some(parent) = self.destination.parent() {
            fs::create_dir_all(parent).map_err(Error::fs(parent))?;
        }
        tracing::trace!(
            "Copying {} -> {}",
            self.source.display(),
            self.destination.display()
        );
        fs::copy(&self.source, &self.destination).map_err(Error::fs(&self.destination))
    }
}

/// Join `relative` onto `root`, refusing anything that would escape `root`.
pub fn confine(root: &Path, relative: &Path) -> Result<PathBuf> {
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(escapes(root, relative));
            }
        }
    }

    if depth == 0 {
        return Err(escapes(root, relative));
    }
    Ok(joined)
}

fn escapes(root: &Path, relative: &Path) -> Error {
    Error::Filesystem {
        path: root.join(relative),
        source: io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not confined to {}", relative.display(), root.display()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_confine_accepts_nested() {
        let path = confine(Path::new("/out"), Path::new("images/./logo.png")).expect("Should confine");
        assert_eq!(path, PathBuf::from("/out/images/logo.png"));
    }

    #[test]
    fn test_confine_rejects_traversal() {
        assert!(confine(Path::new("/out"), Path::new("../etc/passwd")).is_err());
        assert!(confine(Path::new("/out"), Path::new("images/../../x.png")).is_err());
        assert!(confine(Path::new("/out"), Path::new("/abs.png")).is_err());
        assert!(confine(Path::new("/out"), Path::new("")).is_err());
        assert!(confine(Path::new("/out"), Path::new(".")).is_err());
    }

    #[test]
    fn test_copy_creates_parents() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let source = temp.path().join("logo.png");
        fs::write(&source, [0x89, b'P', b'N', b'G']).expect("Failed to write source");

        let root = temp.path().join("out");
        let staged = StagedFile::new(&source, &root, Path::new("assets/img/logo.png"))
            .expect("Failed to stage");
        assert_eq!(staged.copy().expect("Failed to copy"), 4);
        assert!(root.join("assets/img/logo.png").is_file());
        assert_eq!(staged.source(), source.as_path());
    }
}
