//! Idempotent, atomic extraction of runtime resources.

use std::fs;
use std::path::Path;

use super::{ResourceLocator, RuntimeResource};
use crate::error::{Error, Result};

/// Outcome of [`ResourceLocator::materialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    /// The destination already existed; nothing was written.
    AlreadyPresent,
    /// The resource was extracted.
    Extracted {
        /// Number of files written.
        files: usize,
    },
}

impl ResourceLocator {
    /// Extract `resource` into `destination` unless it already exists.
    ///
    /// Entries are written into a temporary sibling of `destination` and the
    /// directory is renamed into place only once every entry is on disk, so a
    /// failed extraction never leaves a half-populated cache behind.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The resource is in no container ([`Error::ResourceMaterialization`])
    /// - A directory or file cannot be created or renamed ([`Error::Filesystem`])
    pub fn materialize(&self, resource: &RuntimeResource, destination: &Path) -> Result<Materialized> {
        if destination.exists() {
            tracing::debug!(
                "Resource '{}' already materialized at {}",
                resource.name,
                destination.display()
            );
            return Ok(Materialized::AlreadyPresent);
        }

        let container = self.locate(resource).ok_or_else(|| {
            Error::ResourceMaterialization(format!(
                "resource '{}' not found (searched {} lookup directories{})",
                resource.name,
                self.lookup_path().len(),
                if self.use_packaged() { " and packaged resources" } else { "" }
            ))
        })?;
        let entries = container.entries(resource)?;
        if entries.is_empty() {
            return Err(Error::ResourceMaterialization(format!(
                "resource '{}' is empty in {:?}",
                resource.name, container
            )));
        }

        let parent = destination.parent().ok_or_else(|| {
            Error::ResourceMaterialization(format!(
                "cannot materialize into {}",
                destination.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(Error::fs(parent))?;

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}-staging-", resource.name))
            .tempdir_in(parent)
            .map_err(Error::fs(parent))?;

        for entry in &entries {
            entry.extract_into(staging.path())?;
        }

        let staged = staging.keep();
        if let Err(e) = fs::rename(&staged, destination) {
            let _ = fs::remove_dir_all(&staged);
            return Err(Error::fs(destination)(e));
        }

        tracing::info!(
            "Materialized resource '{}' ({} files) into {}",
            resource.name,
            entries.len(),
            destination.display()
        );
        Ok(Materialized::Extracted {
            files: entries.len(),
        })
    }
}
