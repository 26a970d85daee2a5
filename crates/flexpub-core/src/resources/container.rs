//! Containers holding packaged runtime resources.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_embed::Embed;
use walkdir::WalkDir;

use super::RuntimeResource;
use crate::error::{Error, Result};
use crate::stage::confine;

/// Environment variable listing extra resource directories (platform path-list syntax).
pub const RESOURCE_PATH_ENV: &str = "FLEXPUB_RESOURCE_PATH";

/// Resources compiled into the toolchain.
#[derive(Embed)]
#[folder = "resources/"]
pub struct PackagedResources;

/// Where a resource was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContainer {
    /// A loose directory on the lookup path holding `<name>/…`.
    Directory(PathBuf),
    /// The resources compiled into the toolchain.
    Packaged,
}

/// One file of a resource, relative to the resource's logical root.
pub(crate) struct ResourceEntry {
    pub(crate) relative: PathBuf,
    source: EntrySource,
}

enum EntrySource {
    File(PathBuf),
    Packaged(String),
}

impl ResourceContainer {
    /// List every file below the resource's logical root.
    pub(crate) fn entries(&self, resource: &RuntimeResource) -> Result<Vec<ResourceEntry>> {
        match self {
            ResourceContainer::Directory(dir) => {
                let root = dir.join(resource.name);
                let mut entries = Vec::new();
                for entry in WalkDir::new(&root).sort_by_file_name() {
                    let entry = entry.map_err(|e| {
                        Error::ResourceMaterialization(format!(
                            "cannot read resource '{}' in {}: {}",
                            resource.name,
                            dir.display(),
                            e
                        ))
                    })?;
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let relative = entry
                        .path()
                        .strip_prefix(&root)
                        .map(Path::to_path_buf)
                        .map_err(|_| {
                            Error::ResourceMaterialization(format!(
                                "resource entry {} outside {}",
                                entry.path().display(),
                                root.display()
                            ))
                        })?;
                    entries.push(ResourceEntry {
                        relative,
                        source: EntrySource::File(entry.into_path()),
                    });
                }
                Ok(entries)
            }
            ResourceContainer::Packaged => {
                let prefix = format!("{}/", resource.name);
                let mut entries: Vec<ResourceEntry> = PackagedResources::iter()
                    .filter_map(|path| {
                        let relative = path.strip_prefix(&prefix)?.to_string();
                        Some(ResourceEntry {
                            relative: PathBuf::from(relative),
                            source: EntrySource::Packaged(path.into_owned()),
                        })
                    })
                    .collect();
                entries.sort_by(|a, b| a.relative.cmp(&b.relative));
                Ok(entries)
            }
        }
    }
}

impl ResourceEntry {
    /// Write this entry below `dest_root`.
    pub(crate) fn extract_into(&self, dest_root: &Path) -> Result<()> {
        let target = confine(dest_root, &self.relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(Error::fs(parent))?;
        }

        match &self.source {
            EntrySource::File(source) => {
                fs::copy(source, &target).map_err(Error::fs(&target))?;
            }
            EntrySource::Packaged(path) => {
                let file = PackagedResources::get(path).ok_or_else(|| {
                    Error::ResourceMaterialization(format!("packaged entry '{}' vanished", path))
                })?;
                fs::write(&target, file.data.as_ref()).map_err(Error::fs(&target))?;
            }
        }
        Ok(())
    }
}

/// Finds runtime resources: lookup-path directories first, then the
/// packaged copy.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    lookup_path: Vec<PathBuf>,
    use_packaged: bool,
}

impl ResourceLocator {
    /// Create a locator searching `lookup_path` before the packaged resources.
    pub fn new(lookup_path: Vec<PathBuf>) -> Self {
        Self {
            lookup_path,
            use_packaged: true,
        }
    }

    /// Create a locator from configured directories plus [`RESOURCE_PATH_ENV`].
    pub fn from_env(configured: &[PathBuf]) -> Self {
        let mut lookup_path = configured.to_vec();
        if let Some(value) = env::var_os(RESOURCE_PATH_ENV) {
            lookup_path.extend(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
        Self::new(lookup_path)
    }

    /// Stop falling back to the packaged resources.
    pub fn without_packaged(mut self) -> Self {
        self.use_packaged = false;
        self
    }

    /// Directories searched, in order.
    pub fn lookup_path(&self) -> &[PathBuf] {
        &self.lookup_path
    }

    pub(crate) fn use_packaged(&self) -> bool {
        self.use_packaged
    }

    /// Find the first container holding `resource`.
    pub fn locate(&self, resource: &RuntimeResource) -> Option<ResourceContainer> {
        let found = self.lookup_path.iter().find(|dir| {
            dir.join(resource.name).join(resource.marker).is_file()
        });
        if let Some(dir) = found {
            return Some(ResourceContainer::Directory(dir.clone()));
        }

        let packaged_marker = format!("{}/{}", resource.name, resource.marker);
        if self.use_packaged && PackagedResources::get(&packaged_marker).is_some() {
            return Some(ResourceContainer::Packaged);
        }

        None
    }
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
