//! Runtime libraries shipped with the toolchain.
//!
//! Two libraries are packaged: the base module loader (`closure`) and the
//! runtime-support library (`support`). Both are extracted once into a cache
//! directory and reused by later publishes.
//!
//! # Architecture
//!
//! ```text
//! lookup path dirs ──┐
//!                    ├──► ResourceLocator::locate ──► materialize ──► <cache>/<name>/…
//! packaged (embed) ──┘                                  │
//!                                                       └── staged in a temp sibling, renamed on success
//! ```

mod container;
mod materialize;

pub use container::{PackagedResources, RESOURCE_PATH_ENV, ResourceContainer, ResourceLocator};
pub use materialize::Materialized;

/// A library packaged with the toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeResource {
    /// Logical root inside the container, also the cache directory name.
    pub name: &'static str,
    /// Path below the logical root that identifies a usable copy.
    pub marker: &'static str,
}

/// Base module loader: `goog/base.js` and its manifest.
pub const CLOSURE_LIBRARY: RuntimeResource = RuntimeResource {
    name: "closure",
    marker: "goog/deps.js",
};

/// Runtime-support library imported by entry modules that need it.
pub const RUNTIME_SUPPORT: RuntimeResource = RuntimeResource {
    name: "support",
    marker: "org/apache/flex/utils/Language.js",
};

/// Symbol provided by [`RUNTIME_SUPPORT`].
pub const RUNTIME_SUPPORT_SYMBOL: &str = "org.apache.flex.utils.Language";
