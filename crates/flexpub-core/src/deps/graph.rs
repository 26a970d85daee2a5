//! Module dependency graph and manifest generation.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use super::ScannedModule;
use crate::error::{Error, Result};
use crate::paths::LIBRARY_DIR_NAME;

/// Location of `base.js` inside the debug tree. Manifest paths are relative to it.
const BASE_DIR: [&str; 3] = [LIBRARY_DIR_NAME, "closure", "goog"];

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDependencyRecord {
    /// Module location inside the debug tree.
    pub path: PathBuf,
    /// `path` as seen from `library/closure/goog/base.js`.
    pub manifest_path: String,
    pub provides: BTreeSet<String>,
    pub requires: BTreeSet<String>,
    /// The rendered `goog.addDependency` line, without newline.
    pub line: String,
    /// Position in the manifest.
    pub ordinal: usize,
}

/// Dependency graph over the project (and staged support) modules.
///
/// Edges go from the module providing a symbol to the module requiring it.
/// Requires satisfied by the shared library add no edge.
pub struct DependencyGraph {
    modules: Vec<ScannedModule>,
    graph: DiGraph<usize, ()>,
    node_indices: Vec<NodeIndex>,
    /// Provided symbol to providing module index
    providers: FxHashMap<String, usize>,
    library_symbols: BTreeSet<String>,
}

impl DependencyGraph {
    /// Build and validate the graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyResolution`] if a module provides nothing,
    /// two modules (or a module and the library) provide the same symbol, or
    /// a require resolves to no provider.
    pub fn build(modules: Vec<ScannedModule>, library_symbols: BTreeSet<String>) -> Result<Self> {
        let mut providers: FxHashMap<String, usize> = FxHashMap::default();

        for (index, module) in modules.iter().enumerate() {
            if module.provides.is_empty() {
                return Err(Error::dependency(
                    [module.display_name()],
                    "module declares no goog.provide",
                ));
            }
            for symbol in &module.provides {
                if library_symbols.contains(symbol) {
                    return Err(Error::dependency(
                        [module.display_name(), "shared library".to_string()],
                        format!("symbol '{}' is provided more than once", symbol),
                    ));
                }
                if let Some(&existing) = providers.get(symbol) {
                    return Err(Error::dependency(
                        [modules[existing].display_name(), module.display_name()],
                        format!("symbol '{}' is provided more than once", symbol),
                    ));
                }
                providers.insert(symbol.clone(), index);
            }
        }

        let mut graph = DiGraph::new();
        let node_indices: Vec<NodeIndex> = (0..modules.len()).map(|i| graph.add_node(i)).collect();

        let mut engine = Self {
            modules,
            graph,
            node_indices,
            providers,
            library_symbols,
        };

        let mut unresolved = Vec::new();
        let mut edges = Vec::new();
        for (index, module) in engine.modules.iter().enumerate() {
            for symbol in &module.requires {
                match engine.resolve(symbol) {
                    Resolution::Module(provider) => edges.push((provider, index)),
                    Resolution::Library => {}
                    Resolution::Missing => unresolved.push((index, symbol.clone())),
                }
            }
        }

        if !unresolved.is_empty() {
            return Err(engine.unresolved_error(&unresolved));
        }

        for (provider, requirer) in edges {
            engine.add_edge(provider, requirer);
        }

        tracing::debug!(
            "Built dependency graph: {} modules, {} edges",
            engine.modules.len(),
            engine.graph.edge_count()
        );
        Ok(engine)
    }

    /// Record requires introduced after the graph was built.
    ///
    /// Symbols the module already requires or provides are ignored.
    pub fn add_requires<I, S>(&mut self, debug_path: &Path, symbols: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self
            .modules
            .iter()
            .position(|m| m.debug_path == debug_path)
            .ok_or_else(|| {
                Error::dependency(
                    [debug_path.to_string_lossy().replace('\\', "/")],
                    "module is not part of the dependency graph",
                )
            })?;

        let mut unresolved = Vec::new();
        for symbol in symbols {
            let symbol = symbol.into();
            let module = &self.modules[index];
            if module.provides.contains(&symbol) || module.requires.contains(&symbol) {
                continue;
            }
            match self.resolve(&symbol) {
                Resolution::Module(provider) => self.add_edge(provider, index),
                Resolution::Library => {}
                Resolution::Missing => {
                    unresolved.push((index, symbol));
                    continue;
                }
            }
            tracing::debug!("{} now requires '{}'", self.modules[index].display_name(), symbol);
            self.modules[index].requires.insert(symbol);
        }

        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(self.unresolved_error(&unresolved))
        }
    }

    /// Modules with every provider ahead of its requirers.
    ///
    /// Cycles are left for the loader to resolve: each strongly connected
    /// component is emitted as a block, its members sorted by path.
    pub fn ordered_modules(&self) -> Vec<&ScannedModule> {
        // kosaraju_scc yields components in reverse topological order.
        let mut components = kosaraju_scc(&self.graph);
        components.reverse();

        let mut ordered = Vec::with_capacity(self.modules.len());
        for component in components {
            let mut members: Vec<&ScannedModule> = component
                .into_iter()
                .map(|node| &self.modules[self.graph[node]])
                .collect();
            members.sort_by(|a, b| a.debug_path.cmp(&b.debug_path));
            ordered.extend(members);
        }
        ordered
    }

    /// Manifest records, one per module, in load order.
    pub fn compute_manifest(&self) -> Vec<ModuleDependencyRecord> {
        self.ordered_modules()
            .into_iter()
            .enumerate()
            .map(|(ordinal, module)| {
                let manifest_path = manifest_path(&module.debug_path);
                let line = format!(
                    "goog.addDependency('{}', [{}], [{}]);",
                    manifest_path,
                    quoted_list(&module.provides),
                    quoted_list(&module.requires)
                );
                ModuleDependencyRecord {
                    path: module.debug_path.clone(),
                    manifest_path,
                    provides: module.provides.clone(),
                    requires: module.requires.clone(),
                    line,
                    ordinal,
                }
            })
            .collect()
    }

    /// The manifest text, one newline-terminated line per module.
    pub fn manifest(&self) -> String {
        self.compute_manifest()
            .into_iter()
            .map(|record| record.line + "\n")
            .collect()
    }

    /// `<inject_html>` contents in module order, first occurrence kept.
    pub fn extra_head_tags(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut tags = Vec::new();
        for module in self.ordered_modules() {
            for tag in &module.inject_html {
                if seen.insert(tag.as_str()) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    /// Modules outside the staged `library/` subtree, in load order.
    pub fn project_modules(&self) -> Vec<&ScannedModule> {
        self.ordered_modules()
            .into_iter()
            .filter(|m| !m.debug_path.starts_with(LIBRARY_DIR_NAME))
            .collect()
    }

    /// Look up a module by its debug-tree path.
    pub fn module(&self, debug_path: &Path) -> Option<&ScannedModule> {
        self.modules.iter().find(|m| m.debug_path == debug_path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn resolve(&self, symbol: &str) -> Resolution {
        if let Some(&provider) = self.providers.get(symbol) {
            Resolution::Module(provider)
        } else if self.library_symbols.contains(symbol) {
            Resolution::Library
        } else {
            Resolution::Missing
        }
    }

    fn add_edge(&mut self, provider: usize, requirer: usize) {
        if provider != requirer {
            self.graph
                .update_edge(self.node_indices[provider], self.node_indices[requirer], ());
        }
    }

    fn unresolved_error(&self, unresolved: &[(usize, String)]) -> Error {
        let mut names: Vec<String> = unresolved
            .iter()
            .map(|(index, _)| self.modules[*index].display_name())
            .collect();
        names.dedup();

        let detail: Vec<String> = unresolved
            .iter()
            .map(|(index, symbol)| format!("{} requires '{}'", self.modules[*index].display_name(), symbol))
            .collect();

        Error::dependency(names, format!("unresolved requires: {}", detail.join("; ")))
    }
}

enum Resolution {
    Module(usize),
    Library,
    Missing,
}

/// `debug_path` relative to the directory holding `base.js`, with forward slashes.
fn manifest_path(debug_path: &Path) -> String {
    let components: Vec<String> = debug_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    // The last component is the file itself and never matches a base directory.
    let shared = BASE_DIR
        .iter()
        .zip(&components[..components.len().saturating_sub(1)])
        .take_while(|(base, part)| **base == part.as_str())
        .count();

    let mut parts: Vec<&str> = vec![".."; BASE_DIR.len() - shared];
    parts.extend(components[shared..].iter().map(String::as_str));
    parts.join("/")
}

fn quoted_list(symbols: &BTreeSet<String>) -> String {
    symbols
        .iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}
