//! Symbols declared by the shared library's `deps.js` manifest.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const ADD_DEPENDENCY_CALL: &str = "goog.addDependency";
const DEPS_FILE: &str = "deps.js";

/// Symbol provided by `base.js` itself.
pub const BASE_SYMBOL: &str = "goog";

/// One `goog.addDependency` line of a library manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDependency {
    pub path: String,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
}

/// Parse one manifest line. Returns `None` for anything that is not a
/// well-formed `goog.addDependency(path, [provides], [requires])` call.
pub fn parse_add_dependency(line: &str) -> Option<LibraryDependency> {
    let rest = line.trim_start().strip_prefix(ADD_DEPENDENCY_CALL)?;
    let rest = rest.trim_start().strip_prefix('(')?.trim_start();

    let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    let path = rest[..end].to_string();
    let rest = &rest[end + 1..];

    let (provides, rest) = bracketed_list(rest)?;
    let (requires, _) = bracketed_list(rest)?;

    Some(LibraryDependency {
        path,
        provides,
        requires,
    })
}

/// Take the next `[...]` group in `text` and split it into unquoted items.
fn bracketed_list(text: &str) -> Option<(Vec<String>, &str)> {
    let open = text.find('[')?;
    let close = open + text[open..].find(']')?;
    let items = text[open + 1..close]
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    Some((items, &text[close + 1..]))
}

/// Every symbol the library in `goog_dir` can satisfy: `goog` plus each
/// symbol provided in `goog_dir/deps.js`. A missing manifest only yields `goog`.
pub fn library_symbols(goog_dir: &Path) -> Result<BTreeSet<String>> {
    let mut symbols = BTreeSet::from([BASE_SYMBOL.to_string()]);

    let manifest = goog_dir.join(DEPS_FILE);
    if !manifest.is_file() {
        tracing::warn!(
            "No {} in {}, only '{}' is known from the library",
            DEPS_FILE,
            goog_dir.display(),
            BASE_SYMBOL
        );
        return Ok(symbols);
    }

    let text = fs::read_to_string(&manifest).map_err(Error::fs(&manifest))?;
    for dependency in text.lines().filter_map(parse_add_dependency) {
        symbols.extend(dependency.provides);
    }

    tracing::debug!(
        "Read {} library symbols from {}",
        symbols.len(),
        manifest.display()
    );
    Ok(symbols)
}
