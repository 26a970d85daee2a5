//! Post-compilation patches to the entry module.
//!
//! Each transform takes the module text and returns the patched text.
//! [`patch_entry_module`] applies them in order and writes the file once.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::deps::{REQUIRE_CALL, call_argument};
use crate::error::{Error, Result};
use crate::project::CssSession;
use crate::resources::RUNTIME_SUPPORT_SYMBOL;

const PROVIDE_CALL: &str = "goog.provide";

/// Symbols a patch run introduced into the entry module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub added_requires: BTreeSet<String>,
}

/// Keep `project` reachable by its public name after optimization.
///
/// Appended on every run.
pub fn append_export_symbol(text: &str, project: &str) -> String {
    format!(
        "{}\n\n// Ensures the symbol will be visible after compiler renaming.\n\
         goog.exportSymbol('{}', {});\n",
        text, project, project
    )
}

/// Embed the encoded stylesheet as `<project>.prototype.cssData`.
///
/// `goog.require` statements trailing the encoded data are moved in front of
/// the module's first `goog.require`, so imports stay in one block. Without
/// a marker in the module the encoded text is appended as is.
///
/// An empty stylesheet leaves the module untouched, as does a module that
/// already carries a `cssData` assignment from an earlier run.
pub fn inject_css(text: &str, project: &str, encoded: &str) -> String {
    if encoded.trim().is_empty() {
        return text.to_string();
    }

    let assignment = format!("{}.prototype.cssData = [", project);
    if text.contains(&assignment) {
        tracing::debug!("Entry module already embeds its stylesheet");
        return text.to_string();
    }
    let prefix = format!("\n\n{}", assignment);

    let split = encoded.find(REQUIRE_CALL).zip(text.find(REQUIRE_CALL));
    let Some((css_requires_at, marker_at)) = split else {
        return format!("{}{}{}", text, prefix, encoded);
    };

    let data = &encoded[..css_requires_at];
    let data = data.strip_suffix('\n').unwrap_or(data);
    let mut requires = encoded[css_requires_at..].to_string();
    if !requires.ends_with('\n') {
        requires.push('\n');
    }

    format!(
        "{}{}{}{}{}",
        &text[..marker_at],
        requires,
        &text[marker_at..],
        prefix,
        data
    )
}

/// Import the runtime-support library right after the module's last
/// `goog.require` (or last `goog.provide` when it has none).
///
/// Does nothing when the import is already present or no anchor exists.
pub fn inject_runtime_support(text: &str) -> String {
    let statement = support_statement();
    if text.contains(&statement) {
        return text.to_string();
    }

    let anchor = text.rfind(REQUIRE_CALL).or_else(|| text.rfind(PROVIDE_CALL));
    let Some(insert_at) = anchor.and_then(|at| text[at..].find(';').map(|end| at + end + 1)) else {
        tracing::warn!("No goog.require or goog.provide in entry module, support import skipped");
        return text.to_string();
    };

    format!("{}\n{}{}", &text[..insert_at], statement, &text[insert_at..])
}

fn support_statement() -> String {
    format!("{}('{}');", REQUIRE_CALL, RUNTIME_SUPPORT_SYMBOL)
}

/// Symbols required by `goog.require` lines in `text`.
fn required_symbols(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter_map(|line| call_argument(line.trim_start(), REQUIRE_CALL))
        .map(str::to_string)
        .collect()
}

/// Apply every patch to the entry module at `path` and write it back.
///
/// # Errors
/// Returns [`Error::Filesystem`] if the module cannot be read or written.
pub fn patch_entry_module(
    path: &Path,
    project: &str,
    css: &dyn CssSession,
    needs_runtime_support: bool,
) -> Result<PatchOutcome> {
    let original = fs::read_to_string(path).map_err(Error::fs(path))?;
    let before = required_symbols(&original);

    let mut text = append_export_symbol(&original, project);
    text = inject_css(&text, project, &css.encoded_stylesheet());
    if needs_runtime_support {
        text = inject_runtime_support(&text);
    }

    fs::write(path, &text).map_err(Error::fs(path))?;

    let added_requires: BTreeSet<String> = required_symbols(&text)
        .difference(&before)
        .cloned()
        .collect();
    tracing::debug!(
        "Patched {} ({} new requires)",
        path.display(),
        added_requires.len()
    );

    Ok(PatchOutcome { added_requires })
}
