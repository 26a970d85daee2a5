//! Optimizer input collection.

use std::path::PathBuf;

use crate::context::PublishContext;
use crate::deps::DependencyGraph;
use crate::error::Result;
use crate::stage::list_js_files;

const BASE_FILE: &str = "base.js";

/// Everything the optimizer needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerJob {
    /// Sources, in the order they are passed.
    pub inputs: Vec<PathBuf>,
    /// Type definitions, not emitted.
    pub externs: Vec<PathBuf>,
    /// The release bundle.
    pub output: PathBuf,
    pub strict: bool,
    /// Symbol the bundle is built around (the project name).
    pub entry_point: String,
}

impl OptimizerJob {
    /// Collect the inputs from the staged debug tree.
    ///
    /// Order: `goog/base.js`, the rest of the shared library sorted by path,
    /// the support library when staged, then the project modules in load order.
    pub fn collect(ctx: &PublishContext, graph: &DependencyGraph, support_staged: bool) -> Result<Self> {
        let goog_dir = ctx.goog_debug_dir();
        let base = goog_dir.join(BASE_FILE);

        let mut inputs = vec![base.clone()];
        inputs.extend(list_js_files(&goog_dir)?.into_iter().filter(|f| *f != base));

        if support_staged {
            inputs.extend(list_js_files(&ctx.support_debug_dir())?);
        }

        inputs.extend(graph.project_modules().into_iter().map(|m| m.file.clone()));

        Ok(Self {
            inputs,
            externs: ctx.externs.clone(),
            output: ctx.release_bundle(),
            strict: ctx.strict,
            entry_point: ctx.project_name.clone(),
        })
    }
}
