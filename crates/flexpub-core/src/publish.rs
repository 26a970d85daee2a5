//! Publish orchestration.
//!
//! A publish runs a fixed sequence of stages. Each stage either completes or
//! fails the run; nothing is retried and nothing is rolled back.
//!
//! ```text
//! Init → StagingRuntime → ComputingDependencies → PatchingSources
//!      → AssemblingDebug → Optimizing → AssemblingRelease → Done
//!                  (any stage) ──► Failed
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::abort::AbortHandle;
use crate::context::PublishContext;
use crate::deps::{self, DependencyGraph};
use crate::error::{Error, Result};
use crate::optimize::{Optimizer, OptimizerJob, append_source_map};
use crate::patch::patch_entry_module;
use crate::paths::LIBRARY_DIR_NAME;
use crate::project::CompiledProject;
use crate::resources::{CLOSURE_LIBRARY, RUNTIME_SUPPORT, ResourceLocator};
use crate::stage::{self, HarnessMode, MirrorSummary};

/// Stage of a publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishStage {
    Init,
    StagingRuntime,
    ComputingDependencies,
    PatchingSources,
    AssemblingDebug,
    Optimizing,
    AssemblingRelease,
    Done,
    Failed,
}

impl PublishStage {
    /// Short human-readable description.
    pub fn label(&self) -> &'static str {
        match self {
            PublishStage::Init => "preparing output directories",
            PublishStage::StagingRuntime => "staging runtime libraries",
            PublishStage::ComputingDependencies => "computing dependencies",
            PublishStage::PatchingSources => "patching entry module",
            PublishStage::AssemblingDebug => "assembling debug tree",
            PublishStage::Optimizing => "optimizing",
            PublishStage::AssemblingRelease => "assembling release tree",
            PublishStage::Done => "done",
            PublishStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Callback trait for publish progress reporting.
pub trait PublishCallback: Send + Sync {
    /// Called when a stage starts.
    fn on_stage_started(&self, stage: PublishStage);

    /// Called when a stage completes.
    fn on_stage_completed(&self, stage: PublishStage);

    /// Called when a stage fails. The run stops afterwards.
    fn on_failed(&self, _stage: PublishStage, _error: &Error) {}
}

/// Summary of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub project_name: String,
    pub debug_dir: PathBuf,
    pub release_dir: PathBuf,
    /// The optimized bundle.
    pub bundle: PathBuf,
    /// Project modules in the manifest (staged libraries excluded).
    pub module_count: usize,
    /// Asset files copied into each tree.
    pub assets_mirrored: usize,
    /// Runtime-library files copied into the debug tree.
    pub library_files: usize,
    pub support_staged: bool,
    pub elapsed: Duration,
}

/// Drives one publish of a compiled project.
pub struct Publisher<'a> {
    ctx: PublishContext,
    project: &'a dyn CompiledProject,
    optimizer: Box<dyn Optimizer>,
    locator: ResourceLocator,
    abort: AbortHandle,
    callback: Option<Box<dyn PublishCallback>>,
    stage: PublishStage,
    failed_at: Option<PublishStage>,
}

impl<'a> Publisher<'a> {
    /// Create a publisher. Runtime resources are looked up on the context's
    /// resource path, then in the packaged copy.
    pub fn new(
        ctx: PublishContext,
        project: &'a dyn CompiledProject,
        optimizer: Box<dyn Optimizer>,
    ) -> Self {
        let locator = ResourceLocator::from_env(&ctx.resource_path);
        Self {
            ctx,
            project,
            optimizer,
            locator,
            abort: AbortHandle::new(),
            callback: None,
            stage: PublishStage::Init,
            failed_at: None,
        }
    }

    pub fn with_locator(mut self, locator: ResourceLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Share an abort handle with the caller.
    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn with_callback(mut self, callback: Box<dyn PublishCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn context(&self) -> &PublishContext {
        &self.ctx
    }

    /// Current stage.
    pub fn stage(&self) -> PublishStage {
        self.stage
    }

    /// The stage that failed, if the run failed.
    pub fn failed_at(&self) -> Option<PublishStage> {
        self.failed_at
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns the first stage error unchanged. Files written by earlier
    /// stages are left in place.
    pub fn publish(&mut self) -> Result<PublishReport> {
        let started = Instant::now();
        tracing::info!("Publishing '{}'", self.ctx.project_name);

        self.enter(PublishStage::Init, |p| p.init())?;
        let support_staged = self.enter(PublishStage::StagingRuntime, |p| {
            stage_runtime(&p.ctx, p.project, &p.locator)
        })?;
        let mut graph = self.enter(PublishStage::ComputingDependencies, |p| {
            compute_dependencies(&p.ctx, p.project, support_staged)
        })?;
        self.enter(PublishStage::PatchingSources, |p| p.patch_sources(&mut graph))?;
        let (library_files, assets) = self.enter(PublishStage::AssemblingDebug, |p| {
            p.assemble_debug(&graph, support_staged)
        })?;
        let bundle = self.enter(PublishStage::Optimizing, |p| p.optimize(&graph, support_staged))?;
        self.enter(PublishStage::AssemblingRelease, |p| p.assemble_release(&graph))?;

        self.stage = PublishStage::Done;
        let report = PublishReport {
            project_name: self.ctx.project_name.clone(),
            debug_dir: self.ctx.layout.debug_dir.clone(),
            release_dir: self.ctx.layout.release_dir.clone(),
            bundle,
            module_count: graph.project_modules().len(),
            assets_mirrored: assets.files,
            library_files,
            support_staged,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Published '{}' in {:.2?}",
            report.project_name,
            report.elapsed
        );
        Ok(report)
    }

    fn enter<T>(
        &mut self,
        stage: PublishStage,
        run: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        let result = self.abort.check().and_then(|()| {
            self.stage = stage;
            tracing::info!("Stage: {}", stage);
            if let Some(callback) = &self.callback {
                callback.on_stage_started(stage);
            }
            run(self)
        });

        match result {
            Ok(value) => {
                if let Some(callback) = &self.callback {
                    callback.on_stage_completed(stage);
                }
                Ok(value)
            }
            Err(e) => {
                tracing::debug!("Stage '{}' failed: {}", stage, e);
                self.stage = PublishStage::Failed;
                self.failed_at = Some(stage);
                if let Some(callback) = &self.callback {
                    callback.on_failed(stage, &e);
                }
                Err(e)
            }
        }
    }

    fn init(&self) -> Result<()> {
        let wipe_release = !self.ctx.redirected;
        if !wipe_release {
            tracing::debug!("Output is redirected, release tree kept");
        }
        self.ctx.layout.prepare(wipe_release)
    }

    fn patch_sources(&self, graph: &mut DependencyGraph) -> Result<()> {
        let outcome = patch_entry_module(
            &self.ctx.entry_module(),
            &self.ctx.project_name,
            self.project.css_session(),
            self.project.needs_runtime_support(),
        )?;
        let entry = PathBuf::from(self.ctx.output_file_name());
        graph.add_requires(&entry, outcome.added_requires)
    }

    fn assemble_debug(
        &self,
        graph: &DependencyGraph,
        support_staged: bool,
    ) -> Result<(usize, MirrorSummary)> {
        let mut library_files =
            stage::stage_library(&self.ctx.goog_source_dir(), &self.ctx.goog_debug_dir())?.len();
        if support_staged {
            library_files +=
                stage::stage_library(&self.ctx.support_source_dir(), &self.ctx.support_debug_dir())?
                    .len();
        }

        let layout = &self.ctx.layout;
        let assets = stage::mirror(
            &self.ctx.source_root,
            &[layout.debug_dir.clone(), layout.release_dir.clone()],
            &[layout.bin_dir.clone(), self.ctx.cache_root.clone()],
        )?;

        stage::write_harness(
            HarnessMode::Debug,
            &self.ctx.project_name,
            &layout.debug_dir,
            &graph.manifest(),
            &graph.extra_head_tags(),
        )?;
        stage::write_css(
            &self.ctx.project_name,
            &layout.debug_dir,
            &self.project.css_session().emit_stylesheet(),
        )?;

        Ok((library_files, assets))
    }

    fn optimize(&self, graph: &DependencyGraph, support_staged: bool) -> Result<PathBuf> {
        let job = OptimizerJob::collect(&self.ctx, graph, support_staged)?;
        self.optimizer.optimize(&job, &self.abort)?;
        append_source_map(&job.output, &self.ctx.project_name)?;
        Ok(job.output)
    }

    fn assemble_release(&self, graph: &DependencyGraph) -> Result<()> {
        let layout = &self.ctx.layout;
        stage::write_harness(
            HarnessMode::Release,
            &self.ctx.project_name,
            &layout.release_dir,
            "",
            &graph.extra_head_tags(),
        )?;
        stage::write_css(
            &self.ctx.project_name,
            &layout.release_dir,
            &self.project.css_session().emit_stylesheet(),
        )?;
        Ok(())
    }
}

/// Materialize the runtime libraries the project needs and build its
/// dependency graph, without writing either output tree.
///
/// The graph reflects the modules as compiled, before the entry module is patched.
pub fn dependency_graph(
    ctx: &PublishContext,
    project: &dyn CompiledProject,
    locator: &ResourceLocator,
) -> Result<DependencyGraph> {
    let support_staged = stage_runtime(ctx, project, locator)?;
    compute_dependencies(ctx, project, support_staged)
}

/// Returns whether the support library is needed (and now cached).
fn stage_runtime(
    ctx: &PublishContext,
    project: &dyn CompiledProject,
    locator: &ResourceLocator,
) -> Result<bool> {
    match &ctx.closure_lib {
        Some(root) => tracing::debug!("Using runtime libraries from {}", root.display()),
        None => {
            let destination = ctx.cache_root.join(CLOSURE_LIBRARY.name);
            locator.materialize(&CLOSURE_LIBRARY, &destination)?;
        }
    }

    if !project.needs_runtime_support() {
        return Ok(false);
    }
    locator.materialize(&RUNTIME_SUPPORT, &ctx.support_source_dir())?;
    Ok(true)
}

fn compute_dependencies(
    ctx: &PublishContext,
    project: &dyn CompiledProject,
    support_staged: bool,
) -> Result<DependencyGraph> {
    let files = project.module_files(ctx)?;
    let mut modules = deps::scan_tree(&ctx.layout.debug_dir, &files, Path::new(""))?;

    if support_staged {
        let support_dir = ctx.support_source_dir();
        let support_files = stage::list_js_files(&support_dir)?;
        let prefix = Path::new(LIBRARY_DIR_NAME).join(RUNTIME_SUPPORT.name);
        modules.extend(deps::scan_tree(&support_dir, &support_files, &prefix)?);
    }

    let symbols = deps::library_symbols(&ctx.goog_source_dir())?;
    DependencyGraph::build(modules, symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(PublishStage::Optimizing.to_string(), "optimizing");
        assert_eq!(PublishStage::Init.label(), "preparing output directories");
    }
}
