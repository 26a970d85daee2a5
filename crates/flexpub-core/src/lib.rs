//! Core engine for the flexpub JavaScript publisher.
//!
//! This crate provides:
//! - Runtime library materialization (packaged base loader and support library)
//! - Module dependency graph and `goog.addDependency` manifest generation
//! - Entry-module patching (exported symbol, embedded CSS, support import)
//! - Debug and release tree assembly, including asset mirroring
//! - External optimizer invocation with cancellation
//! - The publish orchestrator tying the stages together

pub mod abort;
pub mod config;
pub mod context;
pub mod deps;
pub mod error;
pub mod optimize;
pub mod patch;
pub mod paths;
pub mod project;
pub mod publish;
pub mod resources;
pub mod stage;

pub use abort::AbortHandle;
pub use config::PublishConfig;
pub use context::PublishContext;
pub use deps::{DependencyGraph, ModuleDependencyRecord, ScannedModule};
pub use error::{Error, Result};
pub use optimize::{ClosureCompiler, Optimizer, OptimizerJob};
pub use patch::PatchOutcome;
pub use paths::OutputLayout;
pub use project::{CompiledProject, CssSession, SessionDescriptor, SessionProject};
pub use publish::{PublishCallback, PublishReport, PublishStage, Publisher, dependency_graph};
pub use resources::{Materialized, ResourceLocator, RuntimeResource};
pub use stage::{HarnessMode, StagedFile};
