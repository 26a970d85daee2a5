//! Publish command implementation.
//!
//! Turns a compiled project into its debug and release trees.

use flexpub_core::{
    AbortHandle, ClosureCompiler, Error, PublishCallback, PublishContext, PublishStage, Publisher,
    SessionProject,
};

use crate::args::PublishArgs;
use crate::colors::{self, Tone, paint};

/// Prints one line per stage.
pub struct ProgressCallback;

impl PublishCallback for ProgressCallback {
    fn on_stage_started(&self, stage: PublishStage) {
        print!("{} ... ", paint(Tone::Progress, format!("  ◆ {}", capitalize(stage.label()))));
        colors::flush_stdout();
    }

    fn on_stage_completed(&self, _stage: PublishStage) {
        println!("{}", paint(Tone::Success, "✓"));
    }

    fn on_failed(&self, _stage: PublishStage, _error: &Error) {
        println!("{}", paint(Tone::Failure, "✗"));
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Publish the project named by `args`.
pub fn execute(args: PublishArgs, abort: AbortHandle) -> anyhow::Result<()> {
    let config = args.into_config()?;
    let ctx = PublishContext::resolve(&config)?;

    let session_file = config
        .session
        .clone()
        .unwrap_or_else(|| ctx.default_session_file());
    let project = SessionProject::load(ctx.target_file.clone(), &session_file)?;
    let optimizer = ClosureCompiler::locate(config.optimizer.as_deref())?;

    println!(
        "\n{} - Publishing {}\n",
        paint(Tone::Heading, "flexpub"),
        paint(Tone::Accent, &ctx.project_name)
    );

    let report = Publisher::new(ctx, &project, Box::new(optimizer))
        .with_abort(abort)
        .with_callback(Box::new(ProgressCallback))
        .publish()?;

    println!(
        "\n{} {} ({} modules, {} assets) in {:.2}s",
        paint(Tone::Success, "Published"),
        report.project_name,
        report.module_count,
        report.assets_mirrored,
        report.elapsed.as_secs_f64()
    );
    println!("  {}   {}", paint(Tone::Muted, "debug:"), report.debug_dir.display());
    println!("  {} {}", paint(Tone::Muted, "release:"), report.release_dir.display());

    Ok(())
}
