//! Deps command implementation.

use flexpub_core::{PublishContext, ResourceLocator, SessionProject};

use crate::args::PublishArgs;
use crate::colors::{Tone, paint};

/// Print the `goog.addDependency` manifest for the project, one line per module.
///
/// Runtime libraries are materialized into the cache as needed; neither
/// output tree is written.
pub fn execute(args: PublishArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    let ctx = PublishContext::resolve(&config)?;

    let session_file = config
        .session
        .clone()
        .unwrap_or_else(|| ctx.default_session_file());
    let project = SessionProject::load(ctx.target_file.clone(), &session_file)?;

    let locator = ResourceLocator::from_env(&ctx.resource_path);
    let graph = flexpub_core::dependency_graph(&ctx, &project, &locator)?;

    for record in graph.compute_manifest() {
        println!("{}", record.line);
    }

    let extra = graph.extra_head_tags();
    if !extra.is_empty() {
        eprintln!("{}", paint(Tone::Muted, "extra head tags:"));
        for tag in extra {
            eprintln!("  {tag}");
        }
    }

    Ok(())
}
