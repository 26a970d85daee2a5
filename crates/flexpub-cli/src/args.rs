//! Command-line options shared by the publish and deps commands.

use std::path::PathBuf;

use clap::Args;
use flexpub_core::PublishConfig;

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    /// Main source file of the application (e.g. src/App.mxml)
    pub target: PathBuf,

    /// JSON configuration file. Command-line flags take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output override (a path ending in .swf selects the project two levels up)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Redirect all output into this directory and keep its release tree
    #[arg(long)]
    pub redirect: Option<PathBuf>,

    /// Alternate runtime-library root containing closure/goog/base.js
    #[arg(long)]
    pub closure_lib: Option<PathBuf>,

    /// Cache directory for materialized runtime libraries
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Extern file handed to the optimizer (repeatable)
    #[arg(long = "external-js-lib", value_name = "FILE")]
    pub external_js_lib: Vec<PathBuf>,

    /// Fail on optimizer type warnings
    #[arg(long)]
    pub strict_publish: bool,

    /// Extra directory searched for runtime resources (repeatable)
    #[arg(long = "resource-path", value_name = "DIR")]
    pub resource_path: Vec<PathBuf>,

    /// Optimizer program (default: google-closure-compiler on PATH)
    #[arg(long)]
    pub optimizer: Option<PathBuf>,

    /// Compile session descriptor (default: <js-debug>/<project>.session.json)
    #[arg(long)]
    pub session: Option<PathBuf>,
}

impl PublishArgs {
    /// Merge the optional config file with the flags.
    pub fn into_config(self) -> anyhow::Result<PublishConfig> {
        let mut config = match &self.config {
            Some(path) => PublishConfig::load(path)?,
            None => PublishConfig::default(),
        };

        config.target_file = self.target;
        if self.output.is_some() {
            config.output = self.output;
        }
        if self.redirect.is_some() {
            config.redirect = self.redirect;
        }
        if self.closure_lib.is_some() {
            config.closure_lib = self.closure_lib;
        }
        if self.cache_dir.is_some() {
            config.cache_dir = self.cache_dir;
        }
        if !self.external_js_lib.is_empty() {
            config.external_js_lib = self.external_js_lib;
        }
        config.strict_publish |= self.strict_publish;
        if !self.resource_path.is_empty() {
            config.resource_path = self.resource_path;
        }
        if self.optimizer.is_some() {
            config.optimizer = self.optimizer;
        }
        if self.session.is_some() {
            config.session = self.session;
        }

        Ok(config)
    }
}
