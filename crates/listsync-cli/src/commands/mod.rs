//! CLI subcommands

pub mod batch;
pub mod completions;
pub mod config;
pub mod plan;
pub mod retry;
pub mod sync;

use std::path::PathBuf;

use listsync_core::config::Config;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Global options resolved once in `main`
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub quiet: bool,
    /// Path the configuration was (or would be) loaded from
    pub config_path: PathBuf,
    /// Configuration loaded from `config_path`, defaults if missing
    pub config: Config,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter + Send + Sync> {
        get_formatter(self.format, self.quiet)
    }
}
