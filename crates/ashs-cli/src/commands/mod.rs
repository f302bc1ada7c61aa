//! CLI command implementations.

use std::path::PathBuf;

use anyhow::Result;

use ashs_sched::{BackendKind, BackendSelector, JobScheduler, SchedulerConfig};

pub mod array;
pub mod detect;
pub mod slots;
pub mod submit;
pub mod wait;

/// Backend and configuration choices carried from the global flags.
pub struct Selection {
    /// Explicit configuration file, if any.
    pub config_path: Option<PathBuf>,
    /// Backend forced by a selector flag; `None` means automatic.
    pub selector: Option<BackendKind>,
}

/// Resolve the configuration and apply the command-line selector, which
/// outranks both the configuration file and the legacy environment
/// booleans.
pub fn load_config(selection: &Selection) -> Result<SchedulerConfig> {
    let mut config = SchedulerConfig::load(selection.config_path.as_deref())?;
    if let Some(kind) = selection.selector {
        config.selector = BackendSelector::Named(kind);
    }
    Ok(config)
}

/// Build the scheduler façade for this invocation.
pub fn create_scheduler(selection: &Selection) -> Result<JobScheduler> {
    let config = load_config(selection)?;
    Ok(JobScheduler::new(config)?)
}
