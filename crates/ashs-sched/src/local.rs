//! Sequential local adapter; the terminal detection fallback.
//!
//! Submissions execute inline and have already finished by the time a handle
//! is returned, so every handle is the `0` sentinel and `wait` is a no-op.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::SchedResult;
use crate::exec::{self, SubmitRequest};

/// Configuration for the local adapter.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Shell used to run job scripts.
    pub shell: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("bash"),
        }
    }
}

/// Adapter running jobs synchronously in the driver process.
#[derive(Debug, Default)]
pub struct LocalAdapter {
    config: LocalConfig,
}

impl LocalAdapter {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    /// Run the script to completion, returning its exit code. Logs land in
    /// a PID-stamped file like the parallel adapter's.
    pub(crate) async fn run(&self, req: &SubmitRequest<'_>) -> SchedResult<i32> {
        let mut argv: Vec<OsString> = vec![self.config.shell.clone().into(), req.script.into()];
        argv.extend(req.args.iter().map(OsString::from));

        let mut cmd = exec::stamped_command(req.log_dir, &req.job_name, argv);
        cmd.current_dir(req.work_dir);

        let code = exec::run_blocking(cmd, "sh").await?;
        if code != 0 {
            tracing::warn!("local job {} exited with code {code}", req.job_name);
        }
        Ok(code)
    }
}
