//! LSF adapter.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{SchedError, SchedResult};
use crate::exec::{self, SubmitRequest};
use crate::lsf::parser;

/// Configuration for the LSF adapter.
#[derive(Debug, Clone)]
pub struct LsfConfig {
    /// Path to `bsub`.
    pub bsub: PathBuf,
    /// Deadline for a single submission command.
    pub submit_timeout: Duration,
}

impl Default for LsfConfig {
    fn default() -> Self {
        Self {
            bsub: PathBuf::from("bsub"),
            submit_timeout: Duration::from_secs(60),
        }
    }
}

/// Adapter for the LSF workload manager.
#[derive(Debug, Default)]
pub struct LsfAdapter {
    config: LsfConfig,
}

impl LsfAdapter {
    pub fn new(config: LsfConfig) -> Self {
        Self { config }
    }

    /// Submit a job asynchronously, returning the cluster job number.
    pub(crate) async fn submit(&self, req: &SubmitRequest<'_>) -> SchedResult<String> {
        let mut cmd = Command::new(&self.config.bsub);
        self.submission_args(&mut cmd, req);

        let output = exec::capture(cmd, "bsub", self.config.submit_timeout).await?;
        if !output.status.success() {
            return Err(SchedError::Submit {
                command: "bsub".to_string(),
                message: format!("exited with {}", output.status),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        parser::parse_bsub_id(&String::from_utf8_lossy(&output.stdout))
    }

    /// Submit a job and block until it terminates; `-K` makes bsub's exit
    /// status reflect the job's.
    pub(crate) async fn submit_sync(&self, req: &SubmitRequest<'_>) -> SchedResult<i32> {
        let mut cmd = Command::new(&self.config.bsub);
        cmd.arg("-K");
        self.submission_args(&mut cmd, req);
        exec::run_blocking(cmd, "bsub").await
    }

    /// Block until every job in `ids` is terminal, via a synchronous
    /// sentinel job with an `ended(..)` dependency on the whole set.
    ///
    /// The sentinel's own output and exit status are discarded; it exists
    /// only as a dependency-triggered barrier.
    pub(crate) async fn wait(&self, sentinel_name: &str, ids: &[&str]) -> SchedResult<()> {
        let predicate = ids
            .iter()
            .map(|id| format!("ended({id})"))
            .collect::<Vec<_>>()
            .join(" && ");

        let mut cmd = Command::new(&self.config.bsub);
        cmd.arg("-K")
            .args(["-w", &predicate])
            .args(["-o", "/dev/null", "-e", "/dev/null"])
            .arg("-J")
            .arg(sentinel_name)
            .arg("/bin/true");

        let status = cmd.status().await.map_err(|e| SchedError::Command {
            command: "bsub".to_string(),
            message: e.to_string(),
        })?;
        if !status.success() {
            tracing::debug!("LSF wait sentinel exited with {status}");
        }
        Ok(())
    }

    /// Common tail of the submission command line. LSF forwards the
    /// submission environment on its own; `%J` stamps log files with the
    /// job number.
    fn submission_args(&self, cmd: &mut Command, req: &SubmitRequest<'_>) {
        cmd.current_dir(req.work_dir)
            .args(req.opts)
            .arg("-J")
            .arg(&req.job_name)
            .arg("-o")
            .arg(req.log_dir.join(format!("{}_%J.out", req.job_name)))
            .arg("-e")
            .arg(req.log_dir.join(format!("{}_%J.err", req.job_name)))
            .arg(req.script)
            .args(&req.args);
    }
}

/// Slot count exported to a process running inside an LSF job.
pub(crate) fn slots_from_env() -> Option<u32> {
    std::env::var("LSB_MAX_NUM_PROCESSORS")
        .ok()
        .and_then(|v| v.parse().ok())
}

/// Whether the current process runs inside an LSF job.
pub(crate) fn in_managed_job() -> bool {
    std::env::var_os("LSB_JOBID").is_some()
}
