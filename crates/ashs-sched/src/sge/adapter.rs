//! SGE adapter.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{SchedError, SchedResult};
use crate::exec::{self, SubmitRequest};
use crate::sge::parser;

/// Configuration for the SGE adapter.
#[derive(Debug, Clone)]
pub struct SgeConfig {
    /// Path to `qsub`.
    pub qsub: PathBuf,
    /// Deadline for a single submission command.
    pub submit_timeout: Duration,
}

impl Default for SgeConfig {
    fn default() -> Self {
        Self {
            qsub: PathBuf::from("qsub"),
            submit_timeout: Duration::from_secs(60),
        }
    }
}

/// Adapter for the SGE workload manager.
#[derive(Debug, Default)]
pub struct SgeAdapter {
    config: SgeConfig,
}

impl SgeAdapter {
    pub fn new(config: SgeConfig) -> Self {
        Self { config }
    }

    /// Submit a job asynchronously, returning the cluster job number.
    pub(crate) async fn submit(&self, req: &SubmitRequest<'_>) -> SchedResult<String> {
        let mut cmd = Command::new(&self.config.qsub);
        self.submission_args(&mut cmd, req);

        let output = exec::capture(cmd, "qsub", self.config.submit_timeout).await?;
        if !output.status.success() {
            return Err(SchedError::Submit {
                command: "qsub".to_string(),
                message: format!("exited with {}", output.status),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        parser::parse_qsub_id(&String::from_utf8_lossy(&output.stdout))
    }

    /// Submit a job and block until it terminates; `-sync y` makes qsub's
    /// exit status reflect the job's.
    pub(crate) async fn submit_sync(&self, req: &SubmitRequest<'_>) -> SchedResult<i32> {
        let mut cmd = Command::new(&self.config.qsub);
        cmd.args(["-sync", "y"]);
        self.submission_args(&mut cmd, req);
        exec::run_blocking(cmd, "qsub").await
    }

    /// Block until every job in `ids` is terminal, via a synchronous
    /// sentinel job holding on the whole set.
    ///
    /// The sentinel's own output and exit status are discarded; it exists
    /// only as a dependency-triggered barrier.
    pub(crate) async fn wait(&self, sentinel_name: &str, ids: &[&str]) -> SchedResult<()> {
        let mut cmd = Command::new(&self.config.qsub);
        cmd.args(["-sync", "y", "-b", "y"])
            .args(["-o", "/dev/null", "-e", "/dev/null"])
            .arg("-N")
            .arg(sentinel_name)
            .arg("-hold_jid")
            .arg(ids.join(","))
            .arg("/bin/true");

        let status = cmd.status().await.map_err(|e| SchedError::Command {
            command: "qsub".to_string(),
            message: e.to_string(),
        })?;
        if !status.success() {
            tracing::debug!("SGE wait sentinel exited with {status}");
        }
        Ok(())
    }

    /// Common tail of the submission command line. `-cwd` starts the job in
    /// the submission directory and `-V` forwards the driver environment;
    /// SGE names its own log files under the given directories.
    fn submission_args(&self, cmd: &mut Command, req: &SubmitRequest<'_>) {
        cmd.current_dir(req.work_dir)
            .args(req.opts)
            .arg("-N")
            .arg(&req.job_name)
            .arg("-cwd")
            .arg("-V")
            .arg("-o")
            .arg(req.log_dir)
            .arg("-e")
            .arg(req.log_dir)
            .arg(req.script)
            .args(&req.args);
    }
}

/// Slot count exported to a process running inside an SGE job.
pub(crate) fn slots_from_env() -> Option<u32> {
    std::env::var("NSLOTS").ok().and_then(|v| v.parse().ok())
}

/// Whether the current process runs inside an SGE job.
pub(crate) fn in_managed_job() -> bool {
    std::env::var_os("JOB_ID").is_some()
}
