//! SLURM adapter.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{SchedError, SchedResult};
use crate::exec::{self, SubmitRequest};
use crate::slurm::parser;

/// SLURM job state, as reported by the accounting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlurmState {
    Pending,
    Running,
    Completing,
    Configuring,
    Suspended,
    Completed,
    Failed,
    Cancelled,
    Timeout,
    NodeFail,
    Preempted,
    OutOfMemory,
    Unknown(String),
}

impl SlurmState {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SlurmState::Completed
                | SlurmState::Failed
                | SlurmState::Cancelled
                | SlurmState::Timeout
                | SlurmState::NodeFail
                | SlurmState::Preempted
                | SlurmState::OutOfMemory
        )
    }

    /// Check if this represents a successful completion.
    pub fn is_success(&self) -> bool {
        matches!(self, SlurmState::Completed)
    }
}

/// Configuration for the SLURM adapter.
#[derive(Debug, Clone)]
pub struct SlurmConfig {
    /// Path to `sbatch`.
    pub sbatch: PathBuf,
    /// Path to `squeue`.
    pub squeue: PathBuf,
    /// Path to `sacct`.
    pub sacct: PathBuf,
    /// Interval between accounting polls while waiting.
    pub poll_interval: Duration,
    /// Grace period before the final accounting re-check for a job that is
    /// visible in neither accounting nor the live queue.
    pub requeue_grace: Duration,
    /// Deadline for a single submission command.
    pub submit_timeout: Duration,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            sbatch: PathBuf::from("sbatch"),
            squeue: PathBuf::from("squeue"),
            sacct: PathBuf::from("sacct"),
            poll_interval: Duration::from_secs(10),
            requeue_grace: Duration::from_secs(5),
            submit_timeout: Duration::from_secs(60),
        }
    }
}

/// Adapter for the SLURM workload manager.
#[derive(Debug, Default)]
pub struct SlurmAdapter {
    config: SlurmConfig,
}

impl SlurmAdapter {
    pub fn new(config: SlurmConfig) -> Self {
        Self { config }
    }

    /// Submit a job asynchronously, returning the cluster job number.
    pub(crate) async fn submit(&self, req: &SubmitRequest<'_>) -> SchedResult<String> {
        let mut cmd = Command::new(&self.config.sbatch);
        cmd.arg("--parsable");
        self.submission_args(&mut cmd, req);

        let output = exec::capture(cmd, "sbatch", self.config.submit_timeout).await?;
        if !output.status.success() {
            return Err(SchedError::Submit {
                command: "sbatch".to_string(),
                message: format!("exited with {}", output.status),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        parser::parse_sbatch_id(&String::from_utf8_lossy(&output.stdout))
    }

    /// Submit a job and block until it terminates; `--wait` makes sbatch's
    /// exit status reflect the job's.
    pub(crate) async fn submit_sync(&self, req: &SubmitRequest<'_>) -> SchedResult<i32> {
        let mut cmd = Command::new(&self.config.sbatch);
        cmd.arg("--parsable").arg("--wait");
        self.submission_args(&mut cmd, req);

        let output = cmd.output().await.map_err(|e| SchedError::Command {
            command: "sbatch".to_string(),
            message: e.to_string(),
        })?;
        Ok(output.status.code().unwrap_or(-1))
    }

    /// Block until every job in `ids` has reached a terminal state.
    ///
    /// Per-job failure states are logged, not propagated; the barrier always
    /// covers the whole set.
    pub(crate) async fn wait(&self, ids: &[&str]) -> SchedResult<()> {
        for id in ids {
            self.wait_one(id).await?;
        }
        Ok(())
    }

    async fn wait_one(&self, id: &str) -> SchedResult<()> {
        loop {
            match self.accounting_state(id).await? {
                Some(state) => {
                    if state.is_terminal() {
                        if !state.is_success() {
                            tracing::warn!("SLURM job {id} finished in state {state:?}");
                        }
                        return Ok(());
                    }
                    if let SlurmState::Unknown(token) = &state {
                        tracing::warn!("SLURM job {id} reports unknown state `{token}`");
                    }
                }
                None => {
                    // Not in accounting yet; the live queue is authoritative
                    // for freshly submitted jobs.
                    if !self.in_live_queue(id).await? {
                        tokio::time::sleep(self.config.requeue_grace).await;
                        if self.accounting_state(id).await?.is_some() {
                            continue;
                        }
                        tracing::warn!(
                            "SLURM job {id} is in neither accounting nor the queue, giving up on it"
                        );
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Query the accounting service for the job's state token.
    async fn accounting_state(&self, id: &str) -> SchedResult<Option<SlurmState>> {
        let mut cmd = Command::new(&self.config.sacct);
        cmd.args(["-j", id, "-o", "State", "-n", "-X"]);

        let output = exec::capture(cmd, "sacct", self.config.submit_timeout).await?;
        Ok(parser::parse_sacct_state(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    /// Check whether the live queue still knows the job.
    async fn in_live_queue(&self, id: &str) -> SchedResult<bool> {
        let mut cmd = Command::new(&self.config.squeue);
        cmd.args(["-j", id, "-h", "-o", "%T"]);

        let output = exec::capture(cmd, "squeue", self.config.submit_timeout).await?;
        // squeue exits non-zero for unknown job ids; either way an empty
        // listing means the job is not live.
        Ok(output.status.success()
            && String::from_utf8_lossy(&output.stdout)
                .lines()
                .any(|l| !l.trim().is_empty()))
    }

    /// Common tail of the submission command line.
    fn submission_args(&self, cmd: &mut Command, req: &SubmitRequest<'_>) {
        cmd.args(req.opts)
            .arg("-J")
            .arg(&req.job_name)
            .arg("-o")
            .arg(req.log_dir.join(format!("{}_%j.out", req.job_name)))
            .arg("-D")
            .arg(req.work_dir)
            .arg("--export=ALL")
            .arg(req.script)
            .args(&req.args);
    }
}

/// Slot count exported to a process running inside a SLURM allocation.
pub(crate) fn slots_from_env() -> Option<u32> {
    for var in ["SLURM_CPUS_PER_TASK", "SLURM_NTASKS"] {
        if let Some(n) = std::env::var(var).ok().and_then(|v| v.parse().ok()) {
            return Some(n);
        }
    }
    None
}

/// Whether the current process runs inside a SLURM job.
pub(crate) fn in_managed_job() -> bool {
    std::env::var_os("SLURM_JOB_ID").is_some()
}
