//! GNU parallel adapter.
//!
//! Single submissions background the script directly and hand back the child
//! PID. Array submissions fan out through one `parallel` invocation, so a
//! whole sweep is represented by a single PID; waiting on that PID is a
//! complete barrier because `parallel` does not exit until all of its
//! children have.

use std::ffi::OsString;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::{SchedError, SchedResult};
use crate::exec::{self, SubmitRequest};

/// Configuration for the parallel adapter.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Path to the `parallel` binary.
    pub parallel: PathBuf,
    /// Shell used to run job scripts.
    pub shell: PathBuf,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            parallel: PathBuf::from("parallel"),
            shell: PathBuf::from("bash"),
        }
    }
}

/// Adapter running jobs as local child processes, fanned out by GNU
/// parallel.
#[derive(Debug, Default)]
pub struct ParallelAdapter {
    config: ParallelConfig,
    /// Live children, keyed by PID, reaped by `wait`.
    children: Mutex<FxHashMap<u32, Child>>,
}

impl ParallelAdapter {
    pub fn new(config: ParallelConfig) -> Self {
        Self {
            config,
            children: Mutex::new(FxHashMap::default()),
        }
    }

    /// Spawn the script in the background; the handle is the child PID.
    pub(crate) async fn submit(&self, req: &SubmitRequest<'_>) -> SchedResult<String> {
        let mut argv: Vec<OsString> = vec![self.config.shell.clone().into(), req.script.into()];
        argv.extend(req.args.iter().map(OsString::from));
        self.spawn_tracked(req, argv).await
    }

    /// Run the script inline, blocking until it finishes.
    pub(crate) async fn submit_sync(&self, req: &SubmitRequest<'_>) -> SchedResult<i32> {
        let mut argv: Vec<OsString> = vec![self.config.shell.clone().into(), req.script.into()];
        argv.extend(req.args.iter().map(OsString::from));

        let mut cmd = exec::stamped_command(req.log_dir, &req.job_name, argv);
        cmd.current_dir(req.work_dir);
        exec::run_blocking(cmd, "sh").await
    }

    /// Fan a 1-D parameter sweep out through a single `parallel` process.
    pub(crate) async fn submit_array(
        &self,
        req: &SubmitRequest<'_>,
        values: &[&str],
    ) -> SchedResult<String> {
        let mut argv = self.array_argv(req);
        argv.push("{}".into());
        argv.push(":::".into());
        argv.extend(values.iter().map(OsString::from));
        self.spawn_tracked(req, argv).await
    }

    /// Fan a 2-D Cartesian product out through a single `parallel` process;
    /// two operand lists give outer-major iteration.
    pub(crate) async fn submit_array_double(
        &self,
        req: &SubmitRequest<'_>,
        outer: &[&str],
        inner: &[&str],
    ) -> SchedResult<String> {
        let mut argv = self.array_argv(req);
        argv.push("{1}".into());
        argv.push("{2}".into());
        argv.push(":::".into());
        argv.extend(outer.iter().map(OsString::from));
        argv.push(":::".into());
        argv.extend(inner.iter().map(OsString::from));
        self.spawn_tracked(req, argv).await
    }

    /// Reap the given PIDs.
    pub(crate) async fn wait(&self, pids: &[u32]) -> SchedResult<()> {
        for pid in pids {
            let child = self.children.lock().await.remove(pid);
            match child {
                Some(mut child) => {
                    let status = child.wait().await.map_err(|e| SchedError::Command {
                        command: "wait".to_string(),
                        message: e.to_string(),
                    })?;
                    if !status.success() {
                        tracing::warn!("local job {pid} exited with {status}");
                    }
                }
                None => {
                    tracing::warn!("no live child with pid {pid}, already reaped?");
                }
            }
        }
        Ok(())
    }

    /// `parallel <opts> <shell> <script> <prefix args...>`.
    fn array_argv(&self, req: &SubmitRequest<'_>) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec![self.config.parallel.clone().into()];
        argv.extend(req.opts.iter().map(OsString::from));
        argv.push(self.config.shell.clone().into());
        argv.push(req.script.into());
        argv.extend(req.args.iter().map(OsString::from));
        argv
    }

    async fn spawn_tracked(
        &self,
        req: &SubmitRequest<'_>,
        argv: Vec<OsString>,
    ) -> SchedResult<String> {
        let mut cmd: Command = exec::stamped_command(req.log_dir, &req.job_name, argv);
        cmd.current_dir(req.work_dir);

        let child = cmd.spawn().map_err(|e| SchedError::Command {
            command: "sh".to_string(),
            message: e.to_string(),
        })?;
        let pid = child.id().ok_or_else(|| SchedError::Command {
            command: "sh".to_string(),
            message: "child exited before its pid could be observed".to_string(),
        })?;

        self.children.lock().await.insert(pid, child);
        tracing::debug!("spawned {} as pid {pid}", req.job_name);
        Ok(pid.to_string())
    }
}
