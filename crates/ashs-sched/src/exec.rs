//! Process-execution plumbing shared by the backend adapters.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{SchedError, SchedResult};

/// Everything an adapter needs to realise one submission.
#[derive(Debug)]
pub(crate) struct SubmitRequest<'a> {
    /// Fully prefixed job name (`<prefix>_<name>`).
    pub job_name: String,
    /// Compiled resource flags plus verbatim extra options.
    pub opts: &'a [String],
    /// Directory receiving per-job stdout/stderr.
    pub log_dir: &'a Path,
    /// Directory jobs start in.
    pub work_dir: &'a Path,
    /// The executable unit; its contents are never interpreted here.
    pub script: &'a Path,
    /// Ordered positional arguments for the script.
    pub args: Vec<String>,
}

/// Run a submission-style command to completion, capturing its output.
///
/// Spawn failures map to [`SchedError::Command`]; commands that outlive
/// `limit` map to [`SchedError::Timeout`]. Exit status interpretation is the
/// caller's business.
pub(crate) async fn capture(
    mut cmd: Command,
    name: &str,
    limit: Duration,
) -> SchedResult<std::process::Output> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    tokio::time::timeout(limit, cmd.output())
        .await
        .map_err(|_| SchedError::Timeout(format!("`{name}` did not finish within {limit:?}")))?
        .map_err(|e| SchedError::Command {
            command: name.to_string(),
            message: e.to_string(),
        })
}

/// Run a command with inherited stdio and no deadline, returning its exit
/// status. Used by the synchronous submission paths, which block until the
/// remote job is done by design.
pub(crate) async fn run_blocking(mut cmd: Command, name: &str) -> SchedResult<i32> {
    let status = cmd.status().await.map_err(|e| SchedError::Command {
        command: name.to_string(),
        message: e.to_string(),
    })?;
    Ok(status.code().unwrap_or(-1))
}

/// Build a command whose stdout and stderr land in a PID-stamped log file.
///
/// `argv[0]` is the program to run. The command is wrapped in a thin
/// `sh -c 'exec ...'` shell so the log file can be named after the PID of
/// the process itself: the redirection expands `$$` before `exec` replaces
/// the shell with the real program, so the file carries the child's own
/// PID. Within one driver run the PID is unique.
pub(crate) fn stamped_command(
    log_dir: &Path,
    stem: &str,
    argv: impl IntoIterator<Item = std::ffi::OsString>,
) -> Command {
    let log_file = log_dir.join(format!("{stem}_$$.out"));
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c")
        .arg(format!("exec \"$@\" >\"{}\" 2>&1", log_file.display()))
        .arg(stem)
        .args(argv);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_spawn_failure() {
        let cmd = Command::new("/nonexistent/binary-for-test");
        let err = capture(cmd, "binary-for-test", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedError::Command { .. }));
    }

    #[tokio::test]
    async fn test_capture_timeout() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "sleep 5"]);
        let err = capture(cmd, "sh", Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, SchedError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_stamped_command_writes_pid_log() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("emit.sh");
        tokio::fs::write(&script, "#!/bin/sh\necho ran\n").await.unwrap();

        let mut cmd = stamped_command(dir.path(), "unit", [
            "/bin/sh".into(),
            script.clone().into_os_string(),
        ]);
        let mut child = cmd.spawn().unwrap();
        let pid = child.id().unwrap();
        assert!(child.wait().await.unwrap().success());

        let log = dir.path().join(format!("unit_{pid}.out"));
        let contents = tokio::fs::read_to_string(&log).await.unwrap();
        assert_eq!(contents, "ran\n");
    }
}
