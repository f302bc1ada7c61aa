//! Parsers for SLURM command output.

use crate::error::{SchedError, SchedResult};
use crate::slurm::adapter::SlurmState;

/// Extract the job id from `sbatch --parsable` output.
///
/// The parsable format is the id alone on the first line, optionally
/// followed by `;cluster` on federated installations; the whole first line
/// is the identifier.
pub fn parse_sbatch_id(output: &str) -> SchedResult<String> {
    let line = output.lines().next().unwrap_or("").trim();
    if line.is_empty() || !line.as_bytes()[0].is_ascii_digit() {
        return Err(SchedError::IdExtract {
            command: "sbatch".to_string(),
            output: output.to_string(),
        });
    }
    Ok(line.to_string())
}

/// Extract the job state from `sacct -n -X -o State` output.
///
/// Returns `None` when the job is not yet visible in accounting. The state
/// is the first whitespace-delimited token of the first non-empty line;
/// `CANCELLED` may carry a trailing `+` or a `by <uid>` suffix.
pub fn parse_sacct_state(output: &str) -> Option<SlurmState> {
    let token = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())?
        .split_whitespace()
        .next()?
        .trim_end_matches('+');
    Some(parse_state(token))
}

/// Map a state token to [`SlurmState`].
pub fn parse_state(token: &str) -> SlurmState {
    match token.to_uppercase().as_str() {
        "PENDING" => SlurmState::Pending,
        "RUNNING" => SlurmState::Running,
        "COMPLETING" => SlurmState::Completing,
        "CONFIGURING" => SlurmState::Configuring,
        "SUSPENDED" => SlurmState::Suspended,
        "COMPLETED" => SlurmState::Completed,
        "FAILED" => SlurmState::Failed,
        "CANCELLED" => SlurmState::Cancelled,
        "TIMEOUT" => SlurmState::Timeout,
        "NODE_FAIL" => SlurmState::NodeFail,
        "PREEMPTED" => SlurmState::Preempted,
        "OUT_OF_MEMORY" => SlurmState::OutOfMemory,
        _ => SlurmState::Unknown(token.to_string()),
    }
}
