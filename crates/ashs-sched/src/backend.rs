//! Backend identity.

use std::fmt;
use std::str::FromStr;

/// The workload managers the scheduler core can drive.
///
/// Exactly one backend is active per driver process; switching requires a
/// restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SLURM (sbatch / squeue / sacct).
    Slurm,
    /// Sun Grid Engine / Open Grid Scheduler (qsub).
    Sge,
    /// IBM Spectrum LSF (bsub).
    Lsf,
    /// GNU parallel on the local host.
    Parallel,
    /// Sequential in-process execution; the terminal fallback.
    Local,
}

impl BackendKind {
    /// All backends, in the default detection priority order.
    pub const DEFAULT_PRIORITY: [BackendKind; 5] = [
        BackendKind::Slurm,
        BackendKind::Sge,
        BackendKind::Lsf,
        BackendKind::Parallel,
        BackendKind::Local,
    ];

    /// Canonical lowercase name, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Slurm => "slurm",
            BackendKind::Sge => "sge",
            BackendKind::Lsf => "lsf",
            BackendKind::Parallel => "parallel",
            BackendKind::Local => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slurm" => Ok(BackendKind::Slurm),
            "sge" => Ok(BackendKind::Sge),
            "lsf" => Ok(BackendKind::Lsf),
            "parallel" => Ok(BackendKind::Parallel),
            "local" => Ok(BackendKind::Local),
            other => Err(format!("unknown backend `{other}`")),
        }
    }
}

/// Backend selection: automatic detection or a pinned backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendSelector {
    /// Probe the priority list and take the first available backend.
    #[default]
    Auto,
    /// Use the named backend; its probe must still pass.
    Named(BackendKind),
}
