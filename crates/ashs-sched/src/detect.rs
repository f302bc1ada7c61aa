//! Backend availability probes and selection.
//!
//! Detection iterates the configured priority list and takes the first
//! backend whose probe succeeds. `local` always probes true, so a priority
//! list containing it can never fail to select. An explicitly pinned backend
//! skips iteration but its probe must still pass.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::backend::{BackendKind, BackendSelector};
use crate::config::SchedulerConfig;
use crate::error::{SchedError, SchedResult};

/// Environment variable identifying an SGE installation.
pub const ENV_SGE_ROOT: &str = "SGE_ROOT";

/// Environment variable identifying the LSF binary directory.
pub const ENV_LSF_BINDIR: &str = "LSF_BINDIR";

/// The slice of the process environment that detection depends on.
///
/// Captured as a value so probes can be exercised against synthetic
/// environments in tests without mutating process state.
#[derive(Debug, Clone, Default)]
pub struct DetectEnv {
    /// Directories searched for backend executables.
    pub path_dirs: Vec<PathBuf>,
    /// Value of `SGE_ROOT`, if set.
    pub sge_root: Option<OsString>,
    /// Value of `LSF_BINDIR`, if set.
    pub lsf_bindir: Option<OsString>,
}

impl DetectEnv {
    /// Capture the real process environment.
    pub fn from_env() -> Self {
        let path_dirs = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        Self {
            path_dirs,
            sge_root: std::env::var_os(ENV_SGE_ROOT),
            lsf_bindir: std::env::var_os(ENV_LSF_BINDIR),
        }
    }

    fn has_command(&self, name: &str) -> bool {
        self.path_dirs.iter().any(|dir| is_executable(&dir.join(name)))
    }
}

/// Probe one backend; `Err` names the missing prerequisite.
pub fn probe(kind: BackendKind, env: &DetectEnv) -> Result<(), String> {
    match kind {
        BackendKind::Slurm => {
            for cmd in ["sbatch", "squeue", "sacct"] {
                if !env.has_command(cmd) {
                    return Err(format!("`{cmd}` not found on PATH"));
                }
            }
            Ok(())
        }
        BackendKind::Sge => {
            if env.sge_root.is_none() {
                return Err(format!("{ENV_SGE_ROOT} is not set"));
            }
            if !env.has_command("qsub") {
                return Err("`qsub` not found on PATH".to_string());
            }
            Ok(())
        }
        BackendKind::Lsf => {
            if env.lsf_bindir.is_none() {
                return Err(format!("{ENV_LSF_BINDIR} is not set"));
            }
            if !env.has_command("bsub") {
                return Err("`bsub` not found on PATH".to_string());
            }
            Ok(())
        }
        BackendKind::Parallel => {
            if !env.has_command("parallel") {
                return Err("`parallel` not found on PATH".to_string());
            }
            Ok(())
        }
        BackendKind::Local => Ok(()),
    }
}

/// Select the backend for this run.
pub fn select(config: &SchedulerConfig, env: &DetectEnv) -> SchedResult<BackendKind> {
    match config.selector {
        BackendSelector::Named(kind) => match probe(kind, env) {
            Ok(()) => {
                tracing::info!("using explicitly selected backend `{kind}`");
                Ok(kind)
            }
            Err(missing) => Err(SchedError::Detect {
                backend: kind,
                missing,
            }),
        },
        BackendSelector::Auto => {
            for &kind in &config.priority {
                match probe(kind, env) {
                    Ok(()) => {
                        tracing::info!("detected backend `{kind}`");
                        return Ok(kind);
                    }
                    Err(missing) => {
                        tracing::debug!("backend `{kind}` unavailable: {missing}");
                    }
                }
            }
            Err(SchedError::NoBackend {
                probed: config
                    .priority
                    .iter()
                    .map(BackendKind::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// A synthetic environment with the named commands present.
    fn env_with(commands: &[&str], sge_root: bool, lsf_bindir: bool) -> (tempfile::TempDir, DetectEnv) {
        let dir = tempfile::tempdir().unwrap();
        for cmd in commands {
            let path = dir.path().join(cmd);
            fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            }
        }
        let env = DetectEnv {
            path_dirs: vec![dir.path().to_path_buf()],
            sge_root: sge_root.then(|| "/opt/sge".into()),
            lsf_bindir: lsf_bindir.then(|| "/opt/lsf/bin".into()),
        };
        (dir, env)
    }

    #[test]
    fn test_probe_slurm_needs_all_three() {
        let (_dir, env) = env_with(&["sbatch", "squeue"], false, false);
        assert!(probe(BackendKind::Slurm, &env).is_err());

        let (_dir, env) = env_with(&["sbatch", "squeue", "sacct"], false, false);
        assert!(probe(BackendKind::Slurm, &env).is_ok());
    }

    #[test]
    fn test_probe_sge_needs_root_and_qsub() {
        let (_dir, env) = env_with(&["qsub"], false, false);
        assert!(probe(BackendKind::Sge, &env).is_err());

        let (_dir, env) = env_with(&[], true, false);
        assert!(probe(BackendKind::Sge, &env).is_err());

        let (_dir, env) = env_with(&["qsub"], true, false);
        assert!(probe(BackendKind::Sge, &env).is_ok());
    }

    #[test]
    fn test_probe_local_always_succeeds() {
        assert!(probe(BackendKind::Local, &DetectEnv::default()).is_ok());
    }

    #[test]
    fn test_select_first_available() {
        let (_dir, env) = env_with(&["qsub", "parallel"], true, false);
        let config = SchedulerConfig::default();
        assert_eq!(select(&config, &env).unwrap(), BackendKind::Sge);
    }

    #[test]
    fn test_select_priority_permutations() {
        let (_dir, env) = env_with(&["parallel", "bsub"], false, true);

        let mut config = SchedulerConfig::default();
        config.priority = vec![BackendKind::Parallel, BackendKind::Lsf, BackendKind::Local];
        assert_eq!(select(&config, &env).unwrap(), BackendKind::Parallel);

        config.priority = vec![BackendKind::Lsf, BackendKind::Parallel, BackendKind::Local];
        assert_eq!(select(&config, &env).unwrap(), BackendKind::Lsf);

        config.priority = vec![BackendKind::Slurm, BackendKind::Sge, BackendKind::Local];
        assert_eq!(select(&config, &env).unwrap(), BackendKind::Local);
    }

    #[test]
    fn test_select_local_fallback() {
        let config = SchedulerConfig::default();
        let selected = select(&config, &DetectEnv::default()).unwrap();
        assert_eq!(selected, BackendKind::Local);
    }

    #[test]
    fn test_select_no_backend() {
        let mut config = SchedulerConfig::default();
        config.priority = vec![BackendKind::Slurm, BackendKind::Lsf];
        let err = select(&config, &DetectEnv::default()).unwrap_err();
        assert!(matches!(err, SchedError::NoBackend { .. }));
    }

    #[test]
    fn test_explicit_selection_still_probes() {
        let mut config = SchedulerConfig::default();
        config.selector = BackendSelector::Named(BackendKind::Slurm);
        let err = select(&config, &DetectEnv::default()).unwrap_err();
        match err {
            SchedError::Detect { backend, missing } => {
                assert_eq!(backend, BackendKind::Slurm);
                assert!(missing.contains("sbatch"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
