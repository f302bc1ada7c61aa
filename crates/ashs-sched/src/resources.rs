//! Generic resource requests and their translation to backend flags.

use std::fmt;
use std::str::FromStr;

use crate::backend::BackendKind;

/// A memory amount with its original unit suffix (`G`, `M`, or bare).
///
/// The original spelling is preserved so backends that accept suffixed values
/// (SLURM `--mem=4G`, SGE `-l h_vmem=4G`) receive the value exactly as it was
/// configured. LSF needs plain megabytes; gigabytes convert at x1000, which
/// matches what deployed cluster configurations already expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySpec {
    raw: String,
    megabytes: u64,
}

impl MemorySpec {
    /// The value as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The value in decimal megabytes.
    pub fn megabytes(&self) -> u64 {
        self.megabytes
    }
}

impl FromStr for MemorySpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err("empty memory value".to_string());
        }

        let (digits, factor) = match raw.as_bytes()[raw.len() - 1] {
            b'G' | b'g' => (&raw[..raw.len() - 1], 1000),
            b'M' | b'm' => (&raw[..raw.len() - 1], 1),
            _ => (raw, 1),
        };

        let amount: u64 = digits
            .parse()
            .map_err(|_| format!("invalid memory value `{raw}`"))?;

        Ok(Self {
            raw: raw.to_string(),
            megabytes: amount * factor,
        })
    }
}

impl fmt::Display for MemorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Which job lifecycle events trigger a notification mail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifyEvents {
    /// No notifications (the default).
    #[default]
    None,
    /// Begin, end, and abort events.
    All,
    /// Abort/failure only.
    Fail,
    /// Normal completion only.
    End,
    /// Job start only.
    Begin,
}

impl FromStr for NotifyEvents {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(NotifyEvents::None),
            "all" => Ok(NotifyEvents::All),
            "fail" => Ok(NotifyEvents::Fail),
            "end" => Ok(NotifyEvents::End),
            "begin" => Ok(NotifyEvents::Begin),
            other => Err(format!("unknown notification policy `{other}`")),
        }
    }
}

/// The abstract resource description for one submission.
///
/// Derived from the configuration defaults and the per-stage overrides at
/// submission time; unset fields emit no flag at all.
#[derive(Debug, Clone, Default)]
pub struct ResourceRequest {
    /// Memory limit.
    pub memory: Option<MemorySpec>,
    /// Core / slot count.
    pub cores: Option<u32>,
    /// Walltime, colon-separated `H:M:S` or backend-native.
    pub walltime: Option<String>,
    /// Queue or partition name.
    pub queue: Option<String>,
    /// Notification mail recipient.
    pub notify_email: Option<String>,
    /// Notification event policy.
    pub notify_events: NotifyEvents,
}

impl ResourceRequest {
    /// Compile this request into the flag vector for `kind`.
    ///
    /// `extra_opts` is the configured verbatim suffix for the backend; it is
    /// whitespace-split and appended after the compiled flags.
    pub fn compile(&self, kind: BackendKind, extra_opts: Option<&str>) -> Vec<String> {
        let mut opts = match kind {
            BackendKind::Slurm => self.compile_slurm(),
            BackendKind::Sge => self.compile_sge(),
            BackendKind::Lsf => self.compile_lsf(),
            BackendKind::Parallel => self.compile_parallel(),
            BackendKind::Local => Vec::new(),
        };

        if kind != BackendKind::Local {
            if let Some(extra) = extra_opts {
                opts.extend(extra.split_whitespace().map(str::to_string));
            }
        }

        opts
    }

    fn compile_slurm(&self) -> Vec<String> {
        let mut opts = Vec::new();
        if let Some(mem) = &self.memory {
            opts.push(format!("--mem={mem}"));
        }
        if let Some(cores) = self.cores {
            opts.push(format!("--cpus-per-task={cores}"));
        }
        if let Some(time) = &self.walltime {
            opts.push(format!("--time={time}"));
        }
        if let Some(queue) = &self.queue {
            opts.push(format!("--partition={queue}"));
        }
        if self.notify_events != NotifyEvents::None {
            if let Some(email) = &self.notify_email {
                opts.push(format!("--mail-user={email}"));
            }
            let mail_type = match self.notify_events {
                NotifyEvents::All => "ALL",
                NotifyEvents::Fail => "FAIL",
                NotifyEvents::End => "END",
                NotifyEvents::Begin => "BEGIN",
                NotifyEvents::None => unreachable!(),
            };
            opts.push(format!("--mail-type={mail_type}"));
        }
        opts
    }

    fn compile_sge(&self) -> Vec<String> {
        let mut opts = Vec::new();
        if let Some(mem) = &self.memory {
            opts.push("-l".to_string());
            opts.push(format!("h_vmem={mem}"));
        }
        if let Some(cores) = self.cores {
            opts.push("-pe".to_string());
            opts.push("smp".to_string());
            opts.push(cores.to_string());
        }
        if let Some(time) = &self.walltime {
            opts.push("-l".to_string());
            opts.push(format!("h_rt={time}"));
        }
        if let Some(queue) = &self.queue {
            opts.push("-q".to_string());
            opts.push(queue.clone());
        }
        if self.notify_events != NotifyEvents::None {
            if let Some(email) = &self.notify_email {
                opts.push("-M".to_string());
                opts.push(email.clone());
            }
            let events = match self.notify_events {
                NotifyEvents::All => "beas",
                NotifyEvents::Fail => "a",
                NotifyEvents::End => "e",
                NotifyEvents::Begin => "b",
                NotifyEvents::None => unreachable!(),
            };
            opts.push("-m".to_string());
            opts.push(events.to_string());
        }
        opts
    }

    fn compile_lsf(&self) -> Vec<String> {
        let mut opts = Vec::new();
        if let Some(mem) = &self.memory {
            opts.push("-R".to_string());
            opts.push(format!("rusage[mem={}]", mem.megabytes()));
        }
        if let Some(cores) = self.cores {
            opts.push("-n".to_string());
            opts.push(cores.to_string());
        }
        if let Some(time) = &self.walltime {
            opts.push("-W".to_string());
            opts.push(lsf_walltime(time));
        }
        if let Some(queue) = &self.queue {
            opts.push("-q".to_string());
            opts.push(queue.clone());
        }
        if self.notify_events != NotifyEvents::None {
            if let Some(email) = &self.notify_email {
                opts.push("-u".to_string());
                opts.push(email.clone());
            }
            // LSF has no begin-only notification flag.
            match self.notify_events {
                NotifyEvents::All | NotifyEvents::Fail | NotifyEvents::End => {
                    opts.push("-N".to_string());
                }
                NotifyEvents::Begin | NotifyEvents::None => {}
            }
        }
        opts
    }

    fn compile_parallel(&self) -> Vec<String> {
        let jobs = self.cores.unwrap_or_else(host_core_count);
        vec!["-j".to_string(), jobs.to_string()]
    }
}

/// Truncate an `H:M:S` walltime to the `H:M` form LSF's `-W` expects.
///
/// A value with fewer than two colon-separated components passes through
/// unchanged.
fn lsf_walltime(walltime: &str) -> String {
    let mut parts = walltime.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(h), Some(m)) => format!("{h}:{m}"),
        _ => walltime.to_string(),
    }
}

/// Number of cores on the local host.
pub(crate) fn host_core_count() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> ResourceRequest {
        ResourceRequest {
            memory: Some("8G".parse().unwrap()),
            cores: Some(4),
            walltime: Some("4:00:00".to_string()),
            queue: Some("long".to_string()),
            notify_email: Some("user@example.org".to_string()),
            notify_events: NotifyEvents::All,
        }
    }

    #[test]
    fn test_memory_spec() {
        let mem: MemorySpec = "8G".parse().unwrap();
        assert_eq!(mem.as_str(), "8G");
        assert_eq!(mem.megabytes(), 8000);

        let mem: MemorySpec = "512M".parse().unwrap();
        assert_eq!(mem.megabytes(), 512);

        let mem: MemorySpec = "2048".parse().unwrap();
        assert_eq!(mem.megabytes(), 2048);

        assert!("".parse::<MemorySpec>().is_err());
        assert!("eightG".parse::<MemorySpec>().is_err());
    }

    #[test]
    fn test_compile_slurm_full() {
        let opts = full_request().compile(BackendKind::Slurm, None);
        assert_eq!(
            opts,
            vec![
                "--mem=8G",
                "--cpus-per-task=4",
                "--time=4:00:00",
                "--partition=long",
                "--mail-user=user@example.org",
                "--mail-type=ALL",
            ]
        );
    }

    #[test]
    fn test_compile_slurm_empty() {
        let opts = ResourceRequest::default().compile(BackendKind::Slurm, None);
        assert!(opts.is_empty());
    }

    #[test]
    fn test_compile_slurm_policy_without_email() {
        let req = ResourceRequest {
            notify_events: NotifyEvents::Fail,
            ..Default::default()
        };
        assert_eq!(req.compile(BackendKind::Slurm, None), vec!["--mail-type=FAIL"]);
    }

    #[test]
    fn test_compile_sge_full() {
        let opts = full_request().compile(BackendKind::Sge, None);
        assert_eq!(
            opts,
            vec![
                "-l",
                "h_vmem=8G",
                "-pe",
                "smp",
                "4",
                "-l",
                "h_rt=4:00:00",
                "-q",
                "long",
                "-M",
                "user@example.org",
                "-m",
                "beas",
            ]
        );
    }

    #[test]
    fn test_compile_sge_policies() {
        for (events, code) in [
            (NotifyEvents::Fail, "a"),
            (NotifyEvents::End, "e"),
            (NotifyEvents::Begin, "b"),
        ] {
            let req = ResourceRequest {
                notify_events: events,
                ..Default::default()
            };
            assert_eq!(req.compile(BackendKind::Sge, None), vec!["-m", code]);
        }
    }

    #[test]
    fn test_compile_lsf_memory_and_walltime() {
        let opts = full_request().compile(BackendKind::Lsf, None);
        assert_eq!(
            opts,
            vec![
                "-R",
                "rusage[mem=8000]",
                "-n",
                "4",
                "-W",
                "4:00",
                "-q",
                "long",
                "-u",
                "user@example.org",
                "-N",
            ]
        );
    }

    #[test]
    fn test_compile_lsf_begin_emits_no_notify_flag() {
        let req = ResourceRequest {
            notify_events: NotifyEvents::Begin,
            ..Default::default()
        };
        assert!(req.compile(BackendKind::Lsf, None).is_empty());
    }

    #[test]
    fn test_compile_parallel() {
        let req = ResourceRequest {
            cores: Some(4),
            memory: Some("8G".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(req.compile(BackendKind::Parallel, None), vec!["-j", "4"]);

        // Without a core count the host core count is used.
        let opts = ResourceRequest::default().compile(BackendKind::Parallel, None);
        assert_eq!(opts[0], "-j");
        assert!(opts[1].parse::<u32>().unwrap() >= 1);
    }

    #[test]
    fn test_compile_local_ignores_everything() {
        let opts = full_request().compile(BackendKind::Local, Some("--ignored"));
        assert!(opts.is_empty());
    }

    #[test]
    fn test_extra_opts_appended_verbatim() {
        let req = ResourceRequest {
            cores: Some(2),
            ..Default::default()
        };
        let opts = req.compile(BackendKind::Slurm, Some("--constraint=avx2 --exclusive"));
        assert_eq!(
            opts,
            vec!["--cpus-per-task=2", "--constraint=avx2", "--exclusive"]
        );
    }

    #[test]
    fn test_lsf_walltime_truncation() {
        assert_eq!(lsf_walltime("4:00:00"), "4:00");
        assert_eq!(lsf_walltime("12:30:59"), "12:30");
        assert_eq!(lsf_walltime("90"), "90");
    }
}
