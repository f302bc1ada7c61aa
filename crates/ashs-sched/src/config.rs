//! Configuration loading.
//!
//! A single configuration document is resolved from a fixed search path
//! (first hit wins, no merging) and bridged with legacy environment
//! overrides. The file format is `key = value` lines; blank lines and `#`
//! comments are ignored, values may be quoted, and unknown keys are silently
//! skipped so one file can serve several pipeline versions.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::backend::{BackendKind, BackendSelector};
use crate::error::{SchedError, SchedResult};
use crate::resources::{MemorySpec, NotifyEvents, ResourceRequest};

/// Base name of the configuration document.
pub const CONFIG_FILE_NAME: &str = "ashs_sched.conf";

/// Environment variable naming the pipeline work directory.
pub const ENV_WORK: &str = "ASHS_WORK";

/// Environment variable naming the pipeline install root.
pub const ENV_ROOT: &str = "ASHS_ROOT";

/// Per-stage resource overrides.
#[derive(Debug, Clone, Default)]
pub struct StageResources {
    pub memory: Option<MemorySpec>,
    pub cores: Option<u32>,
    pub walltime: Option<String>,
}

/// Immutable scheduler configuration, constructed once at pipeline start.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Backend selection: automatic or pinned.
    pub selector: BackendSelector,
    /// Detection order for automatic selection.
    pub priority: Vec<BackendKind>,
    /// Default memory limit when a stage override is absent.
    pub default_memory: Option<MemorySpec>,
    /// Default core count.
    pub default_cores: Option<u32>,
    /// Default walltime.
    pub default_time: Option<String>,
    /// Default queue / partition.
    pub default_queue: Option<String>,
    /// Per-stage overrides, keyed by stage index.
    pub stage_overrides: FxHashMap<u32, StageResources>,
    /// Verbatim extra flags per backend.
    pub extra_opts: FxHashMap<BackendKind, String>,
    /// Prefix for generated job names.
    pub job_prefix: String,
    /// Notification mail recipient.
    pub notify_email: Option<String>,
    /// Notification event policy.
    pub notify_events: NotifyEvents,
    /// Pipeline work directory; the log directory lives beneath it.
    pub work_dir: Option<PathBuf>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            selector: BackendSelector::Auto,
            priority: BackendKind::DEFAULT_PRIORITY.to_vec(),
            default_memory: None,
            default_cores: None,
            default_time: None,
            default_queue: None,
            stage_overrides: FxHashMap::default(),
            extra_opts: FxHashMap::default(),
            job_prefix: "ashs".to_string(),
            notify_email: None,
            notify_events: NotifyEvents::None,
            work_dir: None,
        }
    }
}

impl SchedulerConfig {
    /// Load the configuration from the first existing source.
    ///
    /// Search order: `explicit` (caller argument), the current directory,
    /// the work directory, `~/.ashs_sched.conf`, and the install root; the
    /// first hit wins and sources are never merged. When no source exists,
    /// every option takes its default. The legacy `USE_*` environment
    /// booleans are applied afterwards; they override the file's selector
    /// but not an explicit caller choice, which callers apply on the
    /// returned value.
    pub fn load(explicit: Option<&Path>) -> SchedResult<Self> {
        let work_dir = std::env::var_os(ENV_WORK).map(PathBuf::from);

        let mut config = match find_config_file(explicit, work_dir.as_deref()) {
            Some(path) => {
                tracing::debug!("loading scheduler configuration from {}", path.display());
                let text = std::fs::read_to_string(&path)?;
                Self::parse(&text)?
            }
            None => {
                tracing::debug!("no scheduler configuration file found, using defaults");
                Self::default()
            }
        };

        if config.work_dir.is_none() {
            config.work_dir = work_dir;
        }
        config.apply_env_selector();

        Ok(config)
    }

    /// Parse a configuration document.
    pub fn parse(text: &str) -> SchedResult<Self> {
        let mut config = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = unquote(value.trim());
            config.apply_option(key, value)?;
        }

        Ok(config)
    }

    fn apply_option(&mut self, key: &str, value: &str) -> SchedResult<()> {
        match key {
            "backend_selector" => {
                self.selector = if value.eq_ignore_ascii_case("auto") {
                    BackendSelector::Auto
                } else {
                    BackendSelector::Named(parse_value(key, value)?)
                };
            }
            "priority" => {
                let mut priority = Vec::new();
                for name in value.split([',', ' ']).filter(|s| !s.is_empty()) {
                    priority.push(parse_value::<BackendKind>(key, name)?);
                }
                if priority.is_empty() {
                    return Err(SchedError::Config {
                        key: key.to_string(),
                        message: "priority list is empty".to_string(),
                    });
                }
                self.priority = priority;
            }
            "default_memory" => self.default_memory = Some(parse_value(key, value)?),
            "default_cores" => self.default_cores = Some(parse_value(key, value)?),
            "default_time" => self.default_time = Some(value.to_string()),
            "default_queue" => self.default_queue = Some(value.to_string()),
            "job_prefix" => self.job_prefix = value.to_string(),
            "notify_email" => self.notify_email = Some(value.to_string()),
            "notify_events" => self.notify_events = parse_value(key, value)?,
            _ => {
                if let Some(rest) = key.strip_prefix("stage_") {
                    return self.apply_stage_option(key, rest, value);
                }
                if let Some(backend) = key.strip_prefix("extra_opts_") {
                    if let Ok(kind) = backend.parse::<BackendKind>() {
                        self.extra_opts.insert(kind, value.to_string());
                    }
                    return Ok(());
                }
                // Unknown keys are ignored.
            }
        }
        Ok(())
    }

    fn apply_stage_option(&mut self, key: &str, rest: &str, value: &str) -> SchedResult<()> {
        let Some((index, field)) = rest.split_once('_') else {
            return Ok(());
        };
        if !matches!(field, "memory" | "cores" | "time") {
            return Ok(());
        }

        let stage: u32 = index.parse().map_err(|_| SchedError::Config {
            key: key.to_string(),
            message: format!("stage index `{index}` is not a non-negative integer"),
        })?;

        let entry = self.stage_overrides.entry(stage).or_default();
        match field {
            "memory" => entry.memory = Some(parse_value(key, value)?),
            "cores" => entry.cores = Some(parse_value(key, value)?),
            "time" => entry.walltime = Some(value.to_string()),
            _ => unreachable!(),
        }
        Ok(())
    }

    /// Apply the legacy backend-selection booleans.
    fn apply_env_selector(&mut self) {
        let legacy = [
            ("USE_SLURM", BackendKind::Slurm),
            ("USE_QSUB", BackendKind::Sge),
            ("USE_LSF", BackendKind::Lsf),
            ("USE_PARALLEL", BackendKind::Parallel),
        ];
        for (var, kind) in legacy {
            if env_flag(var) {
                tracing::debug!("{var} is set, forcing backend `{kind}`");
                self.selector = BackendSelector::Named(kind);
                return;
            }
        }
    }

    /// The resource request for one stage: stage overrides shadow defaults,
    /// and the notification settings apply globally.
    pub fn resources_for_stage(&self, stage: u32) -> ResourceRequest {
        let overrides = self.stage_overrides.get(&stage);
        ResourceRequest {
            memory: overrides
                .and_then(|o| o.memory.clone())
                .or_else(|| self.default_memory.clone()),
            cores: overrides
                .and_then(|o| o.cores)
                .or(self.default_cores),
            walltime: overrides
                .and_then(|o| o.walltime.clone())
                .or_else(|| self.default_time.clone()),
            queue: self.default_queue.clone(),
            notify_email: self.notify_email.clone(),
            notify_events: self.notify_events,
        }
    }

    /// Verbatim extra flags configured for `kind`.
    pub fn extra_opts_for(&self, kind: BackendKind) -> Option<&str> {
        self.extra_opts.get(&kind).map(String::as_str)
    }
}

/// Resolve the configuration document via the first-hit-wins search path.
fn find_config_file(explicit: Option<&Path>, work_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(work) = work_dir {
        candidates.push(work.join(CONFIG_FILE_NAME));
    }
    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(PathBuf::from(home).join(format!(".{CONFIG_FILE_NAME}")));
    }
    if let Some(root) = std::env::var_os(ENV_ROOT) {
        candidates.push(PathBuf::from(root).join(CONFIG_FILE_NAME));
    }

    candidates.into_iter().find(|p| p.is_file())
}

/// Parse a typed option value, naming the offending key on failure.
fn parse_value<T>(key: &str, value: &str) -> SchedResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| SchedError::Config {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Strip one level of matching single or double quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// A legacy boolean environment flag: set, non-empty, and not `0`/`false`/`no`.
fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(value) => {
            let v = value.trim().to_ascii_lowercase();
            !v.is_empty() && v != "0" && v != "false" && v != "no"
        }
        Err(_) => false,
    }
}
