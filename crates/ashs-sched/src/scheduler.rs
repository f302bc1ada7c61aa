//! The submission façade.
//!
//! A [`JobScheduler`] binds a configuration to exactly one backend adapter
//! for the lifetime of the driver process and exposes the uniform
//! submission, array, and wait operations. Callers never see backend
//! specifics beyond the tag on the handles they get back.

use std::path::{Path, PathBuf};

use crate::backend::BackendKind;
use crate::config::SchedulerConfig;
use crate::detect::{self, DetectEnv};
use crate::error::{SchedError, SchedResult};
use crate::exec::SubmitRequest;
use crate::handle::{JobHandle, JobSet};
use crate::local::{LocalAdapter, LocalConfig};
use crate::lsf::{LsfAdapter, LsfConfig};
use crate::parallel::{ParallelAdapter, ParallelConfig};
use crate::resources::host_core_count;
use crate::sge::{SgeAdapter, SgeConfig};
use crate::slurm::{SlurmAdapter, SlurmConfig};

/// Name of the log directory beneath the work directory.
const LOG_DIR_NAME: &str = "dump";

/// The active backend adapter.
enum Adapter {
    Slurm(SlurmAdapter),
    Sge(SgeAdapter),
    Lsf(LsfAdapter),
    Parallel(ParallelAdapter),
    Local(LocalAdapter),
}

impl Adapter {
    fn kind(&self) -> BackendKind {
        match self {
            Adapter::Slurm(_) => BackendKind::Slurm,
            Adapter::Sge(_) => BackendKind::Sge,
            Adapter::Lsf(_) => BackendKind::Lsf,
            Adapter::Parallel(_) => BackendKind::Parallel,
            Adapter::Local(_) => BackendKind::Local,
        }
    }
}

/// Scheduler façade bound to one backend for the whole run.
pub struct JobScheduler {
    config: SchedulerConfig,
    adapter: Adapter,
    work_dir: PathBuf,
    log_dir: PathBuf,
}

impl JobScheduler {
    /// Detect a backend per the configuration and construct the façade.
    pub fn new(config: SchedulerConfig) -> SchedResult<Self> {
        let kind = detect::select(&config, &DetectEnv::from_env())?;
        Ok(Self::with_backend(config, kind))
    }

    /// Construct the façade for a known backend with default adapter
    /// settings, skipping detection.
    pub fn with_backend(config: SchedulerConfig, kind: BackendKind) -> Self {
        let adapter = match kind {
            BackendKind::Slurm => Adapter::Slurm(SlurmAdapter::default()),
            BackendKind::Sge => Adapter::Sge(SgeAdapter::default()),
            BackendKind::Lsf => Adapter::Lsf(LsfAdapter::default()),
            BackendKind::Parallel => Adapter::Parallel(ParallelAdapter::default()),
            BackendKind::Local => Adapter::Local(LocalAdapter::default()),
        };
        Self::from_parts(config, adapter)
    }

    /// Construct with an explicitly configured SLURM adapter.
    pub fn with_slurm(config: SchedulerConfig, slurm: SlurmConfig) -> Self {
        Self::from_parts(config, Adapter::Slurm(SlurmAdapter::new(slurm)))
    }

    /// Construct with an explicitly configured SGE adapter.
    pub fn with_sge(config: SchedulerConfig, sge: SgeConfig) -> Self {
        Self::from_parts(config, Adapter::Sge(SgeAdapter::new(sge)))
    }

    /// Construct with an explicitly configured LSF adapter.
    pub fn with_lsf(config: SchedulerConfig, lsf: LsfConfig) -> Self {
        Self::from_parts(config, Adapter::Lsf(LsfAdapter::new(lsf)))
    }

    /// Construct with an explicitly configured parallel adapter.
    pub fn with_parallel(config: SchedulerConfig, parallel: ParallelConfig) -> Self {
        Self::from_parts(config, Adapter::Parallel(ParallelAdapter::new(parallel)))
    }

    /// Construct with an explicitly configured local adapter.
    pub fn with_local(config: SchedulerConfig, local: LocalConfig) -> Self {
        Self::from_parts(config, Adapter::Local(LocalAdapter::new(local)))
    }

    fn from_parts(config: SchedulerConfig, adapter: Adapter) -> Self {
        let work_dir = config
            .work_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let log_dir = work_dir.join(LOG_DIR_NAME);

        Self {
            config,
            adapter,
            work_dir,
            log_dir,
        }
    }

    /// The active backend.
    pub fn backend(&self) -> BackendKind {
        self.adapter.kind()
    }

    /// The shared log directory, `<work>/dump`.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Tag a raw backend identifier with the active backend.
    pub fn handle(&self, id: &str) -> JobHandle {
        JobHandle::new(self.backend(), id)
    }

    /// Submit a single job asynchronously.
    ///
    /// Returns immediately for the cluster and parallel backends; the local
    /// backend runs the job inline and returns the `0` sentinel.
    pub async fn submit(
        &self,
        stage: u32,
        name: &str,
        script: &Path,
        args: &[String],
    ) -> SchedResult<JobHandle> {
        self.ensure_log_dir().await?;
        let opts = self.compile_opts(stage);
        let req = self.request(name, &opts, script, args.to_vec());

        let id = match &self.adapter {
            Adapter::Slurm(slurm) => slurm.submit(&req).await?,
            Adapter::Sge(sge) => sge.submit(&req).await?,
            Adapter::Lsf(lsf) => lsf.submit(&req).await?,
            Adapter::Parallel(parallel) => parallel.submit(&req).await?,
            Adapter::Local(local) => {
                local.run(&req).await?;
                return Ok(JobHandle::sentinel(BackendKind::Local));
            }
        };

        tracing::info!("submitted {} as {}", req.job_name, id);
        Ok(self.handle(&id))
    }

    /// Submit a single job and block until it terminates, returning the job
    /// exit code as far as the backend reports it.
    pub async fn submit_sync(
        &self,
        stage: u32,
        name: &str,
        script: &Path,
        args: &[String],
    ) -> SchedResult<i32> {
        self.ensure_log_dir().await?;
        let opts = self.compile_opts(stage);
        let req = self.request(name, &opts, script, args.to_vec());

        match &self.adapter {
            Adapter::Slurm(slurm) => slurm.submit_sync(&req).await,
            Adapter::Sge(sge) => sge.submit_sync(&req).await,
            Adapter::Lsf(lsf) => lsf.submit_sync(&req).await,
            Adapter::Parallel(parallel) => parallel.submit_sync(&req).await,
            Adapter::Local(local) => local.run(&req).await,
        }
    }

    /// Submit a 1-D parameter sweep: one job per whitespace-separated value
    /// in `values`, with the value appended as the last positional argument.
    ///
    /// Handles come back in parameter order. The parallel backend fans the
    /// whole sweep out through a single `parallel` process and returns one
    /// handle for it; the local backend runs the sweep inline and returns
    /// the sentinel.
    pub async fn submit_array_single(
        &self,
        stage: u32,
        name: &str,
        values: &str,
        script: &Path,
        prefix_args: &[String],
    ) -> SchedResult<JobSet> {
        self.ensure_log_dir().await?;
        let opts = self.compile_opts(stage);
        let values: Vec<&str> = values.split_whitespace().collect();

        match &self.adapter {
            Adapter::Parallel(parallel) => {
                let req = self.request(name, &opts, script, prefix_args.to_vec());
                let pid = parallel.submit_array(&req, &values).await?;
                Ok(vec![self.handle(&pid)])
            }
            _ => {
                let mut handles = Vec::with_capacity(values.len());
                for value in &values {
                    let mut args = prefix_args.to_vec();
                    args.push(value.to_string());
                    let element = format!("{name}_{value}");
                    handles.push(self.submit_element(&element, &opts, script, args).await?);
                }
                // Local elements all completed inline; one sentinel stands
                // for the whole sweep.
                if matches!(self.backend(), BackendKind::Local) {
                    handles.truncate(1);
                }
                Ok(handles)
            }
        }
    }

    /// Submit a 2-D Cartesian-product sweep in outer-major order: all inner
    /// values for the first outer value, then the next outer value, and so
    /// on. Both parameters are appended as the last two positional
    /// arguments.
    pub async fn submit_array_double(
        &self,
        stage: u32,
        name: &str,
        outer: &str,
        inner: &str,
        script: &Path,
        prefix_args: &[String],
    ) -> SchedResult<JobSet> {
        self.ensure_log_dir().await?;
        let opts = self.compile_opts(stage);
        let outer: Vec<&str> = outer.split_whitespace().collect();
        let inner: Vec<&str> = inner.split_whitespace().collect();

        match &self.adapter {
            Adapter::Parallel(parallel) => {
                let req = self.request(name, &opts, script, prefix_args.to_vec());
                let pid = parallel.submit_array_double(&req, &outer, &inner).await?;
                Ok(vec![self.handle(&pid)])
            }
            _ => {
                let mut handles = Vec::with_capacity(outer.len() * inner.len());
                for o in &outer {
                    for i in &inner {
                        let mut args = prefix_args.to_vec();
                        args.push(o.to_string());
                        args.push(i.to_string());
                        let element = format!("{name}_{o}_{i}");
                        handles.push(self.submit_element(&element, &opts, script, args).await?);
                    }
                }
                if matches!(self.backend(), BackendKind::Local) {
                    handles.truncate(1);
                }
                Ok(handles)
            }
        }
    }

    /// Block until every handle in the set is terminal.
    ///
    /// The barrier covers the whole set regardless of per-job outcome;
    /// failures are logged by the adapters, never re-raised here. A handle
    /// minted by a different backend is rejected up front.
    pub async fn wait(&self, handles: &[JobHandle]) -> SchedResult<()> {
        let active = self.backend();
        for handle in handles {
            if handle.backend() != active {
                return Err(SchedError::HandleBackendMismatch {
                    handle: handle.id().to_string(),
                    expected: handle.backend(),
                    active,
                });
            }
        }

        // Sentinels were already complete at submission time.
        let live: Vec<&JobHandle> = handles.iter().filter(|h| !h.is_sentinel()).collect();
        if live.is_empty() {
            return Ok(());
        }

        match &self.adapter {
            Adapter::Slurm(slurm) => {
                let ids: Vec<&str> = live.iter().map(|h| h.id()).collect();
                slurm.wait(&ids).await
            }
            Adapter::Sge(sge) => {
                let ids: Vec<&str> = live.iter().map(|h| h.id()).collect();
                sge.wait(&self.sentinel_name(), &ids).await
            }
            Adapter::Lsf(lsf) => {
                let ids: Vec<&str> = live.iter().map(|h| h.id()).collect();
                lsf.wait(&self.sentinel_name(), &ids).await
            }
            Adapter::Parallel(parallel) => {
                let pids: Vec<u32> = live.iter().filter_map(|h| h.pid()).collect();
                parallel.wait(&pids).await
            }
            Adapter::Local(_) => Ok(()),
        }
    }

    /// Cores available to the current execution context, honoring the
    /// backend-exported slot variables and falling back to the host core
    /// count.
    pub fn slots(&self) -> u32 {
        let from_env = match &self.adapter {
            Adapter::Slurm(_) => crate::slurm::slots_from_env(),
            Adapter::Sge(_) => crate::sge::slots_from_env(),
            Adapter::Lsf(_) => crate::lsf::slots_from_env(),
            Adapter::Parallel(_) | Adapter::Local(_) => None,
        };
        from_env.unwrap_or_else(host_core_count)
    }

    /// Whether this process is itself running inside a job allocated by the
    /// active backend.
    pub fn in_managed_job(&self) -> bool {
        match &self.adapter {
            Adapter::Slurm(_) => crate::slurm::in_managed_job(),
            Adapter::Sge(_) => crate::sge::in_managed_job(),
            Adapter::Lsf(_) => crate::lsf::in_managed_job(),
            Adapter::Parallel(_) | Adapter::Local(_) => false,
        }
    }

    /// Compile the resource flags for a stage, extra opts included.
    fn compile_opts(&self, stage: u32) -> Vec<String> {
        let kind = self.backend();
        self.config
            .resources_for_stage(stage)
            .compile(kind, self.config.extra_opts_for(kind))
    }

    fn request<'a>(
        &'a self,
        name: &str,
        opts: &'a [String],
        script: &'a Path,
        args: Vec<String>,
    ) -> SubmitRequest<'a> {
        SubmitRequest {
            job_name: format!("{}_{}", self.config.job_prefix, name),
            opts,
            log_dir: &self.log_dir,
            work_dir: &self.work_dir,
            script,
            args,
        }
    }

    /// Submit one array element through the single-job path of the active
    /// adapter.
    async fn submit_element(
        &self,
        element: &str,
        opts: &[String],
        script: &Path,
        args: Vec<String>,
    ) -> SchedResult<JobHandle> {
        let req = self.request(element, opts, script, args);
        let id = match &self.adapter {
            Adapter::Slurm(slurm) => slurm.submit(&req).await?,
            Adapter::Sge(sge) => sge.submit(&req).await?,
            Adapter::Lsf(lsf) => lsf.submit(&req).await?,
            Adapter::Parallel(parallel) => parallel.submit(&req).await?,
            Adapter::Local(local) => {
                local.run(&req).await?;
                return Ok(JobHandle::sentinel(BackendKind::Local));
            }
        };
        Ok(self.handle(&id))
    }

    fn sentinel_name(&self) -> String {
        format!("{}_wait", self.config.job_prefix)
    }

    async fn ensure_log_dir(&self) -> SchedResult<()> {
        tokio::fs::create_dir_all(&self.log_dir).await?;
        Ok(())
    }
}
