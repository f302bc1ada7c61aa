//! Batch-scheduler abstraction for the ASHS imaging pipeline.
//!
//! The pipeline submits, tracks, and awaits computational jobs across
//! several mutually incompatible workload managers through one uniform
//! interface; callers never need to know which backend is in use.
//!
//! # Backends
//!
//! | Backend | Submission | Wait mechanism |
//! |----------|------------|----------------|
//! | `slurm` | sbatch | poll the accounting service (sacct) |
//! | `sge` | qsub | synchronous dependent sentinel job |
//! | `lsf` | bsub | synchronous sentinel with `ended(..)` predicate |
//! | `parallel` | GNU parallel child process | reap the child |
//! | `local` | inline, sequential | no-op (already complete) |
//!
//! # Example
//!
//! ```ignore
//! use ashs_sched::{JobScheduler, SchedulerConfig};
//!
//! #[tokio::main]
//! async fn main() -> ashs_sched::SchedResult<()> {
//!     // Resolve configuration and detect the first available backend.
//!     let config = SchedulerConfig::load(None)?;
//!     let scheduler = JobScheduler::new(config)?;
//!
//!     // Fan a left/right sweep out and wait for both sides.
//!     let jobs = scheduler
//!         .submit_array_single(2, "reg", "L R", "run_reg.sh".as_ref(), &[])
//!         .await?;
//!     scheduler.wait(&jobs).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Exactly one backend is active per driver process. Handles are opaque and
//! tagged with their backend; `wait` refuses a handle minted by a different
//! backend instead of silently misbehaving.

pub mod backend;
pub mod config;
pub mod detect;
pub mod error;
pub mod handle;
pub mod local;
pub mod lsf;
pub mod parallel;
pub mod resources;
pub mod scheduler;
pub mod sge;
pub mod slurm;

mod exec;

// Re-exports
pub use backend::{BackendKind, BackendSelector};
pub use config::{SchedulerConfig, StageResources, CONFIG_FILE_NAME};
pub use detect::DetectEnv;
pub use error::{SchedError, SchedResult};
pub use handle::{JobHandle, JobSet};
pub use local::{LocalAdapter, LocalConfig};
pub use lsf::{LsfAdapter, LsfConfig};
pub use parallel::{ParallelAdapter, ParallelConfig};
pub use resources::{MemorySpec, NotifyEvents, ResourceRequest};
pub use scheduler::JobScheduler;
pub use sge::{SgeAdapter, SgeConfig};
pub use slurm::{SlurmAdapter, SlurmConfig, SlurmState};
