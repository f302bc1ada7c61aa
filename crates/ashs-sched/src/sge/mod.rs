//! SGE / Open Grid Scheduler integration.

mod adapter;
mod parser;

pub use adapter::{SgeAdapter, SgeConfig};
pub(crate) use adapter::{in_managed_job, slots_from_env};
