//! Opaque job handles.

use std::fmt;

use crate::backend::BackendKind;

/// The sentinel identifier returned by synchronous (local) submissions.
pub const SYNC_SENTINEL: &str = "0";

/// An opaque, backend-tagged job identifier.
///
/// The raw identifier is only meaningful to the backend that produced it: a
/// cluster job number for SLURM/SGE/LSF, a child process id for the parallel
/// executor, or the `0` sentinel for local submissions that already completed
/// synchronously. The tag makes passing a handle to the wrong backend a typed
/// error instead of silent misbehaviour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    backend: BackendKind,
    id: String,
}

impl JobHandle {
    pub(crate) fn new(backend: BackendKind, id: impl Into<String>) -> Self {
        Self {
            backend,
            id: id.into(),
        }
    }

    /// The sentinel handle for a submission that already ran to completion.
    pub(crate) fn sentinel(backend: BackendKind) -> Self {
        Self::new(backend, SYNC_SENTINEL)
    }

    /// The backend this handle belongs to.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// The raw backend identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this is the synchronous-completion sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.id == SYNC_SENTINEL
    }

    /// The identifier as an OS process id, for process-backed handles.
    pub fn pid(&self) -> Option<u32> {
        self.id.parse().ok()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Ordered handles returned by an array submission, in parameter order.
pub type JobSet = Vec<JobHandle>;
