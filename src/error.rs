use std::collections::TryReserveError;

/// Errors surfaced by cache/dataset construction and hashing.
#[derive(Debug, thiserror::Error)]
pub enum RandomXError {
    /// The caller supplied an unusable key.
    #[error("key must not be empty")]
    EmptyKey,
    /// An allocation for the cache, dataset or a scratchpad failed.
    #[error("failed to allocate {what}: {source}")]
    Allocation {
        what: &'static str,
        source: TryReserveError,
    },
    /// The VM was used after [`close`](crate::RandomXVm::close).
    #[error("the VM has been closed")]
    Closed,
}

impl RandomXError {
    pub(crate) fn alloc(what: &'static str) -> impl FnOnce(TryReserveError) -> Self {
        move |source| RandomXError::Allocation { what, source }
    }
}
