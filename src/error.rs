use thiserror::Error;

use crate::storage::error::StorageError;

/// Faults surfaced by playlist operations.
///
/// Parsing is tolerant and never produces these; they come from mutations
/// that must not silently no-op (a missing container on a remove, a missing
/// page on a rename) or from the storage layer itself. Operations never
/// retry: every fault is surfaced once to the caller.
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// The page exists but carries no playlist container where a mutation
    /// requires one. Aborting here prevents a wholesale rewrite of a page
    /// the operation does not understand.
    #[error("playlist container not found on page {0}")]
    ContainerNotFound(String),

    #[error("playlist page {0} does not exist")]
    PageMissing(String),

    #[error("playlist name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
