//! The content-storage boundary.
//!
//! Playlists persist as wiki pages owned by a remote content-storage API;
//! this module defines the narrow capability set the core needs from it
//! ([`ContentStorage`]) plus the real client ([`wiki::WikiApi`]) and an
//! in-memory stand-in ([`memory::MemoryStorage`]).

use std::collections::HashMap;

pub mod error;
pub mod memory;
pub mod wiki;

use error::StorageError;

#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Fail if the page already exists.
    pub create_only: bool,
    /// Fail if the page does not exist yet.
    pub no_create: bool,
    /// Mark the edit as minor.
    pub minor: bool,
}

/// Everything the playlist core requires from the page store, regardless of
/// transport. Each mutation operation calls `fetch_content` once, transforms
/// in memory, and calls `commit_content` once; there is no caching and no
/// coordination between concurrent writers (last writer wins).
pub trait ContentStorage {
    /// Raw markup of a page, or `None` if the page does not exist.
    fn fetch_content(&self, page_id: &str) -> Result<Option<String>, StorageError>;

    fn commit_content(
        &self,
        page_id: &str,
        text: &str,
        summary: &str,
        options: &CommitOptions,
    ) -> Result<(), StorageError>;

    fn delete_page(&self, page_id: &str, reason: &str) -> Result<(), StorageError>;

    /// Resolves file references to served URLs. Missing files are simply
    /// absent from the result.
    fn resolve_file_urls(
        &self,
        file_keys: &[String],
    ) -> Result<HashMap<String, String>, StorageError>;
}
