//! Wiki-hosted playlist engine: parses playlist markup embedded in wiki
//! pages, mutates it through typed documents, and writes it back through a
//! pluggable content store.

pub mod config;
pub mod domain;
pub mod error;
pub mod library;
pub mod markup;
pub mod operations;
pub mod storage;

pub use config::Config;
pub use error::PlaylistError;
pub use operations::Playlists;
