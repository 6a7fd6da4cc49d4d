//! The playlist markup format and its bidirectional transforms.
//!
//! A playlist lives inside a wiki page as a container div holding bullet
//! lines (one per track) and a hidden artwork block. [`parser`] turns that
//! fragment into a typed [`document::PlaylistDocument`]; [`serializer`]
//! prints an edited document back, touching nothing outside the container.
//! [`html`] covers the post-render HTML that the interactive player consumes.

use crate::domain::track::{ArtworkMap, Track};

pub mod document;
pub mod html;
pub mod parser;
pub mod serializer;

pub mod tokens {
    /// Class marker on the playlist container element.
    pub const CONTAINER_CLASS: &str = "tta-playlist";
    /// Class marker on the hidden artwork mapping block.
    pub const ARTWORK_CLASS: &str = "tta-playlist-artworks";
    /// Separator between a track reference and its free-text annotation.
    pub const EXTRA_SEPARATOR: &str = " // ";
    /// Heading of the per-user playlist index page.
    pub const INDEX_HEADING: &str = "My playlists";

    pub const ARTWORK_BLOCK_OPEN: &str =
        "<div class=\"tta-playlist-artworks\" style=\"display:none\">";
    pub const CONTAINER_CLOSE: &str = "</div>";
}

/// Track list plus artwork mapping recovered from one playlist fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPlaylist {
    pub tracks: Vec<Track>,
    pub artworks: ArtworkMap,
}

pub(crate) fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

pub(crate) fn unescape_attr(value: &str) -> String {
    value.replace("&quot;", "\"")
}
