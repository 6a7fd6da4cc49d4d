//! Gallery view over a user's playlist collection and batch media URL
//! resolution for playback.

use std::collections::HashMap;

use crate::domain::title;
use crate::domain::track::Track;
use crate::error::PlaylistError;
use crate::markup::{html, parser};
use crate::operations::Playlists;
use crate::storage::ContentStorage;

/// One tile of the gallery: enough to render a cover, a name, and a count
/// without loading the playlist itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistCard {
    pub page_id: String,
    pub display_name: String,
    pub cover_key: Option<String>,
    pub cover_url: Option<String>,
    pub track_count: usize,
}

/// A track paired with the direct media URLs the player needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub track: Track,
    pub url: Option<String>,
    pub artwork_url: Option<String>,
}

/// A playlist ready for playback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPlaylist {
    pub tracks: Vec<ResolvedTrack>,
    pub cover_url: Option<String>,
}

/// Builds the gallery for one user: reads the index, loads each listed
/// playlist, and resolves all cover URLs in a single storage round trip.
/// Member pages that cannot be read or carry no playlist markup are skipped
/// with a warning, so one damaged page never empties the whole gallery.
pub fn collect_library(
    storage: &dyn ContentStorage,
    owner: &str,
) -> Result<Vec<PlaylistCard>, PlaylistError> {
    let entries = Playlists::new(storage).user_playlists(owner)?;

    let mut cards = Vec::new();
    for entry in entries {
        let content = match storage.fetch_content(&entry.page_id) {
            Ok(Some(content)) => content,
            Ok(None) => {
                log::warn!("library: {} is listed but missing", entry.page_id);
                continue;
            }
            Err(err) => {
                log::warn!("library: skipping {}: {err}", entry.page_id);
                continue;
            }
        };

        let Some(container) = parser::parse_document(&content).container else {
            log::warn!("library: {} has no playlist markup", entry.page_id);
            continue;
        };

        cards.push(PlaylistCard {
            display_name: container.display_name().unwrap_or_else(|| entry.name.clone()),
            cover_key: container.cover(),
            cover_url: None,
            track_count: container.tracks.len(),
            page_id: entry.page_id,
        });
    }

    let cover_keys: Vec<String> = cards.iter().filter_map(|c| c.cover_key.clone()).collect();
    if !cover_keys.is_empty() {
        let urls = UrlLookup::fetch(storage, cover_keys)?;
        for card in &mut cards {
            card.cover_url = card.cover_key.as_deref().and_then(|key| urls.get(key));
        }
    }
    Ok(cards)
}

/// Resolves media URLs for a parsed track list plus its optional cover, all
/// in one storage call: track files, their artworks, and the cover.
pub fn resolve_track_urls(
    storage: &dyn ContentStorage,
    tracks: &[Track],
    cover_key: Option<&str>,
) -> Result<ResolvedPlaylist, PlaylistError> {
    let mut keys: Vec<String> = Vec::new();
    for track in tracks {
        keys.push(track.file_key.clone());
        if let Some(artwork) = &track.artwork_key {
            keys.push(artwork.clone());
        }
    }
    if let Some(cover) = cover_key {
        keys.push(title::normalize(cover));
    }
    if keys.is_empty() {
        return Ok(ResolvedPlaylist::default());
    }

    let urls = UrlLookup::fetch(storage, keys)?;
    Ok(ResolvedPlaylist {
        tracks: tracks
            .iter()
            .map(|track| ResolvedTrack {
                url: urls.get(&track.file_key),
                artwork_url: track.artwork_key.as_deref().and_then(|key| urls.get(key)),
                track: track.clone(),
            })
            .collect(),
        cover_url: cover_key.and_then(|key| urls.get(&title::normalize(key))),
    })
}

/// Playback bootstrap from a rendered page: recovers the playlist from its
/// HTML and resolves every media URL it references.
pub fn resolve_rendered(
    storage: &dyn ContentStorage,
    page_html: &str,
) -> Result<ResolvedPlaylist, PlaylistError> {
    let rendered = html::parse_rendered(page_html);
    resolve_track_urls(storage, &rendered.tracks, rendered.cover.as_deref())
}

/// File URL map with comparison-key lookup, so the canonicalized titles a
/// wiki API echoes back still match the keys we asked about.
struct UrlLookup(HashMap<String, String>);

impl UrlLookup {
    fn fetch(storage: &dyn ContentStorage, mut keys: Vec<String>) -> Result<Self, PlaylistError> {
        keys.sort();
        keys.dedup();
        let urls = storage.resolve_file_urls(&keys)?;
        Ok(Self(
            urls.into_iter()
                .map(|(key, url)| (title::comparison_key(&key), url))
                .collect(),
        ))
    }

    fn get(&self, file_key: &str) -> Option<String> {
        self.0.get(&title::comparison_key(file_key)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::Playlists;
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_collect_library_builds_cards() -> anyhow::Result<()> {
        let storage = MemoryStorage::new()
            .with_file_url("File:CoverA.jpg", "https://media.example/CoverA.jpg");
        let ops = Playlists::new(&storage);

        let a = ops.create_playlist("Alice", "Shanties", Some("CoverA.jpg"))?;
        let b = ops.create_playlist("Alice", "Reels", None)?;
        ops.append_track(&a.page_id, "A1.mp3", None, None)?;
        ops.append_track(&a.page_id, "A2.mp3", None, None)?;

        let cards = collect_library(&storage, "Alice")?;
        assert_eq!(cards.len(), 2);

        let shanties = cards.iter().find(|c| c.page_id == a.page_id).unwrap();
        assert_eq!(shanties.display_name, "Shanties");
        assert_eq!(shanties.track_count, 2);
        assert_eq!(shanties.cover_key.as_deref(), Some("File:CoverA.jpg"));
        assert_eq!(
            shanties.cover_url.as_deref(),
            Some("https://media.example/CoverA.jpg")
        );

        let reels = cards.iter().find(|c| c.page_id == b.page_id).unwrap();
        assert_eq!(reels.cover_key, None);
        assert_eq!(reels.cover_url, None);
        assert_eq!(reels.track_count, 0);
        Ok(())
    }

    #[test]
    fn test_collect_library_skips_damaged_members() -> anyhow::Result<()> {
        let storage = MemoryStorage::new()
            .with_page(
                "User:Alice/Playlists",
                concat!(
                    "== My playlists ==\n",
                    "* [[User:Alice/Playlists/Gone|Gone]]\n",
                    "* [[User:Alice/Playlists/Bare|Bare]]\n",
                    "* [[User:Alice/Playlists/Good|Good]]\n",
                ),
            )
            .with_page("User:Alice/Playlists/Bare", "no markup here\n")
            .with_page(
                "User:Alice/Playlists/Good",
                "<div class=\"tta-playlist\" data-title=\"Good\">\n* [[File:X.mp3]]\n</div>\n",
            );

        let cards = collect_library(&storage, "Alice")?;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].display_name, "Good");
        assert_eq!(cards[0].track_count, 1);
        Ok(())
    }

    #[test]
    fn test_resolve_track_urls_covers_all_media() -> anyhow::Result<()> {
        let storage = MemoryStorage::new()
            .with_file_url("File:Song.mp3", "https://media.example/Song.mp3")
            .with_file_url("File:Art.jpg", "https://media.example/Art.jpg")
            .with_file_url("File:Cover.jpg", "https://media.example/Cover.jpg");

        let track = Track::new("Song.mp3", Some("Player X".into()))
            .with_artwork("Art.jpg");

        let resolved = resolve_track_urls(&storage, &[track], Some("Cover.jpg"))?;
        assert_eq!(resolved.tracks.len(), 1);
        assert_eq!(
            resolved.tracks[0].url.as_deref(),
            Some("https://media.example/Song.mp3")
        );
        assert_eq!(
            resolved.tracks[0].artwork_url.as_deref(),
            Some("https://media.example/Art.jpg")
        );
        assert_eq!(
            resolved.cover_url.as_deref(),
            Some("https://media.example/Cover.jpg")
        );
        Ok(())
    }

    #[test]
    fn test_resolve_track_urls_tolerates_unknown_files() -> anyhow::Result<()> {
        let storage = MemoryStorage::new();
        let track = Track::new("Missing.mp3", None);

        let resolved = resolve_track_urls(&storage, &[track], None)?;
        assert_eq!(resolved.tracks.len(), 1);
        assert_eq!(resolved.tracks[0].url, None);
        Ok(())
    }

    #[test]
    fn test_resolve_rendered_bootstraps_player() -> anyhow::Result<()> {
        let storage = MemoryStorage::new()
            .with_file_url("File:Tune.mp3", "https://media.example/Tune.mp3");

        let html = concat!(
            "<div class=\"tta-playlist\" data-title=\"Session\">",
            "<ul><li><a href=\"/wiki/File:Tune.mp3\" title=\"File:Tune.mp3\">Tune</a></li></ul>",
            "</div>",
        );
        let resolved = resolve_rendered(&storage, html)?;
        assert_eq!(resolved.tracks.len(), 1);
        assert_eq!(resolved.tracks[0].track.file_key, "File:Tune.mp3");
        assert_eq!(
            resolved.tracks[0].url.as_deref(),
            Some("https://media.example/Tune.mp3")
        );
        Ok(())
    }
}
