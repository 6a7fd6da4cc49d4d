use std::collections::HashMap;

use crate::domain::title;
use crate::markup::tokens;

/// One playlist entry. Position is implicit in the owning `Vec<Track>` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Canonical file reference, produced by [`title::normalize`] only.
    pub file_key: String,
    /// Full display text of the source line, separator and all.
    pub raw_label: String,
    /// Trailing annotation after the last ` // ` separator, if any.
    pub extra: Option<String>,
    /// Canonical artwork file reference, resolved via the artwork map.
    pub artwork_key: Option<String>,
}

impl Track {
    pub fn new(file_key: impl AsRef<str>, extra: Option<String>) -> Self {
        let file_key = title::normalize(file_key.as_ref());
        let raw_label = match &extra {
            Some(extra) => format!("{file_key}{}{extra}", tokens::EXTRA_SEPARATOR),
            None => file_key.clone(),
        };
        Self {
            file_key,
            raw_label,
            extra,
            artwork_key: None,
        }
    }

    pub fn with_artwork(mut self, artwork_key: impl AsRef<str>) -> Self {
        self.artwork_key = Some(title::normalize(artwork_key.as_ref()));
        self
    }
}

/// Association between track file keys and artwork file keys.
///
/// Entries are keyed by comparison key so that capitalization or spacing
/// variants of the same file collapse onto one entry; the display spelling of
/// the file key is retained for serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtworkMap {
    entries: HashMap<String, (String, String)>,
}

impl ArtworkMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_key: &str) -> Option<&str> {
        self.entries
            .get(&title::comparison_key(file_key))
            .map(|(_, artwork)| artwork.as_str())
    }

    /// Inserts or replaces the artwork for a file. Both sides are normalized.
    pub fn set(&mut self, file_key: &str, artwork_key: &str) {
        let file_key = title::normalize(file_key);
        let artwork_key = title::normalize(artwork_key);
        self.entries
            .insert(title::comparison_key(&file_key), (file_key, artwork_key));
    }

    pub fn remove(&mut self, file_key: &str) -> Option<String> {
        self.entries
            .remove(&title::comparison_key(file_key))
            .map(|(_, artwork)| artwork)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Merges `other` into `self`, later entries overriding earlier ones for
    /// the same key. Used to collapse duplicated artwork blocks left behind
    /// by prior buggy writes.
    pub fn merge(&mut self, other: ArtworkMap) {
        self.entries.extend(other.entries);
    }

    /// Mapping entries ordered to match the given track sequence, skipping
    /// keys with no corresponding track and deduplicating repeated keys.
    /// This is what the serializer uses to emit the single artwork block.
    pub fn entries_in_order(&self, tracks: &[Track]) -> Vec<(String, String)> {
        let mut seen: Vec<String> = Vec::new();
        let mut ordered = Vec::new();

        for track in tracks {
            let key = title::comparison_key(&track.file_key);
            if seen.contains(&key) {
                continue;
            }
            if let Some((file, artwork)) = self.entries.get(&key) {
                ordered.push((file.clone(), artwork.clone()));
            }
            seen.push(key);
        }

        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_label_with_separator() {
        let track = Track::new("A.mp3", Some("Player X".into()));
        assert_eq!(track.raw_label, "File:A.mp3 // Player X");
        assert_eq!(
            crate::markup::parser::split_extra(&track.raw_label).as_deref(),
            Some("Player X")
        );

        let bare = Track::new("A.mp3", None);
        assert_eq!(bare.raw_label, "File:A.mp3");
    }

    #[test]
    fn test_set_get_across_variants() {
        let mut map = ArtworkMap::new();
        map.set("File:Track_One.mp3", "Cover.jpg");

        assert_eq!(map.get("File:Track One.mp3"), Some("File:Cover.jpg"));
        assert_eq!(map.get("file:track one.mp3"), Some("File:Cover.jpg"));
        assert_eq!(map.get("File:Other.mp3"), None);
    }

    #[test]
    fn test_merge_later_wins() {
        let mut first = ArtworkMap::new();
        first.set("File:A.mp3", "File:Old.jpg");
        first.set("File:B.mp3", "File:B.jpg");

        let mut second = ArtworkMap::new();
        second.set("File:A.mp3", "File:New.jpg");

        first.merge(second);
        assert_eq!(first.get("File:A.mp3"), Some("File:New.jpg"));
        assert_eq!(first.get("File:B.mp3"), Some("File:B.jpg"));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_entries_in_order_follows_tracks() {
        let mut map = ArtworkMap::new();
        map.set("File:A.mp3", "File:A.jpg");
        map.set("File:C.mp3", "File:C.jpg");
        map.set("File:Gone.mp3", "File:Gone.jpg");

        let tracks = vec![
            Track::new("File:C.mp3", None),
            Track::new("File:B.mp3", None),
            Track::new("File:A.mp3", None),
            // duplicate line in the source markup: model keeps it
            Track::new("File:C.mp3", None),
        ];

        let ordered = map.entries_in_order(&tracks);
        assert_eq!(
            ordered,
            vec![
                ("File:C.mp3".to_string(), "File:C.jpg".to_string()),
                ("File:A.mp3".to_string(), "File:A.jpg".to_string()),
            ]
        );
    }
}
