//! Tolerant wikitext parse of a playlist fragment.
//!
//! Malformed or partial entries are skipped, never fatal: a fragment with no
//! container, or a container with no usable bullets, parses to an empty
//! result. Mutations decide for themselves whether an absent container is an
//! error.

use crate::domain::title;
use crate::domain::track::{ArtworkMap, Track};
use crate::markup::document::{self, PlaylistContainer, PlaylistDocument};
use crate::markup::{ParsedPlaylist, tokens};

/// Parses a full page into the typed document tree.
pub fn parse_document(text: &str) -> PlaylistDocument {
    let Some(raw) = document::split_container(text) else {
        return PlaylistDocument::opaque(text);
    };

    let tracks = parse_bullets(raw.inner);
    let artworks = parse_artwork_blocks(raw.inner);

    let tracks = tracks
        .into_iter()
        .map(|mut track| {
            track.artwork_key = artworks.get(&track.file_key).map(str::to_string);
            track
        })
        .collect();

    PlaylistDocument {
        prefix: raw.prefix.to_string(),
        container: Some(PlaylistContainer {
            open_tag: raw.open_tag.to_string(),
            tracks,
            artworks,
        }),
        suffix: raw.suffix.to_string(),
    }
}

/// Convenience view for consumers that only need the track list and mapping.
pub fn parse(text: &str) -> ParsedPlaylist {
    match parse_document(text).container {
        Some(container) => ParsedPlaylist {
            tracks: container.tracks,
            artworks: container.artworks,
        },
        None => ParsedPlaylist::default(),
    }
}

/// Splits a display label on the *last* occurrence of the extra separator.
/// Earlier literal occurrences of ` // ` stay part of the base text.
pub fn split_extra(label: &str) -> Option<String> {
    let idx = label.rfind(tokens::EXTRA_SEPARATOR)?;
    let extra = label[idx + tokens::EXTRA_SEPARATOR.len()..].trim();
    if extra.is_empty() {
        None
    } else {
        Some(extra.to_string())
    }
}

/// Bullet lines of the form `* [[File:X]] // extra`. Targets outside the
/// file namespace are not tracks and are skipped.
fn parse_bullets(inner: &str) -> Vec<Track> {
    let mut tracks = Vec::new();

    for line in inner.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix('*') else {
            continue;
        };

        let Some((target, label, tail)) = parse_wiki_link(rest) else {
            continue;
        };

        if !title::has_file_namespace(&target) {
            log::debug!("skipping non-file bullet: {trimmed}");
            continue;
        }
        let file_key = title::normalize(&target);

        // without an explicit pipe label the rendered link shows the
        // normalized target
        let label = if label == target {
            file_key.clone()
        } else {
            label
        };
        let raw_label = format!("{}{}", label, tail).trim().to_string();
        let extra = split_extra(&raw_label);

        tracks.push(Track {
            file_key,
            raw_label,
            extra,
            artwork_key: None,
        });
    }

    tracks
}

/// First `[[target|label]]` link in a bullet line. Returns the raw target,
/// the display label (target itself when there is no pipe) and the text
/// after the closing brackets.
fn parse_wiki_link(rest: &str) -> Option<(String, String, String)> {
    let open = rest.find("[[")?;
    let close_rel = rest[open..].find("]]")?;
    let body = &rest[open + 2..open + close_rel];
    let tail = &rest[open + close_rel + 2..];

    let (target, label) = match body.split_once('|') {
        Some((target, label)) => (target.trim(), label.trim()),
        None => (body.trim(), body.trim()),
    };

    if target.is_empty() {
        return None;
    }

    Some((target.to_string(), label.to_string(), tail.to_string()))
}

/// Collects every artwork block in the interior and merges them into one
/// mapping, later entries overriding earlier ones. Multiple blocks only
/// exist on pages damaged by prior buggy writes.
fn parse_artwork_blocks(inner: &str) -> ArtworkMap {
    let mut map = ArtworkMap::new();
    let class_marker = format!("class=\"{}\"", tokens::ARTWORK_CLASS);
    let mut from = 0;

    while let Some(rel) = inner[from..].find("<div") {
        let start = from + rel;
        let Some(tag_end_rel) = inner[start..].find('>') else {
            break;
        };
        let tag_end = start + tag_end_rel + 1;

        if !inner[start..tag_end].contains(&class_marker) {
            from = tag_end;
            continue;
        }

        // artwork blocks are leaf containers: first close wins
        let block = match inner[tag_end..].find(tokens::CONTAINER_CLOSE) {
            Some(close_rel) => &inner[tag_end..tag_end + close_rel],
            None => &inner[tag_end..],
        };
        parse_artwork_spans(block, &mut map);

        from = tag_end + block.len();
    }

    map
}

fn parse_artwork_spans(block: &str, map: &mut ArtworkMap) {
    let mut from = 0;

    while let Some(rel) = block[from..].find("<span") {
        let start = from + rel;
        let Some(end_rel) = block[start..].find('>') else {
            break;
        };
        let tag = &block[start..start + end_rel + 1];

        let file = document::attr_value(tag, "data-file");
        let artwork = document::attr_value(tag, "data-artwork");
        match (file, artwork) {
            (Some(file), Some(artwork)) if !file.is_empty() && !artwork.is_empty() => {
                map.set(&file, &artwork);
            }
            _ => log::debug!("skipping artwork span without both attributes: {tag}"),
        }

        from = start + end_rel + 1;
    }
}
