//! Deterministic pretty-printer for the playlist document tree.
//!
//! The container interior is regenerated wholesale: one bullet per track in
//! list order, then at most one artwork block ordered to match the tracks.
//! Prefix and suffix are emitted byte for byte, and serializing the output
//! again yields the same bytes.

use crate::markup::document::PlaylistDocument;
use crate::markup::{escape_attr, tokens};

pub fn serialize(doc: &PlaylistDocument) -> String {
    let Some(container) = &doc.container else {
        // nothing to regenerate, hand the page back untouched
        return format!("{}{}", doc.prefix, doc.suffix);
    };

    let mut out = String::with_capacity(doc.prefix.len() + doc.suffix.len() + 256);
    out.push_str(&doc.prefix);
    out.push_str(&container.open_tag);
    out.push('\n');

    for track in &container.tracks {
        out.push_str("* [[");
        out.push_str(&track.file_key);
        out.push_str("]]");
        if let Some(extra) = &track.extra {
            out.push_str(tokens::EXTRA_SEPARATOR);
            out.push_str(extra);
        }
        out.push('\n');
    }

    let entries = container.artworks.entries_in_order(&container.tracks);
    if !entries.is_empty() {
        out.push_str(tokens::ARTWORK_BLOCK_OPEN);
        out.push('\n');
        for (file, artwork) in entries {
            out.push_str("<span data-file=\"");
            out.push_str(&escape_attr(&file));
            out.push_str("\" data-artwork=\"");
            out.push_str(&escape_attr(&artwork));
            out.push_str("\"></span>\n");
        }
        out.push_str(tokens::CONTAINER_CLOSE);
        out.push('\n');
    }

    out.push_str(tokens::CONTAINER_CLOSE);
    out.push_str(&doc.suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::track::Track;
    use crate::markup::parser;

    fn sample_page() -> String {
        concat!(
            "__NOTITLE__\n\n",
            "== Sea Songs ==\n\n",
            "<div class=\"tta-playlist\" data-title=\"Sea Songs\">\n",
            "* [[File:Spanish Ladies.mp3]] // The City Waites\n",
            "* [[File:Haul Away.mp3]]\n",
            "<div class=\"tta-playlist-artworks\" style=\"display:none\">\n",
            "<span data-file=\"File:Spanish Ladies.mp3\" data-artwork=\"File:Cover.jpg\"></span>\n",
            "</div>\n",
            "</div>\n",
        )
        .to_string()
    }

    #[test]
    fn test_round_trip_idempotence() {
        let page = sample_page();
        let once = serialize(&parser::parse_document(&page));
        let twice = serialize(&parser::parse_document(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_serialize_consistency() {
        let page = sample_page();
        let doc = parser::parse_document(&page);
        let reparsed = parser::parse(&serialize(&doc));

        let container = doc.container.unwrap();
        assert_eq!(reparsed.tracks.len(), container.tracks.len());
        for (before, after) in container.tracks.iter().zip(&reparsed.tracks) {
            assert_eq!(before.file_key, after.file_key);
            assert_eq!(before.extra, after.extra);
            assert_eq!(before.artwork_key, after.artwork_key);
        }
        assert_eq!(
            reparsed.artworks.entries_in_order(&reparsed.tracks),
            container.artworks.entries_in_order(&container.tracks)
        );
    }

    #[test]
    fn test_prefix_and_suffix_untouched() {
        let page = format!(
            "intro text <b>kept</b>\n{}\ntrailing text\n",
            "<div class=\"tta-playlist\">\n* [[File:A.mp3]]\n</div>"
        );
        let out = serialize(&parser::parse_document(&page));
        assert!(out.starts_with("intro text <b>kept</b>\n"));
        assert!(out.ends_with("</div>\ntrailing text\n"));
    }

    #[test]
    fn test_empty_artwork_block_omitted() {
        let page = concat!(
            "<div class=\"tta-playlist\">\n",
            "* [[File:A.mp3]]\n",
            "<div class=\"tta-playlist-artworks\" style=\"display:none\">\n",
            "<span data-file=\"File:Gone.mp3\" data-artwork=\"File:G.jpg\"></span>\n",
            "</div>\n",
            "</div>\n",
        );

        // the only mapped file has no surviving track, so no block at all
        let out = serialize(&parser::parse_document(page));
        assert!(!out.contains("tta-playlist-artworks"));
        assert!(!out.contains("File:G.jpg"));
    }

    #[test]
    fn test_duplicate_artwork_blocks_collapse_to_one() {
        let page = concat!(
            "<div class=\"tta-playlist\">\n",
            "* [[File:A.mp3]]\n",
            "* [[File:B.mp3]]\n",
            "<div class=\"tta-playlist-artworks\" style=\"display:none\">\n",
            "<span data-file=\"File:A.mp3\" data-artwork=\"File:Old.jpg\"></span>\n",
            "</div>\n",
            "<div class=\"tta-playlist-artworks\" style=\"display:none\">\n",
            "<span data-file=\"File:A.mp3\" data-artwork=\"File:New.jpg\"></span>\n",
            "<span data-file=\"File:B.mp3\" data-artwork=\"File:B.jpg\"></span>\n",
            "</div>\n",
            "</div>\n",
        );

        let out = serialize(&parser::parse_document(page));
        assert_eq!(out.matches("tta-playlist-artworks").count(), 1);
        assert!(out.contains("File:New.jpg"));
        assert!(!out.contains("File:Old.jpg"));
        assert!(out.contains("File:B.jpg"));
    }

    #[test]
    fn test_document_without_container_unchanged() {
        let page = "plain page\nwith no playlist\n";
        assert_eq!(serialize(&parser::parse_document(page)), page);
    }

    #[test]
    fn test_quotes_escaped_in_artwork_attrs() {
        let mut doc = parser::parse_document("<div class=\"tta-playlist\">\n</div>\n");
        let container = doc.container.as_mut().unwrap();
        container.tracks.push(Track::new("File:A \"quoted\".mp3", None));
        container
            .artworks
            .set("File:A \"quoted\".mp3", "File:C.jpg");

        let out = serialize(&doc);
        assert!(out.contains("data-file=\"File:A &quot;quoted&quot;.mp3\""));

        // and it survives a reparse
        let reparsed = parser::parse(&out);
        assert_eq!(
            reparsed.artworks.get("File:A \"quoted\".mp3"),
            Some("File:C.jpg")
        );
    }
}
