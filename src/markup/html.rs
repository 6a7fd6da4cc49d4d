//! Parse of the *rendered* playlist HTML, the form the interactive player
//! consumes. Same tolerance rules as the wikitext parser: list items without
//! a usable file link are skipped, a missing container yields an empty
//! result.

use scraper::{ElementRef, Html, Selector};

use crate::domain::title;
use crate::domain::track::{ArtworkMap, Track};
use crate::markup::{parser, tokens};

/// A playlist as recovered from rendered page HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPlaylist {
    pub tracks: Vec<Track>,
    pub artworks: ArtworkMap,
    pub display_name: Option<String>,
    /// Canonical cover file reference from the container's `data-cover`.
    pub cover: Option<String>,
}

pub fn parse_rendered(html: &str) -> RenderedPlaylist {
    let doc = Html::parse_fragment(html);

    let container_sel = selector(&format!("div.{}", tokens::CONTAINER_CLASS));
    let li_sel = selector("li");
    let a_sel = selector("a");
    let span_sel = selector(&format!(
        "div.{} span[data-file][data-artwork]",
        tokens::ARTWORK_CLASS
    ));

    let Some(container) = doc.select(&container_sel).next() else {
        return RenderedPlaylist::default();
    };

    let mut artworks = ArtworkMap::new();
    for span in container.select(&span_sel) {
        let file = span.value().attr("data-file").unwrap_or_default();
        let artwork = span.value().attr("data-artwork").unwrap_or_default();
        if file.is_empty() || artwork.is_empty() {
            continue;
        }
        artworks.set(file, artwork);
    }

    let mut tracks = Vec::new();
    for li in container.select(&li_sel) {
        let Some(link) = li.select(&a_sel).next() else {
            continue;
        };
        let Some(file_key) = resolve_file_key(&link) else {
            log::debug!("skipping list item without a resolvable file link");
            continue;
        };

        let raw_label = li.text().collect::<String>().trim().to_string();
        let extra = parser::split_extra(&raw_label);
        let artwork_key = artworks.get(&file_key).map(str::to_string);

        tracks.push(Track {
            file_key,
            raw_label,
            extra,
            artwork_key,
        });
    }

    RenderedPlaylist {
        tracks,
        artworks,
        display_name: container.value().attr("data-title").map(str::to_string),
        cover: container
            .value()
            .attr("data-cover")
            .map(title::normalize),
    }
}

/// Title resolution order: explicit link title attribute, else the last path
/// segment of the link target, URL-decoded. Mirrors how the renderer itself
/// emits file links.
fn resolve_file_key(link: &ElementRef) -> Option<String> {
    let value = link.value();

    let raw = match value.attr("title") {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            let href = value.attr("href")?;
            let segment = href.rsplit('/').next().unwrap_or_default();
            if segment.is_empty() {
                return None;
            }
            segment.to_string()
        }
    };

    Some(title::normalize(&raw))
}

fn selector(css: &str) -> Selector {
    // static selector strings, parse cannot fail
    Selector::parse(css).expect("invalid css selector")
}
