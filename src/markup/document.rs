//! Typed view of one playlist page: opaque prefix text, the playlist
//! container, opaque suffix text. Mutations edit the tree; the serializer
//! prints it back without disturbing prefix or suffix.

use crate::domain::track::{ArtworkMap, Track};
use crate::markup::tokens;
use crate::markup::{escape_attr, unescape_attr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistDocument {
    /// Everything before the container's opening tag, byte for byte.
    pub prefix: String,
    pub container: Option<PlaylistContainer>,
    /// Everything after the container's closing marker, byte for byte.
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistContainer {
    /// The opening `<div ...>` tag, kept verbatim from the source.
    pub open_tag: String,
    pub tracks: Vec<Track>,
    pub artworks: ArtworkMap,
}

impl PlaylistDocument {
    /// A document with no playlist container; the whole text is prefix.
    pub fn opaque(text: impl Into<String>) -> Self {
        Self {
            prefix: text.into(),
            container: None,
            suffix: String::new(),
        }
    }
}

impl PlaylistContainer {
    pub fn new(open_tag: impl Into<String>) -> Self {
        Self {
            open_tag: open_tag.into(),
            tracks: Vec::new(),
            artworks: ArtworkMap::new(),
        }
    }

    /// Human-readable playlist name from the `data-title` attribute.
    pub fn display_name(&self) -> Option<String> {
        attr_value(&self.open_tag, "data-title")
    }

    /// Cover file reference from the `data-cover` attribute, as written.
    pub fn cover(&self) -> Option<String> {
        attr_value(&self.open_tag, "data-cover")
    }

    pub fn set_display_name(&mut self, name: &str) {
        self.open_tag = set_attr(&self.open_tag, "data-title", name);
    }
}

/// Raw split of a fragment around the playlist container: prefix, opening
/// tag, interior, suffix. `None` when the page has no container or the
/// container never closes (tolerated by the parser, fatal for mutations).
pub(crate) struct RawContainer<'a> {
    pub prefix: &'a str,
    pub open_tag: &'a str,
    pub inner: &'a str,
    pub suffix: &'a str,
}

/// Locates the container using the widest possible extent: the opening tag is
/// the first div carrying the container class, the close marker is the *last*
/// `</div>` in the remaining text. The wide match deliberately swallows
/// nested or duplicated artwork blocks from prior malformed writes so they
/// get collapsed on the next serialization instead of surviving as orphans.
pub(crate) fn split_container(text: &str) -> Option<RawContainer<'_>> {
    let (open_start, open_end) = find_open_tag(text)?;
    let rest = &text[open_end..];
    let close_rel = rest.rfind(tokens::CONTAINER_CLOSE)?;

    Some(RawContainer {
        prefix: &text[..open_start],
        open_tag: &text[open_start..open_end],
        inner: &rest[..close_rel],
        suffix: &rest[close_rel + tokens::CONTAINER_CLOSE.len()..],
    })
}

/// Byte range of the first `<div ...>` tag whose attributes carry the
/// playlist container class.
fn find_open_tag(text: &str) -> Option<(usize, usize)> {
    let class_marker = format!("class=\"{}\"", tokens::CONTAINER_CLASS);
    let mut from = 0;

    while let Some(rel) = text[from..].find("<div") {
        let start = from + rel;
        let Some(end_rel) = text[start..].find('>') else {
            return None;
        };
        let end = start + end_rel + 1;
        if text[start..end].contains(&class_marker) {
            return Some((start, end));
        }
        from = end;
    }

    None
}

/// Reads a double-quoted attribute value out of a raw tag string. The match
/// is anchored on the preceding space so that one attribute name cannot
/// match inside another (`title` inside `data-title`).
pub(crate) fn attr_value(tag: &str, name: &str) -> Option<String> {
    let needle = format!(" {name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')?;
    Some(unescape_attr(&tag[start..start + end]))
}

/// Returns `tag` with the given attribute set, replacing an existing value or
/// inserting the attribute before the closing `>`.
pub(crate) fn set_attr(tag: &str, name: &str, value: &str) -> String {
    let escaped = escape_attr(value);
    let needle = format!(" {name}=\"");

    if let Some(pos) = tag.find(&needle) {
        let value_start = pos + needle.len();
        if let Some(len) = tag[value_start..].find('"') {
            let mut out = String::with_capacity(tag.len());
            out.push_str(&tag[..value_start]);
            out.push_str(&escaped);
            out.push_str(&tag[value_start + len..]);
            return out;
        }
    }

    match tag.rfind('>') {
        Some(gt) => format!("{} {}=\"{}\"{}", &tag[..gt], name, escaped, &tag[gt..]),
        None => tag.to_string(),
    }
}
