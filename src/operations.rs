//! Playlist mutation operations.
//!
//! Every operation is the same three-step pipeline: fetch the current page
//! from the content store, transform the parsed document in memory, commit
//! the reserialized page. Documents are materialized fresh per operation and
//! never cached, so each mutation sees the latest committed state; two
//! concurrent editors race last-writer-wins (accepted, not detected here).

use chrono::Utc;

use crate::domain::title;
use crate::domain::track::Track;
use crate::error::PlaylistError;
use crate::markup::{parser, serializer, tokens};
use crate::storage::{CommitOptions, ContentStorage};

/// One entry of a user's playlist index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub page_id: String,
    pub name: String,
}

/// Replacement page body used by soft deletion: owners cannot remove pages,
/// so the content is stubbed out and the index entry dropped instead.
const SOFT_DELETE_STUB: &str =
    "__NOTITLE__ __NOINDEX__\n\n''This playlist has been deleted by its owner.''\n";

/// Skeleton for a brand-new index page, rendered around the first entry.
const INDEX_TEMPLATE_HEAD: &str = concat!(
    "__NOTITLE__\n",
    "__NOEDITSECTION__\n\n",
    "{{portal header\n",
    " | title = My Playlist Library\n",
    " | notes = ''Your personal collection of playlists.''\n",
    "  Use the green <b>+</b> button near any track to add it to a playlist\n",
    "  or to create a new one. {{break|2}}\n",
    "}}\n\n",
    "[[File:Open book.png|center|300px|link=|alt=My Playlist Library]]\n\n",
    "<!-- TTA_PLAYLIST_LIBRARY_START -->\n",
);
const INDEX_TEMPLATE_NOTE: &str = concat!(
    "<!--\n",
    "The list below is managed automatically.\n",
    "You can rename or delete playlists using the \u{22ee} menu on each playlist page.\n",
    "-->\n",
);
const INDEX_TEMPLATE_TAIL: &str = "<!-- TTA_PLAYLIST_LIBRARY_END -->\n";

/// Full index page laid out around the first entry.
fn new_index_content(link_line: &str) -> String {
    format!(
        "{INDEX_TEMPLATE_HEAD}== {} ==\n{INDEX_TEMPLATE_NOTE}{link_line}\n{INDEX_TEMPLATE_TAIL}",
        tokens::INDEX_HEADING
    )
}

pub struct Playlists<'a> {
    storage: &'a dyn ContentStorage,
}

impl<'a> Playlists<'a> {
    pub fn new(storage: &'a dyn ContentStorage) -> Self {
        Self { storage }
    }

    /// Appends a track at the end of a playlist, recording its artwork in
    /// the mapping when one is supplied. A blank or missing page is
    /// bootstrapped with a skeleton document first.
    pub fn append_track(
        &self,
        page_id: &str,
        file_key: &str,
        extra: Option<&str>,
        artwork_key: Option<&str>,
    ) -> Result<(), PlaylistError> {
        let fetched = self.storage.fetch_content(page_id)?;
        let existed = fetched.as_ref().is_some_and(|c| !c.trim().is_empty());

        let content = match fetched {
            Some(content) if !content.trim().is_empty() => content,
            _ => skeleton_document(&nice_name(page_id), None),
        };

        let mut doc = parser::parse_document(&content);
        let container = doc
            .container
            .as_mut()
            .ok_or_else(|| PlaylistError::ContainerNotFound(page_id.to_string()))?;

        let extra = extra
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        let mut track = Track::new(file_key, extra);
        if let Some(artwork) = artwork_key {
            container.artworks.set(&track.file_key, artwork);
            track.artwork_key = Some(title::normalize(artwork));
        }
        container.tracks.push(track);

        self.storage.commit_content(
            page_id,
            &serializer::serialize(&doc),
            "Add track to playlist",
            &CommitOptions {
                // only a page that already had content keeps nocreate on
                no_create: existed,
                minor: true,
                ..Default::default()
            },
        )?;
        log::info!("appended {} to {page_id}", title::normalize(file_key));
        Ok(())
    }

    /// Removes every track matching the file key and prunes its artwork
    /// entry. A page without a playlist container is a structural fault:
    /// removing must never silently rewrite a page it does not understand.
    pub fn remove_track(&self, page_id: &str, file_key: &str) -> Result<(), PlaylistError> {
        let content = self
            .storage
            .fetch_content(page_id)?
            .ok_or_else(|| PlaylistError::PageMissing(page_id.to_string()))?;

        let mut doc = parser::parse_document(&content);
        let container = doc
            .container
            .as_mut()
            .ok_or_else(|| PlaylistError::ContainerNotFound(page_id.to_string()))?;

        let key = title::comparison_key(file_key);
        let before = container.tracks.len();
        container
            .tracks
            .retain(|track| title::comparison_key(&track.file_key) != key);

        if container.tracks.len() == before {
            log::warn!("remove_track: no track matched {file_key} on {page_id}");
        }
        // no surviving line references the key anymore
        container.artworks.remove(file_key);

        self.storage.commit_content(
            page_id,
            &serializer::serialize(&doc),
            "Remove track from playlist",
            &CommitOptions {
                no_create: true,
                ..Default::default()
            },
        )?;
        Ok(())
    }

    /// Replaces the track sequence with the caller-supplied order. The
    /// artwork block is regenerated to follow the new order; its membership
    /// is untouched. Matching is by comparison key, so spacing or case
    /// variants of a file key keep their artwork.
    pub fn reorder_tracks(&self, page_id: &str, order: &[Track]) -> Result<(), PlaylistError> {
        let content = self
            .storage
            .fetch_content(page_id)?
            .ok_or_else(|| PlaylistError::PageMissing(page_id.to_string()))?;

        let mut doc = parser::parse_document(&content);
        let container = doc
            .container
            .as_mut()
            .ok_or_else(|| PlaylistError::ContainerNotFound(page_id.to_string()))?;

        container.tracks = order
            .iter()
            .map(|track| {
                let mut track = track.clone();
                track.artwork_key = container
                    .artworks
                    .get(&track.file_key)
                    .map(str::to_string);
                track
            })
            .collect();

        self.storage.commit_content(
            page_id,
            &serializer::serialize(&doc),
            "Reorder playlist tracks",
            &CommitOptions {
                no_create: true,
                ..Default::default()
            },
        )?;
        Ok(())
    }

    /// Human-readable playlist name, resolved through the three-tier
    /// fallback: first heading, else the container's `data-title`, else the
    /// final path segment of the page identifier.
    pub fn current_name(&self, page_id: &str) -> Result<String, PlaylistError> {
        let content = self
            .storage
            .fetch_content(page_id)?
            .ok_or_else(|| PlaylistError::PageMissing(page_id.to_string()))?;

        if let Some(heading) = first_heading(&content) {
            return Ok(heading);
        }
        if let Some(name) = parser::parse_document(&content)
            .container
            .and_then(|c| c.display_name())
        {
            return Ok(name);
        }
        Ok(nice_name(page_id))
    }

    /// Renames a playlist: rewrites the page heading and the container's
    /// `data-title`, then the entry on the owner's index page. Two
    /// independent commits, not atomic.
    pub fn rename_playlist(
        &self,
        page_id: &str,
        owner: &str,
        new_name: &str,
    ) -> Result<(), PlaylistError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }

        let content = self
            .storage
            .fetch_content(page_id)?
            .ok_or_else(|| PlaylistError::PageMissing(page_id.to_string()))?;

        let mut doc = parser::parse_document(&content);
        doc.prefix = replace_first_heading(&doc.prefix, new_name);
        if let Some(container) = doc.container.as_mut() {
            container.set_display_name(new_name);
        }

        self.storage.commit_content(
            page_id,
            &serializer::serialize(&doc),
            &format!("Rename playlist to \"{new_name}\""),
            &CommitOptions {
                no_create: true,
                ..Default::default()
            },
        )?;

        self.rename_index_entry(owner, page_id, new_name)?;
        log::info!("renamed {page_id} to {new_name}");
        Ok(())
    }

    /// Creates a new playlist page under the owner's playlist tree and makes
    /// sure the owner's index lists it. The technical identifier is derived
    /// from the human name plus a creation timestamp to dodge collisions.
    pub fn create_playlist(
        &self,
        owner: &str,
        human_name: &str,
        cover_key: Option<&str>,
    ) -> Result<PlaylistRef, PlaylistError> {
        let human_name = human_name.trim();
        if human_name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }

        let page_id = format!(
            "User:{owner}/Playlists/{}",
            technical_name(human_name)
        );
        let cover = cover_key.map(title::normalize);

        self.storage.commit_content(
            &page_id,
            &skeleton_document(human_name, cover.as_deref()),
            &format!("Create playlist \"{human_name}\""),
            &CommitOptions {
                create_only: true,
                ..Default::default()
            },
        )?;

        self.ensure_index_entry(owner, &page_id, human_name)?;
        log::info!("created playlist {page_id}");

        Ok(PlaylistRef {
            page_id,
            name: human_name.to_string(),
        })
    }

    /// Deletes a playlist. `hard` asks the storage layer for true page
    /// removal, which only privileged callers may do; the soft path stubs
    /// out the content and removes the index entry, leaving the page in
    /// place for anyone holding a direct link.
    pub fn delete_playlist(
        &self,
        page_id: &str,
        owner: &str,
        hard: bool,
    ) -> Result<(), PlaylistError> {
        if hard {
            self.storage
                .delete_page(page_id, "Delete playlist permanently")?;
        } else {
            self.storage.commit_content(
                page_id,
                SOFT_DELETE_STUB,
                "Soft-delete playlist by owner",
                &CommitOptions {
                    no_create: true,
                    ..Default::default()
                },
            )?;
        }
        self.remove_index_entry(owner, page_id)
    }

    /// Entries of the owner's playlist index, in page order.
    pub fn user_playlists(&self, owner: &str) -> Result<Vec<PlaylistRef>, PlaylistError> {
        let Some(content) = self.storage.fetch_content(&index_page_id(owner))? else {
            return Ok(Vec::new());
        };
        Ok(parse_index_entries(&content))
    }

    /// Adds a playlist to the owner's index, deduplicating against existing
    /// entries (used both at creation time and for "add to my library").
    pub fn ensure_index_entry(
        &self,
        owner: &str,
        page_id: &str,
        label: &str,
    ) -> Result<(), PlaylistError> {
        let index_id = index_page_id(owner);
        let link_line = format!("* [[{page_id}|{label}]]");

        let existing = self.storage.fetch_content(&index_id)?;
        let content = match existing {
            Some(content) if !content.trim().is_empty() => {
                if find_index_entry(&content, page_id).is_some() {
                    return Ok(());
                }
                let mut content = content;
                if !content.ends_with('\n') {
                    content.push('\n');
                }
                content.push_str(&link_line);
                content.push('\n');
                content
            }
            // first playlist ever: lay out the full library page
            _ => new_index_content(&link_line),
        };

        self.storage.commit_content(
            &index_id,
            &content,
            "Create/update playlist index",
            &CommitOptions::default(),
        )?;
        Ok(())
    }

    /// Adds an arbitrary existing playlist to the owner's library, looking
    /// up its current display name for the entry label.
    pub fn add_to_index(&self, owner: &str, page_id: &str) -> Result<(), PlaylistError> {
        let name = self.current_name(page_id)?;
        self.ensure_index_entry(owner, page_id, &name)
    }

    /// Drops a playlist's line from the owner's index, if present.
    pub fn remove_index_entry(&self, owner: &str, page_id: &str) -> Result<(), PlaylistError> {
        let index_id = index_page_id(owner);
        let Some(content) = self.storage.fetch_content(&index_id)? else {
            return Ok(());
        };

        let filtered: Vec<&str> = content
            .lines()
            .filter(|line| {
                parse_index_line(line)
                    .map(|entry| page_key(&entry.page_id) != page_key(page_id))
                    .unwrap_or(true)
            })
            .collect();

        let mut updated = filtered.join("\n");
        if content.ends_with('\n') {
            updated.push('\n');
        }
        while updated.contains("\n\n\n") {
            updated = updated.replace("\n\n\n", "\n\n");
        }

        if updated == content {
            return Ok(());
        }
        self.storage.commit_content(
            &index_id,
            &updated,
            "Remove playlist from profile",
            &CommitOptions {
                no_create: true,
                ..Default::default()
            },
        )?;
        Ok(())
    }

    fn rename_index_entry(
        &self,
        owner: &str,
        page_id: &str,
        new_name: &str,
    ) -> Result<(), PlaylistError> {
        let index_id = index_page_id(owner);
        let Some(content) = self.storage.fetch_content(&index_id)? else {
            return Ok(());
        };

        let updated: Vec<String> = content
            .lines()
            .map(|line| match parse_index_line(line) {
                Some(entry) if page_key(&entry.page_id) == page_key(page_id) => {
                    format!("* [[{}|{new_name}]]", entry.page_id)
                }
                _ => line.to_string(),
            })
            .collect();

        let mut updated = updated.join("\n");
        if content.ends_with('\n') {
            updated.push('\n');
        }
        if updated == content {
            return Ok(());
        }

        self.storage.commit_content(
            &index_id,
            &updated,
            "Rename playlist entry",
            &CommitOptions {
                no_create: true,
                ..Default::default()
            },
        )?;
        Ok(())
    }
}

pub fn index_page_id(owner: &str) -> String {
    format!("User:{owner}/Playlists")
}

/// Last path segment of a page identifier, underscores to spaces.
fn nice_name(page_id: &str) -> String {
    page_id
        .rsplit('/')
        .next()
        .unwrap_or(page_id)
        .replace('_', " ")
}

/// Wiki page titles treat spaces and underscores as the same character.
fn page_key(page_id: &str) -> String {
    page_id.trim().replace('_', " ")
}

/// Minimal valid playlist page: notitle magic words, a heading, and an empty
/// container carrying the display name (and cover, when given).
fn skeleton_document(name: &str, cover: Option<&str>) -> String {
    let escaped = crate::markup::escape_attr(name);
    let cover_attr = match cover {
        Some(cover) => format!(" data-cover=\"{}\"", crate::markup::escape_attr(cover)),
        None => String::new(),
    };
    format!(
        "__NOTITLE__ __NOEDITSECTION__\n\n\
         == {name} ==\n\n\
         <div class=\"{}\" data-title=\"{escaped}\"{cover_attr}>\n\
         </div>\n",
        tokens::CONTAINER_CLASS
    )
}

/// Machine-safe identifier: alphanumerics kept, separator runs collapsed to
/// single underscores, creation timestamp appended.
fn technical_name(human_name: &str) -> String {
    let mut base = String::new();
    for c in human_name.chars() {
        if c.is_alphanumeric() {
            base.push(c);
        } else if !base.is_empty() && !base.ends_with('_') {
            base.push('_');
        }
    }
    let base = base.trim_end_matches('_');
    let base = if base.is_empty() { "Playlist" } else { base };
    format!("{base}_{}", Utc::now().format("%Y%m%d%H%M%S"))
}

/// First `== heading ==` line of a page, if any.
fn first_heading(content: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim();
        let Some(inner) = trimmed
            .strip_prefix("==")
            .and_then(|rest| rest.strip_suffix("=="))
        else {
            continue;
        };
        let inner = inner.trim();
        if !inner.is_empty() && !inner.starts_with('=') {
            return Some(inner.to_string());
        }
    }
    None
}

fn replace_first_heading(text: &str, new_name: &str) -> String {
    let mut replaced = false;
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if !replaced && first_heading(line).is_some() {
                replaced = true;
                format!("== {new_name} ==")
            } else {
                line.to_string()
            }
        })
        .collect();

    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn parse_index_entries(content: &str) -> Vec<PlaylistRef> {
    content.lines().filter_map(parse_index_line).collect()
}

/// One `* [[page|name]]` index line; the display name falls back to the page
/// identifier when the pipe is absent.
fn parse_index_line(line: &str) -> Option<PlaylistRef> {
    let rest = line.trim_start().strip_prefix('*')?;
    let open = rest.find("[[")?;
    let close = rest[open..].find("]]")?;
    let body = &rest[open + 2..open + close];

    let (page_id, name) = match body.split_once('|') {
        Some((page, name)) => (page.trim(), name.trim()),
        None => (body.trim(), body.trim()),
    };
    if page_id.is_empty() {
        return None;
    }

    Some(PlaylistRef {
        page_id: page_id.to_string(),
        name: name.to_string(),
    })
}

fn find_index_entry(content: &str, page_id: &str) -> Option<PlaylistRef> {
    parse_index_entries(content)
        .into_iter()
        .find(|entry| page_key(&entry.page_id) == page_key(page_id))
}
