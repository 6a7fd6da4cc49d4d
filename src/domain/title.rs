//! Canonicalization of file-reference titles.
//!
//! Every file key stored in a [`crate::domain::track::Track`] or an artwork
//! map goes through [`normalize`]; nothing else in the crate builds file keys
//! by hand. Matching across capitalization or spacing variants always uses
//! [`comparison_key`].

/// Namespace prefix carried by every canonical file reference.
pub const FILE_NAMESPACE: &str = "File:";

/// Produces the canonical form of a file reference: percent-decoded,
/// `File:`-prefixed, underscores replaced by spaces.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut title = decode_fixpoint(raw.trim());

    if !has_file_namespace(&title) {
        title.insert_str(0, FILE_NAMESPACE);
    }

    title.replace('_', " ")
}

/// Case- and whitespace-insensitive key for matching externally supplied
/// titles (the storage API may capitalize or format titles differently than
/// the source markup).
pub fn comparison_key(raw: &str) -> String {
    normalize(raw).trim().to_lowercase()
}

/// Whether a raw title already starts with the file namespace prefix, in
/// any capitalization.
pub fn has_file_namespace(title: &str) -> bool {
    // byte-wise so a multibyte character near the start cannot split a slice
    title.len() >= FILE_NAMESPACE.len()
        && title.as_bytes()[..FILE_NAMESPACE.len()].eq_ignore_ascii_case(FILE_NAMESPACE.as_bytes())
}

/// Percent-decodes until stable, so that normalize stays idempotent even for
/// inputs that were encoded more than once. Every successful decode either
/// leaves the string unchanged or strictly shortens it, so the loop
/// terminates on its own.
fn decode_fixpoint(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let decoded = match urlencoding::decode(&current) {
            Ok(d) => d.into_owned(),
            // not valid UTF-8 once decoded: keep the last good form
            Err(_) => return current,
        };
        if decoded == current {
            return current;
        }
        current = decoded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_added_when_missing() {
        assert_eq!(normalize("Track1.mp3"), "File:Track1.mp3");
        assert_eq!(normalize("File:Track1.mp3"), "File:Track1.mp3");
    }

    #[test]
    fn test_prefix_check_is_case_insensitive() {
        // must not become "File:file:Track1.mp3"
        assert_eq!(normalize("file:Track1.mp3"), "file:Track1.mp3");
    }

    #[test]
    fn test_underscores_become_spaces() {
        assert_eq!(
            normalize("File:Napoleon_crossing_the_Rhine.mp3"),
            "File:Napoleon crossing the Rhine.mp3"
        );
        // each underscore maps to one space, runs are not collapsed
        assert_eq!(normalize("A__B.mp3"), "File:A  B.mp3");
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            normalize("File:Wit_%26_Mirth.mp3"),
            "File:Wit & Mirth.mp3"
        );
        // five encoding layers collapse in a single call
        assert_eq!(normalize("File:%2525252525.mp3"), "File:%.mp3");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [
            "File:Track1.mp3",
            "Track1.mp3",
            "File:Wit_and_Mirth.png",
            "File:100%25_Pure.mp3",
            "  File:Leading space.mp3 ",
            "File:A%2525B.mp3",
            // many encoding layers must still reach the fixpoint in one call
            "File:%2525252525.mp3",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_comparison_key_folds_case() {
        assert_eq!(
            comparison_key("file:TRACK_one.MP3"),
            comparison_key("File:track one.mp3")
        );
    }
}
