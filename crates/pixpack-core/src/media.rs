//! MIME tagging by file-name suffix

/// MIME type for content whose suffix is not a known image format
pub const DEFAULT_MIME: &str = "application/octet-stream";

const KNOWN_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("json", "application/json"),
];

/// Guess the MIME type of a named entry from its extension (case-insensitive)
pub fn mime_for_name(name: &str) -> &'static str {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return DEFAULT_MIME;
    };
    KNOWN_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_suffixes() {
        assert_eq!(mime_for_name("a.png"), "image/png");
        assert_eq!(mime_for_name("photo.JPG"), "image/jpeg");
        assert_eq!(mime_for_name("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for_name("design.json"), "application/json");
    }

    #[test]
    fn test_unknown_suffix() {
        assert_eq!(mime_for_name("notes.txt"), DEFAULT_MIME);
        assert_eq!(mime_for_name("README"), DEFAULT_MIME);
    }
}
