//! 扩展名到媒体类型的查找表

const MEDIA_TYPES_BY_EXTENSION: &[(&str, &str)] = &[
    // Image
    (".avif", "image/avif"),
    (".bmp", "image/bmp"),
    (".gif", "image/gif"),
    (".ico", "image/x-icon"),
    (".jpeg", "image/jpeg"),
    (".jpg", "image/jpeg"),
    (".png", "image/png"),
    (".svg", "image/svg+xml"),
    (".webp", "image/webp"),
    // Font
    (".otf", "font/otf"),
    (".ttf", "font/ttf"),
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
    // Text
    (".css", "text/css"),
    (".htm", "text/html"),
    (".html", "text/html"),
    (".js", "application/javascript"),
    (".json", "application/json"),
    (".mjs", "application/javascript"),
    (".xml", "application/xml"),
    // Audio
    (".flac", "audio/x-flac"),
    (".mp3", "audio/mpeg"),
    (".ogg", "audio/ogg"),
    (".wav", "audio/wav"),
    // Video
    (".avi", "video/avi"),
    (".mov", "video/quicktime"),
    (".mp4", "video/mp4"),
    (".mpeg", "video/mpeg"),
    (".mpg", "video/mpeg"),
    (".webm", "video/webm"),
];

/// Looks up the media type for an extension given with its leading dot
///
/// Returns `None` for unknown or empty extensions.
pub fn media_type_for_extension(extension: &str) -> Option<&'static str> {
    MEDIA_TYPES_BY_EXTENSION
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, media_type)| *media_type)
}

/// Returns the extension of the last path segment, dot included
///
/// `"/img/logo.min.png"` gives `".png"`, `"/img/logo"` gives `""`.
pub fn file_extension(path: &str) -> &str {
    for (i, c) in path.char_indices().rev() {
        match c {
            '/' => break,
            '.' => return &path[i..],
            _ => {}
        }
    }

    ""
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_types() {
        assert_eq!(media_type_for_extension(".png"), Some("image/png"));
        assert_eq!(media_type_for_extension(".jpg"), Some("image/jpeg"));
        assert_eq!(media_type_for_extension(".css"), Some("text/css"));
        assert_eq!(media_type_for_extension(".svg"), Some("image/svg+xml"));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(media_type_for_extension(".PNG"), Some("image/png"));
        assert_eq!(media_type_for_extension(".Gif"), Some("image/gif"));
    }

    #[test]
    fn unknown_or_missing() {
        assert_eq!(media_type_for_extension(".unknown"), None);
        assert_eq!(media_type_for_extension(""), None);
        assert_eq!(media_type_for_extension("png"), None);
    }

    #[test]
    fn extension_of_last_segment() {
        assert_eq!(file_extension("/img/logo.min.png"), ".png");
        assert_eq!(file_extension("/img.d/logo"), "");
        assert_eq!(file_extension("logo."), ".");
        assert_eq!(file_extension(""), "");
    }
}
