//! URL 工具函数
//!
//! 负责 URL 分类（网络、本地文件、data URL）、本地路径规范化、
//! 相对引用解析以及 data URL 的生成和解析。

use std::env;
use std::path::{Component, Path, PathBuf};

use base64::{prelude::BASE64_STANDARD, Engine};
use percent_encoding::percent_decode_str;
pub use url::{ParseError, Url};

use crate::core::CompactError;
use crate::utils::mime::{file_extension, media_type_for_extension};

/// Media type used for data URLs whose extension has no known mapping
pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/png";

/// Where the bytes behind a URL live
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// `http` or `https`
    Network,
    /// `file`
    LocalFile,
    /// `data`, the payload is carried by the URL itself
    Data,
    /// Any other scheme
    Unrecognized,
}

/// Classifies a URL by its scheme, case-insensitively
pub fn classify_url(url: &Url) -> UrlKind {
    let scheme = url.scheme();

    if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        UrlKind::Network
    } else if scheme.eq_ignore_ascii_case("file") || scheme.is_empty() {
        UrlKind::LocalFile
    } else if scheme.eq_ignore_ascii_case("data") {
        UrlKind::Data
    } else {
        UrlKind::Unrecognized
    }
}

/// Turns a user-supplied target into an absolute URL
///
/// Anything without a scheme is treated as a local file path and made
/// absolute against the current working directory, so that references
/// found inside the document resolve against a proper `file://` base.
/// Windows drive paths such as `C:\pages\index.html` are also local paths.
pub fn fix_relative_path(target: &str) -> Result<Url, CompactError> {
    match Url::parse(target) {
        Ok(url) if !is_drive_letter(url.scheme()) => Ok(url),
        Ok(_) | Err(ParseError::RelativeUrlWithoutBase) => file_url_from_path(target),
        Err(e) => Err(CompactError::Parse(format!("{target}: {e}"))),
    }
}

fn is_drive_letter(scheme: &str) -> bool {
    scheme.len() == 1 && scheme.chars().all(|c| c.is_ascii_alphabetic())
}

fn file_url_from_path(path: &str) -> Result<Url, CompactError> {
    let path = Path::new(path);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = env::current_dir().map_err(|e| {
            CompactError::Parse(format!("cannot resolve \"{}\": {e}", path.display()))
        })?;
        cwd.join(path)
    };
    let absolute = normalize_path(&absolute);

    Url::from_file_path(&absolute).map_err(|_| {
        CompactError::Parse(format!(
            "could not map path \"{}\" to a file URL",
            absolute.display()
        ))
    })
}

// 词法规范化，去掉 "." 和 ".." 组件，不访问文件系统
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Resolves a reference found in a document against that document's own URL
pub fn resolve_url(base_url: &Url, reference: &str) -> Result<Url, CompactError> {
    base_url
        .join(reference)
        .map_err(|e| CompactError::Parse(format!("\"{reference}\" relative to {base_url}: {e}")))
}

/// Picks the media type for a resource from its path's extension
pub fn media_type_for_url(url: &Url) -> &'static str {
    media_type_for_extension(file_extension(url.path())).unwrap_or(DEFAULT_IMAGE_MEDIA_TYPE)
}

/// Builds a `data: <media type>;base64,<payload>` URL
pub fn create_data_url(media_type: &str, data: &[u8]) -> String {
    format!("data: {};base64,{}", media_type, BASE64_STANDARD.encode(data))
}

/// Splits a data URL into its media type and decoded payload
///
/// The media type defaults to `text/plain` when the header omits it.
pub fn parse_data_url(url: &Url) -> Result<(String, Vec<u8>), CompactError> {
    let (_, body) = url
        .as_str()
        .split_once(':')
        .ok_or_else(|| CompactError::Parse(format!("not a data URL: {url}")))?;
    let (header, payload) = body
        .split_once(',')
        .ok_or_else(|| CompactError::Parse(format!("data URL has no payload: {url}")))?;

    let header = header.trim();
    let is_base64 = header.to_ascii_lowercase().ends_with(";base64");
    let media_type = match header.split(';').next().map(str::trim) {
        Some(media_type) if !media_type.is_empty() => media_type.to_ascii_lowercase(),
        _ => "text/plain".to_string(),
    };

    let raw: Vec<u8> = percent_decode_str(payload).collect();
    let data = if is_base64 {
        let compacted: Vec<u8> = raw
            .into_iter()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        BASE64_STANDARD
            .decode(compacted)
            .map_err(|e| CompactError::Parse(format!("invalid base64 in data URL: {e}")))?
    } else {
        raw
    };

    Ok((media_type, data))
}

/// Checks whether `domain` is `parent` itself or one of its subdomains
pub fn domain_is_within_domain(domain: &str, parent: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    let parent = parent
        .trim_start_matches('.')
        .trim_end_matches('.')
        .to_ascii_lowercase();

    if parent.is_empty() {
        return false;
    }

    domain == parent
        || domain
            .strip_suffix(&parent)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_scheme() {
        let cases = [
            ("http://example.com/", UrlKind::Network),
            ("HTTPS://example.com/", UrlKind::Network),
            ("file:///tmp/index.html", UrlKind::LocalFile),
            ("data:text/plain,hi", UrlKind::Data),
            ("ftp://example.com/file", UrlKind::Unrecognized),
            ("mailto:someone@example.com", UrlKind::Unrecognized),
        ];

        for (input, expected) in cases {
            let url = Url::parse(input).unwrap();
            assert_eq!(classify_url(&url), expected, "{input}");
        }
    }

    #[test]
    fn relative_path_becomes_absolute_file_url() {
        let url = fix_relative_path("tests/index.html").unwrap();
        let expected = env::current_dir().unwrap().join("tests/index.html");

        assert_eq!(classify_url(&url), UrlKind::LocalFile);
        assert_eq!(url.to_file_path().unwrap(), expected);
    }

    #[test]
    fn parent_components_are_collapsed() {
        let url = fix_relative_path("/tmp/x/../y/./index.html").unwrap();
        assert_eq!(url.as_str(), "file:///tmp/y/index.html");
    }

    #[test]
    fn network_targets_are_kept() {
        let url = fix_relative_path("https://example.com/a/b.html?x=1").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a/b.html?x=1");
    }

    #[test]
    fn resolves_relative_references_against_document() {
        let base = Url::parse("file:///tmp/x/index.html").unwrap();

        assert_eq!(
            resolve_url(&base, "a.png").unwrap().as_str(),
            "file:///tmp/x/a.png"
        );
        assert_eq!(
            resolve_url(&base, "../css/site.css").unwrap().as_str(),
            "file:///tmp/css/site.css"
        );
        assert_eq!(
            resolve_url(&base, "https://cdn.example.com/x.js").unwrap().as_str(),
            "https://cdn.example.com/x.js"
        );
    }

    #[test]
    fn resolving_against_data_url_fails() {
        let base = Url::parse("data:text/html,<p>hi</p>").unwrap();
        assert!(matches!(
            resolve_url(&base, "a.png"),
            Err(CompactError::Parse(_))
        ));
    }

    #[test]
    fn data_url_format() {
        assert_eq!(
            create_data_url("image/png", b"\x89PNG"),
            "data: image/png;base64,iVBORw=="
        );
    }

    #[test]
    fn media_type_falls_back_to_png() {
        let known = Url::parse("https://example.com/photo.JPG").unwrap();
        let unknown = Url::parse("https://example.com/blob").unwrap();

        assert_eq!(media_type_for_url(&known), "image/jpeg");
        assert_eq!(media_type_for_url(&unknown), DEFAULT_IMAGE_MEDIA_TYPE);
    }

    #[test]
    fn parses_base64_data_url() {
        let url = Url::parse("data:text/html;base64,PGgxPmhpPC9oMT4=").unwrap();
        let (media_type, data) = parse_data_url(&url).unwrap();

        assert_eq!(media_type, "text/html");
        assert_eq!(data, b"<h1>hi</h1>");
    }

    #[test]
    fn parses_percent_encoded_data_url() {
        let url = Url::parse("data:,Hello%2C%20World").unwrap();
        let (media_type, data) = parse_data_url(&url).unwrap();

        assert_eq!(media_type, "text/plain");
        assert_eq!(data, b"Hello, World");
    }

    #[test]
    fn domain_matching() {
        assert!(domain_is_within_domain("example.com", "example.com"));
        assert!(domain_is_within_domain("cdn.example.com", "example.com"));
        assert!(domain_is_within_domain("CDN.Example.com.", ".example.com"));
        assert!(!domain_is_within_domain("badexample.com", "example.com"));
        assert!(!domain_is_within_domain("example.com", ""));
    }
}
