//! HTML 外部资源内联
//!
//! 通过模式匹配（而不是 DOM 解析）在 HTML 文本中查找：
//!
//! - `<img src="...">` 图片，替换为 data URL
//! - `<script src="..."></script>` 外部脚本，替换为内联脚本
//! - `<link rel="stylesheet" href="...">` 样式表，替换为 `<style>` 元素，
//!   样式表中的背景图片同样被内联
//!
//! 不匹配的文本原样保留；单个引用失败只会被记录，不会中断整个转换。

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::core::{Outcome, ResourceKind};
use crate::network::session::Session;
use crate::parsers::css::embed_css_backgrounds;
use crate::utils::url::{classify_url, resolve_url, Url, UrlKind};

static IMAGE_RE: OnceLock<Regex> = OnceLock::new();
static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
static LINK_RE: OnceLock<Regex> = OnceLock::new();
static STYLESHEET_REL_RE: OnceLock<Regex> = OnceLock::new();

fn image_regex() -> &'static Regex {
    IMAGE_RE.get_or_init(|| {
        Regex::new(r#"(?i)(<img\s*[^>]*\s*src=")([^">]+)("[^>]*>)"#)
            .expect("image pattern is valid")
    })
}

fn script_regex() -> &'static Regex {
    SCRIPT_RE.get_or_init(|| {
        Regex::new(r#"(?i)(<script\s*[^>]*\s*)(src=")([^">]+)(")([^>]*>)(\s*</script>)"#)
            .expect("script pattern is valid")
    })
}

fn link_regex() -> &'static Regex {
    LINK_RE.get_or_init(|| {
        Regex::new(r#"(?i)(<link)(\s*[^>]*\s*)(href=")([^"]+)(")([^>]*>)"#)
            .expect("link pattern is valid")
    })
}

// 只接受 rel="stylesheet" 这一种写法（区分大小写）
fn stylesheet_rel_regex() -> &'static Regex {
    STYLESHEET_REL_RE.get_or_init(|| {
        Regex::new(r#"\s+rel\s*=\s*"stylesheet""#).expect("rel pattern is valid")
    })
}

/// Resolves a raw reference against the document it was found in
///
/// A reference that cannot be parsed is logged, recorded as failed and
/// yields `None`.
pub(crate) fn resolve_reference(
    session: &mut Session,
    kind: ResourceKind,
    document_url: &Url,
    raw: &str,
) -> Option<Url> {
    match resolve_url(document_url, raw) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("skipping {} reference: {}", kind, e);
            session.record(kind, raw, Outcome::Failed(e.to_string()));
            None
        }
    }
}

pub(crate) fn is_excluded<F>(
    session: &mut Session,
    kind: ResourceKind,
    url: &Url,
    exclude: &F,
) -> bool
where
    F: Fn(&Url) -> bool,
{
    if exclude(url) {
        tracing::debug!("excluded {} {}", kind, url);
        session.record(kind, url.as_str(), Outcome::Excluded);
        true
    } else {
        false
    }
}

pub(crate) fn record_failure(
    session: &mut Session,
    kind: ResourceKind,
    url: &Url,
    reason: String,
) {
    tracing::warn!("failed to inline {} {}: {}", kind, url, reason);
    session.record(kind, url.as_str(), Outcome::Failed(reason));
}

/// Replaces the `src` of every `<img>` with a data URL of the image
pub fn embed_images<F>(session: &mut Session, document_url: &Url, html: &str, exclude: F) -> String
where
    F: Fn(&Url) -> bool,
{
    let kind = ResourceKind::ContentImage;

    image_regex()
        .replace_all(html, |caps: &Captures| {
            let original = caps[0].to_string();

            let image_url = match resolve_reference(session, kind, document_url, &caps[2]) {
                Some(url) => url,
                None => return original,
            };

            if classify_url(&image_url) == UrlKind::Data
                || is_excluded(session, kind, &image_url, &exclude)
            {
                return original;
            }

            match session.retrieve_data_url(&image_url) {
                Ok(data_url) => {
                    session.record(kind, image_url.as_str(), Outcome::Inlined);
                    format!("{}{}{}", &caps[1], data_url, &caps[3])
                }
                Err(e) => {
                    record_failure(session, kind, &image_url, e.to_string());
                    original
                }
            }
        })
        .into_owned()
}

/// Turns every external `<script src>` into an inline script
///
/// The opening tag keeps its other attributes; the fetched source becomes
/// the element's body verbatim. Script bytes that are not valid UTF-8 are
/// replaced with U+FFFD, since the document is rewritten as text.
pub fn embed_scripts<F>(session: &mut Session, document_url: &Url, html: &str, exclude: F) -> String
where
    F: Fn(&Url) -> bool,
{
    let kind = ResourceKind::Script;

    script_regex()
        .replace_all(html, |caps: &Captures| {
            let original = caps[0].to_string();

            let script_url = match resolve_reference(session, kind, document_url, &caps[3]) {
                Some(url) => url,
                None => return original,
            };

            if is_excluded(session, kind, &script_url, &exclude) {
                return original;
            }

            match session.fetch(&script_url) {
                Ok(data) => {
                    session.record(kind, script_url.as_str(), Outcome::Inlined);
                    format!(
                        "{}{}{}{}",
                        &caps[1],
                        &caps[5],
                        String::from_utf8_lossy(&data),
                        &caps[6]
                    )
                }
                Err(e) => {
                    record_failure(session, kind, &script_url, e.to_string());
                    original
                }
            }
        })
        .into_owned()
}

/// Turns every `<link rel="stylesheet">` into a `<style>` element
///
/// Background images inside the fetched stylesheet are inlined as well,
/// resolved against the stylesheet's own URL and filtered by
/// `exclude_image`. `<link>` tags with any other `rel` are left alone.
pub fn embed_stylesheets<F, G>(
    session: &mut Session,
    document_url: &Url,
    html: &str,
    exclude: F,
    exclude_image: G,
) -> String
where
    F: Fn(&Url) -> bool,
    G: Fn(&Url) -> bool,
{
    let kind = ResourceKind::Stylesheet;

    link_regex()
        .replace_all(html, |caps: &Captures| {
            let original = caps[0].to_string();

            if !stylesheet_rel_regex().is_match(&original) {
                return original;
            }

            let css_url = match resolve_reference(session, kind, document_url, &caps[4]) {
                Some(url) => url,
                None => return original,
            };

            if is_excluded(session, kind, &css_url, &exclude) {
                return original;
            }

            match session.fetch(&css_url) {
                Ok(data) => {
                    session.record(kind, css_url.as_str(), Outcome::Inlined);
                    let css = String::from_utf8_lossy(&data);
                    let css = embed_css_backgrounds(session, &css_url, &css, &exclude_image);
                    format!("<style{}{}{}</style>", &caps[2], caps[6].replace("/>", ">"), css)
                }
                Err(e) => {
                    record_failure(session, kind, &css_url, e.to_string());
                    original
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CompactOptions;

    fn session() -> Session {
        Session::new(CompactOptions::default()).unwrap()
    }

    fn fixture(files: &[(&str, &str)]) -> (tempfile::TempDir, Url) {
        let dir = tempfile::tempdir().unwrap();
        for (name, data) in files {
            std::fs::write(dir.path().join(name), data).unwrap();
        }
        let url = Url::from_file_path(dir.path().join("index.html")).unwrap();
        (dir, url)
    }

    #[test]
    fn image_src_becomes_data_url() {
        let (_dir, url) = fixture(&[("a.png", "png")]);
        let mut session = session();

        let html = r#"<p><img class="logo" src="a.png" alt="A"></p>"#;
        let result = embed_images(&mut session, &url, html, |_| false);

        assert_eq!(
            result,
            r#"<p><img class="logo" src="data: image/png;base64,cG5n" alt="A"></p>"#
        );
    }

    #[test]
    fn image_tag_is_case_insensitive() {
        let (_dir, url) = fixture(&[("a.png", "png")]);
        let mut session = session();

        let result = embed_images(&mut session, &url, r#"<IMG SRC="a.png">"#, |_| false);
        assert_eq!(result, r#"<IMG SRC="data: image/png;base64,cG5n">"#);
    }

    #[test]
    fn data_images_are_left_alone() {
        let (_dir, url) = fixture(&[]);
        let mut session = session();

        let html = r#"<img src="data:image/gif;base64,R0lGODlh">"#;
        assert_eq!(embed_images(&mut session, &url, html, |_| false), html);
        assert!(session.take_report().outcomes.is_empty());
    }

    #[test]
    fn missing_image_is_kept_and_reported() {
        let (_dir, url) = fixture(&[]);
        let mut session = session();

        let html = r#"<img src="missing.png">"#;
        assert_eq!(embed_images(&mut session, &url, html, |_| false), html);

        let report = session.take_report();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[0].kind, ResourceKind::ContentImage);
    }

    #[test]
    fn excluded_image_is_kept() {
        let (_dir, url) = fixture(&[("a.png", "png"), ("b.png", "png")]);
        let mut session = session();

        let html = r#"<img src="a.png"><img src="b.png">"#;
        let result = embed_images(&mut session, &url, html, |u| u.path().ends_with("/b.png"));

        assert_eq!(
            result,
            r#"<img src="data: image/png;base64,cG5n"><img src="b.png">"#
        );
    }

    #[test]
    fn external_script_is_inlined() {
        let (_dir, url) = fixture(&[("app.js", "console.log(1);")]);
        let mut session = session();

        let html = "<script type=\"text/javascript\" src=\"app.js\" defer></script>";
        let result = embed_scripts(&mut session, &url, html, |_| false);

        assert_eq!(
            result,
            "<script type=\"text/javascript\"  defer>console.log(1);</script>"
        );
    }

    #[test]
    fn invalid_utf8_in_script_is_replaced() {
        let (dir, url) = fixture(&[]);
        std::fs::write(dir.path().join("latin1.js"), b"var s = '\xe9';").unwrap();
        let mut session = session();

        let html = r#"<script src="latin1.js"></script>"#;
        let result = embed_scripts(&mut session, &url, html, |_| false);

        assert_eq!(result, "<script >var s = '\u{FFFD}';</script>");
    }

    #[test]
    fn inline_scripts_are_untouched() {
        let (_dir, url) = fixture(&[]);
        let mut session = session();

        let html = "<script>var src = \"x.js\";</script>";
        assert_eq!(embed_scripts(&mut session, &url, html, |_| false), html);
    }

    #[test]
    fn stylesheet_link_becomes_style() {
        let (_dir, url) = fixture(&[("style.css", "p { color: red; }")]);
        let mut session = session();

        let html = r#"<link rel="stylesheet" href="style.css" media="all" />"#;
        let result = embed_stylesheets(&mut session, &url, html, |_| false, |_| false);

        assert_eq!(
            result,
            r#"<style rel="stylesheet"  media="all" >p { color: red; }</style>"#
        );
    }

    #[test]
    fn stylesheet_background_is_resolved_against_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(
            dir.path().join("css/site.css"),
            "body { background-image: url('bg.png'); }",
        )
        .unwrap();
        std::fs::write(dir.path().join("css/bg.png"), "png").unwrap();
        let url = Url::from_file_path(dir.path().join("index.html")).unwrap();
        let mut session = session();

        let html = r#"<link rel="stylesheet" href="css/site.css">"#;
        let result = embed_stylesheets(&mut session, &url, html, |_| false, |_| false);

        assert_eq!(
            result,
            r#"<style rel="stylesheet" >body { background-image: url("data: image/png;base64,cG5n"); }</style>"#
        );
    }

    #[test]
    fn other_links_are_untouched() {
        let (_dir, url) = fixture(&[("favicon.ico", "ico"), ("style.css", "p {}")]);
        let mut session = session();

        let html = concat!(
            r#"<link rel="icon" href="favicon.ico">"#,
            r#"<link href="style.css">"#,
            r#"<link rel='stylesheet' href="style.css">"#,
        );
        assert_eq!(
            embed_stylesheets(&mut session, &url, html, |_| false, |_| false),
            html
        );
    }

    #[test]
    fn failed_stylesheet_keeps_link() {
        let (_dir, url) = fixture(&[]);
        let mut session = session();

        let html = r#"<link rel="stylesheet" href="style.css">"#;
        assert_eq!(
            embed_stylesheets(&mut session, &url, html, |_| false, |_| false),
            html
        );
        assert_eq!(session.take_report().failed(), 1);
    }
}
