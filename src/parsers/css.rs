//! CSS 背景图片处理
//!
//! 在样式表文本中查找 `background` / `background-image` 声明，
//! 将其中 `url(...)` 引用的图片替换为 data URL。
//!
//! 匹配是非贪婪的，止于声明后的第一个分号；引号内或注释中含有分号的
//! 声明可能被截断，这种情况下该声明保持原样或只被部分处理。

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::core::{Outcome, ResourceKind};
use crate::network::session::Session;
use crate::parsers::html::{is_excluded, record_failure, resolve_reference};
use crate::utils::url::{classify_url, Url, UrlKind};

static BACKGROUND_RE: OnceLock<Regex> = OnceLock::new();

fn background_regex() -> &'static Regex {
    BACKGROUND_RE.get_or_init(|| {
        Regex::new(r"(?Ui)(background(-image)?\s*:\s*[^;]*url\()(.+)(\)[^;]*;)")
            .expect("background pattern is valid")
    })
}

/// Inlines the images referenced by `background` declarations
///
/// `stylesheet_url` is the URL the stylesheet itself was loaded from;
/// relative image references resolve against it. References that are
/// already data URLs are left as they are.
pub fn embed_css_backgrounds<F>(
    session: &mut Session,
    stylesheet_url: &Url,
    css: &str,
    exclude: F,
) -> String
where
    F: Fn(&Url) -> bool,
{
    let kind = ResourceKind::CssImage;

    background_regex()
        .replace_all(css, |caps: &Captures| {
            let original = caps[0].to_string();
            let src = caps[3].trim_matches(|c: char| matches!(c, '"' | '\'' | ' '));

            let Some(image_url) = resolve_reference(session, kind, stylesheet_url, src) else {
                return original;
            };

            if classify_url(&image_url) == UrlKind::Data
                || is_excluded(session, kind, &image_url, &exclude)
            {
                return original;
            }

            match session.retrieve_data_url(&image_url) {
                Ok(data_url) => {
                    session.record(kind, image_url.as_str(), Outcome::Inlined);
                    format!("{}\"{}\"{}", &caps[1], data_url, &caps[4])
                }
                Err(e) => {
                    record_failure(session, kind, &image_url, e.to_string());
                    original
                }
            }
        })
        .into_owned()
}
