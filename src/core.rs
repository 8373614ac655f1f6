use std::fmt;

use thiserror::Error;
use url::Url;

use crate::network::cache::CacheStats;
use crate::network::session::Session;
use crate::parsers::html::{embed_images, embed_scripts, embed_stylesheets};
use crate::utils::url::{classify_url, fix_relative_path, parse_data_url, UrlKind};

/// Represents errors that can occur while compacting a document
#[derive(Debug, Error)]
pub enum CompactError {
    /// A reference or target could not be parsed as a URL
    #[error("parse error: {0}")]
    Parse(String),
    /// Transport failure, non-200 response, file I/O failure or unknown scheme
    #[error("fetch error: {0}")]
    Fetch(String),
    /// A resource could not be turned into a data URL
    #[error("encode error: {0}")]
    Encode(String),
    /// Invalid options or environment values
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration options for fetching
#[derive(Clone, Debug, Default)]
pub struct CompactOptions {
    /// Network timeout in seconds, `0` keeps the HTTP client's default
    pub timeout: u64,
    pub user_agent: Option<String>,
    /// Accept invalid TLS certificates
    pub insecure: bool,
}

/// The kinds of references a document can embed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `<img src>` in the document
    ContentImage,
    /// `background` / `background-image` inside a stylesheet
    CssImage,
    /// `<link rel="stylesheet" href>`
    Stylesheet,
    /// `<script src>`
    Script,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ResourceKind::ContentImage => "image",
            ResourceKind::CssImage => "background image",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Script => "script",
        };
        f.write_str(name)
    }
}

/// A pure test on a resolved absolute URL; `true` keeps the reference as written
pub type Predicate = Box<dyn Fn(&Url) -> bool + Send + Sync>;

/// Which references to leave untouched
///
/// A reference is excluded when the general predicate or the predicate
/// for its kind returns `true`. The general predicate is evaluated first.
#[derive(Default)]
pub struct ExclusionPolicy {
    pub general: Option<Predicate>,
    pub content_image: Option<Predicate>,
    pub css_image: Option<Predicate>,
    pub stylesheet: Option<Predicate>,
    pub script: Option<Predicate>,
}

impl ExclusionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_all<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.general = Some(Box::new(predicate));
        self
    }

    pub fn exclude_content_images<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.content_image = Some(Box::new(predicate));
        self
    }

    pub fn exclude_css_images<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.css_image = Some(Box::new(predicate));
        self
    }

    pub fn exclude_stylesheets<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.stylesheet = Some(Box::new(predicate));
        self
    }

    pub fn exclude_scripts<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.script = Some(Box::new(predicate));
        self
    }

    /// Checks a resolved URL against the general and kind-specific predicates
    pub fn excludes(&self, kind: ResourceKind, url: &Url) -> bool {
        if self.general.as_ref().is_some_and(|p| p(url)) {
            return true;
        }

        let specific = match kind {
            ResourceKind::ContentImage => &self.content_image,
            ResourceKind::CssImage => &self.css_image,
            ResourceKind::Stylesheet => &self.stylesheet,
            ResourceKind::Script => &self.script,
        };

        specific.as_ref().is_some_and(|p| p(url))
    }
}

impl fmt::Debug for ExclusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExclusionPolicy")
            .field("general", &self.general.is_some())
            .field("content_image", &self.content_image.is_some())
            .field("css_image", &self.css_image.is_some())
            .field("stylesheet", &self.stylesheet.is_some())
            .field("script", &self.script.is_some())
            .finish()
    }
}

/// What happened to a single reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Inlined,
    Excluded,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceOutcome {
    pub kind: ResourceKind,
    /// The resolved URL, or the raw text when it could not be resolved
    pub reference: String,
    pub outcome: Outcome,
}

/// Per-reference outcomes of one conversion, in the order they were processed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub outcomes: Vec<ReferenceOutcome>,
}

impl ConversionReport {
    pub fn push(&mut self, kind: ResourceKind, reference: &str, outcome: Outcome) {
        self.outcomes.push(ReferenceOutcome {
            kind,
            reference: reference.to_string(),
            outcome,
        });
    }

    pub fn inlined(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Inlined))
    }

    pub fn excluded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Excluded))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// `true` when no reference had to be skipped because of an error
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, filter: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| filter(&r.outcome)).count()
    }
}

/// Turns a page into a single self-contained document
///
/// The converter owns the network cache, so repeated conversions through
/// the same instance reuse previously downloaded resources. It is meant to
/// be driven from one thread at a time; wrap it in a `Mutex` to share it.
pub struct Converter {
    session: Session,
    pub policy: ExclusionPolicy,
}

impl Converter {
    pub fn new(options: CompactOptions) -> Result<Converter, CompactError> {
        Converter::with_policy(options, ExclusionPolicy::default())
    }

    pub fn with_policy(
        options: CompactOptions,
        policy: ExclusionPolicy,
    ) -> Result<Converter, CompactError> {
        Ok(Converter {
            session: Session::new(options)?,
            policy,
        })
    }

    /// Converts the document at `target` (URL, file path or data URL)
    ///
    /// Fails only when the document itself cannot be retrieved; references
    /// that cannot be inlined are kept as written. The document, its scripts
    /// and stylesheets are decoded as UTF-8, invalid bytes become U+FFFD.
    pub fn convert(&mut self, target: &str) -> Result<String, CompactError> {
        self.convert_with_report(target).map(|(content, _)| content)
    }

    /// Like [`Converter::convert`], also reporting what happened to every reference
    pub fn convert_with_report(
        &mut self,
        target: &str,
    ) -> Result<(String, ConversionReport), CompactError> {
        let document_url = fix_relative_path(target)?;
        let data = self.retrieve_document(&document_url)?;
        let content = String::from_utf8_lossy(&data);

        // 丢弃上一次转换遗留的记录
        self.session.take_report();

        let Converter { session, policy } = self;

        // 顺序固定：图片、脚本、样式表
        let content = embed_images(session, &document_url, &content, |url| {
            policy.excludes(ResourceKind::ContentImage, url)
        });
        let content = embed_scripts(session, &document_url, &content, |url| {
            policy.excludes(ResourceKind::Script, url)
        });
        let content = embed_stylesheets(
            session,
            &document_url,
            &content,
            |url| policy.excludes(ResourceKind::Stylesheet, url),
            |url| policy.excludes(ResourceKind::CssImage, url),
        );

        let report = session.take_report();
        tracing::info!(
            "compacted {}: {} inlined, {} excluded, {} failed",
            document_url,
            report.inlined(),
            report.excluded(),
            report.failed()
        );

        Ok((content, report))
    }

    fn retrieve_document(&mut self, document_url: &Url) -> Result<Vec<u8>, CompactError> {
        if classify_url(document_url) != UrlKind::Data {
            return self.session.fetch(document_url);
        }

        let (media_type, data) = parse_data_url(document_url)?;
        if media_type != "text/html" {
            return Err(CompactError::Parse(format!(
                "can only process HTML documents from data URLs, got {media_type}"
            )));
        }
        Ok(data)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.session.cache_stats()
    }
}

/// Converts `target` with a single predicate applied to every kind of reference
pub fn convert<F>(target: &str, exclude: F) -> Result<String, CompactError>
where
    F: Fn(&Url) -> bool + Send + Sync + 'static,
{
    let policy = ExclusionPolicy::new().exclude_all(exclude);
    Converter::with_policy(CompactOptions::default(), policy)?.convert(target)
}

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// Prints an error message to stderr, in red when stderr is a terminal
pub fn print_error_message(msg: &str, no_color: bool) {
    if !no_color && atty::is(atty::Stream::Stderr) {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    } else {
        eprintln!("{msg}");
    }
}

/// Prints an info message to stdout
pub fn print_info_message(msg: &str) {
    println!("{msg}");
}
