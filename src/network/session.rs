//! HTTP会话管理和资源获取
//!
//! `Session` 持有阻塞式 HTTP 客户端、网络资源缓存和本次转换的引用处理报告。
//! 所有读取都是同步阻塞的，失败时不会重试。

use std::fs;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use url::Url;

use crate::core::{CompactError, CompactOptions, ConversionReport, Outcome, ResourceKind};
use crate::network::cache::{CacheStats, FetchCache};
use crate::utils::url::{classify_url, create_data_url, media_type_for_url, UrlKind};

pub const DEFAULT_USER_AGENT: &str = concat!("compact/", env!("CARGO_PKG_VERSION"));

/// Fetches documents and sub-resources for a conversion
pub struct Session {
    client: Client,
    cache: FetchCache,
    pub options: CompactOptions,
    report: ConversionReport,
}

impl Session {
    pub fn new(options: CompactOptions) -> Result<Session, CompactError> {
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(options.insecure);
        if options.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(options.timeout));
        }

        let client = builder
            .build()
            .map_err(|e| CompactError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Session {
            client,
            cache: FetchCache::new(),
            options,
            report: ConversionReport::default(),
        })
    }

    /// Retrieves the raw bytes behind a network or local-file URL
    ///
    /// Network responses are cached by their exact URL; a second request
    /// for the same URL never reaches the network. Local files are read
    /// fresh every time.
    pub fn fetch(&mut self, url: &Url) -> Result<Vec<u8>, CompactError> {
        match classify_url(url) {
            UrlKind::Network => {
                if let Some(data) = self.cache.get(url) {
                    tracing::trace!("cache hit for {}", url);
                    return Ok(data);
                }

                let data = self.fetch_remote(url)?;
                self.cache.insert(url.clone(), data.clone());
                Ok(data)
            }
            UrlKind::LocalFile => {
                let path = url
                    .to_file_path()
                    .map_err(|_| CompactError::Fetch(format!("invalid file URL {url}")))?;
                fs::read(&path)
                    .map_err(|e| CompactError::Fetch(format!("{}: {e}", path.display())))
            }
            UrlKind::Data | UrlKind::Unrecognized => {
                Err(CompactError::Fetch(format!("unrecognized URL {url}")))
            }
        }
    }

    fn fetch_remote(&self, url: &Url) -> Result<Vec<u8>, CompactError> {
        tracing::debug!("fetching {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| CompactError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CompactError::Fetch(format!(
                "response code of {url} is {status}, not 200"
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| CompactError::Fetch(format!("{url}: {e}")))?;

        Ok(body.to_vec())
    }

    /// Fetches a resource and encodes it as a data URL
    ///
    /// Must not be handed a URL that is already a data URL.
    pub fn retrieve_data_url(&mut self, url: &Url) -> Result<String, CompactError> {
        if classify_url(url) == UrlKind::Data {
            return Err(CompactError::Encode(format!(
                "{url} is already a data URL"
            )));
        }

        let data = self.fetch(url)?;
        Ok(create_data_url(media_type_for_url(url), &data))
    }

    pub fn record(&mut self, kind: ResourceKind, reference: &str, outcome: Outcome) {
        self.report.push(kind, reference, outcome);
    }

    /// Hands over the outcomes recorded since the last call
    pub fn take_report(&mut self) -> ConversionReport {
        std::mem::take(&mut self.report)
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
