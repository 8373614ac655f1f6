//! 网络资源缓存
//!
//! 以完整的绝对 URL（包括查询字符串和片段）为键保存已下载的原始字节。
//! 只有网络 URL 会进入缓存；本地文件每次都重新读取，data URL 本身就携带数据。
//! 条目在缓存的整个生命周期内都不会过期或被淘汰。
//!
//! 缓存由单一所有者持有（见 [`crate::network::session::Session`]），
//! 修改需要 `&mut self`。需要在线程之间共享时，请将持有者放进 `Mutex`。

use std::collections::HashMap;

use url::Url;

/// 缓存统计信息
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Exact-URL keyed store of fetched network resources
#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<Url, Vec<u8>>,
    stats: CacheStats,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached bytes, counting the lookup as a hit or miss
    pub fn get(&mut self, url: &Url) -> Option<Vec<u8>> {
        match self.entries.get(url) {
            Some(data) => {
                self.stats.hits += 1;
                Some(data.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, url: Url, data: Vec<u8>) {
        self.entries.insert(url, data);
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
