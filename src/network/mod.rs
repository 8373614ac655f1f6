//! # 网络模块
//!
//! 这个模块包含所有与资源获取和缓存相关的功能：
//!
//! - HTTP会话管理和资源下载
//! - 本地文件读取
//! - 内存中的网络资源缓存
//!
//! # 模块组织
//!
//! - `session` - HTTP会话管理、请求处理、资源下载
//! - `cache` - 按URL索引的内存缓存

pub mod cache;
pub mod session;

// Re-export commonly used items for convenience
pub use cache::{CacheStats, FetchCache};
pub use session::Session;
