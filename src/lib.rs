//! # Compact Library
//!
//! 将网页（HTTP URL、本地文件或 data URL）保存为单一的自包含 HTML 文件：
//! 图片转换为 data URL，外部样式表和脚本被内联，样式表中的背景图片同样被内联。
//!
//! ## 模块组织
//!
//! - `core` - 转换器、排除策略和错误类型
//! - `parsers` - HTML 和 CSS 中外部引用的查找与替换
//! - `network` - 资源获取和缓存
//! - `utils` - URL 分类、data URL 和媒体类型查找
//! - `env` - 环境变量配置

pub mod core;
pub mod env;
pub mod network;
pub mod parsers;
pub mod utils;

// Re-export commonly used items for convenience
pub use crate::core::{
    convert, CompactError, CompactOptions, ConversionReport, Converter, ExclusionPolicy, Outcome,
    ReferenceOutcome, ResourceKind,
};
pub use crate::network::{CacheStats, FetchCache, Session};
pub use crate::utils::url::{classify_url, UrlKind};
