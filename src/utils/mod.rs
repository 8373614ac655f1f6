//! # 工具模块
//!
//! 这个模块包含各种工具函数和实用程序：
//!
//! - URL分类、规范化和相对引用解析
//! - 数据URL创建和解析
//! - 扩展名到媒体类型的查找
//!
//! # 模块组织
//!
//! - `url` - URL处理、数据URL、域名匹配等工具函数
//! - `mime` - 媒体类型查找表

pub mod mime;
pub mod url;

// Re-export commonly used items for convenience
pub use mime::{file_extension, media_type_for_extension};
pub use url::{
    classify_url, create_data_url, domain_is_within_domain, fix_relative_path,
    media_type_for_url, parse_data_url, resolve_url, Url, UrlKind, DEFAULT_IMAGE_MEDIA_TYPE,
};
