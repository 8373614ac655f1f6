//! # 解析器模块
//!
//! 这个模块包含在文档文本中查找并内联外部资源的功能：
//!
//! - HTML中的图片、脚本和样式表
//! - 样式表中的背景图片
//!
//! # 模块组织
//!
//! - `html` - `<img>`、`<script>`、`<link rel="stylesheet">` 的内联
//! - `css` - `background` / `background-image` 声明中图片的内联

pub mod css;
pub mod html;

// Re-export commonly used items for convenience
pub use css::embed_css_backgrounds;
pub use html::{embed_images, embed_scripts, embed_stylesheets};
