// 集成测试公共模块
//
// 提供临时目录中的页面夹具

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use base64::{prelude::BASE64_STANDARD, Engine};
use tempfile::TempDir;

/// A page and its resources laid out in a temporary directory
pub struct Site {
    dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn with_file(self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(path, contents).expect("write fixture");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Absolute path of `name` as a string target
    pub fn target(&self, name: &str) -> String {
        self.file(name).to_string_lossy().into_owned()
    }
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

/// Extracts and decodes the payload of the first `data: <type>;base64,` URL in `text`
pub fn first_data_url_payload(text: &str, media_type: &str) -> Option<Vec<u8>> {
    let prefix = format!("data: {media_type};base64,");
    let start = text.find(&prefix)? + prefix.len();
    let end = text[start..]
        .find(|c: char| c == '"' || c == '\'' || c == ')')
        .map(|i| start + i)
        .unwrap_or(text.len());

    BASE64_STANDARD.decode(&text[start..end]).ok()
}
