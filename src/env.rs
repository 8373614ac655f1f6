//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问；命令行参数会覆盖这里读取的值。

use std::env;
use std::fmt;

use crate::core::{CompactError, CompactOptions};

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

impl From<EnvError> for CompactError {
    fn from(e: EnvError) -> Self {
        CompactError::Config(e.to_string())
    }
}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }
}

/// 日志与输出相关变量
pub mod logging {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "COMPACT_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level used with --verbose: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("debug".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 网络相关变量
pub mod network {
    use super::*;

    /// 网络超时（秒）
    pub struct Timeout;
    impl EnvVar<u64> for Timeout {
        const NAME: &'static str = "COMPACT_TIMEOUT";
        const DEFAULT: Option<u64> = Some(0);
        const DESCRIPTION: &'static str = "Network timeout in seconds, 0 keeps the client default";

        fn parse(value: &str) -> EnvResult<u64> {
            value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("Invalid timeout '{}'. Must be a whole number of seconds", value),
            })
        }
    }

    /// 自定义 User-Agent
    pub struct UserAgent;
    impl EnvVar<String> for UserAgent {
        const NAME: &'static str = "COMPACT_USER_AGENT";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "User-Agent header sent with every request";

        fn parse(value: &str) -> EnvResult<String> {
            let value = value.trim();
            if value.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "User-Agent cannot be empty".to_string(),
                });
            }
            Ok(value.to_string())
        }
    }

    /// 接受无效的 TLS 证书
    pub struct Insecure;
    impl EnvVar<bool> for Insecure {
        const NAME: &'static str = "COMPACT_INSECURE";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Accept invalid TLS certificates";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

/// 环境变量配置汇总
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub log_level: String,
    pub no_color: bool,
    pub timeout: u64,
    pub user_agent: Option<String>,
    pub insecure: bool,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: logging::LogLevel::get()?,
            no_color: logging::NoColor::get()?,
            timeout: network::Timeout::get()?,
            user_agent: match env::var(network::UserAgent::NAME) {
                Ok(value) => Some(network::UserAgent::parse(&value)?),
                Err(_) => None,
            },
            insecure: network::Insecure::get()?,
        })
    }
}

impl From<&EnvConfig> for CompactOptions {
    fn from(config: &EnvConfig) -> Self {
        CompactOptions {
            timeout: config.timeout,
            user_agent: config.user_agent.clone(),
            insecure: config.insecure,
        }
    }
}

impl CompactOptions {
    /// Options built from `COMPACT_*` environment variables
    pub fn from_env() -> Result<CompactOptions, CompactError> {
        Ok(CompactOptions::from(&EnvConfig::from_env()?))
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    let entries = [
        (logging::LogLevel::NAME, logging::LogLevel::DESCRIPTION, "debug".to_string()),
        (logging::NoColor::NAME, logging::NoColor::DESCRIPTION, "unset".to_string()),
        (network::Timeout::NAME, network::Timeout::DESCRIPTION, "0".to_string()),
        (network::UserAgent::NAME, network::UserAgent::DESCRIPTION, "unset".to_string()),
        (network::Insecure::NAME, network::Insecure::DESCRIPTION, "false".to_string()),
    ];

    for (name, description, default) in entries {
        docs.push_str(&format!("- `{}`: {} (default: {})\n", name, description, default));
    }

    docs
}
