use std::fmt;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 浏览器会话相关错误
    Session(SessionError),
    /// 相关性过滤服务错误
    Filter(FilterError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Filter(e) => write!(f, "过滤错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Session(e) => Some(e),
            AppError::Filter(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 浏览器会话错误
///
/// 故障分为两类：可重试的瞬态故障（超时、导航、协议调用、会话中断）
/// 和不可重试的"元素不存在"。重试策略只关心 `is_transient()`。
#[derive(Debug, Error)]
pub enum SessionError {
    /// 浏览器进程启动失败
    #[error("浏览器启动失败: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("导航到 {url} 失败: {message}")]
    NavigationFailed { url: String, message: String },
    /// 等待超时
    #[error("操作超时: {operation}")]
    Timeout { operation: String },
    /// CDP 协议调用 / 脚本执行失败
    #[error("协议调用失败: {0}")]
    ScriptFailed(String),
    /// 元素不存在（预期内的缺失，不可重试）
    #[error("元素不存在: {0}")]
    ElementNotFound(String),
    /// 会话已关闭
    #[error("浏览器会话已关闭")]
    SessionClosed,
}

impl SessionError {
    /// 判断是否属于可重试的瞬态故障
    pub fn is_transient(&self) -> bool {
        !matches!(self, SessionError::ElementNotFound(_))
    }
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;
        match err {
            CdpError::Timeout => SessionError::Timeout {
                operation: "CDP 请求".to_string(),
            },
            CdpError::NotFound => SessionError::ElementNotFound("(CDP 查询)".to_string()),
            other => SessionError::ScriptFailed(other.to_string()),
        }
    }
}

/// 相关性过滤服务错误
#[derive(Debug)]
pub enum FilterError {
    /// LLM API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// LLM 返回内容为空
    EmptyContent { model: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            FilterError::EmptyContent { model } => {
                write!(f, "LLM返回内容为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FilterError::EmptyContent { .. } => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 解析失败
    JsonParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::JsonParseFailed { path, source } => {
                write!(f, "JSON解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::JsonParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// URL 来源缺失：既没有直接提供列表，也没有提供输入文件
    MissingUrlSource,
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingUrlSource => {
                write!(f, "必须提供 URL 列表或输入文件中的至少一个")
            }
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<FilterError> for AppError {
    fn from(err: FilterError) -> Self {
        AppError::Filter(err)
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        AppError::File(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonParseFailed {
            path: String::new(), // serde_json 错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Filter(FilterError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 会话层结果类型
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        // 超时 / 导航 / 协议 / 会话中断都属于瞬态故障
        assert!(SessionError::Timeout {
            operation: "等待元素".to_string()
        }
        .is_transient());
        assert!(SessionError::NavigationFailed {
            url: "https://example.com".to_string(),
            message: "net::ERR_TIMED_OUT".to_string()
        }
        .is_transient());
        assert!(SessionError::SessionClosed.is_transient());

        // 元素不存在属于预期内缺失，不触发重试
        assert!(!SessionError::ElementNotFound("div.missing".to_string()).is_transient());
    }

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config(ConfigError::MissingUrlSource);
        assert!(err.to_string().contains("URL"));
    }
}
