//! 管道统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use thiserror::Error;

/// 管道错误类型
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 字符配额已用尽
    #[error("字符配额已用尽")]
    QuotaExceeded,

    /// 所有翻译后端都失败
    #[error("所有翻译后端都失败: {0}")]
    TranslationChainExhausted(String),

    /// 所有分析后端都失败
    #[error("所有分析后端都失败: {0}")]
    AnalysisChainExhausted(String),

    /// 单个后端调用失败
    #[error("后端 {provider} 调用失败: {message}")]
    ProviderError { provider: String, message: String },

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// 检查错误是否可通过切换后端恢复
    ///
    /// 链式调用逻辑据此决定是否推进到下一个后端；
    /// 配额与输入错误不属于后端问题，不参与链式恢复。
    pub fn is_provider_level(&self) -> bool {
        matches!(
            self,
            PipelineError::NetworkError(_)
                | PipelineError::ProviderError { .. }
                | PipelineError::ParseError(_)
                | PipelineError::TimeoutError(_)
        )
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PipelineError::ConfigError(_) => ErrorSeverity::Critical,
            PipelineError::NetworkError(_) => ErrorSeverity::Warning,
            PipelineError::InvalidInput(_) => ErrorSeverity::Info,
            PipelineError::QuotaExceeded => ErrorSeverity::Info,
            PipelineError::TranslationChainExhausted(_) => ErrorSeverity::Error,
            PipelineError::AnalysisChainExhausted(_) => ErrorSeverity::Warning,
            PipelineError::ProviderError { .. } => ErrorSeverity::Warning,
            PipelineError::ParseError(_) => ErrorSeverity::Warning,
            PipelineError::CacheError(_) => ErrorSeverity::Warning,
            PipelineError::TimeoutError(_) => ErrorSeverity::Warning,
            PipelineError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 创建后端调用错误
    pub fn provider<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        PipelineError::ProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<reqwest::Error> for PipelineError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PipelineError::TimeoutError(format!("HTTP请求超时: {}", error))
        } else {
            PipelineError::NetworkError(format!("HTTP请求失败: {}", error))
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::ParseError(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(error: toml::de::Error) -> Self {
        PipelineError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(error: config::ConfigError) -> Self {
        PipelineError::ConfigError(format!("配置加载错误: {}", error))
    }
}

impl From<tokio::time::error::Elapsed> for PipelineError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        PipelineError::TimeoutError(format!("异步操作超时: {}", error))
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::InternalError(format!("IO错误: {}", error))
    }
}

/// 错误结果类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;
