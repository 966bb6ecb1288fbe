//! 管道配置管理模块
//!
//! 提供配置加载、默认值和示例配置生成，支持 TOML 文件与环境变量两种配置源

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// 管道配置常量
pub mod constants {
    /// 输入静默期，超过该时间没有新击键才触发翻译
    pub const DEBOUNCE_MS: u64 = 300;

    /// 单次翻译后端调用的超时时间
    pub const TRANSLATE_TIMEOUT_SECS: u64 = 5;

    /// 单次分析后端调用的超时时间，语言模型延迟较高
    pub const ANALYZE_TIMEOUT_SECS: u64 = 30;

    /// 进程内分析缓存的条目上限
    pub const CACHE_MAX_ENTRIES: usize = 200;

    /// 进程内分析缓存的条目存活时间
    pub const CACHE_TTL_SECS: u64 = 1800;

    /// 低于该长度的模型原始响应视为无效
    pub const MIN_RAW_RESPONSE_CHARS: usize = 10;

    /// 免费档的字符配额
    pub const FREE_TIER_CHAR_LIMIT: usize = 1000;

    /// 默认的聊天补全接口地址
    pub const DEFAULT_ANALYSIS_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

    /// 默认的分析模型，按优先级排列
    pub const DEFAULT_ANALYSIS_MODELS: &[&str] = &[
        "z-ai/glm-4.5-air:free",
        "meta-llama/llama-3.3-70b-instruct:free",
        "arcee-ai/trinity-large-preview:free",
    ];

    /// 环境变量前缀，例如 LEXIFLOW__ANALYSIS__API_KEY
    pub const ENV_PREFIX: &str = "LEXIFLOW";

    /// 按顺序探测的配置文件路径
    pub const CONFIG_PATHS: &[&str] = &["lexiflow.toml", ".lexiflow.toml"];
}

/// 管道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 输入静默期（毫秒）
    pub debounce_ms: u64,

    /// 单次翻译后端调用超时（秒）
    pub translate_timeout_secs: u64,

    /// 单次分析后端调用超时（秒）
    pub analyze_timeout_secs: u64,

    /// 进程内缓存配置
    pub cache: CacheSettings,

    /// 分析后端配置
    pub analysis: AnalysisSettings,
}

/// 进程内缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// 条目上限，达到上限时淘汰最早插入的条目
    pub max_entries: usize,

    /// 条目存活时间（秒）
    pub ttl_secs: u64,
}

/// 分析后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// 聊天补全接口地址
    pub endpoint: String,

    /// 接口密钥，留空时分析功能降级为仅缓存
    pub api_key: String,

    /// 按优先级排列的模型列表
    pub models: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: constants::DEBOUNCE_MS,
            translate_timeout_secs: constants::TRANSLATE_TIMEOUT_SECS,
            analyze_timeout_secs: constants::ANALYZE_TIMEOUT_SECS,
            cache: CacheSettings::default(),
            analysis: AnalysisSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: constants::CACHE_MAX_ENTRIES,
            ttl_secs: constants::CACHE_TTL_SECS,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ANALYSIS_ENDPOINT.to_string(),
            api_key: String::new(),
            models: constants::DEFAULT_ANALYSIS_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// 输入静默期
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// 翻译后端单次调用超时
    pub fn translate_timeout(&self) -> Duration {
        Duration::from_secs(self.translate_timeout_secs)
    }

    /// 分析后端单次调用超时
    pub fn analyze_timeout(&self) -> Duration {
        Duration::from_secs(self.analyze_timeout_secs)
    }

    /// 缓存条目存活时间
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// 从默认路径和环境变量加载配置
    ///
    /// 配置文件不存在时回退到默认值，环境变量始终参与覆盖。
    pub fn load() -> PipelineResult<Self> {
        let mut builder = Config::builder();
        for path in constants::CONFIG_PATHS {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix(constants::ENV_PREFIX).separator("__"))
            .build()?;
        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 从指定文件加载配置
    pub fn load_from<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| PipelineError::ConfigError(format!("非法配置路径: {:?}", path)))?;
        let settings = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(Environment::with_prefix(constants::ENV_PREFIX).separator("__"))
            .build()?;
        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置的基本约束
    pub fn validate(&self) -> PipelineResult<()> {
        if self.cache.max_entries == 0 {
            return Err(PipelineError::ConfigError(
                "cache.max_entries 必须大于0".to_string(),
            ));
        }
        if self.translate_timeout_secs == 0 || self.analyze_timeout_secs == 0 {
            return Err(PipelineError::ConfigError(
                "后端超时必须大于0秒".to_string(),
            ));
        }
        Ok(())
    }

    /// 生成示例配置文件
    pub fn write_example<P: AsRef<Path>>(path: P) -> PipelineResult<()> {
        let example = PipelineConfig::default();
        let content = toml::to_string_pretty(&example)
            .map_err(|e| PipelineError::ConfigError(format!("序列化示例配置失败: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 语言表
///
/// 提示词构建需要把语言代码换成展示名称；
/// 未收录的代码按原样展示。
pub mod languages {
    /// 支持的语言，代码与英文展示名
    pub const LANGUAGES: &[(&str, &str)] = &[
        ("en", "English"),
        ("uk", "Ukrainian"),
        ("ru", "Russian"),
        ("it", "Italian"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("pt", "Portuguese"),
        ("zh", "Chinese"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
    ];

    /// 查询语言展示名
    pub fn display_name(code: &str) -> Option<&'static str> {
        LANGUAGES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
    }

    /// 查询语言展示名，未收录时回退到代码本身
    pub fn display_name_or_code(code: &str) -> &str {
        display_name(code).unwrap_or(code)
    }
}
