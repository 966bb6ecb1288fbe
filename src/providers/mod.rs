//! 可互换的后端能力
//!
//! 翻译与分析都面向同一种形态的能力：一组按优先级排列、可互换的后端，
//! 逐个尝试直到某个后端给出结构上有效的结果。
//! 链式调用逻辑只写一次，针对能力接口，不针对具体后端。

pub mod analyze;
pub mod translate;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};

pub use analyze::{backends_from_settings, AnalysisBackend, ChatModelAnalyzer};
pub use translate::{GoogleWebTranslator, MyMemoryTranslator};

/// 一次字面翻译的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub translated_text: String,
    /// 后端检测到的源语言
    pub detected_lang: String,
}

/// 字面翻译后端能力
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// 后端名称，用于日志定位
    fn name(&self) -> &str;

    /// 翻译一段文本
    ///
    /// `source_lang` 可以是 "auto"，由后端自行检测。
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> PipelineResult<Translation>;
}

/// 翻译后端链
///
/// 严格按配置顺序尝试；每次调用带独立超时；
/// 超时、非成功状态、畸形响应都算该后端失败，推进到下一个后端。
pub struct TranslationChain {
    providers: Vec<Arc<dyn TranslationProvider>>,
    attempt_timeout: Duration,
}

impl TranslationChain {
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>, attempt_timeout: Duration) -> Self {
        Self {
            providers,
            attempt_timeout,
        }
    }

    /// 沿链翻译
    ///
    /// 某个后端检测出用户是在用目标语言输入时，用同一个后端反向重发一次再返回；
    /// 反向调用失败不作数，保留正向结果。
    /// 所有后端都失败时返回 [`PipelineError::TranslationChainExhausted`]。
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> PipelineResult<Translation> {
        let mut last_error = "没有配置翻译后端".to_string();

        for provider in &self.providers {
            match self
                .attempt(provider.as_ref(), text, source_lang, target_lang)
                .await
            {
                Ok(mut result) => {
                    if result.detected_lang == target_lang && result.detected_lang != source_lang {
                        // 用户用目标语言输入，反向翻译回配置的源语言
                        tracing::debug!(
                            "检测到目标语言输入({}), 用 {} 反向重发",
                            result.detected_lang,
                            provider.name()
                        );
                        match self
                            .attempt(provider.as_ref(), text, "auto", source_lang)
                            .await
                        {
                            Ok(reverse) => result.translated_text = reverse.translated_text,
                            Err(e) => {
                                tracing::warn!("反向翻译失败，保留正向结果: {}", e);
                            }
                        }
                    }
                    return Ok(result);
                }
                Err(e) => {
                    tracing::warn!("翻译后端 {} 失败: {}", provider.name(), e);
                    last_error = e.to_string();
                }
            }
        }

        Err(PipelineError::TranslationChainExhausted(last_error))
    }

    async fn attempt(
        &self,
        provider: &dyn TranslationProvider,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> PipelineResult<Translation> {
        match tokio::time::timeout(
            self.attempt_timeout,
            provider.translate(text, source_lang, target_lang),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PipelineError::TimeoutError(format!(
                "翻译后端 {} 超过 {:?} 未响应",
                provider.name(),
                self.attempt_timeout
            ))),
        }
    }
}
