//! 语法分析后端实现
//!
//! 每个后端对应一个聊天补全模型；模型只负责产出嵌有JSON对象的自由文本，
//! 清洗、提取、校验都在分析服务一侧统一进行。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::AnalysisSettings;
use crate::error::{PipelineError, PipelineResult};

/// 语法分析后端能力
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// 后端名称，用于日志定位
    fn name(&self) -> &str;

    /// 发送指令并取回模型的原始文本输出
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> PipelineResult<String>;
}

/// 聊天补全模型后端
///
/// OpenRouter 风格的接口，一个实例绑定一个模型。
pub struct ChatModelAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatModelAnalyzer {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl AnalysisBackend for ChatModelAnalyzer {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> PipelineResult<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": 0.3,
            "max_tokens": 4000,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PipelineError::provider(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let payload: Value = response.json().await?;
        let content = payload
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(PipelineError::provider(self.name(), "响应缺少内容"));
        }

        tracing::debug!("模型 {} 返回 {} 字符", self.model, content.len());
        Ok(content.to_string())
    }
}

/// 按配置的模型列表构建后端链
///
/// 密钥为空时返回空链，分析功能降级为仅缓存。
pub fn backends_from_settings(settings: &AnalysisSettings) -> Vec<Arc<dyn AnalysisBackend>> {
    if settings.api_key.is_empty() {
        tracing::warn!("未配置分析接口密钥，语法分析只使用缓存");
        return Vec::new();
    }
    settings
        .models
        .iter()
        .map(|model| {
            Arc::new(ChatModelAnalyzer::new(
                settings.endpoint.clone(),
                settings.api_key.clone(),
                model.clone(),
            )) as Arc<dyn AnalysisBackend>
        })
        .collect()
}
