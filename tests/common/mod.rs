//! 集成测试公共设施
//!
//! 按脚本工作的翻译/分析后端，以及常用的装配辅助函数。

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lexiflow::analysis::{AnalysisCache, AnalysisService};
use lexiflow::config::PipelineConfig;
use lexiflow::error::{PipelineError, PipelineResult};
use lexiflow::pipeline::{QuotaGate, Session, SessionOptions};
use lexiflow::providers::{
    AnalysisBackend, Translation, TranslationChain, TranslationProvider,
};
use lexiflow::store::MemoryWordStore;

/// 按脚本工作的翻译后端
///
/// 响应队列逐次弹出，弹空后使用固定的兜底响应；
/// 每次调用都会记录请求参数。
pub struct ScriptedTranslator {
    name: String,
    delay: Duration,
    responses: Mutex<VecDeque<PipelineResult<Translation>>>,
    fallback: PipelineResult<Translation>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedTranslator {
    /// 永远成功的后端
    pub fn ok(name: &str, translated: &str, detected: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            responses: Mutex::new(VecDeque::new()),
            fallback: Ok(Translation {
                translated_text: translated.to_string(),
                detected_lang: detected.to_string(),
            }),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 永远失败的后端
    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            responses: Mutex::new(VecDeque::new()),
            fallback: Err(PipelineError::provider(name, "脚本要求失败")),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 每次调用前先等待指定时长
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 预置一条响应，弹出顺序与预置顺序一致
    pub fn push_response(&self, response: PipelineResult<Translation>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 记录到的请求参数 (text, source, target)
    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationProvider for ScriptedTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> PipelineResult<Translation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            text.to_string(),
            source_lang.to_string(),
            target_lang.to_string(),
        ));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}

/// 按脚本工作的分析后端
///
/// 响应队列的每个条目带独立延迟，用来模拟快慢不同的请求。
pub struct ScriptedAnalyzer {
    name: String,
    responses: Mutex<VecDeque<(Duration, PipelineResult<String>)>>,
    fallback: (Duration, PipelineResult<String>),
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    /// 固定返回一段原始文本的后端
    pub fn ok(name: &str, raw: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            fallback: (Duration::ZERO, Ok(raw.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// 永远失败的后端
    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            fallback: (
                Duration::ZERO,
                Err(PipelineError::provider(name, "脚本要求失败")),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    /// 预置一条带延迟的响应
    pub fn push_response(&self, delay: Duration, response: PipelineResult<String>) {
        self.responses.lock().unwrap().push_back((delay, response));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> PipelineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, response) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

/// 构造 words 载荷，条目为 (original, translation, pos)
pub fn words_payload(entries: &[(&str, &str, &str)]) -> String {
    let words: Vec<serde_json::Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (original, translation, pos))| {
            serde_json::json!({
                "id": format!("w{}", i + 1),
                "original": original,
                "translation": translation,
                "pos": pos,
                "grammar": format!("грам. {}", translation),
                "definition": format!("знач. {}", translation),
                "example": format!("Приклад з {}.", translation),
            })
        })
        .collect();
    serde_json::json!({ "words": words }).to_string()
}

/// 场景里反复用到的两词载荷："The cat runs." → "Кіт бігає."
pub fn cat_runs_payload() -> String {
    words_payload(&[("cat", "Кіт", "noun"), ("runs", "бігає", "verb")])
}

/// 集成测试用的短去抖配置
pub fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.debounce_ms = 50;
    config.translate_timeout_secs = 2;
    config.analyze_timeout_secs = 2;
    config
}

/// 装配一个分析服务及其内存词库
pub fn make_service(
    backends: Vec<Arc<dyn AnalysisBackend>>,
) -> (Arc<AnalysisService>, Arc<MemoryWordStore>) {
    let config = test_config();
    let store = Arc::new(MemoryWordStore::new());
    let cache = Arc::new(AnalysisCache::new(
        config.cache.max_entries,
        config.cache_ttl(),
    ));
    let service = Arc::new(AnalysisService::new(
        cache,
        Arc::clone(&store) as Arc<dyn lexiflow::store::WordStore>,
        backends,
        config.analyze_timeout(),
    ));
    (service, store)
}

/// 装配一个完整会话
pub fn make_session(
    translators: Vec<Arc<dyn TranslationProvider>>,
    backends: Vec<Arc<dyn AnalysisBackend>>,
    quota: Arc<dyn QuotaGate>,
    options: SessionOptions,
) -> (Session, Arc<MemoryWordStore>) {
    let config = test_config();
    let chain = TranslationChain::new(translators, config.translate_timeout());
    let (service, store) = make_service(backends);
    let session = Session::new(chain, service, quota, &config, options);
    (session, store)
}
