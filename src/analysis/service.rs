//! 语法分析服务
//!
//! 分析一次译文的完整路径：本地缓存、共享词库、后端链。
//! 契约：要么返回非空词表，要么返回错误；空分析和"无可分析"
//! 无法区分，绝不能当成功结果缓存。

use std::sync::Arc;
use std::time::Duration;

use crate::analysis::cache::{fingerprint, AnalysisCache};
use crate::analysis::{parse, prompt};
use crate::detach;
use crate::error::{PipelineError, PipelineResult};
use crate::providers::AnalysisBackend;
use crate::store::{StoredWord, WordStore};
use crate::tokenize;
use crate::words::WordUnit;

/// 一次分析请求
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub ui_lang: String,
}

/// 语法分析服务
///
/// 进程内构造一次，各会话共享；两级缓存都在语言模型调用之前。
pub struct AnalysisService {
    cache: Arc<AnalysisCache>,
    store: Arc<dyn WordStore>,
    backends: Vec<Arc<dyn AnalysisBackend>>,
    attempt_timeout: Duration,
}

impl AnalysisService {
    pub fn new(
        cache: Arc<AnalysisCache>,
        store: Arc<dyn WordStore>,
        backends: Vec<Arc<dyn AnalysisBackend>>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            store,
            backends,
            attempt_timeout,
        }
    }

    /// 本地缓存层，统计与测试用
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// 分析一次译文
    ///
    /// 返回的词表保持译文词序；所有路径的结果都已归一化。
    pub async fn analyze(&self, request: &AnalysisRequest) -> PipelineResult<Vec<WordUnit>> {
        if request.translated_text.trim().is_empty() {
            return Err(PipelineError::InvalidInput("译文为空".to_string()));
        }

        let key = fingerprint(
            &request.translated_text,
            &request.target_lang,
            &request.ui_lang,
        );

        if let Some(words) = self.cache.get(&key) {
            tracing::debug!("本地缓存命中: {}", truncate(&request.translated_text));
            return Ok(words);
        }

        if let Some(words) = self.lookup_shared(request, &key).await {
            tracing::debug!("共享词库命中: {}", truncate(&request.translated_text));
            return Ok(words);
        }

        self.run_backend_chain(request, &key).await
    }

    /// 查询共享词库
    ///
    /// 译文的每个去重词键都在库里才算命中；部分命中按整体未命中处理，
    /// 不跨缓存与后端边界做部分拼装。查询失败降级为未命中。
    async fn lookup_shared(&self, request: &AnalysisRequest, key: &str) -> Option<Vec<WordUnit>> {
        let target_tokens = tokenize::tokenize(&request.translated_text);
        let word_keys = tokenize::distinct_keys(&target_tokens);
        if word_keys.is_empty() {
            return None;
        }

        let found = match self
            .store
            .lookup(&word_keys, &request.target_lang, &request.ui_lang)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("共享词库查询失败，降级到后端链: {}", e);
                return None;
            }
        };
        if !word_keys.iter().all(|k| found.contains_key(k)) {
            return None;
        }

        // 按译文词序重建词表，原文按相同索引对齐
        let source_tokens = tokenize::tokenize(&request.source_text);
        let words: Vec<WordUnit> = target_tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let row = &found[&token.lower];
                WordUnit {
                    id: format!("w{}", i + 1),
                    source_fragment: source_tokens
                        .get(i)
                        .map(|t| t.raw.clone())
                        .unwrap_or_default(),
                    target_fragment: token.raw.clone(),
                    part_of_speech: row.pos,
                    grammar_note: row.grammar.clone(),
                    definition: row.definition.clone(),
                    example_sentence: row.example.clone(),
                }
            })
            .collect();

        self.cache.insert(key.to_string(), words.clone());

        let store = Arc::clone(&self.store);
        let target_lang = request.target_lang.clone();
        let ui_lang = request.ui_lang.clone();
        detach::spawn_logged("bump-word-usage", async move {
            store.bump_usage(&word_keys, &target_lang, &ui_lang).await
        });

        Some(words)
    }

    /// 沿后端链请求分析
    ///
    /// 每次尝试带独立超时；超时与失败同样处理，推进到下一个后端，
    /// 绝不对同一个后端重试。
    async fn run_backend_chain(
        &self,
        request: &AnalysisRequest,
        key: &str,
    ) -> PipelineResult<Vec<WordUnit>> {
        if self.backends.is_empty() {
            return Err(PipelineError::AnalysisChainExhausted(
                "没有配置分析后端".to_string(),
            ));
        }

        let (system_prompt, user_prompt) = prompt::build_prompts(request);
        let mut last_error = String::new();

        for backend in &self.backends {
            let raw = match tokio::time::timeout(
                self.attempt_timeout,
                backend.complete(&system_prompt, &user_prompt),
            )
            .await
            {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) => {
                    tracing::warn!("分析后端 {} 失败: {}", backend.name(), e);
                    last_error = e.to_string();
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        "分析后端 {} 超过 {:?} 未响应",
                        backend.name(),
                        self.attempt_timeout
                    );
                    last_error = format!("后端 {} 超时", backend.name());
                    continue;
                }
            };

            match parse::parse_word_payload(&raw) {
                Ok(raw_words) => {
                    let words = parse::normalize_words(raw_words);
                    tracing::info!("分析成功: {} 产出 {} 个词条", backend.name(), words.len());

                    self.cache.insert(key.to_string(), words.clone());
                    self.store_detached(&words, request);
                    return Ok(words);
                }
                Err(e) => {
                    tracing::warn!("分析后端 {} 输出无法解析: {}", backend.name(), e);
                    last_error = e.to_string();
                }
            }
        }

        Err(PipelineError::AnalysisChainExhausted(last_error))
    }

    /// 把新分析结果写入共享词库，射后不理
    fn store_detached(&self, words: &[WordUnit], request: &AnalysisRequest) {
        let rows: Vec<StoredWord> = words.iter().filter_map(StoredWord::from_word).collect();
        if rows.is_empty() {
            return;
        }
        let store = Arc::clone(&self.store);
        let target_lang = request.target_lang.clone();
        let ui_lang = request.ui_lang.clone();
        detach::spawn_logged("store-word-analyses", async move {
            store.upsert(rows, &target_lang, &ui_lang).await
        });
    }
}

/// 日志里只展示译文开头
fn truncate(text: &str) -> String {
    text.chars().take(40).collect()
}
