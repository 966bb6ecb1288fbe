//! 会话状态机
//!
//! 每个会话一台状态机：去抖输入、先翻译后分析的两阶段编排、
//! 单调递增的请求代次与过期结果丢弃、在途分析的取消。
//!
//! ## 代次规则
//!
//! 每次派发分配一个严格递增的 `request_id`，之后它是唯一允许提交
//! 结果的代次。代次显式地随每个异步续体传递，在**每个**提交点
//! 与会话当前代次比对；派发到提交之间有多次异步跳转
//! （翻译、分词、分析、解析、提交），只在派发时检查是不够的。
//! 旧请求的结果晚到时静默丢弃，晚到的数据永远不赢。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::analysis::{AnalysisRequest, AnalysisService};
use crate::config::PipelineConfig;
use crate::detach;
use crate::pipeline::quota::QuotaGate;
use crate::providers::TranslationChain;
use crate::tokenize;
use crate::words::WordUnit;

/// 会话初始语言设置
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub source_lang: String,
    pub target_lang: String,
    pub ui_lang: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "uk".to_string(),
            ui_lang: "en".to_string(),
        }
    }
}

/// 对消费方可见的会话快照
///
/// 序列化字段名沿用线上接口的命名。
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub input_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub translated_text: String,
    pub words: Vec<WordUnit>,
    pub detected_lang: Option<String>,
    /// 仅第一阶段期间为真
    pub is_translating: bool,
    /// 仅第二阶段期间为真
    pub is_analyzing: bool,
    pub error: Option<String>,
}

/// 会话可变状态，整体在一把读写锁后面
struct SessionState {
    input_text: String,
    source_lang: String,
    target_lang: String,
    ui_lang: String,
    translated_text: String,
    words: Vec<WordUnit>,
    detected_lang: Option<String>,
    is_translating: bool,
    is_analyzing: bool,
    error: Option<String>,
    /// 本次编辑内已经调和过的检测语言，防止重复检测引起震荡
    last_detection: Option<String>,
}

struct SessionInner {
    translator: TranslationChain,
    analyzer: Arc<AnalysisService>,
    quota: Arc<dyn QuotaGate>,
    debounce: Duration,
    state: RwLock<SessionState>,
    /// 当前最新的请求代次
    latest_request: AtomicU64,
    /// 编辑序号，静默期计时器据此识别自己是否已过期
    edit_seq: AtomicU64,
    /// 在途的第二阶段任务，新请求派发时作废
    phase2: Mutex<Option<JoinHandle<()>>>,
}

/// 翻译/分析会话
///
/// 克隆廉价，内部共享同一台状态机。
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(
        translator: TranslationChain,
        analyzer: Arc<AnalysisService>,
        quota: Arc<dyn QuotaGate>,
        config: &PipelineConfig,
        options: SessionOptions,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                translator,
                analyzer,
                quota,
                debounce: config.debounce(),
                state: RwLock::new(SessionState {
                    input_text: String::new(),
                    source_lang: options.source_lang,
                    target_lang: options.target_lang,
                    ui_lang: options.ui_lang,
                    translated_text: String::new(),
                    words: Vec::new(),
                    detected_lang: None,
                    is_translating: false,
                    is_analyzing: false,
                    error: None,
                    last_detection: None,
                }),
                latest_request: AtomicU64::new(0),
                edit_seq: AtomicU64::new(0),
                phase2: Mutex::new(None),
            }),
        }
    }

    /// 记录一次击键
    ///
    /// 文本立即进入快照供展示；网络工作推迟到静默期结束，
    /// 每次新击键都会重置静默期，只有最后稳定的文本会被派发。
    pub fn on_text_changed(&self, text: &str) {
        let inner = Arc::clone(&self.inner);
        let seq = inner.edit_seq.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut st = inner.state.write().unwrap();
            st.input_text = text.to_string();
            st.error = None;
            st.last_detection = None;
        }

        if text.trim().is_empty() {
            // 清空输入：清掉结果并作废一切在途工作
            inner.latest_request.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = inner.phase2.lock().unwrap().take() {
                handle.abort();
            }
            let mut st = inner.state.write().unwrap();
            st.translated_text.clear();
            st.words.clear();
            st.detected_lang = None;
            st.is_translating = false;
            st.is_analyzing = false;
            return;
        }

        let text = text.to_string();
        let debounce = inner.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if inner.edit_seq.load(Ordering::SeqCst) != seq {
                // 静默期内出现了新击键
                return;
            }
            inner.dispatch(text).await;
        });
    }

    /// 跳过静默期直接派发，返回时第一阶段已结束
    ///
    /// 第二阶段照常在后台运行，可用 [`Session::wait_for_analysis`] 等待。
    pub async fn submit(&self, text: &str) {
        self.inner.edit_seq.fetch_add(1, Ordering::SeqCst);
        {
            let mut st = self.inner.state.write().unwrap();
            st.input_text = text.to_string();
            st.error = None;
            st.last_detection = None;
        }
        if text.trim().is_empty() {
            return;
        }
        Arc::clone(&self.inner).dispatch(text.to_string()).await;
    }

    /// 对调源语言与目标语言
    ///
    /// 上一次的译文成为新的输入，从第一阶段重新触发。
    pub fn swap_languages(&self) {
        let seed = {
            let mut st = self.inner.state.write().unwrap();
            let st = &mut *st;
            std::mem::swap(&mut st.source_lang, &mut st.target_lang);
            st.translated_text.clone()
        };
        if !seed.trim().is_empty() {
            self.on_text_changed(&seed);
        }
    }

    /// 等待在途的第二阶段结束（若有）
    pub async fn wait_for_analysis(&self) {
        let handle = self.inner.phase2.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// 当前会话快照
    pub fn snapshot(&self) -> Snapshot {
        let st = self.inner.state.read().unwrap();
        Snapshot {
            input_text: st.input_text.clone(),
            source_lang: st.source_lang.clone(),
            target_lang: st.target_lang.clone(),
            translated_text: st.translated_text.clone(),
            words: st.words.clone(),
            detected_lang: st.detected_lang.clone(),
            is_translating: st.is_translating,
            is_analyzing: st.is_analyzing,
            error: st.error.clone(),
        }
    }
}

impl SessionInner {
    /// 派发一次请求：第一阶段在本任务内完成，第二阶段派生后台任务
    async fn dispatch(self: Arc<Self>, text: String) {
        let char_count = text.chars().count();
        if let Err(e) = self.quota.check(char_count).await {
            tracing::info!("配额拒绝本次翻译: {}", e);
            let mut st = self.state.write().unwrap();
            st.error = Some(e.to_string());
            return;
        }

        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        // 新代次作废旧请求的在途分析
        if let Some(handle) = self.phase2.lock().unwrap().take() {
            handle.abort();
        }

        let (source_lang, target_lang, ui_lang) = {
            let mut st = self.state.write().unwrap();
            st.is_translating = true;
            st.error = None;
            (
                st.source_lang.clone(),
                st.target_lang.clone(),
                st.ui_lang.clone(),
            )
        };

        tracing::debug!("请求 {} 第一阶段: {}", request_id, truncate(&text));

        let translation = match self
            .translator
            .translate(&text, &source_lang, &target_lang)
            .await
        {
            Ok(translation) => translation,
            Err(e) => {
                tracing::warn!("请求 {} 翻译失败: {}", request_id, e);
                self.commit(request_id, |st| {
                    st.is_translating = false;
                    st.error = Some(e.to_string());
                });
                return;
            }
        };

        // 占位词表先给界面一个可交互的东西，真实分析随后整体替换
        let provisional = tokenize::provisional_words(&text, &translation.translated_text);
        let committed = self.commit(request_id, |st| {
            st.translated_text = translation.translated_text.clone();
            st.detected_lang = Some(translation.detected_lang.clone());
            st.words = provisional;
            st.is_translating = false;
            st.is_analyzing = true;
        });
        if !committed {
            return;
        }

        // 消耗字符上报，射后不理
        let quota = Arc::clone(&self.quota);
        detach::spawn_logged("report-quota-usage", async move {
            quota.report_usage(char_count).await
        });

        self.reconcile_detection(&translation.detected_lang);

        // 第二阶段用翻译时的语言组合，调和只影响后续请求
        let request = AnalysisRequest {
            source_text: text,
            translated_text: translation.translated_text,
            source_lang,
            target_lang,
            ui_lang,
        };
        let inner = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            inner.run_analysis(request_id, request).await;
        });
        *self.phase2.lock().unwrap() = Some(handle);
    }

    /// 第二阶段：语法分析
    ///
    /// 失败或超时不作废译文，占位或上一份词表原样保留。
    async fn run_analysis(self: Arc<Self>, request_id: u64, request: AnalysisRequest) {
        tracing::debug!("请求 {} 第二阶段", request_id);
        match self.analyzer.analyze(&request).await {
            Ok(words) => {
                self.commit(request_id, |st| {
                    st.words = words;
                    st.is_analyzing = false;
                });
            }
            Err(e) => {
                tracing::warn!("请求 {} 分析不可用: {}", request_id, e);
                self.commit(request_id, |st| {
                    st.is_analyzing = false;
                });
            }
        }
    }

    /// 带代次围栏的状态提交
    ///
    /// 代次不是当前最新时丢弃写入并返回 false。
    fn commit<F: FnOnce(&mut SessionState)>(&self, request_id: u64, mutate: F) -> bool {
        let mut st = self.state.write().unwrap();
        if self.latest_request.load(Ordering::SeqCst) != request_id {
            tracing::debug!("丢弃过期请求 {} 的结果", request_id);
            return false;
        }
        mutate(&mut st);
        true
    }

    /// 检测语言调和
    ///
    /// 检测结果与配置的源语言不一致时更新配置；与目标语言相同时对调，
    /// 避免同语种往返。同一次编辑内同一检测值只调和一次。
    fn reconcile_detection(&self, detected: &str) {
        if detected.is_empty() || detected == "auto" {
            return;
        }
        let mut st = self.state.write().unwrap();
        if st.last_detection.as_deref() == Some(detected) {
            return;
        }
        st.last_detection = Some(detected.to_string());

        if detected == st.source_lang {
            return;
        }
        if detected == st.target_lang {
            let st = &mut *st;
            std::mem::swap(&mut st.source_lang, &mut st.target_lang);
            tracing::debug!(
                "检测到目标语言输入，对调为 {} -> {}",
                st.source_lang,
                st.target_lang
            );
        } else {
            tracing::debug!("源语言从 {} 调整为 {}", st.source_lang, detected);
            st.source_lang = detected.to_string();
        }
    }
}

/// 日志里只展示输入开头
fn truncate(text: &str) -> String {
    text.chars().take(40).collect()
}
