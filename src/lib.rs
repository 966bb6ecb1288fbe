//! # lexiflow
//!
//! 实时翻译与逐词语法分析的编排管道。
//!
//! 用户的每次输入经过去抖后走两个阶段：先从翻译后端链取回快速的
//! 字面翻译，再独立地发起较慢的语法分析；两个阶段都与后续输入
//! 赛跑，过期结果永远不会覆盖更新的结果。分析结果先查两级缓存
//! （进程内 + 共享词库），未命中才付出语言模型调用的代价。
//!
//! ## 模块组织
//!
//! - `pipeline` - 会话状态机与配额边界
//! - `providers` - 可互换的翻译/分析后端与链式调用
//! - `analysis` - 语法分析服务、缓存层与输出解析
//! - `store` - 共享词库存储边界
//! - `tokenize` - 分词与占位对齐
//! - `words` - 词条数据模型
//! - `config` - 配置与语言表
//! - `error` - 统一错误类型
//! - `detach` - 后台任务提交

pub mod analysis;
pub mod config;
pub mod detach;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod store;
pub mod tokenize;
pub mod words;

// Re-export commonly used items for convenience
pub use analysis::{AnalysisCache, AnalysisRequest, AnalysisService};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{CharacterQuota, QuotaGate, Session, SessionOptions, Snapshot};
pub use providers::{Translation, TranslationChain, TranslationProvider};
pub use store::{MemoryWordStore, StoredWord, WordStore};
pub use words::{PartOfSpeech, WordUnit};
