//! 语法分析模块
//!
//! 对一句译文做逐词的语法分析，结果优先来自两级缓存，
//! 未命中时才走语言模型后端链。
//!
//! - **cache**: 进程内缓存层（指纹键、TTL、插入序淘汰）
//! - **parse**: 模型输出的清洗、JSON提取与归一化
//! - **prompt**: 分析指令构建
//! - **service**: 缓存与后端链的编排

pub mod cache;
pub mod parse;
pub mod prompt;
pub mod service;

pub use cache::{fingerprint, AnalysisCache, CacheStats};
pub use parse::extract_json_object;
pub use service::{AnalysisRequest, AnalysisService};
