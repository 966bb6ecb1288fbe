//! 配额协作方边界
//!
//! 翻译开始之前必须通过鉴权与字符配额检查；第一阶段完成后
//! 把消耗的字符数异步上报回去，上报失败不影响翻译。

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::config::constants::FREE_TIER_CHAR_LIMIT;
use crate::error::{PipelineError, PipelineResult};

/// 配额协作能力
#[async_trait]
pub trait QuotaGate: Send + Sync {
    /// 第一阶段开始前检查调用方是否还有额度
    async fn check(&self, chars: usize) -> PipelineResult<()>;

    /// 上报已消耗的字符数，调用方射后不理
    async fn report_usage(&self, chars: usize) -> PipelineResult<()>;
}

/// 内存字符配额
///
/// 免费档有限额，付费档无限；持久化的配额记账在外部协作方。
pub struct CharacterQuota {
    used: AtomicUsize,
    /// None 表示无限档
    limit: Option<usize>,
}

impl CharacterQuota {
    /// 免费档配额
    pub fn free() -> Self {
        Self::with_limit(FREE_TIER_CHAR_LIMIT)
    }

    /// 指定限额
    pub fn with_limit(limit: usize) -> Self {
        Self {
            used: AtomicUsize::new(0),
            limit: Some(limit),
        }
    }

    /// 无限档
    pub fn unlimited() -> Self {
        Self {
            used: AtomicUsize::new(0),
            limit: None,
        }
    }

    /// 已消耗的字符数
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuotaGate for CharacterQuota {
    async fn check(&self, chars: usize) -> PipelineResult<()> {
        if let Some(limit) = self.limit {
            if self.used.load(Ordering::Relaxed) + chars > limit {
                return Err(PipelineError::QuotaExceeded);
            }
        }
        Ok(())
    }

    async fn report_usage(&self, chars: usize) -> PipelineResult<()> {
        self.used.fetch_add(chars, Ordering::Relaxed);
        Ok(())
    }
}
