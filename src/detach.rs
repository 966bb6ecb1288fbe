//! 后台任务提交
//!
//! 管道里的若干写操作（共享词库写入、用量上报）属于优化路径，
//! 不允许阻塞响应，也不允许静默丢失失败信息。
//! 统一从这里派生分离任务，失败一律进日志。

use std::future::Future;

use crate::error::PipelineResult;

/// 派生一个分离的后台任务
///
/// 任务结果不回传调用方；失败仅记录警告日志。
pub fn spawn_logged<F>(task_name: &'static str, fut: F)
where
    F: Future<Output = PipelineResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            tracing::warn!("后台任务 {} 失败: {}", task_name, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spawn_logged_runs_task() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        spawn_logged("test", async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_spawn_logged_swallows_errors() {
        spawn_logged("test-err", async {
            Err(crate::error::PipelineError::CacheError("x".to_string()))
        });
        // 失败只进日志，不会使运行时崩溃
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
