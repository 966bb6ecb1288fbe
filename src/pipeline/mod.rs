//! 管道编排模块
//!
//! - **session**: 每会话的状态机（去抖、两阶段、代次围栏、取消）
//! - **quota**: 配额协作方边界

pub mod quota;
pub mod session;

pub use quota::{CharacterQuota, QuotaGate};
pub use session::{Session, SessionOptions, Snapshot};
