//! # 请求序号模块
//!
//! 每次通过校验的压缩请求领取一个严格递增的序号（从 1 开始）。
//! 异步阶段在写入共享结果前用 `is_current` 复核，过期请求静默结束。
//!
//! 序号归属于编排器实例，不使用全局状态，测试可并行创建多个独立实例。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 请求序号发放器。
///
/// `Clone` 得到的句柄共享同一计数。
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: Arc<AtomicU64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发放下一个序号。
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 最近发放的序号，尚未发放时为 0。
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, id: u64) -> bool {
        id != 0 && self.latest() == id
    }
}
