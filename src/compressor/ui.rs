//! # 界面协作接口
//!
//! ## 设计思路
//!
//! 核心流程不直接操作界面，只通过 `CompressionUi` 通知外部：
//! 提示消息、忙碌状态、原图信息、压缩结果、步骤切换。
//! “当前提示消息”之类的状态由界面实现自行持有，核心不依赖其存在。
//!
//! 所有方法均为 `&self`，实现方需自行处理内部可变性。

use super::stats::CompressionStats;
use super::OutputFormat;

/// 工作流步骤：1 上传、2 设置与压缩、3 下载结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Upload = 1,
    Compress = 2,
    Download = 3,
}

/// 原图信息（解码完成后展示）。
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalInfo {
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// 如 `1.20 MB | PNG | 1920 x 1080`。
    pub summary: String,
}

/// 可下载产物。
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub format: OutputFormat,
    pub file_name: String,
    /// `data:` URL 形式的载荷。
    pub data_url: String,
}

/// 界面协作方。
pub trait CompressionUi: Send + Sync {
    /// 展示一条提示（校验失败、错误、效果提示等）。
    fn show_message(&self, message: &str);

    /// 切换“处理中”状态。
    fn set_busy(&self, busy: bool);

    fn show_original(&self, info: &OriginalInfo);

    fn show_result(&self, stats: &CompressionStats, artifact: &DownloadArtifact);

    fn complete_step(&self, step: WorkflowStep);

    fn activate_step(&self, step: WorkflowStep);
}
