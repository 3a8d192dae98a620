//! # 图片压缩模块（compressor）
//!
//! ## 设计思路
//!
//! 该模块将“输入校验 → 读取解码 → 尺寸限制 → 绘制水印 → 编码 → 结果展示”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线，负责请求序号与过期判断
//! - `codec`：文件读取与栅格编解码能力（可注入）
//! - `encoder`：画布分配、绘制、水印、序列化与体积估算
//! - `geometry`：像素总量与单边尺寸限制
//! - `surface/watermark`：离屏画布与水印文字
//! - `stats`：压缩率、文件名、体积格式化等纯函数
//! - `crop`：裁切选区状态
//! - `ui`：界面协作接口
//! - `config/error/source/sequencer`：配置、错误、中间数据模型、序号
//!
//! ## 实现思路
//!
//! 宿主能力（读取、解码、编码、界面）以 trait 注入，核心流程不依赖具体平台，
//! 测试中可替换为确定性的假实现。
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 界面事件（上传 / 调整参数 / 裁切）
//!    ↓
//! handler.rs（校验 + 领号 + 阶段耗时日志）
//!    ├─ codec.rs（读取 + 签名校验 + 解码）
//!    ├─ encoder.rs（尺寸限制 + 画布 + 水印 + 编码）
//!    └─ stats.rs（压缩率 + 下载文件名）
//!    ↓
//! ui.rs（展示结果 / 提示 / 步骤切换）
//! ```
//!
//! ## 分层职责建议
//!
//! - 限制阈值与默认值变更优先改 `config.rs`
//! - 流程顺序与过期判断变更优先改 `handler.rs`
//! - 缩放算法变更优先改 `geometry.rs` 与 `surface.rs`
//! - 格式与画质映射变更优先改 `codec.rs`

mod codec;
mod config;
mod crop;
mod encoder;
mod error;
mod geometry;
mod handler;
mod sequencer;
mod source;
mod stats;
mod surface;
mod ui;
mod watermark;

pub use codec::{validate_image_signature, FileReader, FsFileReader, ImageCodec, RasterCodec};
pub use config::{CompressorConfig, ResizeFilter, WatermarkColor};
pub use crop::{crop_raster, CropRect, CropSelection};
pub use encoder::{encode, estimate_payload_size, mime_supports_alpha, to_data_url, EncodeJob, EncodedImage};
pub use error::CompressError;
pub use geometry::{clamp, ClampedSize};
pub use handler::{CompressionOrchestrator, CompressionOutcome, CompressionResult, CompressionStage};
pub use sequencer::RequestSequencer;
pub use source::{
    CompressionInput, CompressionRequest, CompressionSettings, FileData, ImageFile, OutputFormat, Raster,
    WatermarkSpec,
};
pub use stats::{
    base_file_name, compression_notice, compression_ratio, download_file_name, format_change_notice,
    format_file_size, preset_matches, quality_hint, CompressionStats, FALLBACK_BASE_NAME,
    PRESET_QUALITY_TOLERANCE,
};
pub use surface::{embedded_font, Surface, TextAlign, TextBaseline, TextCanvas, TextStyle};
pub use ui::{CompressionUi, DownloadArtifact, OriginalInfo, WorkflowStep};
pub use watermark::{render_watermark, sanitize_watermark_text, WatermarkStyle};
