//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `CompressionOrchestrator` 只负责流程编排，不直接与界面绑定。
//! 单次请求的状态流转：
//!
//! ```text
//! Validating → Reading → Decoding → Encoding → Displaying → Done
//!                 └──────────┴──────────┴──→ Aborted（过期或出错）
//! ```
//!
//! 存在裁切结果时跳过 Reading / Decoding，直接进入 Encoding。
//!
//! ## 实现思路
//!
//! - 先校验后领号：校验失败不消耗序号。
//! - 每个异步阶段（读取、解码、延迟、编码）完成后、写入界面前用 `is_current` 复核；
//!   过期请求只释放缓冲，不触碰任何界面状态。
//! - 缩放、水印与编码在 `spawn_blocking` 中执行，与解码一致，不占用异步工作线程。
//! - 所有失败都恢复空闲状态并给出提示，`compress` 本身不向外抛错。
//! - 记录 `read/decode/encode/total` 阶段耗时，便于性能诊断。

use std::sync::Arc;
use std::time::{Duration, Instant};

use ab_glyph::FontArc;

use super::codec::{validate_image_signature, FileReader, FsFileReader, ImageCodec, RasterCodec};
use super::encoder::{self, mime_supports_alpha, EncodeJob};
use super::geometry::ClampedSize;
use super::sequencer::RequestSequencer;
use super::stats::{
    compression_notice, download_file_name, format_change_notice, format_file_size, CompressionStats,
};
use super::ui::{CompressionUi, DownloadArtifact, OriginalInfo, WorkflowStep};
use super::{
    CompressError, CompressionInput, CompressionRequest, CompressionSettings, CompressorConfig, ImageFile,
    Raster,
};

/// 单次请求所处阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStage {
    Validating,
    Reading,
    Decoding,
    Encoding,
    Displaying,
    Done,
    Aborted,
}

impl CompressionStage {
    /// 日志中使用的上下文标签。
    pub fn label(self) -> &'static str {
        match self {
            Self::Validating => "validate",
            Self::Reading => "FileReader",
            Self::Decoding => "ImageDecode",
            Self::Encoding => "processCompression",
            Self::Displaying => "display",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

/// 压缩成功的产物。
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub request: CompressionRequest,
    /// 编码后的原始字节。
    pub bytes: Vec<u8>,
    pub size: ClampedSize,
    pub watermarked: bool,
    pub stats: CompressionStats,
    pub artifact: DownloadArtifact,
}

/// 一次 `compress` 调用的结局。
#[derive(Debug, Clone)]
pub enum CompressionOutcome {
    Completed(CompressionResult),
    /// 校验未通过，未领取序号。
    Rejected(CompressError),
    Failed {
        id: u64,
        stage: CompressionStage,
        error: CompressError,
    },
    /// 已被更新的请求取代，静默结束。
    Superseded { id: u64, stage: CompressionStage },
}

impl CompressionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn result(&self) -> Option<&CompressionResult> {
        match self {
            Self::Completed(result) => Some(result),
            _ => None,
        }
    }

    /// 结局对应的终态。
    pub fn final_stage(&self) -> CompressionStage {
        match self {
            Self::Completed(_) => CompressionStage::Done,
            Self::Rejected(_) => CompressionStage::Validating,
            Self::Failed { .. } | Self::Superseded { .. } => CompressionStage::Aborted,
        }
    }
}

enum Abort {
    Stale(CompressionStage),
    Failed(CompressionStage, CompressError),
}

#[derive(Default)]
struct StageTimings {
    read: Duration,
    decode: Duration,
}

/// 压缩编排器。
///
/// 持有配置、序号发放器、宿主能力与界面协作方。
pub struct CompressionOrchestrator<U, R = FsFileReader, C = ImageCodec> {
    config: CompressorConfig,
    sequencer: RequestSequencer,
    reader: R,
    codec: Arc<C>,
    ui: U,
    font: Option<FontArc>,
}

impl<U: CompressionUi> CompressionOrchestrator<U> {
    /// 使用默认读取与编解码能力创建编排器。
    pub fn new(config: CompressorConfig, ui: U) -> Result<Self, CompressError> {
        Self::with_capabilities(config, FsFileReader, ImageCodec, ui)
    }
}

impl<U, R, C> CompressionOrchestrator<U, R, C>
where
    U: CompressionUi,
    R: FileReader,
    C: RasterCodec + 'static,
{
    /// 注入自定义能力创建编排器（测试中使用确定性的假实现）。
    pub fn with_capabilities(config: CompressorConfig, reader: R, codec: C, ui: U) -> Result<Self, CompressError> {
        config.validate()?;
        Ok(Self {
            config,
            sequencer: RequestSequencer::new(),
            reader,
            codec: Arc::new(codec),
            ui,
            font: None,
        })
    }

    /// 设置水印字体，未设置时使用内置字体。
    pub fn with_watermark_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// 从字体文件字节（TTF/OTF）加载水印字体。
    pub fn load_watermark_font(self, font_bytes: Vec<u8>) -> Result<Self, CompressError> {
        let font = FontArc::try_from_vec(font_bytes)
            .map_err(|e| CompressError::InvalidConfig(format!("水印字体无效：{}", e)))?;
        Ok(self.with_watermark_font(font))
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn codec(&self) -> &C {
        self.codec.as_ref()
    }

    /// 校验输入：存在图片来源、声明类型为图片、体积不超过上限。
    pub fn validate(&self, input: &CompressionInput) -> Result<(), CompressError> {
        if input.file.is_none() && input.crop.is_none() {
            return Err(CompressError::Validation("请先选择图片".to_string()));
        }

        if let Some(file) = &input.file {
            if !file.is_image() {
                return Err(CompressError::Validation("只能上传图片文件".to_string()));
            }

            if file.size > self.config.max_file_size {
                return Err(CompressError::Validation(format!(
                    "文件过大，请选择小于 {}MB 的图片",
                    (self.config.max_file_size as f64 / 1024.0 / 1024.0).round()
                )));
            }
        }

        Ok(())
    }

    /// 只有文件时的便捷入口。
    pub async fn compress_file(&self, file: ImageFile, settings: CompressionSettings) -> CompressionOutcome {
        self.compress(CompressionInput::from_file(file), settings).await
    }

    /// 处理主入口：校验 → 领号 →（读取 → 解码）→ 编码 → 展示。
    pub async fn compress(&self, input: CompressionInput, settings: CompressionSettings) -> CompressionOutcome {
        if let Err(err) = self.validate(&input) {
            log::warn!("⚠️ 输入校验失败：{}", err);
            self.ui.show_message(&err.user_message());
            return CompressionOutcome::Rejected(err);
        }

        let request = CompressionRequest {
            id: self.sequencer.next(),
            quality: self.resolve_quality(settings.quality),
            format: settings.format,
            watermark: settings.watermark,
        };

        log::info!(
            "🚀 开始压缩请求 #{} - source={} format={} quality={:.2}",
            request.id,
            if input.crop.is_some() { "crop" } else { "file" },
            request.format,
            request.quality
        );

        self.ui.set_busy(true);
        let total_start = Instant::now();

        let id = request.id;
        let CompressionInput { file, crop } = input;
        let run = match crop {
            Some(crop) => self.run_from_crop(request, file.as_ref(), crop).await,
            None => match &file {
                Some(file) => self.run_from_file(request, file).await,
                None => Err(Abort::Failed(
                    CompressionStage::Validating,
                    CompressError::Validation("请先选择图片".to_string()),
                )),
            },
        };

        match run {
            Ok(result) => {
                log::info!(
                    "✅ 压缩请求 #{} 完成 - ratio={:.2}% total={}ms",
                    id,
                    result.stats.ratio,
                    total_start.elapsed().as_millis()
                );
                CompressionOutcome::Completed(result)
            }
            Err(Abort::Stale(stage)) => CompressionOutcome::Superseded { id, stage },
            Err(Abort::Failed(stage, error)) => {
                if !self.sequencer.is_current(id) {
                    log::debug!("🔕 过期请求 #{} 出错，忽略：{}", id, error);
                    return CompressionOutcome::Superseded { id, stage };
                }
                self.report_failure(id, stage, &error);
                CompressionOutcome::Failed { id, stage, error }
            }
        }
    }

    fn resolve_quality(&self, quality: Option<f32>) -> f32 {
        quality
            .filter(|q| q.is_finite())
            .map(|q| q.clamp(0.0, 1.0))
            .unwrap_or(self.config.default_quality)
    }

    fn ensure_current(&self, id: u64, stage: CompressionStage) -> Result<(), Abort> {
        if self.sequencer.is_current(id) {
            return Ok(());
        }
        log::debug!(
            "🔕 请求 #{} 已被 #{} 取代（阶段：{:?}），放弃后续处理",
            id,
            self.sequencer.latest(),
            stage
        );
        Err(Abort::Stale(stage))
    }

    fn report_failure(&self, id: u64, stage: CompressionStage, error: &CompressError) {
        log::error!(
            "❌ [{}] 压缩请求 #{} 失败 - code={} error={} timestamp={}",
            stage.label(),
            id,
            error.code(),
            error,
            chrono::Utc::now().to_rfc3339()
        );
        self.ui.show_message(&error.user_message());
        self.ui.set_busy(false);
    }

    async fn run_from_file(&self, request: CompressionRequest, file: &ImageFile) -> Result<CompressionResult, Abort> {
        let mut timings = StageTimings::default();

        let read_start = Instant::now();
        let bytes = self
            .reader
            .read(file)
            .await
            .map_err(|e| Abort::Failed(CompressionStage::Reading, e))?;
        timings.read = read_start.elapsed();
        self.ensure_current(request.id, CompressionStage::Reading)?;

        validate_image_signature(&bytes).map_err(|e| Abort::Failed(CompressionStage::Decoding, e))?;

        let decode_start = Instant::now();
        let raster = self
            .codec
            .decode(bytes)
            .await
            .map_err(|e| Abort::Failed(CompressionStage::Decoding, e))?;
        timings.decode = decode_start.elapsed();
        self.ensure_current(request.id, CompressionStage::Decoding)?;

        self.ui.show_original(&Self::original_info(file, &raster));

        log::debug!(
            "📥 请求 #{} 读取={}ms 解码={}ms 原始尺寸={}x{}",
            request.id,
            timings.read.as_millis(),
            timings.decode.as_millis(),
            raster.width(),
            raster.height()
        );

        let alpha_aware = mime_supports_alpha(&file.mime_type);
        self.encode_and_display(request, Some(file), raster, alpha_aware, false)
            .await
    }

    async fn run_from_crop(
        &self,
        request: CompressionRequest,
        file: Option<&ImageFile>,
        crop: Raster,
    ) -> Result<CompressionResult, Abort> {
        let alpha_aware = crop.has_alpha();
        self.encode_and_display(request, file, crop, alpha_aware, true)
            .await
    }

    async fn encode_and_display(
        &self,
        request: CompressionRequest,
        file: Option<&ImageFile>,
        source: Raster,
        alpha_aware: bool,
        from_crop: bool,
    ) -> Result<CompressionResult, Abort> {
        let delay = self.config.compression_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.ensure_current(request.id, CompressionStage::Encoding)?;

        let encode_start = Instant::now();
        let codec = Arc::clone(&self.codec);
        let config = self.config.clone();
        let font = self.font.clone();
        let watermark = request.watermark.clone();
        let (format, quality) = (request.format, request.quality);

        let encoded = tokio::task::spawn_blocking(move || {
            encoder::encode(
                codec.as_ref(),
                EncodeJob {
                    source: &source,
                    alpha_aware,
                    format,
                    quality,
                    watermark: &watermark,
                },
                &config,
                font.as_ref(),
            )
        })
        .await
        .map_err(|e| {
            Abort::Failed(
                CompressionStage::Encoding,
                CompressError::Encode(format!("编码线程执行失败：{}", e)),
            )
        })?
        .map_err(|e| Abort::Failed(CompressionStage::Encoding, e))?;
        let encode_elapsed = encode_start.elapsed();
        self.ensure_current(request.id, CompressionStage::Encoding)?;

        for notice in Self::resize_notices(&encoded.size, from_crop) {
            self.ui.show_message(notice);
        }

        let format = request.format;
        let original_size = file.map(|f| f.size).unwrap_or(0);
        let stats = CompressionStats::new(
            original_size,
            encoded.estimated_size,
            encoded.size.width,
            encoded.size.height,
            format,
        );
        let artifact = DownloadArtifact {
            format,
            file_name: download_file_name(file.map(|f| f.name.as_str()), format),
            data_url: encoded.data_url,
        };

        log::info!(
            "📊 请求 #{} 编码={}ms {} ({})",
            request.id,
            encode_elapsed.as_millis(),
            stats.size_comparison(),
            stats.ratio_label()
        );

        self.ui.show_result(&stats, &artifact);

        if let Some(notice) = compression_notice(stats.ratio) {
            self.ui.show_message(notice);
        }
        if let Some(notice) = format_change_notice(file.and_then(ImageFile::subtype), format) {
            self.ui.show_message(&notice);
        }

        self.ui.set_busy(false);
        self.ui.complete_step(WorkflowStep::Compress);
        self.ui.activate_step(WorkflowStep::Download);

        Ok(CompressionResult {
            request,
            bytes: encoded.bytes,
            size: encoded.size,
            watermarked: encoded.watermarked,
            stats,
            artifact,
        })
    }

    fn resize_notices(size: &ClampedSize, from_crop: bool) -> Vec<&'static str> {
        let mut notices = Vec::new();
        if size.pixel_budget_applied {
            notices.push(if from_crop {
                "裁切后图片像素过高，已自动调整尺寸"
            } else {
                "图片像素过高，已自动调整尺寸"
            });
        }
        if size.dimension_cap_applied {
            notices.push(if from_crop {
                "裁切后图片尺寸很大，已调整为较小尺寸以确保性能"
            } else {
                "图片尺寸很大，已调整为较小尺寸以确保性能"
            });
        }
        notices
    }

    fn original_info(file: &ImageFile, raster: &Raster) -> OriginalInfo {
        let subtype = file.subtype().unwrap_or("unknown").to_uppercase();
        OriginalInfo {
            file_name: file.name.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
            width: raster.width(),
            height: raster.height(),
            summary: format!(
                "{} | {} | {} x {}",
                format_file_size(file.size as i64),
                subtype,
                raster.width(),
                raster.height()
            ),
        }
    }
}
