//! # 编码模块
//!
//! ## 设计思路
//!
//! 将“源图 → 画布 → 水印 → 序列化”的过程集中管理：
//!
//! 1. 以源图（原图或裁切区域）尺寸为起点执行尺寸限制
//! 2. 按限制后的尺寸分配画布，分配失败返回 `EncodingContext`
//! 3. 源图支持透明时先清空画布
//! 4. 缩放绘制源图，绘制水印
//! 5. 按格式与画质编码，并包装为 Base64 `data:` URL
//!
//! 体积估算沿用 `floor(len(body) * 3 / 4)`，`body` 为 `,` 之后的 Base64 部分。

use ab_glyph::FontArc;
use base64::{Engine as _, engine::general_purpose};

use super::codec::RasterCodec;
use super::geometry::{clamp, ClampedSize};
use super::surface::Surface;
use super::watermark::{render_watermark, WatermarkStyle};
use super::{CompressError, CompressorConfig, OutputFormat, Raster, WatermarkSpec};

/// 单次编码任务。
pub struct EncodeJob<'a> {
    pub source: &'a Raster,
    /// 源图是否具有透明语义（声明为支持 alpha 的格式或像素带 alpha）。
    pub alpha_aware: bool,
    pub format: OutputFormat,
    pub quality: f32,
    pub watermark: &'a WatermarkSpec,
}

/// 编码结果。
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    /// `data:<mime>;base64,<body>` 形式的载荷。
    pub data_url: String,
    pub format: OutputFormat,
    pub size: ClampedSize,
    /// 由 Base64 载荷估算的字节数。
    pub estimated_size: u64,
    pub watermarked: bool,
}

/// 按 Base64 载荷估算编码后字节数。
///
/// 载荷可以是完整的 `data:` URL，也可以是不带头部的 Base64 文本。
///
/// # 示例
/// ```rust
/// use image_compressor::compressor::estimate_payload_size;
///
/// let body = "A".repeat(533_333);
/// assert_eq!(estimate_payload_size(&format!("data:image/jpeg;base64,{}", body)), 399_999);
/// ```
pub fn estimate_payload_size(payload: &str) -> u64 {
    let body = match payload.split_once(',') {
        Some((_, body)) => body,
        None if payload.starts_with("data:") => "",
        None => payload,
    };
    (body.len() as u64).saturating_mul(3) / 4
}

/// 构建 `data:` URL。
pub fn to_data_url(format: OutputFormat, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        format.mime_type(),
        general_purpose::STANDARD.encode(bytes)
    )
}

/// MIME 类型是否属于支持透明的格式。
pub fn mime_supports_alpha(mime_type: &str) -> bool {
    matches!(
        mime_type.trim().to_lowercase().as_str(),
        "image/png" | "image/webp" | "image/gif" | "image/avif" | "image/tiff" | "image/x-icon"
    )
}

/// 执行编码任务。
pub fn encode<C: RasterCodec + ?Sized>(
    codec: &C,
    job: EncodeJob<'_>,
    config: &CompressorConfig,
    font: Option<&FontArc>,
) -> Result<EncodedImage, CompressError> {
    let (source_width, source_height) = job.source.dimensions();
    let size = clamp(source_width, source_height, config.max_total_pixels, config.max_dimension);

    if size.resized {
        log::info!(
            "🧩 尺寸限制：{}x{} -> {}x{}（pixel_budget={}, dimension_cap={}）",
            source_width,
            source_height,
            size.width,
            size.height,
            size.pixel_budget_applied,
            size.dimension_cap_applied
        );
    }

    let mut surface = Surface::allocate(size.width, size.height)?.with_font(font.cloned());

    if job.alpha_aware || job.source.has_alpha() {
        surface.clear();
    }

    surface.draw_raster(job.source, config.resize_filter)?;

    let watermarked = render_watermark(
        &mut surface,
        size.width,
        size.height,
        job.watermark,
        &WatermarkStyle::from_config(config),
    );

    let bytes = codec.encode(&surface, job.format, job.quality)?;
    drop(surface);

    let data_url = to_data_url(job.format, &bytes);
    let estimated_size = estimate_payload_size(&data_url);

    log::debug!(
        "🗜️ 编码完成 - format={} quality={:.2} {}x{} bytes={} estimated={}",
        job.format,
        job.quality,
        size.width,
        size.height,
        bytes.len(),
        estimated_size
    );

    Ok(EncodedImage {
        bytes,
        data_url,
        format: job.format,
        size,
        estimated_size,
        watermarked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::codec::ImageCodec;
    use image::{ImageBuffer, Rgba};
    use std::sync::Mutex;

    /// 记录编码调用的假实现。
    #[derive(Default)]
    struct RecordingCodec {
        seen: Mutex<Vec<(u32, u32, OutputFormat, f32)>>,
    }

    impl RasterCodec for RecordingCodec {
        async fn decode(&self, _bytes: Vec<u8>) -> Result<Raster, CompressError> {
            Err(CompressError::Decode("not used".to_string()))
        }

        fn encode(&self, surface: &Surface, format: OutputFormat, quality: f32) -> Result<Vec<u8>, CompressError> {
            self.seen
                .lock()
                .expect("lock poisoned")
                .push((surface.width(), surface.height(), format, quality));
            Ok(vec![0u8; 30])
        }
    }

    fn raster(width: u32, height: u32) -> Raster {
        Raster::from_rgba(ImageBuffer::from_pixel(width, height, Rgba([40, 80, 120, 255])))
    }

    fn job<'a>(source: &'a Raster, watermark: &'a WatermarkSpec) -> EncodeJob<'a> {
        EncodeJob {
            source,
            alpha_aware: false,
            format: OutputFormat::Jpeg,
            quality: 0.7,
            watermark,
        }
    }

    #[test]
    fn estimate_matches_documented_example() {
        let body = "A".repeat(533_333);
        assert_eq!(estimate_payload_size(&body), 399_999);
        assert_eq!(estimate_payload_size("data:,"), 0);
        assert_eq!(estimate_payload_size("data:image/png;base64"), 0);
    }

    #[test]
    fn data_url_has_header_and_body() {
        let url = to_data_url(OutputFormat::Png, &[1, 2, 3]);
        assert_eq!(url, "data:image/png;base64,AQID");
        assert_eq!(estimate_payload_size(&url), 3);
    }

    #[test]
    fn alpha_mime_detection() {
        assert!(mime_supports_alpha("image/png"));
        assert!(mime_supports_alpha("IMAGE/WEBP"));
        assert!(!mime_supports_alpha("image/jpeg"));
    }

    #[test]
    fn encode_uses_clamped_surface() {
        let codec = RecordingCodec::default();
        let config = CompressorConfig {
            max_total_pixels: 10_000,
            max_dimension: 80,
            ..CompressorConfig::default()
        };
        let source = raster(400, 100);
        let watermark = WatermarkSpec::disabled();

        let encoded = encode(&codec, job(&source, &watermark), &config, None).expect("encode failed");

        // 400x100 = 40000 > 10000：ratio 0.5 → 200x50；再按单边 80 → 80x20
        assert_eq!((encoded.size.width, encoded.size.height), (80, 20));
        assert!(encoded.size.resized);
        assert_eq!(codec.seen.lock().expect("lock poisoned")[0], (80, 20, OutputFormat::Jpeg, 0.7));
        assert_eq!(encoded.estimated_size, 30);
        assert!(encoded.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn zero_sized_surface_is_context_error() {
        let codec = RecordingCodec::default();
        let source = raster(10_000, 1);
        let config = CompressorConfig {
            max_dimension: 100,
            ..CompressorConfig::default()
        };
        let watermark = WatermarkSpec::disabled();

        let result = encode(&codec, job(&source, &watermark), &config, None);
        assert!(matches!(result, Err(CompressError::EncodingContext(_))));
        assert!(codec.seen.lock().expect("lock poisoned").is_empty());
    }

    #[test]
    fn embedded_font_draws_watermark() {
        let source = raster(400, 200);
        let watermark = WatermarkSpec::new("demo");
        let encoded = encode(&ImageCodec, job(&source, &watermark), &CompressorConfig::default(), None)
            .expect("encode failed");
        assert!(encoded.watermarked);
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        // 填充字符会让估算值向上取到 3 的倍数
        assert_eq!(encoded.estimated_size, (encoded.bytes.len() as u64).div_ceil(3) * 3);
    }

    #[test]
    fn text_without_glyphs_is_not_reported_as_watermarked() {
        let source = raster(400, 200);
        let watermark = WatermarkSpec::new("水印");
        let encoded = encode(&ImageCodec, job(&source, &watermark), &CompressorConfig::default(), None)
            .expect("encode failed");
        assert!(!encoded.watermarked);
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
    }
}
