//! # 宿主能力模块（读取 / 解码 / 编码）
//!
//! ## 设计思路
//!
//! 读取文件字节、解码像素、编码画布都属于宿主能力，编排器只依赖两个窄接口：
//! - `FileReader`：异步读取 `ImageFile` 的字节
//! - `RasterCodec`：异步解码字节为 `Raster`，同步将画布编码为指定格式
//!
//! 测试中可注入确定性的假实现，从而精确控制回调完成顺序。
//!
//! ## 实现思路
//!
//! - `FsFileReader`：内存字节直接返回，路径使用 `tokio::fs` 读取，并做体积与签名校验。
//! - `ImageCodec`：基于 `image` crate，解码放到阻塞线程执行，避免阻塞 async 运行时；
//!   `image` 只有无损 WebP 编码器，有损 WebP 交给 `webp`（libwebp）。

use std::future::Future;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};

use super::surface::Surface;
use super::{CompressError, FileData, ImageFile, OutputFormat, Raster};

/// 文件读取能力。
pub trait FileReader: Send + Sync {
    fn read(&self, file: &ImageFile) -> impl Future<Output = Result<Vec<u8>, CompressError>> + Send;
}

/// 像素解码/编码能力。
pub trait RasterCodec: Send + Sync {
    fn decode(&self, bytes: Vec<u8>) -> impl Future<Output = Result<Raster, CompressError>> + Send;

    /// 将画布编码为指定格式，`quality` 取值 0~1。
    fn encode(&self, surface: &Surface, format: OutputFormat, quality: f32) -> Result<Vec<u8>, CompressError>;
}

/// 通过文件签名（magic bytes）校验内容是否为图片。
pub fn validate_image_signature(bytes: &[u8]) -> Result<(), CompressError> {
    if bytes.is_empty() {
        return Err(CompressError::Decode("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| CompressError::Decode("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(CompressError::Decode(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 默认文件读取实现。
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileReader;

impl FileReader for FsFileReader {
    async fn read(&self, file: &ImageFile) -> Result<Vec<u8>, CompressError> {
        match &file.data {
            FileData::Memory(bytes) => Ok(bytes.to_vec()),
            FileData::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| CompressError::Read(format!("无法读取图片文件 {}：{}", path.display(), e))),
        }
    }
}

/// 基于 `image` crate 的默认编解码实现。
///
/// - JPEG：按画质 1~100 有损编码，alpha 通道被丢弃
/// - PNG：无损，忽略画质
/// - WebP：按画质 0~100 有损编码，保留 alpha
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    fn decode_blocking(bytes: &[u8]) -> Result<DynamicImage, CompressError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CompressError::Decode(format!("无法识别图片格式：{}", e)))?
            .decode()
            .map_err(|e| CompressError::Decode(format!("图片解码失败：{}", e)))
    }

    /// 画质 0~1 映射到 JPEG 的 1~100。
    pub(crate) fn jpeg_quality(quality: f32) -> u8 {
        let quality = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 0.92 };
        ((quality * 100.0).round() as u8).max(1)
    }

    /// 画质 0~1 映射到 libwebp 的 0~100。
    pub(crate) fn webp_quality(quality: f32) -> f32 {
        let quality = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 0.92 };
        quality * 100.0
    }
}

impl RasterCodec for ImageCodec {
    async fn decode(&self, bytes: Vec<u8>) -> Result<Raster, CompressError> {
        let decoded = tokio::task::spawn_blocking(move || Self::decode_blocking(&bytes))
            .await
            .map_err(|e| CompressError::Decode(format!("解码线程执行失败：{}", e)))??;
        Ok(Raster::new(decoded))
    }

    fn encode(&self, surface: &Surface, format: OutputFormat, quality: f32) -> Result<Vec<u8>, CompressError> {
        let rgba = surface.as_rgba();
        let (width, height) = rgba.dimensions();
        let encode_failed = |e: String| CompressError::Encode(format!("{} 编码失败：{}", format, e));

        match format {
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(rgba.clone()).to_rgb8();
                let mut buffer = Cursor::new(Vec::new());
                JpegEncoder::new_with_quality(&mut buffer, Self::jpeg_quality(quality))
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| encode_failed(e.to_string()))?;
                Ok(buffer.into_inner())
            }
            OutputFormat::Png => {
                let mut buffer = Cursor::new(Vec::new());
                PngEncoder::new(&mut buffer)
                    .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(|e| encode_failed(e.to_string()))?;
                Ok(buffer.into_inner())
            }
            OutputFormat::Webp => {
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                    .encode_simple(false, Self::webp_quality(quality))
                    .map_err(|e| encode_failed(format!("{:?}", e)))?;
                Ok(encoded.to_vec())
            }
        }
    }
}
