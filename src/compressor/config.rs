//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `CompressorConfig`，保证运行时行为可观测、可测试。
//! 这些值在单个编排器实例内视为常量；每次请求的画质、格式、水印由
//! `CompressionSettings` 单独传入。
//!
//! ## 实现思路
//!
//! - `Default` 提供与网页版一致的限制值。
//! - `#[serde(default)]` 允许只覆盖部分字段。
//! - `validate` 在构造编排器前拒绝不合理的组合。

use std::time::Duration;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::CompressError;

/// 水印填充色（RGBA，alpha 为 0~1）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Default for WatermarkColor {
    fn default() -> Self {
        Self {
            r: 108,
            g: 99,
            b: 255,
            alpha: 0.35,
        }
    }
}

/// 缩放滤镜。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn to_fast_filter(self) -> fast_image_resize::FilterType {
        match self {
            Self::Nearest => fast_image_resize::FilterType::Box,
            Self::Bilinear => fast_image_resize::FilterType::Bilinear,
            Self::CatmullRom => fast_image_resize::FilterType::CatmullRom,
            Self::Lanczos3 => fast_image_resize::FilterType::Lanczos3,
        }
    }

    pub(crate) fn to_image_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// 压缩配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    /// 输出画布允许的总像素上限（`width * height`）。
    pub max_total_pixels: u64,
    /// 输出画布宽/高单边最大值。
    pub max_dimension: u32,
    /// 输入文件允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 水印文字最大字符数。
    pub watermark_max_length: usize,
    /// 字号 = floor(宽度 / 该值)。
    pub watermark_font_size_ratio: u32,
    /// 边距 = floor(宽度 / 该值)。
    pub watermark_padding_ratio: u32,
    pub watermark_color: WatermarkColor,
    /// 未提供画质时使用的默认值（0~1）。
    pub default_quality: f32,
    /// 编码前的人为延迟（毫秒），仅用于配合界面动画，默认 0。
    pub compression_delay_ms: u64,
    pub resize_filter: ResizeFilter,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            max_total_pixels: 16_777_216,
            max_dimension: 4096,
            max_file_size: 50 * 1024 * 1024,
            watermark_max_length: 50,
            watermark_font_size_ratio: 20,
            watermark_padding_ratio: 40,
            watermark_color: WatermarkColor::default(),
            default_quality: 0.7,
            compression_delay_ms: 0,
            resize_filter: ResizeFilter::Bilinear,
        }
    }
}

impl CompressorConfig {
    /// 从 JSON 文本解析配置，缺省字段使用默认值。
    ///
    /// # 示例
    /// ```rust
    /// use image_compressor::compressor::CompressorConfig;
    ///
    /// let config = CompressorConfig::from_json_str(r#"{ "max_dimension": 2048 }"#)?;
    /// assert_eq!(config.max_dimension, 2048);
    /// assert_eq!(config.max_total_pixels, 16_777_216);
    /// # Ok::<(), image_compressor::compressor::CompressError>(())
    /// ```
    pub fn from_json_str(raw: &str) -> Result<Self, CompressError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| CompressError::InvalidConfig(format!("配置解析失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn compression_delay(&self) -> Duration {
        Duration::from_millis(self.compression_delay_ms)
    }

    /// 校验配置组合是否可用。
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.max_total_pixels == 0 {
            return Err(CompressError::InvalidConfig("max_total_pixels 不能为 0".to_string()));
        }
        if self.max_dimension == 0 {
            return Err(CompressError::InvalidConfig("max_dimension 不能为 0".to_string()));
        }
        if self.max_file_size == 0 {
            return Err(CompressError::InvalidConfig("max_file_size 不能为 0".to_string()));
        }
        if self.watermark_font_size_ratio == 0 || self.watermark_padding_ratio == 0 {
            return Err(CompressError::InvalidConfig(
                "水印字号/边距比例不能为 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_quality) {
            return Err(CompressError::InvalidConfig(format!(
                "default_quality 必须在 0~1 之间：{}",
                self.default_quality
            )));
        }
        if !(0.0..=1.0).contains(&self.watermark_color.alpha) {
            return Err(CompressError::InvalidConfig(format!(
                "水印透明度必须在 0~1 之间：{}",
                self.watermark_color.alpha
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let config = CompressorConfig::default();
        assert_eq!(config.max_total_pixels, 4096 * 4096);
        assert_eq!(config.max_dimension, 4096);
        assert_eq!(config.max_file_size, 52_428_800);
        assert_eq!(config.watermark_max_length, 50);
        assert_eq!(config.compression_delay(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CompressorConfig::from_json_str(
            r#"{ "compression_delay_ms": 800, "resize_filter": "lanczos3" }"#,
        )
        .expect("parse config failed");
        assert_eq!(config.compression_delay(), Duration::from_millis(800));
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
        assert_eq!(config.default_quality, 0.7);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let result = CompressorConfig::from_json_str(r#"{ "default_quality": 1.5 }"#);
        assert!(matches!(result, Err(CompressError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_ratio() {
        let config = CompressorConfig {
            watermark_padding_ratio: 0,
            ..CompressorConfig::default()
        };
        assert!(matches!(config.validate(), Err(CompressError::InvalidConfig(_))));
    }
}
