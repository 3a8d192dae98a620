//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageFile` 表示文件选择器交来的文件（名称、声明体积、声明类型、内容）
//! - `Raster` 表示已解码的像素网格（原图或裁切区域）
//! - `CompressionInput` 表示一次压缩可用的输入（文件 / 裁切结果）
//! - `CompressionRequest` 表示通过校验后的单次请求快照

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, RgbaImage};

use super::CompressError;

/// 文件内容的承载方式。
#[derive(Debug, Clone)]
pub enum FileData {
    /// 已在内存中的字节。
    Memory(Bytes),
    /// 本地文件路径，读取阶段再加载。
    Path(PathBuf),
}

/// 文件选择器/拖放交来的文件。
///
/// 一经创建不可变；新的上传产生新的 `ImageFile`。
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    /// 声明的字节体积。
    pub size: u64,
    /// 声明的 MIME 类型（如 `image/png`）。
    pub mime_type: String,
    pub data: FileData,
}

impl ImageFile {
    /// 由内存字节构建文件。
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            data: FileData::Memory(bytes),
        }
    }

    /// 由本地路径构建文件，MIME 类型按文件签名识别。
    ///
    /// 无法识别时声明为 `application/octet-stream`，会在校验阶段被拒绝。
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CompressError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|e| CompressError::Read(format!("无法读取文件信息：{}", e)))?;

        let mime_type = infer::get_from_path(path)
            .map_err(|e| CompressError::Read(format!("无法识别文件类型：{}", e)))?
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            size: metadata.len(),
            mime_type,
            data: FileData::Path(path.to_path_buf()),
        })
    }

    /// 声明类型是否为图片。
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// 声明类型的子类型（`image/png` → `png`）。
    pub fn subtype(&self) -> Option<&str> {
        self.mime_type.split('/').nth(1).filter(|s| !s.is_empty())
    }
}

/// 已解码的像素网格。
#[derive(Debug, Clone)]
pub struct Raster {
    image: DynamicImage,
}

impl Raster {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// 像素格式是否带 alpha 通道。
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// 输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// 稳定字符串，同时用作下载文件扩展名。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CompressError;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            other => Err(CompressError::InvalidConfig(format!(
                "未知输出格式：{}（可选：jpeg / png / webp）",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 水印开关与原始文本（未清洗）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatermarkSpec {
    pub enabled: bool,
    pub text: String,
}

impl WatermarkSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            enabled: true,
            text: text.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// 界面提供的压缩参数。
#[derive(Debug, Clone, Default)]
pub struct CompressionSettings {
    /// 画质（0~1）；`None` 时使用配置中的默认值。
    pub quality: Option<f32>,
    pub format: OutputFormat,
    pub watermark: WatermarkSpec,
}

/// 一次压缩可用的输入。
///
/// 存在裁切结果时优先使用裁切结果；`file` 仍用于原始体积与文件名。
#[derive(Debug, Clone, Default)]
pub struct CompressionInput {
    pub file: Option<ImageFile>,
    pub crop: Option<Raster>,
}

impl CompressionInput {
    pub fn from_file(file: ImageFile) -> Self {
        Self {
            file: Some(file),
            crop: None,
        }
    }

    pub fn with_crop(mut self, crop: Raster) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// 通过校验后的请求快照。
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionRequest {
    pub id: u64,
    pub quality: f32,
    pub format: OutputFormat,
    pub watermark: WatermarkSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_accepts_jpg_alias() {
        assert_eq!("JPG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!(" webp ".parse::<OutputFormat>(), Ok(OutputFormat::Webp));
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn file_subtype_and_image_check() {
        let file = ImageFile::from_bytes("a.png", "image/png", vec![1u8, 2, 3]);
        assert!(file.is_image());
        assert_eq!(file.subtype(), Some("png"));
        assert_eq!(file.size, 3);

        let text = ImageFile::from_bytes("a.txt", "text/plain", Vec::<u8>::new());
        assert!(!text.is_image());
    }
}
