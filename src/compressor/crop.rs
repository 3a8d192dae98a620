//! # 裁切选择状态
//!
//! ## 设计思路
//!
//! 裁切工具交出“无选择”或“已裁切的像素区域”。本模块只保存这两类状态：
//! - 最近上传的文件（新上传会使旧裁切失效）
//! - 已裁切的区域（作为源图传给压缩流程）
//!
//! 选区超出原图时先裁到原图范围内，裁完为空视为失败。

use image::GenericImageView;

use super::{CompressError, CompressionInput, ImageFile, Raster};

/// 像素坐标下的矩形选区。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// 限制在 `width x height` 范围内的选区，结果为空时返回 `None`。
    pub fn clamp_to(self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self::new(self.x, self.y, w, h))
    }
}

/// 从源图中裁出选区。
pub fn crop_raster(source: &Raster, rect: CropRect) -> Result<Raster, CompressError> {
    let (width, height) = source.dimensions();
    let rect = rect
        .clamp_to(width, height)
        .ok_or_else(|| CompressError::Validation("裁切失败，请重新选择区域".to_string()))?;

    let view = source.as_image().view(rect.x, rect.y, rect.width, rect.height);
    Ok(Raster::from_rgba(view.to_image()))
}

/// 上传与裁切状态。
#[derive(Debug, Default)]
pub struct CropSelection {
    uploaded: Option<ImageFile>,
    cropped: Option<Raster>,
}

impl CropSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录新上传的文件，同时丢弃旧裁切。
    pub fn set_uploaded_file(&mut self, file: ImageFile) {
        self.cropped = None;
        self.uploaded = Some(file);
    }

    pub fn uploaded_file(&self) -> Option<&ImageFile> {
        self.uploaded.as_ref()
    }

    pub fn cropped(&self) -> Option<&Raster> {
        self.cropped.as_ref()
    }

    /// 在已解码的原图上应用选区。
    pub fn apply_crop(&mut self, source: &Raster, rect: CropRect) -> Result<&Raster, CompressError> {
        let cropped = crop_raster(source, rect)?;
        log::info!(
            "✂️ 已裁切图片 - {}x{} -> {}x{}",
            source.width(),
            source.height(),
            cropped.width(),
            cropped.height()
        );
        let cropped = self.cropped.insert(cropped);
        Ok(&*cropped)
    }

    /// 重置裁切，保留已上传文件。
    pub fn reset(&mut self) -> Result<(), CompressError> {
        if self.uploaded.is_none() {
            return Err(CompressError::Validation("没有可重置的图片".to_string()));
        }
        self.cropped = None;
        Ok(())
    }

    /// 清理全部状态。
    pub fn clear(&mut self) {
        self.uploaded = None;
        self.cropped = None;
    }

    /// 构建一次压缩的输入。
    pub fn to_input(&self) -> CompressionInput {
        CompressionInput {
            file: self.uploaded.clone(),
            crop: self.cropped.clone(),
        }
    }
}
