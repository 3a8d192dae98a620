//! # 绘制画布模块
//!
//! ## 设计思路
//!
//! `Surface` 相当于内存中的 canvas：固定尺寸的 RGBA 缓冲，可清空、绘制源图、绘制文字，
//! 最终交给编码能力序列化。
//!
//! ## 实现思路
//!
//! 1. 分配阶段使用 `try_reserve_exact`，分配失败映射为 `EncodingContext` 错误
//! 2. 源图尺寸与画布不一致时用 `fast_image_resize` 缩放，失败回退 `image::resize_exact`
//! 3. 文字通过 `ab_glyph` 逐字形光栅化并按 alpha 叠加；未注入字体时使用内置的
//!    DejaVu Sans Mono，字体中缺失的字形跳过不画

use std::sync::OnceLock;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use fast_image_resize as fr;
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};

use super::config::{ResizeFilter, WatermarkColor};
use super::{CompressError, Raster};

/// 文字水平对齐方式（相对锚点）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

/// 文字基线（相对锚点）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    /// 锚点为字母基线。
    Alphabetic,
    /// 锚点为字形下沿。
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: WatermarkColor,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

/// 可绘制文字的目标。
///
/// 水印渲染只依赖该能力，测试中可替换为记录型实现。
pub trait TextCanvas {
    /// 绘制文字，返回是否实际落下了像素。
    fn fill_text(&mut self, text: &str, style: &TextStyle, x: f32, y: f32) -> bool;
}

/// 内置字体（DejaVu Sans Mono，许可见 `fonts/LICENSE-DejaVu.txt`）。
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

static EMBEDDED_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

/// 内置字体，首次调用时解析。
pub fn embedded_font() -> Option<&'static FontArc> {
    EMBEDDED_FONT
        .get_or_init(|| match FontArc::try_from_slice(EMBEDDED_FONT_DATA) {
            Ok(font) => Some(font),
            Err(e) => {
                log::error!("❌ 内置字体解析失败：{}", e);
                None
            }
        })
        .as_ref()
}

/// 内存画布。
pub struct Surface {
    pixels: RgbaImage,
    font: Option<FontArc>,
}

impl Surface {
    /// 分配指定尺寸的透明画布。
    pub fn allocate(width: u32, height: u32) -> Result<Self, CompressError> {
        if width == 0 || height == 0 {
            return Err(CompressError::EncodingContext(format!(
                "画布尺寸无效：{}x{}",
                width, height
            )));
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| CompressError::EncodingContext("画布尺寸导致内存溢出风险".to_string()))?;

        let mut buffer: Vec<u8> = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|e| CompressError::EncodingContext(format!("画布内存分配失败：{}", e)))?;
        buffer.resize(len, 0);

        let pixels = RgbaImage::from_raw(width, height, buffer)
            .ok_or_else(|| CompressError::EncodingContext("画布缓冲长度异常".to_string()))?;

        Ok(Self { pixels, font: None })
    }

    /// 设置绘制文字使用的字体，`None` 时回退到内置字体。
    pub fn with_font(mut self, font: Option<FontArc>) -> Self {
        self.font = font;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// 清空为全透明。
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// 将源图缩放到画布尺寸并叠加绘制（source-over）。
    pub fn draw_raster(&mut self, raster: &Raster, filter: ResizeFilter) -> Result<(), CompressError> {
        let (target_width, target_height) = (self.width(), self.height());

        let scaled = if raster.dimensions() == (target_width, target_height) {
            raster.as_image().to_rgba8()
        } else {
            match Self::resize_with_fast_image_resize(raster.as_image(), target_width, target_height, filter) {
                Ok(resized) => resized,
                Err(err) => {
                    log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}", err);
                    raster
                        .as_image()
                        .resize_exact(target_width, target_height, filter.to_image_filter())
                        .to_rgba8()
                }
            }
        };

        image::imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        Ok(())
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: ResizeFilter,
    ) -> Result<RgbaImage, CompressError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| CompressError::Encode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(filter.to_fast_filter()));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| CompressError::Encode(format!("fast_image_resize 执行失败：{}", e)))?;

        ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| CompressError::Encode("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    fn blend(bottom: Rgba<u8>, color: &WatermarkColor, alpha: f32) -> Rgba<u8> {
        let bottom_alpha = bottom[3] as f32 / 255.0;
        let out_alpha = alpha + bottom_alpha * (1.0 - alpha);
        if out_alpha < 0.001 {
            return Rgba([0, 0, 0, 0]);
        }

        let mix = |top: u8, under: u8| -> u8 {
            let top = top as f32 / 255.0;
            let under = under as f32 / 255.0;
            let value = (top * alpha + under * bottom_alpha * (1.0 - alpha)) / out_alpha;
            (value * 255.0).round().clamp(0.0, 255.0) as u8
        };

        Rgba([
            mix(color.r, bottom[0]),
            mix(color.g, bottom[1]),
            mix(color.b, bottom[2]),
            (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
        ])
    }
}

impl TextCanvas for Surface {
    fn fill_text(&mut self, text: &str, style: &TextStyle, x: f32, y: f32) -> bool {
        let Some(font) = self.font.clone().or_else(|| embedded_font().cloned()) else {
            log::warn!("⚠️ 没有可用的水印字体，跳过文字绘制");
            return false;
        };

        let scale = PxScale::from(style.font_size);
        let scaled = font.as_scaled(scale);

        let mut text_width = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                text_width += scaled.kern(p, id);
            }
            text_width += scaled.h_advance(id);
            prev = Some(id);
        }

        let start_x = match style.align {
            TextAlign::Left => x,
            TextAlign::Right => x - text_width,
        };
        // descent 为负值，基线位于下沿之上
        let baseline_y = match style.baseline {
            TextBaseline::Alphabetic => y,
            TextBaseline::Bottom => y + scaled.descent(),
        };

        let alpha = style.color.alpha.clamp(0.0, 1.0);
        let (width, height) = (self.pixels.width() as i32, self.pixels.height() as i32);
        let mut cursor_x = start_x;
        let mut prev: Option<GlyphId> = None;
        let mut drawn = false;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                cursor_x += scaled.kern(p, id);
            }

            // 0 号字形为 .notdef（字体不含该字符）
            let glyph = id.with_scale_and_position(scale, point(cursor_x, baseline_y));
            let outlined = if id.0 == 0 { None } else { font.outline_glyph(glyph) };
            if let Some(outlined) = outlined {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let gx = px as i32 + bounds.min.x as i32;
                    let gy = py as i32 + bounds.min.y as i32;
                    if gx < 0 || gy < 0 || gx >= width || gy >= height || coverage <= 0.0 {
                        return;
                    }
                    let pixel = self.pixels.get_pixel_mut(gx as u32, gy as u32);
                    *pixel = Self::blend(*pixel, &style.color, coverage * alpha);
                    drawn = true;
                });
            }

            cursor_x += scaled.h_advance(id);
            prev = Some(id);
        }

        if !drawn {
            log::debug!("💧 字体中没有可绘制的字形：{}", text);
        }
        drawn
    }
}
