//! # 水印模块
//!
//! ## 设计思路
//!
//! 水印文字来自用户输入，后续可能被当作标记渲染，因此先清洗再绘制：
//! 去首尾空白 → 截断到最大字符数 → 移除 ASCII 控制字符与 `< > " ' & \`。
//! 清洗后为空则不绘制。
//!
//! 字号与边距按画布宽度推导，锚定右下角。

use super::config::{CompressorConfig, WatermarkColor};
use super::surface::{TextAlign, TextBaseline, TextCanvas, TextStyle};
use super::WatermarkSpec;

/// 水印绘制参数，由配置推导。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkStyle {
    pub max_length: usize,
    pub font_size_ratio: u32,
    pub padding_ratio: u32,
    pub color: WatermarkColor,
}

impl WatermarkStyle {
    pub fn from_config(config: &CompressorConfig) -> Self {
        Self {
            max_length: config.watermark_max_length,
            font_size_ratio: config.watermark_font_size_ratio.max(1),
            padding_ratio: config.watermark_padding_ratio.max(1),
            color: config.watermark_color,
        }
    }
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self::from_config(&CompressorConfig::default())
    }
}

fn is_stripped(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}' | '<' | '>' | '"' | '\'' | '&' | '\\')
}

/// 清洗水印文字。
///
/// 返回 `None` 表示不应绘制。
///
/// # 示例
/// ```rust
/// use image_compressor::compressor::sanitize_watermark_text;
///
/// let text = sanitize_watermark_text("<script>alert('x')&\"'</script>", 50);
/// assert_eq!(text.as_deref(), Some("scriptalert(x)/script"));
/// assert_eq!(sanitize_watermark_text("<<<>>>", 50), None);
/// ```
pub fn sanitize_watermark_text(raw: &str, max_length: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .take(max_length)
        .filter(|c| !is_stripped(*c))
        .collect();

    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// 在画布右下角绘制水印。
///
/// 返回是否实际落下了像素（字体缺少全部字形时为 `false`）。
pub fn render_watermark<S: TextCanvas + ?Sized>(
    canvas: &mut S,
    width: u32,
    height: u32,
    spec: &WatermarkSpec,
    style: &WatermarkStyle,
) -> bool {
    if !spec.enabled {
        return false;
    }

    let Some(text) = sanitize_watermark_text(&spec.text, style.max_length) else {
        return false;
    };

    let font_size = width / style.font_size_ratio;
    let padding = width / style.padding_ratio;

    let text_style = TextStyle {
        font_size: font_size as f32,
        color: style.color,
        align: TextAlign::Right,
        baseline: TextBaseline::Bottom,
    };

    let x = width.saturating_sub(padding) as f32;
    let y = height.saturating_sub(padding) as f32;

    log::debug!("💧 绘制水印 - size={} anchor=({}, {}) chars={}", font_size, x, y, text.chars().count());
    canvas.fill_text(&text, &text_style, x, y)
}
