//! # 统计与展示辅助
//!
//! 压缩率、节省体积、下载文件名、人类可读体积、画质提示等纯函数。

use once_cell::sync::Lazy;
use regex::Regex;

use super::OutputFormat;

/// 文件名中的尺寸标记，如 ` (1920x1080)`、`(800 x 600 px)`、`(640x480像素)`。
static DIMENSION_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i) ?\([0-9]+ ?x ?[0-9]+ ?(像素|pixels|px)?\)").expect("dimension suffix regex is valid")
});

/// 无法得知原文件名时使用的基础名。
pub const FALLBACK_BASE_NAME: &str = "compressed-image";

/// 画质预设按钮的匹配容差（百分点）。
pub const PRESET_QUALITY_TOLERANCE: u8 = 5;

/// 压缩统计。
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    /// 节省的字节数，结果更大时为负。
    pub saved_bytes: i64,
    /// 压缩率（百分比，两位小数）。
    pub ratio: f64,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl CompressionStats {
    pub fn new(original_size: u64, compressed_size: u64, width: u32, height: u32, format: OutputFormat) -> Self {
        Self {
            original_size,
            compressed_size,
            saved_bytes: original_size as i64 - compressed_size as i64,
            ratio: compression_ratio(original_size, compressed_size),
            width,
            height,
            format,
        }
    }

    /// 压缩率文案，如 `-60.00%`。
    pub fn ratio_label(&self) -> String {
        format!("-{:.2}%", self.ratio)
    }

    /// 体积对比文案，如 `976.56 KB → 390.62 KB`。
    pub fn size_comparison(&self) -> String {
        format!(
            "{} → {}",
            format_file_size(self.original_size as i64),
            format_file_size(self.compressed_size as i64)
        )
    }

    /// 结果摘要，如 `390.62 KB | JPEG | 800 x 600`。
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {} x {}",
            format_file_size(self.compressed_size as i64),
            self.format.as_str().to_uppercase(),
            self.width,
            self.height
        )
    }
}

/// 压缩率 = `(1 - compressed / original) * 100`，四舍五入到两位小数。
///
/// 原始体积为 0 时返回 0。
///
/// # 示例
/// ```rust
/// use image_compressor::compressor::compression_ratio;
///
/// assert_eq!(compression_ratio(1_000_000, 399_999), 60.0);
/// assert_eq!(compression_ratio(0, 1234), 0.0);
/// ```
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let ratio = (1.0 - compressed_size as f64 / original_size as f64) * 100.0;
    (ratio * 100.0).round() / 100.0
}

/// 去掉尺寸标记与扩展名后的基础文件名。
pub fn base_file_name(file_name: &str) -> String {
    let cleaned = DIMENSION_SUFFIX.replace_all(file_name, "");
    match cleaned.rfind('.') {
        None | Some(0) => cleaned.into_owned(),
        Some(index) => cleaned[..index].to_string(),
    }
}

/// 下载文件名：`<基础名>-compressed.<格式>`。
///
/// # 示例
/// ```rust
/// use image_compressor::compressor::{download_file_name, OutputFormat};
///
/// assert_eq!(
///     download_file_name(Some("photo (1920x1080).png"), OutputFormat::Jpeg),
///     "photo-compressed.jpeg"
/// );
/// ```
pub fn download_file_name(original_name: Option<&str>, format: OutputFormat) -> String {
    let base = original_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(base_file_name)
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| FALLBACK_BASE_NAME.to_string());
    format!("{}-compressed.{}", base, format.as_str())
}

/// 人类可读体积（`bytes` / `KB` / `MB`，两位小数）。
pub fn format_file_size(bytes: i64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    }
}

/// 根据画质百分比给出提示文案。
pub fn quality_hint(percent: u8) -> &'static str {
    if percent < 30 {
        "高压缩"
    } else if percent < 70 {
        "平衡（推荐）"
    } else {
        "高品质"
    }
}

/// 当前画质是否落在某个预设值的容差范围内。
pub fn preset_matches(percent: u8, preset: u8) -> bool {
    percent.abs_diff(preset) <= PRESET_QUALITY_TOLERANCE
}

/// 压缩效果提示：效果有限（< 5%）或效果显著（> 70%）。
pub fn compression_notice(ratio: f64) -> Option<&'static str> {
    if ratio < 5.0 {
        Some("此图片压缩效果有限，可能已经优化或不适合进一步压缩")
    } else if ratio > 70.0 {
        Some("压缩效果显著！已减少超过 70% 的文件大小")
    } else {
        None
    }
}

/// 输出格式与原始声明格式不同时的提示。
///
/// 豁免方向刻意取 `jpg` → `jpeg`：两者是同一格式，而输出端只会产生 `jpeg`，
/// 反方向 `jpeg` → `jpg` 不会出现。
pub fn format_change_notice(original_subtype: Option<&str>, output: OutputFormat) -> Option<String> {
    let original = original_subtype?.trim().to_lowercase();
    if original.is_empty() {
        return None;
    }

    let output = output.as_str();
    let same = original == output || (original == "jpg" && output == "jpeg");
    if same {
        return None;
    }

    Some(format!(
        "注意：图片格式已从 {} 变更为 {}",
        original.to_uppercase(),
        output.to_uppercase()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_example_rounds_to_two_decimals() {
        assert_eq!(compression_ratio(1_000_000, 399_999), 60.0);
        assert_eq!(compression_ratio(3, 1), 66.67);
        assert_eq!(compression_ratio(100, 150), -50.0);
    }

    #[test]
    fn zero_original_size_reports_zero() {
        assert_eq!(compression_ratio(0, 0), 0.0);
        assert_eq!(compression_ratio(0, 5000), 0.0);
        let stats = CompressionStats::new(0, 5000, 10, 10, OutputFormat::Png);
        assert_eq!(stats.ratio, 0.0);
        assert_eq!(stats.saved_bytes, -5000);
    }

    #[test]
    fn download_name_strips_dimension_suffix() {
        assert_eq!(
            download_file_name(Some("photo (1920x1080).png"), OutputFormat::Jpeg),
            "photo-compressed.jpeg"
        );
        assert_eq!(
            download_file_name(Some("cat(800 x 600 px).webp"), OutputFormat::Png),
            "cat-compressed.png"
        );
        assert_eq!(
            download_file_name(Some("图 (640x480像素).jpg"), OutputFormat::Webp),
            "图-compressed.webp"
        );
        assert_eq!(
            download_file_name(Some("a (1x2) b (3X4 Pixels).tar.gz"), OutputFormat::Jpeg),
            "a b.tar-compressed.jpeg"
        );
    }

    #[test]
    fn download_name_without_extension_or_name() {
        assert_eq!(download_file_name(Some("README"), OutputFormat::Png), "README-compressed.png");
        assert_eq!(download_file_name(Some(".hidden"), OutputFormat::Png), ".hidden-compressed.png");
        assert_eq!(download_file_name(None, OutputFormat::Jpeg), "compressed-image-compressed.jpeg");
        assert_eq!(download_file_name(Some("  "), OutputFormat::Jpeg), "compressed-image-compressed.jpeg");
    }

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(5 * 1_048_576), "5.00 MB");
        assert_eq!(format_file_size(-10), "-10 bytes");
    }

    #[test]
    fn quality_hints_and_presets() {
        assert_eq!(quality_hint(10), "高压缩");
        assert_eq!(quality_hint(50), "平衡（推荐）");
        assert_eq!(quality_hint(90), "高品质");
        assert!(preset_matches(72, 70));
        assert!(preset_matches(65, 70));
        assert!(!preset_matches(76, 70));
    }

    #[test]
    fn notices() {
        assert!(compression_notice(3.2).is_some());
        assert!(compression_notice(40.0).is_none());
        assert!(compression_notice(80.5).is_some());

        assert!(format_change_notice(Some("png"), OutputFormat::Jpeg).is_some());
        assert!(format_change_notice(Some("jpeg"), OutputFormat::Jpeg).is_none());
        assert!(format_change_notice(Some("jpg"), OutputFormat::Jpeg).is_none());
        assert!(format_change_notice(None, OutputFormat::Webp).is_none());
    }

    #[test]
    fn stats_labels() {
        let stats = CompressionStats::new(1_000_000, 399_999, 800, 600, OutputFormat::Jpeg);
        assert_eq!(stats.ratio_label(), "-60.00%");
        assert_eq!(stats.saved_bytes, 600_001);
        assert_eq!(stats.summary(), "390.62 KB | JPEG | 800 x 600");
        assert_eq!(stats.size_comparison(), "976.56 KB → 390.62 KB");
    }
}
