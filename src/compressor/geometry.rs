//! # 尺寸限制模块
//!
//! ## 设计思路
//!
//! 输出尺寸受两条规则约束：总像素预算、单边最大尺寸。
//! 两条规则按顺序叠加：先按像素预算等比缩小（向下取整），
//! 再以调整后的结果检查单边上限（四舍五入）。
//!
//! 极端长宽比下两次取整会叠加误差，这里保持该行为不变。

/// 限制后的目标尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedSize {
    pub width: u32,
    pub height: u32,
    /// 是否发生了缩放（任一规则生效即为 true）。
    pub resized: bool,
    /// 像素预算规则是否生效。
    pub pixel_budget_applied: bool,
    /// 单边上限规则是否生效。
    pub dimension_cap_applied: bool,
}

/// 按像素预算与单边上限计算目标尺寸。
///
/// # 示例
/// ```rust
/// use image_compressor::compressor::clamp;
///
/// let size = clamp(8192, 4096, 16_777_216, 4096);
/// assert_eq!((size.width, size.height), (4096, 2048));
/// assert!(size.resized);
/// ```
pub fn clamp(width: u32, height: u32, max_total_pixels: u64, max_dimension: u32) -> ClampedSize {
    let mut w = width as f64;
    let mut h = height as f64;
    let mut pixel_budget_applied = false;
    let mut dimension_cap_applied = false;

    if w * h > max_total_pixels as f64 {
        let ratio = (max_total_pixels as f64 / (w * h)).sqrt();
        w = (w * ratio).floor();
        h = (h * ratio).floor();
        pixel_budget_applied = true;
    }

    let cap = max_dimension as f64;
    if w > cap || h > cap {
        if w > h {
            h = (h * (cap / w)).round();
            w = cap;
        } else {
            w = (w * (cap / h)).round();
            h = cap;
        }
        dimension_cap_applied = true;
    }

    ClampedSize {
        width: w as u32,
        height: h as u32,
        resized: pixel_budget_applied || dimension_cap_applied,
        pixel_budget_applied,
        dimension_cap_applied,
    }
}
