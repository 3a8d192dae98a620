//! # 图片压缩工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  宿主界面（上传 / 设置 / 裁切 / 下载）     │
//! │       │  实现 CompressionUi，提供文件与压缩参数            │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ CompressionOutcome / 界面回调
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ compressor ─ 校验·读取·解码·限制尺寸·水印·编码         │
//! │  │   ├─ handler        编排 + 请求序号过期判断            │
//! │  │   ├─ stats          压缩率 / 下载文件名                │
//! │  │   └─ crop           裁切选区状态                       │
//! │  │                                                       │
//! │  └─ preferences        主题偏好 (JSON 文件)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`compressor`] | 图片压缩流水线与请求序号管理 |
//! | [`preferences`] | 浅色 / 深色主题偏好的读取与保存 |

pub mod error;
pub mod compressor;
pub mod preferences;
