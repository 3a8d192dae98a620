//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 压缩流水线内部使用 `CompressError`（带阶段与错误码），
//! 对外的宿主层（偏好存储、文件系统）统一收敛到 `AppError`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `CompressError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于宿主界面直接展示。

use serde::Serialize;

use crate::compressor::CompressError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 压缩流水线错误（校验 / 读取 / 解码 / 编码）
    #[error("{0}")]
    Compress(#[from] CompressError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 偏好存储不可用
    #[error("存储不可用: {0}")]
    Storage(String),
}

impl AppError {
    /// 稳定错误码，便于宿主按类别处理。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Compress(err) => err.code(),
            Self::Io(_) => "io",
            Self::Storage(_) => "storage",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
