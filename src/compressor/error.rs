//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载压缩链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! “请求已过期”不是错误：由 `CompressionOutcome::Superseded` 表达，静默结束。

/// 压缩链路统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompressError {
    /// 输入不合法：没有图片、不是图片类型、文件过大。
    #[error("输入校验失败：{0}")]
    Validation(String),

    #[error("读取错误：{0}")]
    Read(String),

    /// 格式不支持或文件损坏。
    #[error("解码错误：{0}")]
    Decode(String),

    /// 绘制画布无法分配。
    #[error("画布错误：{0}")]
    EncodingContext(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),
}

impl CompressError {
    /// 稳定错误码，供界面层做分支展示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Read(_) => "read",
            Self::Decode(_) => "decode",
            Self::EncodingContext(_) => "encoding_context",
            Self::Encode(_) => "encode",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    /// 错误所属阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidConfig(_) => "validating",
            Self::Read(_) => "reading",
            Self::Decode(_) => "decoding",
            Self::EncodingContext(_) | Self::Encode(_) => "encoding",
        }
    }

    /// 面向用户的通用提示文案。
    ///
    /// 校验错误直接展示具体原因，其余错误只给出概括性提示，细节进日志。
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(reason) => reason.clone(),
            Self::Read(_) => "读取文件时发生错误".to_string(),
            Self::Decode(_) => "图片载入失败，请尝试其他格式".to_string(),
            Self::EncodingContext(_) => "无法建立画布，请尝试较小的图片".to_string(),
            Self::Encode(reason) => format!("发生错误：{}", reason),
            Self::InvalidConfig(reason) => format!("配置错误：{}", reason),
        }
    }
}

impl From<CompressError> for String {
    fn from(error: CompressError) -> Self {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = CompressError::Validation("请先选择图片".to_string());
        assert_eq!(err.user_message(), "请先选择图片");
        assert_eq!(err.code(), "validation");
        assert_eq!(err.stage(), "validating");
    }

    #[test]
    fn decode_message_hides_details() {
        let err = CompressError::Decode("bad huffman table".to_string());
        assert!(!err.user_message().contains("huffman"));
        assert_eq!(err.stage(), "decoding");
    }
}
