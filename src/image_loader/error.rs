//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载加载链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 注意：这些错误只在模块内部流动。`ImageLoader` 的对外入口是全函数，
//! 任何错误都会被记录日志，然后转换为“尝试下一个来源”或“回退占位图”。

/// 图片加载统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("文件不存在：{0}")]
    NotFound(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("不支持的媒体：{0}")]
    UnsupportedMedia(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("宿主能力错误：{0}")]
    Host(String),
}

impl LoaderError {
    /// 稳定的错误码，用于日志检索。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid_format",
            Self::Decode(_) => "decode_failure",
            Self::NotFound(_) => "not_found",
            Self::FileSystem(_) => "io_failure",
            Self::UnsupportedMedia(_) => "unsupported_media",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Host(_) => "host_failure",
        }
    }
}

impl From<LoaderError> for String {
    /// 校验钩子等宿主接口只接受字符串形式的失败说明。
    fn from(error: LoaderError) -> Self {
        error.to_string()
    }
}
