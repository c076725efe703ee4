//! 统一错误类型模块
//!
//! # 设计思路
//!
//! `image_loader` 的对外加载入口是全函数，不返回错误；会失败的只有外围操作：
//! 读取配置文件、命令行输出、校验钩子。这些操作统一返回 `Result<T, AppError>`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `LoaderError`、`std::io::Error`、`serde_json::Error` 提供 `From` 转换，无需手动 map。

use crate::image_loader::LoaderError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 配置文件缺失字段或格式错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 图片加载链路错误（仅校验钩子等外围操作会透出）
    #[error("{0}")]
    Loader(#[from] LoaderError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化失败
    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}
