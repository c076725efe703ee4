//! # 图片加载模块（image_loader）
//!
//! ## 设计思路
//!
//! 该模块将“来源选择 → 字节加载 → 解码归一化 → 回退占位”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线（对外入口，全函数）
//! - `resolver`：四个来源的优先级链与 Base64/文件加载
//! - `pipeline`：解码、方向校正、RGB/遮罩归一化
//! - `tensor`：张量布局与回退占位图
//! - `signature`：宿主用于判断是否重跑的变更签名
//! - `host`：宿主能力接口与本地文件系统实现
//! - `schema`：输入声明与节点元信息
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 宿主调用
//!    ↓
//! handler.rs（CacheReleaseGuard + panic 捕获 + 阶段耗时日志）
//!    ├─ resolver.rs（pasted → filepath → base64 → upload，失败即尝试下一个）
//!    └─ pipeline.rs（嗅探 + 尺寸限制 + 解码 + 方向 + 归一化）
//!    ↓
//! LoadedImage（成功结果，或 1×1 占位图）
//! ```
//!
//! ## 分层职责建议
//!
//! - 来源优先级或解析规则变更优先改 `resolver.rs`
//! - 像素格式与遮罩规则变更优先改 `pipeline.rs`
//! - 宿主目录、预览、缓存相关变更优先改 `host.rs`
//! - 资源上限与目录默认值变更优先改 `config.rs`

mod config;
mod error;
mod handler;
pub mod host;
mod pipeline;
mod resolver;
pub mod schema;
mod signature;
mod source;
mod tensor;

pub use config::LoaderConfig;
pub use error::LoaderError;
pub use handler::{ImageLoader, LoaderOutput};
pub use host::{LoaderHost, LocalHost, PresentMode, PreviewDescriptor};
pub use schema::{FieldSpec, InputSchema, NODE_INFO, NodeInfo};
pub use signature::ChangeSignature;
pub use source::{RawImageData, SourceInputs, SourceKind, is_valid_input};
pub use tensor::{ImageTensor, LoadedImage, MaskTensor, RGB_CHANNELS};
