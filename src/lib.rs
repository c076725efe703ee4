//! # 通用图片加载节点 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                宿主（节点图运行时）                        │
//! │                                                          │
//! │  输入声明查询 ── 上传校验 ── 变更签名 ── 节点执行          │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ LoaderHost（目录 / 标注路径 / 缓存释放 / 预览）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            本库 (Rust)                            │
//! │                                                          │
//! │  ┌─ error ────── AppError (外围操作的统一错误类型)         │
//! │  │                                                       │
//! │  └─ image_loader  来源优先级·解码·归一化·回退占位          │
//! │      ├─ resolver   pasted → filepath → base64 → upload    │
//! │      ├─ pipeline   解码 + EXIF 方向 + RGB/遮罩            │
//! │      └─ handler    全函数入口 + 缓存释放守卫              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，配置读取与命令行使用 |
//! | [`image_loader`] | 从粘贴/文件/Base64/上传加载图片，输出图像与遮罩张量 |

pub mod error;
pub mod image_loader;
