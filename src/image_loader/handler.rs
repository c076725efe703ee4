//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageLoader` 只负责流程编排，不绑定任何具体宿主。
//! 处理链路固定为：
//! 1. 按优先级链解析来源，拿到原始字节
//! 2. 解码并归一化为图像/遮罩张量
//! 3. 任一步失败都返回回退占位图
//!
//! 对外入口是全函数：不返回错误，不向上抛出 panic。
//!
//! ## 实现思路
//!
//! - 宿主能力通过 `Arc<dyn LoaderHost>` 注入，测试可替换为内存实现。
//! - 缓存释放使用 RAII 守卫 `CacheReleaseGuard`，保证每个返回路径都恰好执行一次。
//! - 解码库内部的 panic 在入口处被捕获并映射为回退占位图。
//! - 记录 `load/decode/total` 阶段耗时，便于性能诊断。

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use super::host::{LoaderHost, PresentMode, PreviewDescriptor};
use super::{
    ChangeSignature, ImageTensor, InputSchema, LoadedImage, LoaderConfig, LoaderError, LocalHost,
    MaskTensor, SourceInputs, is_valid_input,
};

/// 带预览描述的加载结果（宿主集成版本的返回值）。
#[derive(Debug, Clone, Serialize)]
pub struct LoaderOutput {
    #[serde(skip)]
    pub image: ImageTensor,
    #[serde(skip)]
    pub mask: MaskTensor,
    pub previews: Vec<PreviewDescriptor>,
}

/// 图片加载器。
///
/// 无内部可变状态，可在多个线程间共享并发调用。
pub struct ImageLoader {
    pub(super) config: LoaderConfig,
    pub(super) host: Arc<dyn LoaderHost>,
}

/// 离开作用域时通知宿主释放缓存。
struct CacheReleaseGuard<'a> {
    host: &'a dyn LoaderHost,
}

impl<'a> CacheReleaseGuard<'a> {
    fn new(host: &'a dyn LoaderHost) -> Self {
        Self { host }
    }
}

impl Drop for CacheReleaseGuard<'_> {
    fn drop(&mut self) {
        log::debug!("🧹 释放宿主缓存");
        self.host.release_cache();
    }
}

impl ImageLoader {
    /// # 示例
    /// ```rust
    /// use std::sync::Arc;
    /// use image_loader_node::image_loader::{ImageLoader, LoaderConfig, LocalHost, SourceInputs};
    ///
    /// let config = LoaderConfig::default();
    /// let loader = ImageLoader::new(config.clone(), Arc::new(LocalHost::from_config(&config)));
    /// let loaded = loader.load(&SourceInputs::default());
    /// assert!(loaded.is_empty_placeholder());
    /// ```
    pub fn new(config: LoaderConfig, host: Arc<dyn LoaderHost>) -> Self {
        Self { config, host }
    }

    /// 使用本地文件系统宿主。
    pub fn local(config: LoaderConfig) -> Self {
        let host = Arc::new(LocalHost::from_config(&config));
        Self::new(config, host)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// 加载主入口：按优先级选择来源并解码，失败时返回 1×1 占位图。
    pub fn load(&self, inputs: &SourceInputs) -> LoadedImage {
        let _release = CacheReleaseGuard::new(self.host.as_ref());
        self.load_catching_panics(inputs)
    }

    /// 宿主集成版本：在 `load` 的基础上把图像交给宿主预览或保存。
    ///
    /// 展示失败只记录日志，不影响图像/遮罩本身。
    pub fn load_with_preview(&self, inputs: &SourceInputs, mode: PresentMode) -> LoaderOutput {
        let _release = CacheReleaseGuard::new(self.host.as_ref());
        let loaded = self.load_catching_panics(inputs);

        let previews = match self.host.present(&loaded.image, mode) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                log::warn!("⚠️ 预览生成失败 [{}]：{}", err.code(), err);
                Vec::new()
            }
        };

        LoaderOutput {
            image: loaded.image,
            mask: loaded.mask,
            previews,
        }
    }

    fn load_catching_panics(&self, inputs: &SourceInputs) -> LoadedImage {
        match panic::catch_unwind(AssertUnwindSafe(|| self.load_inner(inputs))) {
            Ok(loaded) => loaded,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("❌ 图片加载过程中发生 panic，返回占位图：{}", message);
                LoadedImage::empty()
            }
        }
    }

    fn load_inner(&self, inputs: &SourceInputs) -> LoadedImage {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let Some(raw) = self.resolve(inputs) else {
            log::warn!("⚠️ 未提供有效的图片来源，返回占位图");
            return LoadedImage::empty();
        };
        let load_elapsed = load_start.elapsed();

        log::info!("🖼️ 加载图片 - 来源: {}", raw.label);

        let decode_start = Instant::now();
        let loaded = match self.decode(&raw) {
            Ok(loaded) => loaded,
            Err(err) => {
                log::error!(
                    "❌ 图片处理失败 - 来源: {} 字段: {} [{}]：{}",
                    raw.label,
                    raw.source,
                    err.code(),
                    err
                );
                return LoadedImage::empty();
            }
        };
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 图片加载完成 - load={}ms decode={}ms total={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        loaded
    }

    /// 变更签名：只依赖当前输入中非空的字段。
    pub fn signature(inputs: &SourceInputs) -> ChangeSignature {
        ChangeSignature::of(inputs)
    }

    /// 输入声明，`upload` 的取值范围来自宿主当前的输入目录列表。
    pub fn input_schema(&self) -> InputSchema {
        InputSchema::build(self.host.list_input_files())
    }

    /// 校验钩子：所选上传文件必须仍然存在于宿主目录中。
    ///
    /// 未选择上传文件时视为有效。
    pub fn validate_inputs(&self, inputs: &SourceInputs) -> Result<(), LoaderError> {
        let upload = inputs.upload.as_deref();
        if !is_valid_input(upload) {
            return Ok(());
        }

        let name = upload.unwrap_or_default().trim();
        if self.host.exists_annotated_filepath(name) {
            Ok(())
        } else {
            Err(LoaderError::NotFound(format!("Invalid image file: {}", name)))
        }
    }
}
