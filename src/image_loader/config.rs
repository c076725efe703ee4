//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `LoaderConfig`，保证运行时行为可观测、可调整、可测试。
//! 包括宿主目录布局与各阶段的资源上限。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的配置（输入目录为相对路径 `input`）。
//! - 字段均带 `#[serde(default)]`，配置文件只需写出要覆盖的项。
//! - `load_from_path`：文件不存在时回退默认值，存在但格式错误时报错。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

/// 加载器配置。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// 宿主输入目录：`filepath` 相对路径与 `upload` 文件名的解析根。
    pub input_dir: PathBuf,
    /// `[output]` 标注与保存模式的目标目录。
    pub output_dir: Option<PathBuf>,
    /// `[temp]` 标注与预览模式的目标目录。
    pub temp_dir: Option<PathBuf>,
    /// 任意来源允许的最大原始字节数。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA f32 估算，字节）。
    pub max_decoded_bytes: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: None,
            temp_dir: None,
            max_file_size: 256 * 1024 * 1024,
            max_decoded_pixels: 268_435_456,
            max_decoded_bytes: 4 * 1024 * 1024 * 1024,
        }
    }
}

impl LoaderConfig {
    /// 从 JSON 文件读取配置。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_loader_node::image_loader::LoaderConfig;
    ///
    /// let config = LoaderConfig::load_from_path("loader.json")?;
    /// # Ok::<(), image_loader_node::error::AppError>(())
    /// ```
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("配置文件不存在，使用默认配置：{}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件 '{}' 失败: {}", path.display(), e)))
    }

    /// 覆盖输入目录，便于命令行或宿主在运行时指定。
    pub fn with_input_dir(mut self, input_dir: impl Into<PathBuf>) -> Self {
        self.input_dir = input_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("image-loader-config-test-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = unique_temp_dir();
        let config = LoaderConfig::load_from_path(dir.join("absent.json")).expect("load config");

        assert_eq!(config.input_dir, PathBuf::from("input"));
        assert!(config.output_dir.is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = unique_temp_dir();
        let path = dir.join("loader.json");
        fs::write(&path, r#"{ "input_dir": "/srv/input", "max_file_size": 1024 }"#).expect("write config");

        let config = LoaderConfig::load_from_path(&path).expect("load config");
        assert_eq!(config.input_dir, PathBuf::from("/srv/input"));
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.max_decoded_pixels, LoaderConfig::default().max_decoded_pixels);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = unique_temp_dir();
        let path = dir.join("loader.json");
        fs::write(&path, "{ not json").expect("write config");

        assert!(matches!(LoaderConfig::load_from_path(&path), Err(AppError::Config(_))));

        let _ = fs::remove_dir_all(dir);
    }
}
