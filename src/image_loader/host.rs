//! # 宿主能力接口
//!
//! ## 设计思路
//!
//! 节点运行在宿主的节点图运行时里。目录布局、上传文件列表、显存释放、预览/保存
//! 都属于宿主，核心逻辑只通过 `LoaderHost` 调用它们，不依赖任何具体宿主。
//!
//! ## 实现思路
//!
//! - `LoaderHost`：能力 trait，带默认实现的方法可按需覆盖。
//! - `LocalHost`：基于本地文件系统的实现，独立运行与测试都使用它。
//! - 上传文件名支持宿主的标注后缀：` [input]` / ` [output]` / ` [temp]`。

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use image::{ImageFormat, RgbImage};
use serde::Serialize;

use super::{ImageTensor, LoaderConfig, LoaderError};

/// 图像交给宿主展示时的模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentMode {
    /// 临时预览，写入临时目录。
    Preview,
    /// 持久保存，写入输出目录。
    Save,
}

impl PresentMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "temp",
            Self::Save => "output",
        }
    }
}

/// 宿主生成的预览/保存描述。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewDescriptor {
    pub filename: String,
    pub subfolder: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// 加载器依赖的宿主能力。
///
/// 实现必须可跨线程共享：宿主可能并行执行多个节点。
pub trait LoaderHost: Send + Sync {
    /// 宿主输入目录。
    fn input_directory(&self) -> &Path;

    /// 将（可能带标注的）上传文件名解析为绝对位置。
    fn annotated_filepath(&self, name: &str) -> Result<PathBuf, LoaderError>;

    /// 上传文件名当前是否仍指向一个普通文件。
    fn exists_annotated_filepath(&self, name: &str) -> bool {
        self.annotated_filepath(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// 输入目录中当前可选的文件名（作为 `upload` 的取值范围）。
    fn list_input_files(&self) -> Vec<String>;

    /// 每次调用结束时释放宿主侧缓存（如加速器显存）。
    fn release_cache(&self) {}

    /// 把图像交给宿主做预览或保存，返回宿主生成的描述。
    fn present(
        &self,
        _image: &ImageTensor,
        _mode: PresentMode,
    ) -> Result<Vec<PreviewDescriptor>, LoaderError> {
        Ok(Vec::new())
    }
}

/// 基于本地文件系统的宿主实现。
#[derive(Debug)]
pub struct LocalHost {
    input_dir: PathBuf,
    output_dir: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    counter: AtomicU64,
}

impl LocalHost {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            temp_dir: None,
            counter: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            temp_dir: config.temp_dir.clone(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// 拆出标注后缀，返回（去掉标注的文件名, 对应目录）。
    fn split_annotation<'a>(&'a self, name: &'a str) -> Result<(&'a str, &'a Path), LoaderError> {
        let name = name.trim();
        if let Some(stripped) = name.strip_suffix("[output]") {
            let dir = self
                .output_dir
                .as_deref()
                .ok_or_else(|| LoaderError::Host("未配置输出目录".to_string()))?;
            return Ok((stripped.trim_end(), dir));
        }
        if let Some(stripped) = name.strip_suffix("[temp]") {
            let dir = self
                .temp_dir
                .as_deref()
                .ok_or_else(|| LoaderError::Host("未配置临时目录".to_string()))?;
            return Ok((stripped.trim_end(), dir));
        }
        let stripped = name.strip_suffix("[input]").map(str::trim_end).unwrap_or(name);
        Ok((stripped, self.input_dir.as_path()))
    }

    fn next_filename(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("image_loader_{n:05}_.png")
    }
}

/// 仅允许普通的相对路径分量，拒绝 `..` 与绝对路径，避免逃出基准目录。
fn is_contained_relative(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl LoaderHost for LocalHost {
    fn input_directory(&self) -> &Path {
        &self.input_dir
    }

    fn annotated_filepath(&self, name: &str) -> Result<PathBuf, LoaderError> {
        let (file_name, base_dir) = self.split_annotation(name)?;
        if !is_contained_relative(file_name) {
            return Err(LoaderError::InvalidFormat(format!("非法的上传文件名：{}", name)));
        }
        Ok(base_dir.join(file_name))
    }

    fn list_input_files(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.input_dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("⚠️ 无法读取输入目录 {}：{}", self.input_dir.display(), err);
                return Vec::new();
            }
        };

        let mut files: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        files.sort();
        files
    }

    fn present(
        &self,
        image: &ImageTensor,
        mode: PresentMode,
    ) -> Result<Vec<PreviewDescriptor>, LoaderError> {
        let target = match mode {
            PresentMode::Preview => self.temp_dir.as_deref(),
            PresentMode::Save => self.output_dir.as_deref(),
        };
        let Some(dir) = target else {
            log::debug!("未配置 {} 目录，跳过展示", mode.as_str());
            return Ok(Vec::new());
        };

        fs::create_dir_all(dir)
            .map_err(|e| LoaderError::Host(format!("创建目录 '{}' 失败：{}", dir.display(), e)))?;

        let filename = self.next_filename();
        let path = dir.join(&filename);
        tensor_to_rgb8(image)?
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| LoaderError::Host(format!("写入预览图 '{}' 失败：{}", path.display(), e)))?;

        Ok(vec![PreviewDescriptor {
            filename,
            subfolder: String::new(),
            kind: mode.as_str().to_string(),
        }])
    }
}

/// 将 `[1, H, W, 3]` 张量量化回 8 位 RGB 图像。
fn tensor_to_rgb8(image: &ImageTensor) -> Result<RgbImage, LoaderError> {
    let shape = image.shape();
    let (height, width) = (shape[1], shape[2]);
    let width_u32 = u32::try_from(width)
        .map_err(|_| LoaderError::ResourceLimit(format!("图像宽度溢出：{}", width)))?;
    let height_u32 = u32::try_from(height)
        .map_err(|_| LoaderError::ResourceLimit(format!("图像高度溢出：{}", height)))?;

    let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Ok(RgbImage::from_fn(width_u32, height_u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        image::Rgb([
            quantize(image[[0, y, x, 0]]),
            quantize(image[[0, y, x, 1]]),
            quantize(image[[0, y, x, 2]]),
        ])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("image-loader-host-{tag}-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn annotated_filepath_routes_by_tag() {
        let host = LocalHost::new("/srv/input")
            .with_output_dir("/srv/output")
            .with_temp_dir("/srv/temp");

        assert_eq!(
            host.annotated_filepath("a.png").expect("plain"),
            PathBuf::from("/srv/input/a.png")
        );
        assert_eq!(
            host.annotated_filepath("a.png [input]").expect("input tag"),
            PathBuf::from("/srv/input/a.png")
        );
        assert_eq!(
            host.annotated_filepath("a.png [output]").expect("output tag"),
            PathBuf::from("/srv/output/a.png")
        );
        assert_eq!(
            host.annotated_filepath("sub/a.png [temp]").expect("temp tag"),
            PathBuf::from("/srv/temp/sub/a.png")
        );
    }

    #[test]
    fn annotated_filepath_rejects_escapes_and_missing_dirs() {
        let host = LocalHost::new("/srv/input");

        assert!(matches!(
            host.annotated_filepath("../etc/passwd"),
            Err(LoaderError::InvalidFormat(_))
        ));
        assert!(matches!(
            host.annotated_filepath("/etc/passwd"),
            Err(LoaderError::InvalidFormat(_))
        ));
        assert!(matches!(
            host.annotated_filepath("a.png [output]"),
            Err(LoaderError::Host(_))
        ));
    }

    #[test]
    fn list_input_files_returns_sorted_regular_files() {
        let dir = unique_temp_dir("list");
        fs::write(dir.join("b.png"), b"b").expect("write b");
        fs::write(dir.join("a.jpg"), b"a").expect("write a");
        fs::create_dir_all(dir.join("nested")).expect("create nested");

        let host = LocalHost::new(&dir);
        assert_eq!(host.list_input_files(), vec!["a.jpg".to_string(), "b.png".to_string()]);
        assert!(host.exists_annotated_filepath("a.jpg"));
        assert!(!host.exists_annotated_filepath("nested"));
        assert!(!host.exists_annotated_filepath("missing.png"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn present_without_target_dir_returns_nothing() {
        let host = LocalHost::new("input");
        let image = ImageTensor::zeros((1, 2, 2, 3));
        let descriptors = host.present(&image, PresentMode::Preview).expect("present");
        assert!(descriptors.is_empty());
    }

    #[test]
    fn present_writes_png_into_temp_dir() {
        let dir = unique_temp_dir("present");
        let host = LocalHost::new("input").with_temp_dir(&dir);
        let mut image = ImageTensor::zeros((1, 2, 3, 3));
        image[[0, 1, 2, 0]] = 1.0;

        let descriptors = host.present(&image, PresentMode::Preview).expect("present");
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].kind, "temp");

        let written = image::open(dir.join(&descriptors[0].filename))
            .expect("reopen preview")
            .to_rgb8();
        assert_eq!(written.dimensions(), (3, 2));
        assert_eq!(written.get_pixel(2, 1).0, [255, 0, 0]);

        let _ = fs::remove_dir_all(dir);
    }
}
