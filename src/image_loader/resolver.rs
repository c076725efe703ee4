//! # 来源解析模块
//!
//! ## 设计思路
//!
//! 四个来源按固定优先级依次尝试，第一个成功拿到字节的来源胜出：
//!
//! ```text
//! pasted ──失败/无效──▶ filepath ──失败/无效──▶ base64 ──失败/无效──▶ upload ──▶ None
//! ```
//!
//! 每一步的失败（解码错误、文件缺失、I/O 错误、超限）只记录日志，然后继续下一步。
//! 链路不可恢复：每次调用都从头开始。
//!
//! ## 实现思路
//!
//! - 优先级链是一张 `(SourceKind, 加载函数)` 的有序表，而不是状态机。
//! - Base64：支持 `data:<mime>;base64,<payload>` 前缀，`<mime>` 必须包含 `image`。
//! - 文件：存在性 + 普通文件 + metadata 体积限制 + 读取。
//! - 上传：只通过宿主的标注路径能力解析，与 `filepath` 的直接拼接规则不同。

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::source::{RawImageData, SourceInputs, SourceKind, is_valid_input};
use super::{ImageLoader, LoaderError};

/// 标准字母表，容忍缺失或多余的 `=` 填充。
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

type SourceLoader = fn(&ImageLoader, &str) -> Result<Vec<u8>, LoaderError>;

/// 优先级链：从高到低。
const STRATEGIES: [(SourceKind, SourceLoader); 4] = [
    (SourceKind::Pasted, ImageLoader::load_from_base64),
    (SourceKind::FilePath, ImageLoader::load_from_filepath),
    (SourceKind::Base64, ImageLoader::load_from_base64),
    (SourceKind::Upload, ImageLoader::load_from_upload),
];

impl ImageLoader {
    /// 按优先级链解析输入，返回第一个成功来源的原始字节。
    ///
    /// 全部来源缺省、无效或失败时返回 `None`。
    pub(crate) fn resolve(&self, inputs: &SourceInputs) -> Option<RawImageData> {
        for (kind, loader) in STRATEGIES {
            let value = match inputs.get(kind) {
                Some(value) if is_valid_input(Some(value)) => value,
                _ => {
                    log::debug!("⏭️ 跳过来源 {}：未提供有效输入", kind);
                    continue;
                }
            };

            match loader(self, value) {
                Ok(bytes) => {
                    let label = Self::source_label(kind, value);
                    log::info!("📥 命中来源 {} - {} ({} 字节)", kind, label, bytes.len());
                    return Some(RawImageData {
                        bytes,
                        source: kind,
                        label,
                    });
                }
                Err(err) => {
                    log::warn!(
                        "⚠️ 来源 {} 加载失败 [{}]，尝试下一个来源：{}",
                        kind,
                        err.code(),
                        err
                    );
                }
            }
        }

        log::warn!("⚠️ 没有可用的图片来源");
        None
    }

    fn source_label(kind: SourceKind, value: &str) -> String {
        match kind {
            SourceKind::Pasted => "Clipboard Paste".to_string(),
            SourceKind::Base64 => "Base64 Input".to_string(),
            SourceKind::FilePath => {
                let trimmed = value.trim();
                let name = Path::new(trimmed)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| trimmed.to_string());
                format!("File: {}", name)
            }
            SourceKind::Upload => format!("Upload: {}", value.trim()),
        }
    }

    /// 从 Base64 / Data URL 字符串解码原始字节。
    fn load_from_base64(&self, data: &str) -> Result<Vec<u8>, LoaderError> {
        Self::parse_base64_with_limit(data, self.config.max_file_size)
    }

    /// 从 `filepath` 字段读取文件。
    fn load_from_filepath(&self, raw: &str) -> Result<Vec<u8>, LoaderError> {
        let path = self.resolve_filepath(raw);
        log::info!("📁 读取本地图片 - 路径: {}", path.display());
        self.read_image_file(&path)
    }

    /// 从 `upload` 字段读取文件，路径由宿主解析。
    fn load_from_upload(&self, name: &str) -> Result<Vec<u8>, LoaderError> {
        let path = self.host.annotated_filepath(name)?;
        log::info!("📁 读取上传图片 - {} -> {}", name.trim(), path.display());
        self.read_image_file(&path)
    }

    /// `filepath` 的解析规则：绝对路径原样使用；裸文件名与其他相对路径都以输入目录为根。
    pub(crate) fn resolve_filepath(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw.trim());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.host.input_directory().join(path)
        }
    }

    fn read_image_file(&self, path: &Path) -> Result<Vec<u8>, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.display().to_string()));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| LoaderError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if !metadata.is_file() {
            return Err(LoaderError::FileSystem(format!(
                "路径不是普通文件：{}",
                path.display()
            )));
        }

        if metadata.len() > self.config.max_file_size {
            return Err(LoaderError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| LoaderError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        if bytes.is_empty() {
            return Err(LoaderError::UnsupportedMedia(format!(
                "文件内容为空：{}",
                path.display()
            )));
        }

        Ok(bytes)
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64）。
    pub(crate) fn parse_base64(data: &str) -> Result<Vec<u8>, LoaderError> {
        Self::parse_base64_with_limit(data, u64::MAX)
    }

    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, LoaderError> {
        let normalized = data.trim();

        let payload = match normalized.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
            Some((header, payload)) => {
                let mime = header.strip_suffix(";base64").ok_or_else(|| {
                    LoaderError::InvalidFormat(format!("Data URL 缺少 base64 标记：data:{}", header))
                })?;
                if !mime.contains("image") {
                    return Err(LoaderError::InvalidFormat(format!(
                        "不是图片 Data URL：{}",
                        mime
                    )));
                }
                payload
            }
            None => normalized,
        };

        // 多行输入框粘贴的内容可能夹带换行
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(&compact)?;
        if estimated_len > max_file_size {
            return Err(LoaderError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = LENIENT_BASE64
            .decode(compact.as_bytes())
            .map_err(|e| LoaderError::Decode(format!("Base64 解码失败：{}", e)))?;

        if bytes.is_empty() {
            return Err(LoaderError::UnsupportedMedia("Base64 内容为空".to_string()));
        }

        Ok(bytes)
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, LoaderError> {
        let len = base64_data.len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| LoaderError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| LoaderError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }
}
