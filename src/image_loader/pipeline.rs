//! # 解码与归一化流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGB/遮罩张量”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 文件签名嗅探：空内容与已识别的非图片内容直接拒绝
//! 2. 按内容猜测格式并读取 header 尺寸，按像素/内存上限快速拒绝
//! 3. 完整解码，并按 EXIF 方向信息旋转/翻转
//! 4. 转换为三通道 RGB，样本缩放到 `[0, 1]`
//! 5. 有 alpha 通道时提取为遮罩，否则生成全 1 遮罩
//!
//! 调色板 + 透明色键（如 PNG 的 tRNS）在解码阶段已被展开为显式 alpha 通道，
//! 因此第 5 步只需判断解码结果是否带 alpha。

use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader, Limits};

use super::source::RawImageData;
use super::{ImageLoader, LoadedImage, LoaderError};

/// RGBA f32 每像素字节数，用于估算解码内存。
const DECODED_BYTES_PER_PIXEL: u64 = 16;

impl ImageLoader {
    /// 将原始字节解码为图像/遮罩张量对。
    pub(crate) fn decode(&self, raw: &RawImageData) -> Result<LoadedImage, LoaderError> {
        Self::sniff_media(&raw.bytes)?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;
        self.validate_decoded_memory_limits(header_width, header_height)?;

        let decoded = self.decode_oriented(&raw.bytes)?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(LoaderError::UnsupportedMedia(format!(
                "解码结果没有像素：{}x{}",
                width, height
            )));
        }

        let loaded = Self::normalize(&decoded)?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 颜色类型: {:?} 原始尺寸: {}x{} 输出尺寸: {}x{} 透明通道: {}",
            raw.label,
            decoded.color(),
            header_width,
            header_height,
            width,
            height,
            decoded.color().has_alpha()
        );

        Ok(loaded)
    }

    /// 通过文件签名（magic bytes）尽早拒绝非图片内容。
    ///
    /// `infer` 无法识别的内容交给 `image` 自己的格式探测，不在这里拒绝。
    fn sniff_media(bytes: &[u8]) -> Result<(), LoaderError> {
        if bytes.is_empty() {
            return Err(LoaderError::UnsupportedMedia("图片内容为空".to_string()));
        }

        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(LoaderError::UnsupportedMedia(format!(
                    "文件签名不是图片类型：{}",
                    kind.mime_type()
                )));
            }
        }

        Ok(())
    }

    fn reader_for(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, LoaderError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| LoaderError::UnsupportedMedia(format!("无法识别图片格式：{}", e)))?;

        if reader.format().is_none() {
            return Err(LoaderError::UnsupportedMedia("无法识别图片格式".to_string()));
        }

        Ok(reader)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), LoaderError> {
        Self::reader_for(bytes)?
            .into_dimensions()
            .map_err(|e| LoaderError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    /// 完整解码并应用嵌入的方向信息。
    fn decode_oriented(&self, bytes: &[u8]) -> Result<DynamicImage, LoaderError> {
        let mut reader = Self::reader_for(bytes)?;
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.config.max_decoded_bytes);
        reader.limits(limits);

        let mut decoder = reader
            .into_decoder()
            .map_err(|e| LoaderError::Decode(format!("图片解码失败：{}", e)))?;

        // 方向元数据损坏不影响像素本身，按无变换处理
        let orientation = decoder.orientation().unwrap_or_else(|e| {
            log::warn!("⚠️ 读取方向信息失败，按原始方向处理：{}", e);
            Orientation::NoTransforms
        });

        let mut image = DynamicImage::from_decoder(decoder)
            .map_err(|e| LoaderError::Decode(format!("图片解码失败：{}", e)))?;

        if orientation != Orientation::NoTransforms {
            log::debug!("🔄 应用方向信息：{:?}", orientation);
            image.apply_orientation(orientation);
        }

        Ok(image)
    }

    /// 转换为 `[1, H, W, 3]` RGB 张量与 `[1, H, W]` 遮罩张量。
    fn normalize(image: &DynamicImage) -> Result<LoadedImage, LoaderError> {
        let (width, height) = image.dimensions();

        let rgb: Vec<f32> = image
            .to_rgb32f()
            .into_raw()
            .into_iter()
            .map(unit_clamp)
            .collect();

        let alpha: Vec<f32> = if image.color().has_alpha() {
            image.to_rgba32f().pixels().map(|p| unit_clamp(p.0[3])).collect()
        } else {
            vec![1.0; width as usize * height as usize]
        };

        LoadedImage::from_samples(width as usize, height as usize, rgb, alpha)
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), LoaderError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| LoaderError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.config.max_decoded_pixels {
            return Err(LoaderError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(&self, width: u32, height: u32) -> Result<(), LoaderError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(DECODED_BYTES_PER_PIXEL))
            .ok_or_else(|| LoaderError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.config.max_decoded_bytes {
            return Err(LoaderError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}

/// 浮点图像（HDR / EXR）可能越界或含 NaN，统一收敛到 `[0, 1]`。
fn unit_clamp(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
