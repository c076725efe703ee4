//! # 张量缓冲
//!
//! 宿主约定的布局：
//! - 图像：`[1, H, W, 3]`（NHWC），`f32`，取值 `[0, 1]`
//! - 遮罩：`[1, H, W]`，`f32`，取值 `[0, 1]`
//!
//! 批次维恒为 1。

use ndarray::{Array3, Array4};

use super::LoaderError;

/// RGB 图像张量，NHWC。
pub type ImageTensor = Array4<f32>;

/// 不透明度遮罩张量，NHW。
pub type MaskTensor = Array3<f32>;

/// RGB 通道数。
pub const RGB_CHANNELS: usize = 3;

/// 一次加载的产物：图像与遮罩成对出现，空间尺寸一致。
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub image: ImageTensor,
    pub mask: MaskTensor,
}

impl LoadedImage {
    /// 回退占位：1×1 全零图像与 1×1 全零遮罩。
    pub fn empty() -> Self {
        Self {
            image: ImageTensor::zeros((1, 1, 1, RGB_CHANNELS)),
            mask: MaskTensor::zeros((1, 1, 1)),
        }
    }

    /// 由行主序的 RGB / alpha 样本构建张量对。
    ///
    /// `rgb.len()` 必须为 `width * height * 3`，`alpha.len()` 必须为 `width * height`。
    pub(crate) fn from_samples(
        width: usize,
        height: usize,
        rgb: Vec<f32>,
        alpha: Vec<f32>,
    ) -> Result<Self, LoaderError> {
        let image = ImageTensor::from_shape_vec((1, height, width, RGB_CHANNELS), rgb)
            .map_err(|e| LoaderError::Decode(format!("RGB 缓冲形状异常：{}", e)))?;
        let mask = MaskTensor::from_shape_vec((1, height, width), alpha)
            .map_err(|e| LoaderError::Decode(format!("遮罩缓冲形状异常：{}", e)))?;
        Ok(Self { image, mask })
    }

    /// `(height, width)`。
    pub fn dimensions(&self) -> (usize, usize) {
        let shape = self.image.shape();
        (shape[1], shape[2])
    }

    pub fn is_empty_placeholder(&self) -> bool {
        *self == Self::empty()
    }

    /// 遮罩均值，便于日志与诊断。
    pub fn mean_opacity(&self) -> f32 {
        self.mask.mean().unwrap_or(0.0)
    }
}
