// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/frame.rs - 推理输入帧定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

pub const RGB_CHANNELS: usize = 3;

pub trait AsTensorFrame {
  fn as_tensor(&self) -> &NormalizedFrame;
}

/// 归一化后的 NCHW 输入，边长为模型输入边长
///
/// 同时记录原图尺寸，后处理据此把坐标映射回原图。
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
  side: u32,
  source_width: u32,
  source_height: u32,
  data: Box<[f32]>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
pub struct FrameLengthError {
  pub expected: usize,
  pub actual: usize,
}

impl NormalizedFrame {
  pub fn new(
    side: u32,
    source_width: u32,
    source_height: u32,
    data: Vec<f32>,
  ) -> Result<Self, FrameLengthError> {
    let expected = RGB_CHANNELS * side as usize * side as usize;
    if data.len() != expected {
      return Err(FrameLengthError {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      side,
      source_width,
      source_height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn side(&self) -> u32 {
    self.side
  }

  pub fn source_width(&self) -> u32 {
    self.source_width
  }

  pub fn source_height(&self) -> u32 {
    self.source_height
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn as_nchw(&self) -> &[f32] {
    &self.data
  }
}

impl AsTensorFrame for NormalizedFrame {
  fn as_tensor(&self) -> &NormalizedFrame {
    self
  }
}

/// 原图与其归一化张量
#[cfg(feature = "image")]
#[derive(Debug, Clone)]
pub struct ImageFrame {
  pub image: image::RgbImage,
  pub tensor: NormalizedFrame,
}

#[cfg(feature = "image")]
impl ImageFrame {
  /// 缩放到 `side x side` 并按通道平铺，像素值除以 255
  pub fn from_rgb_image(image: image::RgbImage, side: u32) -> Self {
    let (source_width, source_height) = image.dimensions();
    let resized = image::imageops::resize(
      &image,
      side,
      side,
      image::imageops::FilterType::Triangle,
    );

    let plane_size = side as usize * side as usize;
    let mut data = vec![0f32; plane_size * RGB_CHANNELS];
    for (x, y, pixel) in resized.enumerate_pixels() {
      let idx = y as usize * side as usize + x as usize;
      for c in 0..RGB_CHANNELS {
        data[c * plane_size + idx] = pixel[c] as f32 / 255.0;
      }
    }

    let tensor = NormalizedFrame {
      side,
      source_width,
      source_height,
      data: data.into_boxed_slice(),
    };
    Self { image, tensor }
  }
}

#[cfg(feature = "image")]
impl AsTensorFrame for ImageFrame {
  fn as_tensor(&self) -> &NormalizedFrame {
    &self.tensor
  }
}
