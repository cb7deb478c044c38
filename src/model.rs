// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/model.rs - 模型
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

use serde::{Deserialize, Serialize};

use crate::frame::NormalizedFrame;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 推理引擎适配器
///
/// 引擎负责把自身的输出整理成一段连续的 `f32`，后处理不关心张量的具体形状。
pub trait InferenceEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn run(&self, input: &NormalizedFrame) -> Result<RawOutput, Self::Error>;
}

/// 检测器原始输出，按 `特征 * 框数 + 框索引` 展平
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawOutput {
  data: Box<[f32]>,
}

impl RawOutput {
  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }
}

impl From<Vec<f32>> for RawOutput {
  fn from(data: Vec<f32>) -> Self {
    Self {
      data: data.into_boxed_slice(),
    }
  }
}

impl From<&[f32]> for RawOutput {
  fn from(data: &[f32]) -> Self {
    Self { data: data.into() }
  }
}

impl AsRef<[f32]> for RawOutput {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

/// 检测结果，坐标为原图像素坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  /// 边界框左上角 x 坐标
  pub left: f32,
  /// 边界框左上角 y 坐标
  pub top: f32,
  /// 边界框宽度
  pub width: f32,
  /// 边界框高度
  pub height: f32,
  /// 置信度
  pub confidence: f32,
  /// 类别索引
  pub class_id: u32,
}

impl Detection {
  pub fn new(left: f32, top: f32, width: f32, height: f32, confidence: f32, class_id: u32) -> Self {
    Self {
      left,
      top,
      width,
      height,
      confidence,
      class_id,
    }
  }

  pub fn right(&self) -> f32 {
    self.left + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.top + self.height
  }

  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  pub fn iou(&self, other: &Detection) -> f32 {
    crate::postprocess::iou(self, other)
  }
}

mod detector;
mod raw_file;

pub use self::detector::{Detector, DetectorError};
pub use self::raw_file::{RawFileEngine, RawFileError};
