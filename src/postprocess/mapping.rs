// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/postprocess/mapping.rs - 模型坐标到原图坐标
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

use super::Candidate;
use crate::model::Detection;

/// 缩放到原图尺寸并裁剪到图像范围内，裁剪后面积为零的框返回 `None`
pub fn to_image_space(
  candidate: &Candidate,
  model_side: u32,
  image_width: u32,
  image_height: u32,
) -> Option<Detection> {
  let (w, h) = (image_width as f32, image_height as f32);
  let scale_x = w / model_side as f32;
  let scale_y = h / model_side as f32;

  // 转换为左上角坐标和宽高
  let left = (candidate.center_x - candidate.width / 2.0) * scale_x;
  let top = (candidate.center_y - candidate.height / 2.0) * scale_y;
  let width = candidate.width * scale_x;
  let height = candidate.height * scale_y;

  let x_min = left.clamp(0.0, w);
  let y_min = top.clamp(0.0, h);
  let x_max = (left + width).clamp(0.0, w);
  let y_max = (top + height).clamp(0.0, h);

  let width = x_max - x_min;
  let height = y_max - y_min;
  if !(width > 0.0 && height > 0.0) {
    return None;
  }

  Some(Detection {
    left: x_min,
    top: y_min,
    width,
    height,
    confidence: candidate.confidence,
    class_id: candidate.class_id,
  })
}
