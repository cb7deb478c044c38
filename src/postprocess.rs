// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/postprocess.rs - 检测后处理流程
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

use thiserror::Error;
use tracing::debug;

use crate::{
  config::DetectConfig,
  model::{Detection, RawOutput},
};

mod decode;
mod iou;
mod mapping;
mod nms;

pub use self::decode::{Candidate, decode};
pub use self::iou::iou;
pub use self::mapping::to_image_space;
pub use self::nms::suppress;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostprocessError {
  #[error("输出长度 {len} 不是每框特征数 {stride} 的整数倍")]
  ShapeMismatch { len: usize, stride: usize },
  #[error("参数无效: {0}")]
  InvalidConfiguration(String),
}

/// 解码、映射到原图并按类别做 NMS
///
/// 没有任何框通过置信度阈值时返回空列表。
pub fn detect(
  raw: &RawOutput,
  config: &DetectConfig,
  image_width: u32,
  image_height: u32,
) -> Result<Vec<Detection>, PostprocessError> {
  config.validate()?;

  let candidates = decode(raw.as_slice(), config.num_classes, config.conf_threshold)?;
  let detections: Vec<Detection> = candidates
    .iter()
    .filter_map(|c| to_image_space(c, config.model_side, image_width, image_height))
    .collect();
  debug!(
    "映射到 {}x{} 后剩余 {} / {} 个候选框",
    image_width,
    image_height,
    detections.len(),
    candidates.len()
  );

  let kept = suppress(detections, config.iou_threshold);
  debug!("检测到 {} 个物体", kept.len());
  Ok(kept)
}

#[cfg(test)]
mod tests {
  use super::*;

  /// 按特征优先布局构造输出, `boxes` 每项为 [cx, cy, w, h, scores...]
  fn layout(boxes: &[Vec<f32>]) -> RawOutput {
    let features = boxes[0].len();
    let mut data = vec![0.0; features * boxes.len()];
    for (b, values) in boxes.iter().enumerate() {
      for (f, v) in values.iter().enumerate() {
        data[f * boxes.len() + b] = *v;
      }
    }
    RawOutput::from(data)
  }

  #[test]
  fn rejects_invalid_config_before_decoding() {
    let raw = RawOutput::from(vec![0.0; 5]);
    let err = detect(&raw, &DetectConfig::new(1).iou_threshold(2.0), 10, 10).unwrap_err();
    assert!(matches!(err, PostprocessError::InvalidConfiguration(_)));
  }

  #[test]
  fn huge_class_count_is_an_error_not_a_panic() {
    let raw = RawOutput::from(vec![0.0; 8]);
    let err = detect(&raw, &DetectConfig::new(usize::MAX), 10, 10).unwrap_err();
    assert!(matches!(err, PostprocessError::InvalidConfiguration(_)));
  }

  #[test]
  fn empty_when_nothing_clears_threshold() {
    let raw = layout(&[vec![10.0, 10.0, 4.0, 4.0, 0.1, 0.2]]);
    let detections = detect(&raw, &DetectConfig::new(2), 640, 640).unwrap();
    assert!(detections.is_empty());
  }

  #[test]
  fn duplicate_boxes_collapse_but_other_classes_survive() {
    let raw = layout(&[
      vec![100.0, 100.0, 50.0, 50.0, 0.9, 0.0],
      vec![102.0, 100.0, 50.0, 50.0, 0.7, 0.0],
      vec![101.0, 100.0, 50.0, 50.0, 0.0, 0.8],
    ]);
    let detections = detect(&raw, &DetectConfig::new(2), 640, 640).unwrap();
    assert_eq!(detections.len(), 2);
    assert!(detections.iter().any(|d| d.class_id == 0 && d.confidence == 0.9));
    assert!(detections.iter().any(|d| d.class_id == 1 && d.confidence == 0.8));
  }

  #[test]
  fn boxes_outside_image_are_dropped() {
    let raw = layout(&[vec![-100.0, -100.0, 50.0, 50.0, 0.9]]);
    let detections = detect(&raw, &DetectConfig::new(1), 320, 240).unwrap();
    assert!(detections.is_empty());
  }
}
