// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/postprocess/nms.rs - 按类别的非极大值抑制
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

use std::collections::BTreeMap;

use tracing::debug;

use super::iou;
use crate::model::Detection;

/// 非极大值抑制，仅在同一类别内进行
///
/// 输出按类别索引升序排列, 同一类别内按置信度降序排列。
pub fn suppress(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
  let mut class_groups: BTreeMap<u32, Vec<Detection>> = BTreeMap::new();
  for det in detections {
    class_groups.entry(det.class_id).or_default().push(det);
  }

  let mut result = Vec::new();
  for (class_id, boxes) in class_groups {
    let total = boxes.len();
    let before = result.len();
    suppress_group(boxes, iou_threshold, &mut result);
    debug!("类别 {}: 保留 {} / {} 个框", class_id, result.len() - before, total);
  }

  result
}

fn suppress_group(mut boxes: Vec<Detection>, iou_threshold: f32, keep: &mut Vec<Detection>) {
  // 稳定排序, 置信度相同时保持原有顺序
  boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let mut suppressed = vec![false; boxes.len()];
  for i in 0..boxes.len() {
    if suppressed[i] {
      continue;
    }

    keep.push(boxes[i]);

    for j in (i + 1)..boxes.len() {
      if !suppressed[j] && iou(&boxes[i], &boxes[j]) > iou_threshold {
        suppressed[j] = true;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_highest_confidence_of_overlapping_pair() {
    // IoU = 0.7: 两框都是 170x100, 水平错开 30
    let low = Detection::new(30.0, 0.0, 170.0, 100.0, 0.6, 4);
    let high = Detection::new(0.0, 0.0, 170.0, 100.0, 0.9, 4);
    assert!((iou(&low, &high) - 0.7).abs() < 1e-6);

    let kept = suppress(vec![low, high], 0.45);
    assert_eq!(kept, vec![high]);
  }

  #[test]
  fn keeps_both_when_overlap_is_below_threshold() {
    let a = Detection::new(0.0, 0.0, 120.0, 100.0, 0.9, 1);
    let b = Detection::new(80.0, 0.0, 120.0, 100.0, 0.6, 1);
    // 交集 40x100, 并集 20000
    assert!((iou(&a, &b) - 0.2).abs() < 1e-6);

    let kept = suppress(vec![b, a], 0.45);
    assert_eq!(kept, vec![a, b]);
  }

  #[test]
  fn iou_equal_to_threshold_is_not_suppressed() {
    let a = Detection::new(0.0, 0.0, 10.0, 10.0, 0.9, 0);
    let b = Detection::new(5.0, 0.0, 10.0, 10.0, 0.8, 0);
    let overlap = iou(&a, &b);
    assert_eq!(suppress(vec![a, b], overlap).len(), 2);
  }

  #[test]
  fn different_classes_never_suppress_each_other() {
    let a = Detection::new(0.0, 0.0, 10.0, 10.0, 0.9, 0);
    let b = Detection::new(0.0, 0.0, 10.0, 10.0, 0.8, 1);
    let kept = suppress(vec![b, a], 0.1);
    assert_eq!(kept, vec![a, b]);
  }

  #[test]
  fn suppressed_box_does_not_suppress_others() {
    // b 被 a 抑制, c 只与 b 重叠, 因此保留
    let a = Detection::new(0.0, 0.0, 10.0, 10.0, 0.9, 0);
    let b = Detection::new(6.0, 0.0, 10.0, 10.0, 0.8, 0);
    let c = Detection::new(12.0, 0.0, 10.0, 10.0, 0.7, 0);
    let kept = suppress(vec![a, b, c], 0.2);
    assert_eq!(kept, vec![a, c]);
  }

  #[test]
  fn equal_confidence_keeps_input_order() {
    let a = Detection::new(0.0, 0.0, 10.0, 10.0, 0.5, 0);
    let b = Detection::new(1.0, 0.0, 10.0, 10.0, 0.5, 0);
    assert_eq!(suppress(vec![a, b], 0.3), vec![a]);
    assert_eq!(suppress(vec![b, a], 0.3), vec![b]);
  }

  #[test]
  fn empty_input() {
    assert!(suppress(Vec::new(), 0.45).is_empty());
  }
}
