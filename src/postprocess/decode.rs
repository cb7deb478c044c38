// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/postprocess/decode.rs - 输出张量解码
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

use tracing::{debug, error};

use super::PostprocessError;

/// 每个框前 4 个特征为 (cx, cy, w, h)
const BOX_FEATURES: usize = 4;

/// 候选框，坐标位于模型输入空间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
  pub center_x: f32,
  pub center_y: f32,
  pub width: f32,
  pub height: f32,
  pub class_id: u32,
  pub confidence: f32,
}

/// 解码特征优先布局的检测输出
///
/// 第 `f` 个特征、第 `b` 个框位于 `raw[f * num_boxes + b]`。
/// 最高类别得分低于 `conf_threshold` 的框被丢弃，得分相同时取较小的类别索引。
pub fn decode(
  raw: &[f32],
  num_classes: usize,
  conf_threshold: f32,
) -> Result<Vec<Candidate>, PostprocessError> {
  if num_classes < 1 {
    return Err(PostprocessError::InvalidConfiguration(
      "类别数量必须至少为 1".to_string(),
    ));
  }

  let stride = num_classes.checked_add(BOX_FEATURES).ok_or_else(|| {
    PostprocessError::InvalidConfiguration(format!("类别数量过大: {}", num_classes))
  })?;
  if raw.len() % stride != 0 {
    error!("输出长度 {} 不是 {} 的整数倍", raw.len(), stride);
    return Err(PostprocessError::ShapeMismatch {
      len: raw.len(),
      stride,
    });
  }

  let num_boxes = raw.len() / stride;
  debug!("输出长度 {}, 框数 {}, 类别数 {}", raw.len(), num_boxes, num_classes);

  let mut candidates = Vec::new();
  for b in 0..num_boxes {
    let (score, class_id) = {
      let mut max_score = raw[BOX_FEATURES * num_boxes + b];
      let mut cls_idx = 0usize;
      for c in 1..num_classes {
        let score = raw[(BOX_FEATURES + c) * num_boxes + b];
        if score > max_score {
          max_score = score;
          cls_idx = c;
        }
      }
      (max_score, cls_idx as u32)
    };

    // NaN 得分同样丢弃
    if !(score >= conf_threshold) {
      continue;
    }

    candidates.push(Candidate {
      center_x: raw[b],
      center_y: raw[num_boxes + b],
      width: raw[2 * num_boxes + b],
      height: raw[3 * num_boxes + b],
      class_id,
      confidence: score,
    });
  }

  debug!("{} 个框通过置信度阈值 {}", candidates.len(), conf_threshold);
  Ok(candidates)
}
