// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/config.rs - 检测参数配置
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

use crate::postprocess::PostprocessError;

pub const DEFAULT_MODEL_SIDE: u32 = 640;
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.5;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// 后处理参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectConfig {
  /// 模型类别数量，必须与训练时一致
  pub num_classes: usize,
  /// 模型输入边长（正方形）
  pub model_side: u32,
  /// 置信度阈值
  pub conf_threshold: f32,
  /// NMS IOU 阈值
  pub iou_threshold: f32,
}

impl DetectConfig {
  pub fn new(num_classes: usize) -> Self {
    Self {
      num_classes,
      model_side: DEFAULT_MODEL_SIDE,
      conf_threshold: DEFAULT_CONF_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
    }
  }

  pub fn model_side(mut self, model_side: u32) -> Self {
    self.model_side = model_side;
    self
  }

  pub fn conf_threshold(mut self, conf_threshold: f32) -> Self {
    self.conf_threshold = conf_threshold;
    self
  }

  pub fn iou_threshold(mut self, iou_threshold: f32) -> Self {
    self.iou_threshold = iou_threshold;
    self
  }

  /// 在处理任何数据之前检查参数
  pub fn validate(&self) -> Result<(), PostprocessError> {
    if self.num_classes < 1 {
      return Err(PostprocessError::InvalidConfiguration(format!(
        "类别数量必须至少为 1, 实际为 {}",
        self.num_classes
      )));
    }
    // 类别索引以 u32 表示
    if self.num_classes > u32::MAX as usize {
      return Err(PostprocessError::InvalidConfiguration(format!(
        "类别数量不能超过 {}, 实际为 {}",
        u32::MAX,
        self.num_classes
      )));
    }
    if self.model_side == 0 {
      return Err(PostprocessError::InvalidConfiguration(
        "模型输入边长必须大于 0".to_string(),
      ));
    }
    check_threshold("置信度阈值", self.conf_threshold)?;
    check_threshold("IOU 阈值", self.iou_threshold)?;
    Ok(())
  }
}

fn check_threshold(name: &str, value: f32) -> Result<(), PostprocessError> {
  // NaN 不在任何区间内
  if (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    Err(PostprocessError::InvalidConfiguration(format!(
      "{} 必须位于 [0, 1] 区间, 实际为 {}",
      name, value
    )))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_detector_conventions() {
    let config = DetectConfig::new(80);
    assert_eq!(config.model_side, 640);
    assert_eq!(config.conf_threshold, 0.5);
    assert_eq!(config.iou_threshold, 0.45);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn rejects_zero_classes() {
    let err = DetectConfig::new(0).validate().unwrap_err();
    assert!(matches!(err, PostprocessError::InvalidConfiguration(_)));
  }

  #[cfg(target_pointer_width = "64")]
  #[test]
  fn rejects_class_count_beyond_u32_ids() {
    let err = DetectConfig::new(usize::MAX).validate().unwrap_err();
    assert!(matches!(err, PostprocessError::InvalidConfiguration(_)));
    assert!(DetectConfig::new(u32::MAX as usize).validate().is_ok());
  }

  #[test]
  fn rejects_zero_model_side() {
    let err = DetectConfig::new(3).model_side(0).validate().unwrap_err();
    assert!(matches!(err, PostprocessError::InvalidConfiguration(_)));
  }

  #[test]
  fn rejects_thresholds_outside_unit_interval() {
    for bad in [-0.1, 1.5, f32::NAN] {
      assert!(DetectConfig::new(3).conf_threshold(bad).validate().is_err());
      assert!(DetectConfig::new(3).iou_threshold(bad).validate().is_err());
    }
    assert!(
      DetectConfig::new(3)
        .conf_threshold(0.0)
        .iou_threshold(1.0)
        .validate()
        .is_ok()
    );
  }
}
