// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/model/detector.rs - 推理引擎与后处理组合
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
use tracing::{debug, info};

use crate::{
  config::DetectConfig,
  frame::AsTensorFrame,
  model::{Detection, InferenceEngine, Model},
  postprocess::{self, PostprocessError},
};

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("推理引擎错误: {0}")]
  Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("后处理错误: {0}")]
  Postprocess(#[from] PostprocessError),
}

pub struct Detector<E, Frame> {
  engine: E,
  config: DetectConfig,
  _phantom: std::marker::PhantomData<Frame>,
}

impl<E: InferenceEngine, Frame> Detector<E, Frame> {
  pub fn new(engine: E, config: DetectConfig) -> Result<Self, DetectorError> {
    config.validate()?;
    info!(
      "检测器配置: 类别数 {}, 输入边长 {}, 置信度阈值 {}, IOU 阈值 {}",
      config.num_classes, config.model_side, config.conf_threshold, config.iou_threshold
    );

    Ok(Self {
      engine,
      config,
      _phantom: std::marker::PhantomData,
    })
  }

  pub fn config(&self) -> &DetectConfig {
    &self.config
  }
}

impl<E: InferenceEngine, Frame: AsTensorFrame> Model for Detector<E, Frame> {
  type Input = Frame;
  type Output = Vec<Detection>;
  type Error = DetectorError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let tensor = input.as_tensor();

    debug!("执行模型推理");
    let output = self
      .engine
      .run(tensor)
      .map_err(|e| DetectorError::Engine(Box::new(e)))?;
    debug!("模型输出长度: {}", output.len());

    let detections = postprocess::detect(
      &output,
      &self.config,
      tensor.source_width(),
      tensor.source_height(),
    )?;
    Ok(detections)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::NormalizedFrame;
  use crate::model::RawOutput;

  #[derive(Debug, thiserror::Error)]
  #[error("engine offline")]
  struct Offline;

  struct FixedEngine(RawOutput);

  impl InferenceEngine for FixedEngine {
    type Error = Offline;

    fn run(&self, _input: &NormalizedFrame) -> Result<RawOutput, Self::Error> {
      Ok(self.0.clone())
    }
  }

  struct FailingEngine;

  impl InferenceEngine for FailingEngine {
    type Error = Offline;

    fn run(&self, _input: &NormalizedFrame) -> Result<RawOutput, Self::Error> {
      Err(Offline)
    }
  }

  fn frame(source_width: u32, source_height: u32) -> NormalizedFrame {
    NormalizedFrame::new(4, source_width, source_height, vec![0.0; 48]).unwrap()
  }

  #[test]
  fn maps_into_frame_source_dimensions() {
    // 单类别, 单框: 中心 (2, 2), 尺寸 (2, 2), 得分 0.8
    let raw = RawOutput::from(vec![2.0, 2.0, 2.0, 2.0, 0.8]);
    let detector: Detector<_, NormalizedFrame> =
      Detector::new(FixedEngine(raw), DetectConfig::new(1).model_side(4)).unwrap();
    assert_eq!(detector.config().model_side, 4);
    let detections = detector.infer(&frame(400, 200)).unwrap();
    assert_eq!(detections, vec![Detection::new(100.0, 50.0, 200.0, 100.0, 0.8, 0)]);
  }

  #[test]
  fn rejects_invalid_config_up_front() {
    let result: Result<Detector<_, NormalizedFrame>, _> =
      Detector::new(FailingEngine, DetectConfig::new(0));
    assert!(matches!(
      result,
      Err(DetectorError::Postprocess(PostprocessError::InvalidConfiguration(_)))
    ));
  }

  #[test]
  fn surfaces_engine_failure() {
    let detector: Detector<_, NormalizedFrame> =
      Detector::new(FailingEngine, DetectConfig::new(1)).unwrap();
    let err = detector.infer(&frame(10, 10)).unwrap_err();
    assert!(matches!(err, DetectorError::Engine(_)));
    assert_eq!(err.to_string(), "推理引擎错误: engine offline");
  }
}
