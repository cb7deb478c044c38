// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/output/record.rs - 检测结果记录输出
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

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, label::ClassCatalog, model::Detection, output::Render, url_file_path,
};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DetectionRecord {
  pub class_id: u32,
  pub class_name: String,
  pub confidence: f32,
  pub left: f32,
  pub top: f32,
  pub width: f32,
  pub height: f32,
}

impl DetectionRecord {
  pub fn new(catalog: &ClassCatalog, det: &Detection) -> Self {
    Self {
      class_id: det.class_id,
      class_name: catalog.name(det.class_id).into_owned(),
      confidence: det.confidence,
      left: det.left,
      top: det.top,
      width: det.width,
      height: det.height,
    }
  }
}

/// 把检测结果以 JSON 数组写入文件
pub struct RecordOutput {
  path: PathBuf,
  catalog: ClassCatalog,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch(url.scheme().to_string()));
    }

    Ok(Self::new(url_file_path(url)))
  }
}

impl RecordOutput {
  pub fn new<P: AsRef<Path>>(path: P) -> Self {
    Self {
      path: path.as_ref().to_path_buf(),
      catalog: ClassCatalog::coco(),
    }
  }

  pub fn with_catalog(mut self, catalog: ClassCatalog) -> Self {
    self.catalog = catalog;
    self
  }

  pub fn record(&self, detections: &[Detection]) -> Result<(), RecordOutputError> {
    let records: Vec<DetectionRecord> = detections
      .iter()
      .map(|det| DetectionRecord::new(&self.catalog, det))
      .collect();
    let json = serde_json::to_string_pretty(&records)?;

    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, json)?;
    info!("保存 {} 条检测记录到文件: {}", records.len(), self.path.display());
    Ok(())
  }
}

impl<Frame> Render<Frame, Vec<Detection>> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, _frame: &Frame, result: &Vec<Detection>) -> Result<(), Self::Error> {
    self.record(result)
  }
}
