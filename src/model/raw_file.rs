// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/model/raw_file.rs - 原始输出张量文件回放
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::NormalizedFrame,
  model::{InferenceEngine, RawOutput},
  url_file_path,
};

const F32_SIZE: usize = std::mem::size_of::<f32>();

#[derive(Error, Debug)]
pub enum RawFileError {
  #[error("张量文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("张量文件长度 {0} 不是 4 字节的整数倍")]
  Misaligned(usize),
  #[error("模型路径必须使用 raw 方案, 实际为 {0}")]
  SchemeMismatch(String),
}

/// 回放预先导出的检测器输出（小端序 f32）
///
/// 不执行任何推理，`run` 总是返回加载的同一份输出。
#[derive(Debug, Clone)]
pub struct RawFileEngine {
  output: RawOutput,
}

impl FromUrlWithScheme for RawFileEngine {
  const SCHEME: &'static str = "raw";
}

impl FromUrl for RawFileEngine {
  type Error = RawFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RawFileError::SchemeMismatch(url.scheme().to_string()));
    }
    Self::open(url_file_path(url))
  }
}

impl RawFileEngine {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RawFileError> {
    let path = path.as_ref();
    info!("加载张量文件: {}", path.display());
    let bytes = std::fs::read(path)?;
    debug!(
      "张量文件大小: {:.2} MB",
      bytes.len() as f64 / (1024.0 * 1024.0)
    );
    Self::from_le_bytes(&bytes)
  }

  pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, RawFileError> {
    if bytes.len() % F32_SIZE != 0 {
      return Err(RawFileError::Misaligned(bytes.len()));
    }

    let data: Vec<f32> = bytes
      .chunks_exact(F32_SIZE)
      .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
      .collect();
    Ok(Self {
      output: RawOutput::from(data),
    })
  }
}

impl InferenceEngine for RawFileEngine {
  type Error = std::convert::Infallible;

  fn run(&self, _input: &NormalizedFrame) -> Result<RawOutput, Self::Error> {
    Ok(self.output.clone())
  }
}
