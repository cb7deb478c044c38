// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use detpost::DetectConfig;

/// Detpost 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理引擎, 例如 raw:///path/to/output.bin
  #[arg(long, value_name = "ENGINE")]
  pub engine: Url,

  /// 输入图像, 例如 image:///path/to/input.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// 支持格式:
  /// - 标注图像: image:///path/to/output.png
  /// - JSON 记录: record:///path/to/output.json
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 模型类别数量
  #[arg(long, value_name = "COUNT")]
  pub num_classes: usize,

  /// 模型输入边长
  #[arg(long, default_value = "640", value_name = "PIXELS")]
  pub model_side: u32,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.45", value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 类别名称文件（每行一个），默认使用 COCO 类别
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 标签字体文件 (TTF/OTF)
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,

  /// 标签字体大小
  #[arg(long, default_value = "20", value_name = "PIXELS")]
  pub font_size: f32,

  /// 重复推理次数，0 表示只推理一次
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub repeat: usize,
}

impl Args {
  pub fn detect_config(&self) -> DetectConfig {
    DetectConfig::new(self.num_classes)
      .model_side(self.model_side)
      .conf_threshold(self.confidence)
      .iou_threshold(self.nms_threshold)
  }
}
