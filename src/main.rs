// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use detpost::{
  ClassCatalog, Detector, FromUrl,
  frame::ImageFrame,
  input::ImageFileInput,
  model::RawFileEngine,
  output::{OutputWrapper, draw::Draw},
  task::{OneShotTask, RepeatShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("推理引擎: {}", args.engine);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {}", args.nms_threshold);

  let config = args.detect_config();
  let catalog = match &args.labels {
    Some(path) => ClassCatalog::from_file(path)?,
    None => ClassCatalog::coco(),
  };
  let draw = match &args.font {
    Some(path) => Draw::default().with_font_file(path)?,
    None => Draw::default(),
  }
  .font_size(args.font_size);
  if !draw.has_font() {
    warn!("未指定字体文件，标签只绘制背景");
  }

  let engine = RawFileEngine::from_url(&args.engine)?;
  let model: Detector<_, ImageFrame> = Detector::new(engine, config)?;
  let input = ImageFileInput::from_url(&args.input)?.into_frames(model.config().model_side);
  let output = OutputWrapper::from_url(&args.output)?
    .with_catalog(catalog)
    .with_draw(draw);

  if args.repeat > 0 {
    RepeatShotTask::new(args.repeat).run_task(input, model, output)?;
  } else {
    OneShotTask.run_task(input, model, output)?;
  }

  Ok(())
}
