// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, info};

use crate::{label::ClassCatalog, model::Detection, output::label_text};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const PALETTE_SIZE: usize = 80;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 标签背景左上角，位于边框正上方，不会出现负坐标
pub fn label_origin(left: i32, top: i32, text_height: i32) -> (i32, i32) {
  (left.max(0), (top - text_height).max(0))
}

pub struct Draw {
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  font: Option<FontVec>,
  colors: Vec<Rgb<u8>>,
}

impl Default for Draw {
  fn default() -> Self {
    // 每个类别一种颜色
    let colors = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Self {
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      font: None,
      colors,
    }
  }
}

impl Draw {
  /// 加载字体后才会绘制标签文字，否则只绘制标签背景
  pub fn with_font_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, DrawError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    self.font = Some(FontVec::try_from_vec(data)?);
    Ok(self)
  }

  pub fn font_size(mut self, font_size: f32) -> Self {
    self.font_size = font_size;
    self
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  pub fn color_of(&self, class_id: u32) -> Rgb<u8> {
    self.colors[class_id as usize % self.colors.len()]
  }

  fn text_width(&self, label: &str) -> i32 {
    match &self.font {
      Some(font) => text_size(PxScale::from(self.font_size), font, label).0 as i32,
      None => (label.chars().count() as f32 * self.label_char_width) as i32,
    }
  }

  pub fn draw_detections_on_image(
    &self,
    image: &mut RgbImage,
    detections: &[Detection],
    catalog: &ClassCatalog,
  ) {
    for det in detections {
      self.draw_bbox_with_label(image, det, catalog);
    }
    debug!("绘制 {} 个检测框", detections.len());
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, det: &Detection, catalog: &ClassCatalog) {
    let (img_w, img_h) = (image.width() as i32, image.height() as i32);
    if img_w == 0 || img_h == 0 {
      return;
    }
    let color = self.color_of(det.class_id);

    let x_min = (det.left.floor() as i32).clamp(0, img_w - 1);
    let y_min = (det.top.floor() as i32).clamp(0, img_h - 1);
    let x_max = (det.right().ceil() as i32).clamp(x_min + 1, img_w);
    let y_max = (det.bottom().ceil() as i32).clamp(y_min + 1, img_h);
    let (box_w, box_h) = ((x_max - x_min) as u32, (y_max - y_min) as u32);

    // 绘制边框（加粗为2像素）
    draw_hollow_rect_mut(image, Rect::at(x_min, y_min).of_size(box_w, box_h), color);
    if box_w > 2 && box_h > 2 {
      let inner = Rect::at(x_min + 1, y_min + 1).of_size(box_w - 2, box_h - 2);
      draw_hollow_rect_mut(image, inner, color);
    }

    let label = label_text(catalog, det);
    let (label_x, label_y) = label_origin(x_min, y_min, self.label_text_height);

    // 确保标签不超出图像边界
    let max_width = (img_w - label_x).max(0);
    let label_width = self.text_width(&label).min(max_width);
    let label_height = self.label_text_height.min(img_h - label_y);
    if label_width <= 0 || label_height <= 0 {
      return;
    }

    let rect = Rect::at(label_x, label_y).of_size(label_width as u32, label_height as u32);
    draw_filled_rect_mut(image, rect, color);

    if let Some(font) = &self.font {
      draw_text_mut(
        image,
        LABEL_TEXT_COLOR,
        label_x,
        label_y + self.label_text_vertical_padding,
        PxScale::from(self.font_size),
        font,
        &label,
      );
    }
  }
}

/// HSV 转 RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn label_sits_above_box_and_never_goes_negative() {
    assert_eq!(label_origin(30, 100, 24), (30, 76));
    assert_eq!(label_origin(30, 10, 24), (30, 0));
    assert_eq!(label_origin(-5, 10, 24), (0, 0));
  }

  #[test]
  fn outlines_box_and_fills_label_background() {
    let mut image = RgbImage::new(200, 200);
    let draw = Draw::default();
    let det = Detection::new(50.0, 80.0, 60.0, 40.0, 0.9, 3);
    draw.draw_detections_on_image(&mut image, &[det], &ClassCatalog::coco());

    let color = draw.color_of(3);
    // 边框
    assert_eq!(*image.get_pixel(50, 100), color);
    assert_eq!(*image.get_pixel(51, 100), color);
    assert_eq!(*image.get_pixel(80, 119), color);
    // 框内部保持不变
    assert_eq!(*image.get_pixel(80, 100), Rgb([0, 0, 0]));
    // 标签背景位于框上方
    assert_eq!(*image.get_pixel(52, 60), color);
    assert_eq!(*image.get_pixel(52, 50), Rgb([0, 0, 0]));
  }

  #[test]
  fn palette_wraps_around() {
    let draw = Draw::default();
    assert_eq!(draw.color_of(1), draw.color_of(81));
    assert_ne!(draw.color_of(0), draw.color_of(40));
  }

  #[test]
  fn default_draw_has_no_font() {
    let draw = Draw::default().font_size(32.0);
    assert!(!draw.has_font());
    assert_eq!(draw.font_size, 32.0);
  }

  #[test]
  fn missing_font_file_is_reported() {
    let result = Draw::default().with_font_file("/nonexistent/detpost/font.ttf");
    assert!(matches!(result, Err(DrawError::IoError(_))));
  }

  #[test]
  fn garbage_font_is_rejected() {
    let path = std::env::temp_dir().join(format!("detpost-font-{}.ttf", std::process::id()));
    std::fs::write(&path, b"not a font").unwrap();
    let result = Draw::default().with_font_file(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(DrawError::InvalidFont(_))));
  }
}
