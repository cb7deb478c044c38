// 该文件是 Detpost （检测后处理） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  label::ClassCatalog,
  model::Detection,
  output::{Render, draw::Draw},
  url_file_path,
};

pub struct SaveImageFileOutput {
  path: String,
  draw: Draw,
  catalog: ClassCatalog,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: url_file_path(uri),
      draw: Draw::default(),
      catalog: ClassCatalog::coco(),
    })
  }
}

impl SaveImageFileOutput {
  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn with_catalog(mut self, catalog: ClassCatalog) -> Self {
    self.catalog = catalog;
    self
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    warn!("保存图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<ImageFrame, Vec<Detection>> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(
    &self,
    frame: &ImageFrame,
    result: &Vec<Detection>,
  ) -> Result<(), Self::Error> {
    let mut image = frame.image.clone();
    self
      .draw
      .draw_detections_on_image(&mut image, result, &self.catalog);
    self.save_image(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn saves_annotated_image() {
    let dir = std::env::temp_dir().join(format!("detpost-save-{}", std::process::id()));
    let path = dir.join("out.png");
    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();

    let frame = ImageFrame::from_rgb_image(image::RgbImage::new(64, 48), 8);
    let det = Detection::new(10.0, 30.0, 20.0, 10.0, 0.7, 0);
    output.render_result(&frame, &vec![det]).unwrap();

    let saved = image::open(&path).unwrap().to_rgb8();
    std::fs::remove_dir_all(&dir).unwrap();
    assert_eq!(saved.dimensions(), (64, 48));
    assert_eq!(*saved.get_pixel(10, 35), Draw::default().color_of(0));
  }

  #[test]
  fn rejects_foreign_scheme() {
    let url = Url::parse("record:///tmp/out.png").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));
  }
}
