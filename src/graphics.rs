use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use reqwest::Client;

use crate::display::DisplayMode;

// --- Fetching ---

/// Download and decode an image. Preview URLs carry their own cache token,
/// so no caching happens here.
pub async fn fetch_image(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to request {}", url))?;
  if !response.status().is_success() {
    return Err(anyhow!("{} returned {}", url, response.status()));
  }
  let bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode image from memory (URL: {})", url))
}

/// Resize to fill `area`, keeping 16:9. Half-block cells hold two pixel rows.
pub fn fit_to_area(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let target_w = area.width.max(1) as u32;
  let target_h = match mode {
    DisplayMode::Direct => (target_w as f32 * 9.0 / 16.0) as u32,
    DisplayMode::Ascii => (target_w as f32 * 9.0 / 32.0) as u32,
  };
  image.resize_to_fill(target_w, target_h.max(1), FilterType::Triangle)
}

/// Last resize result, reused while the source and target area stay the same.
#[derive(Default)]
pub struct FittedImage {
  key: Option<(String, Rect)>,
  image: Option<DynamicImage>,
}

impl FittedImage {
  pub fn get(&mut self, key: &str, source: &DynamicImage, area: Rect, mode: DisplayMode) -> &DynamicImage {
    let fresh = self.key.as_ref().is_some_and(|(k, a)| k == key && *a == area);
    if !fresh {
      self.image = None;
      self.key = Some((key.to_string(), area));
    }
    self.image.get_or_insert_with(|| fit_to_area(source, area, mode))
  }

  pub fn clear(&mut self) {
    self.key = None;
    self.image = None;
  }
}

// --- Thumbnail Widget ---

pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_CHARS: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_direct(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
    }
  }
}

/// Cell position of pixel column `x` / row `y` after centering.
fn cell(area: Rect, offset_x: u32, offset_y: u32, x: u32, y: u32) -> (u16, u16) {
  let clamp = |v: u32| v.min(u16::MAX as u32) as u16;
  (
    area.x.saturating_add(clamp(offset_x)).saturating_add(clamp(x)),
    area.y.saturating_add(clamp(offset_y)).saturating_add(clamp(y)),
  )
}

fn render_direct(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(area.width as u32);
  let img_h = rgb.height();
  let rows = img_h.div_ceil(2).min(area.height as u32);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(rows) / 2;

  for y in 0..rows {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if y * 2 + 1 < img_h {
        let lower = rgb.get_pixel(x, y * 2 + 1);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell(area, offset_x, offset_y, x, y);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(area.width as u32);
  let img_h = luma.height().min(area.height as u32);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(img_h) / 2;

  for y in 0..img_h {
    for x in 0..img_w {
      let (cx, cy) = cell(area, offset_x, offset_y, x, y);
      buf.set_string(cx, cy, ascii_for(luma.get_pixel(x, y)[0]), Style::default());
    }
  }
}

fn ascii_for(level: u8) -> &'static str {
  let idx = ((level as f32 / 255.0) * (ASCII_CHARS.len() - 1) as f32).round() as usize;
  ASCII_CHARS[idx.min(ASCII_CHARS.len() - 1)]
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn ascii_ramp_ends() {
    assert_eq!(ascii_for(0), " ");
    assert_eq!(ascii_for(255), "@");
  }

  #[test]
  fn fit_to_area_keeps_aspect() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 36, Rgb([10, 20, 30])));
    let area = Rect::new(0, 0, 32, 20);
    let direct = fit_to_area(&img, area, DisplayMode::Direct);
    assert_eq!((direct.width(), direct.height()), (32, 18));
    let ascii = fit_to_area(&img, area, DisplayMode::Ascii);
    assert_eq!((ascii.width(), ascii.height()), (32, 9));
  }

  #[test]
  fn fitted_image_refits_on_new_area() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 36, Rgb([1, 2, 3])));
    let mut fitted = FittedImage::default();
    assert_eq!(fitted.get("a", &img, Rect::new(0, 0, 16, 10), DisplayMode::Direct).width(), 16);
    assert_eq!(fitted.get("a", &img, Rect::new(0, 0, 32, 20), DisplayMode::Direct).width(), 32);
    fitted.clear();
    assert!(fitted.key.is_none());
  }

  #[test]
  fn direct_render_paints_half_blocks() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 0, 0])));
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    ThumbnailWidget { image: &img, display_mode: DisplayMode::Direct }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "▀");
    assert_eq!(buf[(3, 1)].fg, Color::Rgb(200, 0, 0));
  }
}
