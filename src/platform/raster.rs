//! SVG rasterization on an offscreen surface.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbaImage};
use resvg::tiny_skia;
use resvg::usvg;
use resvg::usvg::fontdb;

use crate::dataurl;
use crate::geometry::Size;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// The source image could not be loaded. Callers may fall back to the
    /// vector artifact.
    #[error("image decode failed: {0}")]
    Decode(String),
    /// No drawing surface of the requested size is available.
    #[error("canvas unavailable: {0}")]
    Canvas(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Draws an SVG image onto a white surface and exports it as PNG.
pub trait Rasterizer: Send + Sync {
    /// Load `svg_data_url`, draw it at `scale` onto a white surface of
    /// `size × scale` pixels, and return a `data:image/png` URL.
    ///
    /// # Errors
    ///
    /// [`RasterError::Decode`] when the image cannot be loaded, and
    /// [`RasterError::Canvas`] / [`RasterError::Encode`] when the surface
    /// cannot be created or exported.
    fn rasterize(&self, svg_data_url: &str, size: Size, scale: f64) -> Result<String, RasterError>;
}

/// Rasterizer backed by `resvg`.
#[derive(Debug, Clone)]
pub struct ResvgRasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl ResvgRasterizer {
    pub const fn new(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg_data_url: &str, size: Size, scale: f64) -> Result<String, RasterError> {
        let source = dataurl::decode(svg_data_url).map_err(|err| RasterError::Decode(err.to_string()))?;
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_data(&source.bytes, &options)
            .map_err(|err| RasterError::Decode(err.to_string()))?;

        let (width, height) = canvas_size(size, scale)?;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| RasterError::Canvas(format!("failed to allocate {width}x{height} surface")))?;

        pixmap.fill(tiny_skia::Color::WHITE);
        let scale = scale as f32;
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );

        // Opaque after the white fill, so premultiplied and straight RGBA agree.
        let rgba = RgbaImage::from_raw(width, height, pixmap.take())
            .ok_or_else(|| RasterError::Encode("pixel buffer size mismatch".to_string()))?;
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|err| RasterError::Encode(err.to_string()))?;

        Ok(dataurl::encode("image/png", png.get_ref()))
    }
}

/// Surface dimensions in whole pixels. Fractional sizes truncate, as a
/// canvas does when its width is assigned.
fn canvas_size(size: Size, scale: f64) -> Result<(u32, u32), RasterError> {
    let width = (size.width * scale).floor();
    let height = (size.height * scale).floor();
    let valid = |v: f64| v.is_finite() && v >= 1.0 && v <= f64::from(u32::MAX);
    if !valid(width) || !valid(height) {
        return Err(RasterError::Canvas(format!(
            "invalid surface size {width}x{height}"
        )));
    }
    Ok((width as u32, height as u32))
}
