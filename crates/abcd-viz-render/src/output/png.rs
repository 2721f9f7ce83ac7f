use tiny_skia::{Color, Pixmap, Transform};

use crate::RenderError;

fn png_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Png(e.to_string())
}

/// Rasterize `svg` on a white background. Point units map to pixels at `dpi`.
///
/// Text falls back to the system `sans-serif` font.
pub fn svg_to_png(svg: &str, dpi: u32) -> crate::Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options).map_err(png_error)?;

    let scale = dpi as f32 / 72.0;
    let size = tree.size().to_int_size().scale_by(scale).ok_or_else(|| png_error("empty image"))?;
    let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| png_error("image too large"))?;
    pixmap.fill(Color::WHITE);
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    pixmap.encode_png().map_err(png_error)
}
