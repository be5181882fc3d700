//! Rendering a plot without a window.
//!
//! Each call attaches the plot to a fresh offscreen canvas, draws one frame
//! and reads it back. Useful for batch image production and tests.

use std::path::Path;

use image::RgbaImage;
use meteoplot_render::{save_image, Canvas, GpuCanvas, SoftwareCanvas};

use crate::plot::PlotLifecycle;
use crate::Result;

/// Renders one frame on the CPU rasterizer.
///
/// # Example
/// ```no_run
/// use meteoplot::*;
///
/// let mut plot = Plot3D::new();
/// plot.add_graphic(Graphic::points(vec![Vec3::ZERO, Vec3::X, Vec3::Y], PointStyle::default()));
/// let image = render_to_image(&mut plot, 800, 600).unwrap();
/// assert_eq!(image.dimensions(), (800, 600));
/// ```
pub fn render_to_image<P: PlotLifecycle + ?Sized>(plot: &mut P, width: u32, height: u32) -> Result<RgbaImage> {
    let _ = env_logger::try_init();
    let mut canvas = SoftwareCanvas::new(width, height);
    render_frame(plot, &mut canvas, width, height)
}

/// Renders one frame through wgpu on an offscreen texture.
///
/// Fails when no graphics adapter is available.
pub fn render_to_image_gpu<P: PlotLifecycle + ?Sized>(plot: &mut P, width: u32, height: u32) -> Result<RgbaImage> {
    let _ = env_logger::try_init();
    let mut canvas = GpuCanvas::new(width, height)?;
    render_frame(plot, &mut canvas, width, height)
}

/// Renders one frame and saves it as PNG or JPEG, by extension.
pub fn render_to_file<P: PlotLifecycle + ?Sized>(
    plot: &mut P,
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
) -> Result<()> {
    let image = render_to_image(plot, width, height)?;
    save_image(path, &image)?;
    Ok(())
}

/// A timestamped file name such as `meteoplot_20240101_120000.png`.
#[must_use]
pub fn default_screenshot_name() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("meteoplot_{timestamp}.png")
}

fn render_frame<P: PlotLifecycle + ?Sized>(
    plot: &mut P,
    canvas: &mut dyn Canvas,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    plot.init(canvas);
    plot.reshape(canvas, 0, 0, width, height)?;
    let frame = plot.display(canvas);
    plot.dispose(canvas);
    frame?;
    Ok(canvas.snapshot()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_screenshot_name() {
        let name = default_screenshot_name();
        assert!(name.starts_with("meteoplot_"));
        assert!(name.ends_with(".png"));
        // meteoplot_ + YYYYMMDD_HHMMSS + .png
        assert_eq!(name.len(), 10 + 15 + 4);
    }
}
