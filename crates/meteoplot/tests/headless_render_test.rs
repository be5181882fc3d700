//! Headless rendering integration tests.
//!
//! The CPU canvas always works. The GPU test needs a wgpu adapter (real or
//! software fallback) and skips itself when none is available.

use meteoplot::*;

/// Not all background and not a single flat color.
fn has_nontrivial_content(image: &image::RgbaImage) -> bool {
    let first = image.get_pixel(0, 0);
    image.pixels().any(|p| p != first)
}

fn station_plot() -> Plot3D {
    let mut plot = Plot3D::new();
    let points = vec![
        Vec3::new(100.0, 20.0, 0.0),
        Vec3::new(120.0, 40.0, 500.0),
        Vec3::new(110.0, 30.0, 1000.0),
    ];
    plot.add_graphic(Graphic::points(
        points,
        PointStyle {
            size: 8.0,
            ..PointStyle::default()
        },
    ));
    plot.set_title("Stations");
    plot
}

#[test]
fn test_empty_scene_without_decorations_is_background() {
    let mut plot = Plot3D::new();
    {
        let o = plot.options_mut();
        o.boxed = false;
        o.draw_base = false;
        o.display_xy = false;
        o.display_z = false;
        o.grid_line = GridLine::default();
    }
    let image = render_to_image(&mut plot, 64, 48).unwrap();
    assert_eq!(image.dimensions(), (64, 48));
    assert!(image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn test_scene_renders_to_image() {
    let mut plot = station_plot();
    let image = render_to_image(&mut plot, 200, 150).unwrap();
    assert_eq!(image.dimensions(), (200, 150));
    assert!(has_nontrivial_content(&image));
    assert_eq!(plot.frame_count(), 1);
}

#[test]
fn test_background_color_is_used() {
    let mut plot = Plot3D::new();
    plot.options_mut().set_background(Vec4::new(0.0, 0.0, 0.0, 1.0));
    let image = render_to_image(&mut plot, 40, 40).unwrap();
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn test_colorbar_is_drawn_right_of_the_box() {
    let mut plot = Plot3D::new();
    {
        let o = plot.options_mut();
        o.boxed = false;
        o.draw_base = false;
        o.display_xy = false;
        o.display_z = false;
        o.grid_line = GridLine::default();
    }
    let scheme = LegendScheme::graduated(
        &[0.0, 1.0, 2.0, 3.0],
        &[
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 1.0, 1.0),
        ],
    );
    plot.add_legend(ColorBar::new(scheme));
    let image = render_to_image(&mut plot, 100, 100).unwrap();
    // The bar spans x = 1.6..1.7 of the -2..2 view.
    let painted_right = (0..100).any(|y| image.get_pixel(91, y).0 != [255, 255, 255, 255]);
    let painted_left = (0..100).any(|y| image.get_pixel(10, y).0 != [255, 255, 255, 255]);
    assert!(painted_right);
    assert!(!painted_left);
}

#[test]
fn test_map_plot_renders() {
    let mut map = MapPlot3D::new(ProjectionInfo::lon_lat());
    map.add_graphic(Graphic::polyline(
        vec![Vec3::new(100.0, 20.0, 0.0), Vec3::new(130.0, 45.0, 0.0)],
        LineStyle::default(),
    ));
    let image = render_to_image(&mut map, 120, 90).unwrap();
    assert!(has_nontrivial_content(&image));
}

#[test]
fn test_render_to_file_writes_png() {
    let mut plot = station_plot();
    let path = std::env::temp_dir().join(format!("meteoplot_test_{}.png", std::process::id()));
    render_to_file(&mut plot, &path, 160, 120).unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (160, 120));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_unknown_extension_is_an_error() {
    let mut plot = station_plot();
    let path = std::env::temp_dir().join("meteoplot_test.unknown");
    assert!(render_to_file(&mut plot, &path, 32, 32).is_err());
}

#[test]
fn test_headless_gpu_render() {
    let mut plot = station_plot();
    match render_to_image_gpu(&mut plot, 200, 150) {
        Ok(image) => {
            assert_eq!(image.dimensions(), (200, 150));
            assert!(has_nontrivial_content(&image));
        }
        Err(e) => {
            eprintln!("Skipping GPU headless test: no adapter available ({e})");
        }
    }
}
