//! Renders a small 3D scene of a sounding profile over a terrain patch.
//!
//! ```text
//! cargo run --example scene_demo -- [output.png]
//! ```

use std::sync::Arc;

use meteoplot::*;

/// A 20x20 terrain patch colored by height.
fn terrain(colors: &ColorMap) -> Graphic {
    let n = 20u32;
    let mut vertices = Vec::new();
    let mut heights = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            #[allow(clippy::cast_precision_loss)]
            let (x, y) = (100.0 + i as f32 * 0.5, 30.0 + j as f32 * 0.5);
            let z = 300.0 * ((x - 105.0) * 0.4).sin() * ((y - 35.0) * 0.3).cos() + 300.0;
            vertices.push(Vec3::new(x, y, z));
            heights.push(z);
        }
    }
    let mut triangles = Vec::new();
    let row = n + 1;
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            triangles.push([a, a + 1, a + row + 1]);
            triangles.push([a, a + row + 1, a + row]);
        }
    }
    let mut mesh = MeshShape::new(vertices, triangles);
    mesh.colors = Some(heights.iter().map(|h| colors.sample(h / 600.0)).collect());
    Graphic::leaf(Shape::Mesh(mesh), Style::Intrinsic).with_lighting(true)
}

fn main() -> Result<()> {
    init_logging();
    let output = std::env::args().nth(1).unwrap_or_else(default_screenshot_name);

    let registry = ColorMapRegistry::new();
    let Some(colors) = registry.get("viridis") else {
        log::error!("viridis color map is missing");
        return Ok(());
    };

    let mut plot = Plot3D::new();
    plot.set_font_library(Arc::new(FontLibrary::with_system_fonts()));
    plot.options_mut().lighting = Lighting::on();
    plot.add_graphic(terrain(colors));

    let sounding: Vec<Vec3> = (0..12)
        .map(|k| {
            #[allow(clippy::cast_precision_loss)]
            let k = k as f32;
            Vec3::new(104.0 + 0.3 * k, 34.0 + 0.2 * k, 100.0 * k)
        })
        .collect();
    plot.add_graphic(Graphic::polyline(
        sounding.clone(),
        LineStyle {
            color: Vec4::new(0.8, 0.1, 0.1, 1.0),
            width: 2.0,
            ..LineStyle::default()
        },
    ));
    plot.add_graphic(Graphic::points(
        sounding,
        PointStyle {
            size: 6.0,
            marker: PointMarker::Sphere,
            ..PointStyle::default()
        },
    ));

    plot.x_axis_mut().label = Some(ChartText::new("Longitude"));
    plot.y_axis_mut().label = Some(ChartText::new("Latitude"));
    plot.z_axis_mut().label = Some(ChartText::new("Height (m)"));
    plot.add_z_axis(100.0, 30.0, true);
    plot.set_title("Terrain and sounding");
    plot.set_angle_y(30.0);

    render_to_file(&mut plot, &output, 1000, 800)?;
    println!("wrote {output}");
    Ok(())
}
