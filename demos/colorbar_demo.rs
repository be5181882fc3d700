//! Renders a shaded temperature field with a continuous colorbar.
//!
//! ```text
//! cargo run --example colorbar_demo -- [output.png]
//! ```

use std::sync::Arc;

use meteoplot::*;

fn main() -> Result<()> {
    init_logging();
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "colorbar_demo.png".to_string());

    let registry = ColorMapRegistry::new();
    let Some(colors) = registry.get("coolwarm") else {
        log::error!("coolwarm color map is missing");
        return Ok(());
    };
    let normalize = Normalize::linear(-20.0, 30.0);
    let scheme = LegendScheme::continuous(colors.clone(), normalize).with_extend(ExtendType::Both);

    // Temperature cells as quads on the surface.
    let mut cells = Vec::new();
    for j in 0..16 {
        for i in 0..24 {
            let (x, y) = (f64::from(i), f64::from(j));
            let t = 30.0 - 2.5 * y + 5.0 * (x * 0.3).sin();
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = (x as f32, y as f32);
            let ring = vec![
                Vec3::new(x, y, 0.0),
                Vec3::new(x + 1.0, y, 0.0),
                Vec3::new(x + 1.0, y + 1.0, 0.0),
                Vec3::new(x, y + 1.0, 0.0),
            ];
            let style = PolygonStyle {
                fill_color: scheme.color_for(t),
                draw_outline: false,
                ..PolygonStyle::default()
            };
            cells.push(Graphic::polygon(PolygonShape::new(ring), style));
        }
    }

    let mut plot = Plot3D::new();
    plot.set_font_library(Arc::new(FontLibrary::with_system_fonts()));
    plot.add_graphic(Graphic::collection(cells));
    plot.add_legend(
        ColorBar::new(scheme)
            .with_ticks(
                vec![-20.0, -10.0, 0.0, 10.0, 20.0, 30.0],
                Vec::new(),
            )
            .with_label(ChartText::new("Temperature (C)"), LegendLabelLocation::Right),
    );
    plot.set_title("Surface temperature");
    plot.set_angle_x(-30.0);

    render_to_file(&mut plot, &output, 900, 600)?;
    println!("wrote {output}");
    Ok(())
}
