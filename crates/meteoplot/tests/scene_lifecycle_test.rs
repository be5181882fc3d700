//! Scene and renderer-cache behavior across frames, on the CPU canvas.

use meteoplot::*;

fn canvas() -> SoftwareCanvas {
    SoftwareCanvas::new(120, 90)
}

fn square(x: f32) -> Graphic {
    let ring = vec![
        Vec3::new(x, 0.0, 0.0),
        Vec3::new(x + 1.0, 0.0, 0.0),
        Vec3::new(x + 1.0, 1.0, 0.0),
        Vec3::new(x, 1.0, 0.0),
    ];
    Graphic::polygon(PolygonShape::new(ring), PolygonStyle::default())
}

#[test]
fn test_unchanged_graphic_keeps_its_renderer() {
    let mut plot = Plot3D::new();
    let a = plot.add_graphic(square(0.0));
    let mut canvas = canvas();
    plot.init(&canvas);

    plot.display(&mut canvas).unwrap();
    let id = plot.renderer_cache().instance_id(a);
    assert!(id.is_some());
    assert_eq!(plot.renderer_cache().build_count(a), Some(1));

    plot.display(&mut canvas).unwrap();
    assert_eq!(plot.renderer_cache().instance_id(a), id);
    assert_eq!(plot.renderer_cache().build_count(a), Some(1));
    assert_eq!(plot.frame_count(), 2);
}

#[test]
fn test_rebuild_signal_rebuilds_once() {
    let mut plot = Plot3D::new();
    let a = plot.add_graphic(square(0.0));
    let mut canvas = canvas();
    plot.init(&canvas);
    plot.display(&mut canvas).unwrap();

    plot.dispose(&canvas);
    plot.init(&canvas);
    plot.display(&mut canvas).unwrap();
    assert_eq!(plot.renderer_cache().build_count(a), Some(2));

    plot.display(&mut canvas).unwrap();
    assert_eq!(plot.renderer_cache().build_count(a), Some(2));
}

#[test]
fn test_reshape_resizes_and_rebuilds() {
    let mut plot = Plot3D::new();
    let a = plot.add_graphic(square(0.0));
    let mut canvas = canvas();
    plot.init(&canvas);
    plot.display(&mut canvas).unwrap();

    plot.reshape(&mut canvas, 0, 0, 200, 100).unwrap();
    assert_eq!(canvas.size(), (200, 100));
    assert_eq!(plot.camera().viewport().width, 200);
    plot.display(&mut canvas).unwrap();
    assert_eq!(plot.renderer_cache().build_count(a), Some(2));
}

#[test]
fn test_geometry_edit_rebuilds_only_that_graphic() {
    let mut plot = Plot3D::new();
    let a = plot.add_graphic(square(0.0));
    let b = plot.add_graphic(square(2.0));
    let mut canvas = canvas();
    plot.init(&canvas);
    plot.display(&mut canvas).unwrap();

    plot.update_graphic(a, |g| {
        if let Some(Shape::Polygon(p)) = g.shape_mut() {
            p.set_outer(vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
            ]);
        }
    })
    .unwrap();
    plot.display(&mut canvas).unwrap();
    assert_eq!(plot.renderer_cache().build_count(a), Some(2));
    assert_eq!(plot.renderer_cache().build_count(b), Some(1));
}

#[test]
fn test_removed_slot_gets_a_fresh_renderer() {
    let mut plot = Plot3D::new();
    let a = plot.add_graphic(square(0.0));
    let mut canvas = canvas();
    plot.init(&canvas);
    plot.display(&mut canvas).unwrap();
    let old = plot.renderer_cache().instance_id(a);

    plot.remove_graphic(a);
    let b = plot.add_graphic(square(0.0));
    assert_eq!(b.index(), a.index());
    assert!(plot.graphic(a).is_none());

    plot.display(&mut canvas).unwrap();
    assert_ne!(plot.renderer_cache().instance_id(b), old);
    assert_eq!(plot.renderer_cache().build_count(b), Some(1));
}

#[test]
fn test_remove_all_graphics_clears_cache() {
    let mut plot = Plot3D::new();
    plot.add_graphic(square(0.0));
    plot.add_graphic(square(1.0));
    let mut canvas = canvas();
    plot.init(&canvas);
    plot.display(&mut canvas).unwrap();
    assert_eq!(plot.renderer_cache().len(), 2);

    plot.remove_all_graphics();
    assert!(plot.renderer_cache().is_empty());
    assert!(plot.scene().is_empty());
    plot.display(&mut canvas).unwrap();
    assert_eq!(plot.last_frame_stats(), FrameStats::default());
}

#[test]
fn test_hidden_graphic_is_skipped() {
    let mut plot = Plot3D::new();
    let a = plot.add_graphic(square(0.0));
    plot.update_graphic(a, |g| g.visible = false).unwrap();
    let mut canvas = canvas();
    plot.init(&canvas);
    plot.display(&mut canvas).unwrap();
    let stats = plot.last_frame_stats();
    assert_eq!((stats.drawn, stats.skipped), (0, 1));
}

#[test]
fn test_options_round_trip_through_json() {
    let options = PlotOptions {
        angle_y: 200.0,
        orthographic: false,
        ..PlotOptions::default()
    };
    let json = options.to_json_string().unwrap();
    let mut plot = Plot3D::new();
    plot.set_options(PlotOptions::from_json_str(&json).unwrap()).unwrap();
    assert!(!plot.camera().is_orthographic());
    assert!((plot.camera().angle_y() - 200.0).abs() < 1e-6);

    let bad = PlotOptions {
        distance: 0.0,
        ..PlotOptions::default()
    };
    assert!(plot.set_options(bad).is_err());
}
