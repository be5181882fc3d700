//! The plot object a drawing-context host drives frame by frame.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use meteoplot_core::{
    AspectType, Axis, ChartText, ColorBar, Extent3D, Graphic, GraphicHandle, GridLine, HAlign,
    MeteoPlotError, PlotOptions, Scene, Transform, VAlign, ZAxisOption,
};
use meteoplot_render::{
    clamp_distance, clamp_fov, draw_legend, draw_scene, AxesFrame, Camera, Canvas, FontLibrary,
    FrameStats, Painter, RebuildSignal, RenderResult, RenderState, RendererCache, TextContext, Viewport,
};

use crate::Result;

/// Hooks invoked by whatever owns the drawing context.
pub trait PlotLifecycle {
    /// Called once after the context is created.
    fn init(&mut self, canvas: &dyn Canvas);

    /// Called when the drawable area moves or changes size.
    fn reshape(&mut self, canvas: &mut dyn Canvas, x: i32, y: i32, width: u32, height: u32) -> Result<()>;

    /// Draws one frame.
    fn display(&mut self, canvas: &mut dyn Canvas) -> Result<()>;

    /// Called before the context goes away. Every renderer is rebuilt on
    /// the next frame.
    fn dispose(&mut self, canvas: &dyn Canvas);
}

/// Map grid geometry standing in for the Cartesian x/y grid.
#[derive(Debug, Clone, Default)]
pub(crate) struct BaseGrid {
    /// Polylines on the base plane, in data space.
    pub lines: Vec<Vec<Vec3>>,
    pub x_ticks: (Vec<f64>, Vec<String>),
    pub y_ticks: (Vec<f64>, Vec<String>),
}

/// A 3D plot: scene, extents, camera, axes, legends and title.
pub struct Plot3D {
    scene: Scene,
    cache: RendererCache,
    rebuild: RebuildSignal,
    camera: Camera,
    options: PlotOptions,
    transform: Transform,
    draw_extent: Extent3D,
    axes_extent: Extent3D,
    graphics_extent: Option<Extent3D>,
    x_axis: Axis,
    y_axis: Axis,
    z_axis: Axis,
    z_axes: Vec<ZAxisOption>,
    legends: Vec<ColorBar>,
    title: Option<ChartText>,
    text: TextContext,
    attached: bool,
    frames: u64,
    last_stats: FrameStats,
}

impl Default for Plot3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Plot3D {
    /// Creates an empty plot over the default -1..1 cube.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PlotOptions::default())
    }

    /// Creates an empty plot with the given options.
    #[must_use]
    pub fn with_options(options: PlotOptions) -> Self {
        let extent = Extent3D::default();
        let mut transform = Transform::new(extent, options.aspect);
        transform.set_z_scale(f64::from(options.z_scale));
        let mut plot = Self {
            scene: Scene::new(),
            cache: RendererCache::new(),
            rebuild: RebuildSignal::default(),
            camera: Camera::new(),
            text: TextContext::new(Arc::new(FontLibrary::new()), options.dpi_scale),
            options,
            transform,
            draw_extent: extent,
            axes_extent: extent,
            graphics_extent: None,
            x_axis: Axis::new(extent.min_x, extent.max_x),
            y_axis: Axis::new(extent.min_y, extent.max_y),
            z_axis: Axis::new(extent.min_z, extent.max_z),
            z_axes: Vec::new(),
            legends: Vec::new(),
            title: None,
            attached: false,
            frames: 0,
            last_stats: FrameStats::default(),
        };
        plot.sync_camera();
        plot
    }

    // ---- scene ----

    /// Adds a graphic and, unless the extent is fixed, fits both extents
    /// to the scene.
    pub fn add_graphic(&mut self, graphic: Graphic) -> GraphicHandle {
        let handle = self.scene.add(graphic);
        self.refit();
        handle
    }

    /// Inserts a graphic at a draw-order position.
    pub fn insert_graphic(&mut self, position: usize, graphic: Graphic) -> GraphicHandle {
        let handle = self.scene.insert(position, graphic);
        self.refit();
        handle
    }

    /// Removes a graphic and drops its renderer.
    pub fn remove_graphic(&mut self, handle: GraphicHandle) -> Option<Graphic> {
        let removed = self.scene.remove(handle)?;
        self.cache.evict(handle);
        self.graphics_extent = self.scene.extent().map(|e| e.as_non_zero());
        Some(removed)
    }

    /// Removes every graphic and renderer.
    pub fn remove_all_graphics(&mut self) {
        self.scene.clear();
        self.cache.clear();
        self.graphics_extent = None;
    }

    /// Edits a graphic in place; its renderer is rebuilt on the next frame.
    pub fn update_graphic<R>(&mut self, handle: GraphicHandle, f: impl FnOnce(&mut Graphic) -> R) -> Result<R> {
        let out = self
            .scene
            .update(handle, f)
            .ok_or(MeteoPlotError::GraphicNotFound(handle))?;
        self.graphics_extent = self.scene.extent().map(|e| e.as_non_zero());
        Ok(out)
    }

    #[must_use]
    pub fn graphic(&self, handle: GraphicHandle) -> Option<&Graphic> {
        self.scene.get(handle)
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn renderer_cache(&self) -> &RendererCache {
        &self.cache
    }

    /// Union of the graphics' extents, widened where flat.
    #[must_use]
    pub fn graphics_extent(&self) -> Option<Extent3D> {
        self.graphics_extent
    }

    fn refit(&mut self) {
        self.graphics_extent = self.scene.extent().map(|e| e.as_non_zero());
        if self.options.fix_extent {
            return;
        }
        if let Some(extent) = self.graphics_extent {
            self.set_axes_extent(extent);
            self.set_draw_extent(extent);
        }
    }

    // ---- extents ----

    /// Sets the region mapped onto the drawing cube. The axes follow unless
    /// axes zoom is on.
    pub fn set_draw_extent(&mut self, extent: Extent3D) {
        self.draw_extent = extent;
        self.transform.set_extent(extent);
        if !self.options.axes_zoom {
            self.set_axes_extent(extent);
        }
        self.sync_camera();
    }

    #[must_use]
    pub fn draw_extent(&self) -> Extent3D {
        self.draw_extent
    }

    /// Sets the box, grid and tick range.
    pub fn set_axes_extent(&mut self, extent: Extent3D) {
        self.axes_extent = extent;
        self.x_axis.set_min_max(extent.min_x, extent.max_x);
        self.y_axis.set_min_max(extent.min_y, extent.max_y);
        self.z_axis.set_min_max(extent.min_z, extent.max_z);
    }

    #[must_use]
    pub fn axes_extent(&self) -> Extent3D {
        self.axes_extent
    }

    /// Decouples the axes from the draw extent. Clipping is turned off
    /// while zoomed.
    pub fn set_axes_zoom(&mut self, zoom: bool) {
        self.options.axes_zoom = zoom;
        if zoom {
            self.options.clip_plane = false;
        }
    }

    #[must_use]
    pub fn axes_zoom(&self) -> bool {
        self.options.axes_zoom
    }

    /// Keeps both extents when graphics are added.
    pub fn set_fix_extent(&mut self, fix: bool) {
        self.options.fix_extent = fix;
    }

    #[must_use]
    pub fn fix_extent(&self) -> bool {
        self.options.fix_extent
    }

    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    // ---- camera and options ----

    #[must_use]
    pub fn options(&self) -> &PlotOptions {
        &self.options
    }

    /// Replaces every option after validating them.
    pub fn set_options(&mut self, options: PlotOptions) -> Result<()> {
        options.validate()?;
        self.options = options;
        self.transform.set_aspect(self.options.aspect);
        self.transform.set_z_scale(f64::from(self.options.z_scale));
        self.text.set_dpi_scale(self.options.dpi_scale);
        if self.options.axes_zoom {
            self.options.clip_plane = false;
        }
        self.sync_camera();
        Ok(())
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_angle_x(&mut self, degrees: f32) {
        self.options.angle_x = degrees;
        self.sync_camera();
    }

    pub fn set_angle_y(&mut self, degrees: f32) {
        self.options.angle_y = degrees;
        self.sync_camera();
    }

    pub fn set_head(&mut self, degrees: f32) {
        self.options.head = degrees;
        self.sync_camera();
    }

    pub fn set_pitch(&mut self, degrees: f32) {
        self.options.pitch = degrees;
        self.sync_camera();
    }

    /// Back to the default view angles.
    pub fn reset_angles(&mut self) {
        self.options.reset_angles();
        self.sync_camera();
    }

    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.options.orthographic = orthographic;
        self.sync_camera();
    }

    /// Perspective field of view, clamped to `[1, 179]` degrees.
    pub fn set_fov(&mut self, degrees: f32) {
        self.options.fov = clamp_fov(degrees);
        self.sync_camera();
    }

    /// Eye distance, kept positive.
    pub fn set_distance(&mut self, distance: f32) {
        self.options.distance = clamp_distance(distance);
        self.sync_camera();
    }

    pub fn set_aspect(&mut self, aspect: AspectType) {
        self.options.aspect = aspect;
        self.transform.set_aspect(aspect);
        self.sync_camera();
    }

    pub fn set_z_scale(&mut self, z_scale: f32) {
        self.options.z_scale = z_scale;
        self.transform.set_z_scale(f64::from(z_scale));
        self.sync_camera();
    }

    pub fn set_clip_plane(&mut self, clip: bool) {
        self.options.clip_plane = clip;
    }

    pub fn set_dpi_scale(&mut self, dpi_scale: f32) {
        self.options.dpi_scale = dpi_scale;
        self.text.set_dpi_scale(dpi_scale);
    }

    /// Mutable access to toggles that need no derived state (box, base,
    /// grid style, lighting, colors).
    pub fn options_mut(&mut self) -> &mut PlotOptions {
        &mut self.options
    }

    fn sync_camera(&mut self) {
        let viewport = self.camera.viewport();
        self.camera.apply_options(&self.options);
        self.camera.set_viewport(viewport);
        self.camera.update_model_view(&self.transform);
    }

    // ---- axes, legends, title ----

    #[must_use]
    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }

    #[must_use]
    pub fn y_axis(&self) -> &Axis {
        &self.y_axis
    }

    #[must_use]
    pub fn z_axis(&self) -> &Axis {
        &self.z_axis
    }

    pub fn x_axis_mut(&mut self) -> &mut Axis {
        &mut self.x_axis
    }

    pub fn y_axis_mut(&mut self) -> &mut Axis {
        &mut self.y_axis
    }

    pub fn z_axis_mut(&mut self) -> &mut Axis {
        &mut self.z_axis
    }

    /// Adds a vertical axis at a data location, ticks on the left or right.
    pub fn add_z_axis(&mut self, x: f64, y: f64, left: bool) {
        self.z_axes.push(ZAxisOption::new(x, y, left));
    }

    #[must_use]
    pub fn z_axes(&self) -> &[ZAxisOption] {
        &self.z_axes
    }

    /// Adds a legend. Only the first one is drawn.
    pub fn add_legend(&mut self, legend: ColorBar) {
        self.legends.push(legend);
    }

    #[must_use]
    pub fn legends(&self) -> &[ColorBar] {
        &self.legends
    }

    pub fn legends_mut(&mut self) -> &mut Vec<ColorBar> {
        &mut self.legends
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(ChartText::new(title));
    }

    pub fn set_title_text(&mut self, title: Option<ChartText>) {
        self.title = title;
    }

    #[must_use]
    pub fn title(&self) -> Option<&ChartText> {
        self.title.as_ref()
    }

    /// Fonts used for every label of the plot.
    pub fn set_font_library(&mut self, library: Arc<FontLibrary>) {
        self.text.set_library(library);
    }

    // ---- queries ----

    /// Window coordinates (origin bottom-left) of a data point.
    #[must_use]
    pub fn project(&self, p: Vec3) -> Vec3 {
        self.camera.project(p)
    }

    /// Data point under a pixel (origin top-left), using the depth of the
    /// last frame.
    ///
    /// Returns zero without a context or when the canvas keeps no depth.
    #[must_use]
    pub fn unproject(&self, canvas: Option<&dyn Canvas>, x: f32, y: f32) -> Vec3 {
        let Some(canvas) = canvas.filter(|_| self.attached) else {
            return Vec3::ZERO;
        };
        #[allow(clippy::cast_precision_loss)]
        let height = self.camera.viewport().height as f32;
        let wy = height - y;
        #[allow(clippy::cast_sign_loss)]
        let depth = canvas.read_depth(x.max(0.0) as u32, wy.max(0.0) as u32);
        depth
            .and_then(|d| self.camera.unproject(x, wy, d))
            .unwrap_or(Vec3::ZERO)
    }

    /// Frames completed so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Graphics drawn, skipped and failed in the last frame.
    #[must_use]
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    #[must_use]
    pub fn rebuild_pending(&self) -> bool {
        self.rebuild.is_pending()
    }

    // ---- frame ----

    pub(crate) fn display_with(&mut self, canvas: &mut dyn Canvas, base_grid: Option<&BaseGrid>) -> Result<()> {
        let (width, height) = canvas.size();
        let viewport = self.camera.viewport();
        if (viewport.width, viewport.height) != (width, height) {
            self.camera.set_viewport(Viewport::new(viewport.x, viewport.y, width, height));
        }
        self.sync_camera();
        self.text.set_dpi_scale(self.options.dpi_scale);

        canvas.begin_frame(self.options.background);
        let painted = self.paint(canvas, base_grid);
        let ended = canvas.end_frame();
        self.text.release();
        let stats = painted?;
        ended?;

        if stats.failed > 0 {
            log::debug!("frame {} skipped {} failing graphics", self.frames, stats.failed);
        }
        self.last_stats = stats;
        self.rebuild.consume();
        self.frames += 1;
        Ok(())
    }

    fn paint(&mut self, canvas: &mut dyn Canvas, base_grid: Option<&BaseGrid>) -> RenderResult<FrameStats> {
        let token = self.rebuild.token();
        let options = &self.options;
        let mut painter = Painter::new(canvas, &self.camera);
        painter.set_dpi_scale(options.dpi_scale);

        let (x_axis, y_axis) = match base_grid {
            Some(grid) => (with_ticks(&self.x_axis, &grid.x_ticks), with_ticks(&self.y_axis, &grid.y_ticks)),
            None => (self.x_axis.clone(), self.y_axis.clone()),
        };
        let map_grid_style;
        let mut frame = AxesFrame::new(
            self.axes_extent,
            &self.transform,
            options,
            [&x_axis, &y_axis, &self.z_axis],
            options.angle_x,
            options.angle_y,
        );
        if base_grid.is_some() {
            map_grid_style = GridLine {
                draw_x: false,
                draw_y: false,
                ..options.grid_line.clone()
            };
            frame.grid = &map_grid_style;
        }

        if options.draw_base {
            frame.draw_base(&mut painter);
        }
        if options.boxed {
            frame.draw_box(&mut painter);
        }
        if options.clip_plane {
            painter.clip_mut().enable(&self.axes_extent);
        }
        frame.draw_grid_lines(&mut painter, &mut self.text);
        if let Some(grid) = base_grid {
            let style = &options.grid_line;
            if style.draw_x || style.draw_y {
                for line in &grid.lines {
                    painter.polyline(line, style.color, style.width);
                }
            }
        }

        let stats = {
            let mut state = RenderState {
                transform: self.transform,
                lighting: &options.lighting,
                orthographic: options.orthographic,
                model_view: self.camera.model_view(),
                rotation: self.camera.rotation(),
                projection: self.camera.projection(),
                draw_extent: self.axes_extent,
                clip: options.clip_plane,
                dpi_scale: options.dpi_scale,
                len_scale: options.len_scale,
                text: &mut self.text,
            };
            draw_scene(&self.scene, &mut self.cache, token, &mut painter, &mut state)
        };
        painter.clip_mut().disable();

        if options.draw_bounding_box {
            frame.draw_bounding_box(&mut painter);
        }
        frame.draw_axes(&mut painter, &mut self.text)?;
        for option in &self.z_axes {
            frame.draw_z_axis_option(&mut painter, &mut self.text, option)?;
        }

        if let Some(legend) = self.legends.first() {
            draw_legend(
                &mut painter,
                &mut self.text,
                legend,
                options.len_scale,
                options.tick_space * options.dpi_scale,
            )?;
        }
        if let Some(title) = &self.title {
            let top = Vec2::new(0.5 * painter.viewport().x, painter.viewport().y);
            self.text
                .draw(&mut painter, title, top, HAlign::Center, VAlign::Top, 0.0, Vec2::ZERO)?;
        }
        Ok(stats)
    }
}

/// Copy of `axis` ticking at the given values.
fn with_ticks(axis: &Axis, ticks: &(Vec<f64>, Vec<String>)) -> Axis {
    let mut axis = axis.clone();
    axis.set_ticks(ticks.0.clone(), ticks.1.clone());
    axis
}

impl PlotLifecycle for Plot3D {
    fn init(&mut self, canvas: &dyn Canvas) {
        let (width, height) = canvas.size();
        self.camera.set_viewport(Viewport::new(0, 0, width, height));
        self.attached = true;
        log::info!("plot attached to a {width}x{height} canvas");
    }

    fn reshape(&mut self, canvas: &mut dyn Canvas, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        let (width, height) = (width.max(1), height.max(1));
        canvas.resize(width, height)?;
        self.camera.set_viewport(Viewport::new(x, y, width, height));
        self.rebuild.request();
        log::debug!("reshaped to {width}x{height} at ({x}, {y})");
        Ok(())
    }

    fn display(&mut self, canvas: &mut dyn Canvas) -> Result<()> {
        self.display_with(canvas, None)
    }

    fn dispose(&mut self, _canvas: &dyn Canvas) {
        self.rebuild.request();
        self.attached = false;
        log::debug!("plot detached after {} frames", self.frames);
    }
}
