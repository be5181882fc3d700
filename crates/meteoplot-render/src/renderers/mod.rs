//! Per-kind graphic renderers and the cache that keeps them across frames.
//!
//! Each [`GraphicKind`] maps to one [`GraphicRenderer`] through [`RENDERERS`].
//! A renderer turns a graphic into draw-ready vertex data in
//! [`GraphicRenderer::rebuild`], which runs only when the graphic's geometry
//! version changes or a full rebuild is signalled, and replays that data
//! through the [`Painter`] every frame.

mod batch;
mod composite;
mod image;
mod line;
mod mesh;
mod particle;
mod point;
mod polygon;
mod solid;
mod text;
mod volume;

pub use batch::BatchRenderer;
pub use composite::CompositeRenderer;
pub use image::{ImageRenderer, TextureRenderer};
pub use line::LineRenderer;
pub use mesh::MeshRenderer;
pub use particle::ParticleRenderer;
pub use point::PointRenderer;
pub use polygon::PolygonRenderer;
pub use solid::SolidRenderer;
pub use text::LabelRenderer;
pub use volume::VolumeRenderer;

use glam::{Mat3, Mat4, Vec3, Vec4};
use meteoplot_core::{Extent3D, Graphic, GraphicHandle, GraphicKind, Lighting, Scene, Transform};

use crate::error::RenderResult;
use crate::painter::Painter;
use crate::text::TextContext;

/// Everything a renderer may read while building or drawing.
pub struct RenderState<'a> {
    pub transform: Transform,
    pub lighting: &'a Lighting,
    pub orthographic: bool,
    pub model_view: Mat4,
    /// Model-view without the data scaling and translation.
    pub rotation: Mat4,
    pub projection: Mat4,
    /// Data-space region being drawn.
    pub draw_extent: Extent3D,
    /// Whether drawing is clipped to `draw_extent`.
    pub clip: bool,
    pub dpi_scale: f32,
    pub len_scale: f32,
    pub text: &'a mut TextContext,
}

impl RenderState<'_> {
    /// Matrix taking data-space normals to eye space.
    #[must_use]
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.model_view).inverse().transpose()
    }

    /// Shades a data-space vertex with the scene light.
    #[must_use]
    pub fn shade(&self, color: Vec4, normal: Vec3, position: Vec3) -> Vec4 {
        let eye = self.model_view.transform_point3(position);
        self.lighting.shade(color, self.normal_matrix() * normal, eye)
    }

    /// Eye-space depth of a data point; more negative is farther.
    #[must_use]
    pub fn eye_depth(&self, p: Vec3) -> f32 {
        self.model_view.transform_point3(p).z
    }

    /// Data-space direction the camera looks along.
    #[must_use]
    pub fn view_direction(&self) -> Vec3 {
        self.model_view
            .inverse()
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or_zero()
    }
}

/// Turns one kind of graphic into draw calls.
pub trait GraphicRenderer {
    fn kind(&self) -> GraphicKind;

    /// Rebuilds vertex data from the graphic's current geometry.
    fn rebuild(&mut self, graphic: &Graphic, state: &RenderState<'_>) -> RenderResult<()>;

    /// Draws the last built data with the painter's current matrices.
    fn draw(&mut self, painter: &mut Painter<'_>, state: &mut RenderState<'_>) -> RenderResult<()>;

    /// Whether the clip planes apply to this renderer.
    fn uses_clip(&self) -> bool {
        true
    }

    /// Bounds of the built geometry, used to skip graphics outside the
    /// draw extent.
    fn extent(&self) -> Option<Extent3D> {
        None
    }
}

pub type RendererFactory = fn() -> Box<dyn GraphicRenderer>;

/// Renderer constructor per graphic kind.
pub static RENDERERS: &[(GraphicKind, RendererFactory)] = &[
    (GraphicKind::Points, || Box::new(PointRenderer::default())),
    (GraphicKind::Lines, || Box::new(LineRenderer::default())),
    (GraphicKind::Polygons, || Box::new(PolygonRenderer::default())),
    (GraphicKind::QuadBatch, || Box::new(BatchRenderer::quads())),
    (GraphicKind::TriangleBatch, || Box::new(BatchRenderer::triangles())),
    (GraphicKind::Mesh, || Box::new(MeshRenderer::default())),
    (GraphicKind::Solids, || Box::new(SolidRenderer::default())),
    (GraphicKind::Particles, || Box::new(ParticleRenderer::default())),
    (GraphicKind::Volume, || Box::new(VolumeRenderer::default())),
    (GraphicKind::Image, || Box::new(ImageRenderer::default())),
    (GraphicKind::Texture, || Box::new(TextureRenderer::default())),
    (GraphicKind::Text, || Box::new(LabelRenderer::default())),
    (GraphicKind::Composite, || Box::new(CompositeRenderer::default())),
];

/// A fresh renderer for `kind`, `None` when nothing draws that kind.
#[must_use]
pub fn create_renderer(kind: GraphicKind) -> Option<Box<dyn GraphicRenderer>> {
    RENDERERS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, factory)| factory())
}

/// Draws with the clip planes suspended for renderers that ignore them.
pub(crate) fn draw_renderer(
    renderer: &mut dyn GraphicRenderer,
    painter: &mut Painter<'_>,
    state: &mut RenderState<'_>,
) -> RenderResult<()> {
    if state.clip && renderer.uses_clip() {
        if let Some(extent) = renderer.extent() {
            if !extent.intersects(&state.draw_extent) {
                return Ok(());
            }
        }
    }
    if renderer.uses_clip() {
        return renderer.draw(painter, state);
    }
    let was = painter.clip_mut().set_enabled(false);
    let result = renderer.draw(painter, state);
    painter.clip_mut().set_enabled(was);
    result
}

/// Flags for one frame of drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameToken {
    /// Rebuild every renderer regardless of geometry versions.
    pub rebuild_all: bool,
}

/// Request to rebuild every renderer, held until a frame completes.
///
/// Raised when something every renderer depends on changes, such as the
/// data-to-cube transform or the lighting.
#[derive(Debug, Default)]
pub struct RebuildSignal {
    pending: bool,
}

impl RebuildSignal {
    pub fn request(&mut self) {
        self.pending = true;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Token for the next frame. The request stays pending until
    /// [`RebuildSignal::consume`].
    #[must_use]
    pub fn token(&self) -> FrameToken {
        FrameToken {
            rebuild_all: self.pending,
        }
    }

    /// Clears the request once a frame has completed.
    pub fn consume(&mut self) {
        self.pending = false;
    }
}

struct CacheSlot {
    generation: u32,
    kind: GraphicKind,
    version: u64,
    builds: u64,
    instance: u64,
    renderer: Box<dyn GraphicRenderer>,
}

/// Renderers keyed by graphic handle.
///
/// A slot survives as long as its handle is live and the graphic keeps its
/// kind. A handle of a new generation or a change of kind replaces it.
#[derive(Default)]
pub struct RendererCache {
    slots: Vec<Option<CacheSlot>>,
    next_instance: u64,
}

impl std::fmt::Debug for RendererCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererCache")
            .field("live", &self.len())
            .field("next_instance", &self.next_instance)
            .finish()
    }
}

impl RendererCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached renderers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, handle: GraphicHandle) -> Option<&CacheSlot> {
        self.slots
            .get(handle.index())?
            .as_ref()
            .filter(|s| s.generation == handle.generation())
    }

    #[must_use]
    pub fn contains(&self, handle: GraphicHandle) -> bool {
        self.slot(handle).is_some()
    }

    /// Identity of the renderer serving `handle`; changes when it is replaced.
    #[must_use]
    pub fn instance_id(&self, handle: GraphicHandle) -> Option<u64> {
        self.slot(handle).map(|s| s.instance)
    }

    /// How many times the renderer for `handle` has rebuilt its data.
    #[must_use]
    pub fn build_count(&self, handle: GraphicHandle) -> Option<u64> {
        self.slot(handle).map(|s| s.builds)
    }

    /// Drops the renderer for `handle`. Returns whether one was cached.
    pub fn evict(&mut self, handle: GraphicHandle) -> bool {
        match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.as_ref().is_some_and(|s| s.generation == handle.generation()) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// The slot for `handle`, created when missing or stale.
    fn entry(&mut self, handle: GraphicHandle, kind: GraphicKind) -> Option<&mut CacheSlot> {
        let index = handle.index();
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        let stale = !self.slots[index]
            .as_ref()
            .is_some_and(|s| s.generation == handle.generation() && s.kind == kind);
        if stale {
            let Some(renderer) = create_renderer(kind) else {
                self.slots[index] = None;
                return None;
            };
            log::trace!("creating {kind:?} renderer for graphic {handle}");
            self.next_instance += 1;
            self.slots[index] = Some(CacheSlot {
                generation: handle.generation(),
                kind,
                version: 0,
                builds: 0,
                instance: self.next_instance,
                renderer,
            });
        }
        self.slots[index].as_mut()
    }
}

/// Draws one graphic through its cached renderer.
///
/// Returns `Ok(false)` when nothing was drawn (hidden, empty, or no
/// renderer for the kind).
///
/// # Errors
/// Propagates rebuild and draw failures of the graphic's renderer.
pub fn draw_graphic(
    cache: &mut RendererCache,
    handle: GraphicHandle,
    graphic: &Graphic,
    version: u64,
    token: FrameToken,
    painter: &mut Painter<'_>,
    state: &mut RenderState<'_>,
) -> RenderResult<bool> {
    if !graphic.visible {
        return Ok(false);
    }
    let kind = graphic.kind();
    if kind == GraphicKind::Empty {
        return Ok(false);
    }
    let Some(slot) = cache.entry(handle, kind) else {
        log::warn!("no renderer for {kind:?}, skipping graphic {handle}");
        return Ok(false);
    };
    if slot.builds == 0 || slot.version != version || token.rebuild_all {
        slot.renderer.rebuild(graphic, state)?;
        slot.version = version;
        slot.builds += 1;
    }
    draw_renderer(slot.renderer.as_mut(), painter, state)?;
    Ok(true)
}

/// Per-frame outcome of [`draw_scene`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Draws every graphic of the scene in order.
///
/// A graphic that fails to build or draw is logged and skipped; the rest
/// of the frame continues.
pub fn draw_scene(
    scene: &Scene,
    cache: &mut RendererCache,
    token: FrameToken,
    painter: &mut Painter<'_>,
    state: &mut RenderState<'_>,
) -> FrameStats {
    let mut stats = FrameStats::default();
    for (handle, graphic) in scene.iter() {
        let version = scene.version(handle).unwrap_or_default();
        match draw_graphic(cache, handle, graphic, version, token, painter, state) {
            Ok(true) => stats.drawn += 1,
            Ok(false) => stats.skipped += 1,
            Err(e) => {
                log::warn!("failed to draw graphic {handle}: {e}");
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Newell normal of a ring, zero when degenerate.
#[must_use]
pub(crate) fn ring_normal(ring: &[Vec3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        n += Vec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        );
    }
    n.normalize_or_zero()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::camera::{Camera, Viewport};
    use crate::raster::SoftwareCanvas;
    use std::sync::Arc;

    use crate::text::FontLibrary;

    /// A 40x40 camera looking down the z axis at the default cube.
    pub fn flat_camera(size: u32) -> Camera {
        let mut camera = Camera::new();
        camera.set_viewport(Viewport::new(0, 0, size, size));
        camera.set_angle_x(0.0);
        camera.set_angle_y(0.0);
        camera.update_model_view(&Transform::default());
        camera
    }

    pub fn state<'a>(camera: &Camera, lighting: &'a Lighting, text: &'a mut TextContext) -> RenderState<'a> {
        RenderState {
            transform: Transform::default(),
            lighting,
            orthographic: true,
            model_view: camera.model_view(),
            rotation: camera.rotation(),
            projection: camera.projection(),
            draw_extent: Extent3D::default(),
            clip: false,
            dpi_scale: 1.0,
            len_scale: 1.0,
            text,
        }
    }

    pub fn text_context() -> TextContext {
        TextContext::new(Arc::new(FontLibrary::new()), 1.0)
    }

    /// Pixels that differ from the cleared background.
    pub fn painted(canvas: &mut SoftwareCanvas) -> usize {
        use crate::canvas::Canvas;
        canvas
            .snapshot()
            .map(|img| img.pixels().filter(|p| p.0 != [255, 255, 255, 255]).count())
            .unwrap_or_default()
    }

    /// Builds and draws one graphic on a fresh white canvas.
    pub fn render_one(graphic: &Graphic, size: u32) -> SoftwareCanvas {
        use crate::canvas::Canvas;
        let camera = flat_camera(size);
        let lighting = Lighting::default();
        let mut text = text_context();
        let mut canvas = SoftwareCanvas::new(size, size);
        canvas.begin_frame(Vec4::ONE);
        {
            let mut state = state(&camera, &lighting, &mut text);
            let mut renderer = create_renderer(graphic.kind()).unwrap();
            renderer.rebuild(graphic, &state).unwrap();
            let mut painter = Painter::new(&mut canvas, &camera);
            draw_renderer(renderer.as_mut(), &mut painter, &mut state).unwrap();
        }
        canvas.end_frame().unwrap();
        canvas
    }
}
