//! Camera and projection management.
//!
//! The camera holds the rotation angles, the projection mode and the viewport.
//! The projection matrix is rebuilt lazily: every setter that affects it marks
//! it stale and the next [`Camera::projection`] call rebuilds it. The
//! model-view combines the view with the data transform last passed to
//! [`Camera::update_model_view`]; the angle setters rebuild it right away.
//!
//! Window coordinates have their origin at the bottom-left corner of the
//! viewport, and depth runs from 0 (near) to 1 (far).

use std::cell::Cell;

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use meteoplot_core::{AspectType, PlotOptions, Transform};

/// Half-height of the orthographic view volume in canonical units.
pub const ORTHO_HALF_HEIGHT: f32 = 2.0;

const PERSPECTIVE_NEAR: f32 = 0.1;
const PERSPECTIVE_FAR: f32 = 1000.0;
/// Reference field of view for the distance compensation.
const REFERENCE_FOV: f32 = 45.0;

/// Field of view clamped to `[1, 179]` degrees; NaN gives the reference angle.
#[must_use]
pub fn clamp_fov(degrees: f32) -> f32 {
    if degrees.is_nan() {
        REFERENCE_FOV
    } else {
        degrees.clamp(1.0, 179.0)
    }
}

/// Eye distance kept positive and finite.
#[must_use]
pub fn clamp_distance(distance: f32) -> f32 {
    if distance.is_nan() {
        5.0
    } else {
        distance.clamp(f32::EPSILON, f32::MAX)
    }
}

/// Drawing area inside the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Width over height.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// A 3D camera for viewing the plot.
#[derive(Debug, Clone)]
pub struct Camera {
    angle_x: f32,
    angle_y: f32,
    head: f32,
    pitch: f32,
    orthographic: bool,
    fov: f32,
    distance: f32,
    aspect: AspectType,
    viewport: Viewport,
    projection: Cell<Option<Mat4>>,
    view: Mat4,
    rotation: Mat4,
    model_view: Mat4,
    transform: Transform,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Creates a camera with the default plot angles.
    #[must_use]
    pub fn new() -> Self {
        let mut camera = Self {
            angle_x: -45.0,
            angle_y: 45.0,
            head: 0.0,
            pitch: 0.0,
            orthographic: true,
            fov: 45.0,
            distance: 5.0,
            aspect: AspectType::Auto,
            viewport: Viewport::default(),
            projection: Cell::new(None),
            view: Mat4::IDENTITY,
            rotation: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            transform: Transform::default(),
        };
        camera.refresh_model_view();
        camera
    }

    /// Copies camera-related settings from plot options.
    pub fn apply_options(&mut self, options: &PlotOptions) {
        self.angle_x = options.angle_x;
        self.angle_y = options.angle_y;
        self.head = options.head;
        self.pitch = options.pitch;
        self.orthographic = options.orthographic;
        self.fov = clamp_fov(options.fov);
        self.distance = clamp_distance(options.distance);
        self.aspect = options.aspect;
        self.invalidate();
        self.refresh_model_view();
    }

    fn invalidate(&self) {
        self.projection.set(None);
    }

    #[must_use]
    pub fn angle_x(&self) -> f32 {
        self.angle_x
    }

    /// Rotation about z, as set.
    #[must_use]
    pub fn angle_y(&self) -> f32 {
        self.angle_y
    }

    /// Rotation about z folded into `[0, 360)`.
    #[must_use]
    pub fn angle_y_normalized(&self) -> f32 {
        self.angle_y.rem_euclid(360.0)
    }

    #[must_use]
    pub fn head(&self) -> f32 {
        self.head
    }

    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_angle_x(&mut self, degrees: f32) {
        self.angle_x = degrees;
        self.refresh_model_view();
    }

    pub fn set_angle_y(&mut self, degrees: f32) {
        self.angle_y = degrees;
        self.refresh_model_view();
    }

    pub fn set_head(&mut self, degrees: f32) {
        self.head = degrees;
        self.refresh_model_view();
    }

    pub fn set_pitch(&mut self, degrees: f32) {
        self.pitch = degrees;
        self.refresh_model_view();
    }

    #[must_use]
    pub fn is_orthographic(&self) -> bool {
        self.orthographic
    }

    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.orthographic = orthographic;
        self.invalidate();
    }

    /// Field of view in degrees.
    #[must_use]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Sets the field of view, clamped to `[1, 179]` degrees.
    pub fn set_fov(&mut self, degrees: f32) {
        self.fov = clamp_fov(degrees);
        self.invalidate();
    }

    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = clamp_distance(distance);
        self.invalidate();
    }

    #[must_use]
    pub fn aspect(&self) -> AspectType {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: AspectType) {
        self.aspect = aspect;
        self.invalidate();
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.invalidate();
    }

    /// Builds the projection matrix for a viewport size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build_projection(&self, width: u32, height: u32) -> Mat4 {
        let ratio = width.max(1) as f32 / height.max(1) as f32;
        if self.orthographic {
            let v = ORTHO_HALF_HEIGHT;
            let h = match self.aspect {
                AspectType::Equal => v * ratio,
                AspectType::Auto => v,
            };
            Mat4::orthographic_rh_gl(-h, h, -v, v, -self.distance, self.distance)
        } else {
            let r = match self.aspect {
                AspectType::Equal => ratio,
                AspectType::Auto => 1.0,
            };
            let perspective =
                Mat4::perspective_rh_gl(self.fov.to_radians(), r, PERSPECTIVE_NEAR, PERSPECTIVE_FAR);
            // Wider angles move the eye closer so objects keep their apparent size.
            let z = self.distance * REFERENCE_FOV / self.fov;
            perspective * Mat4::look_at_rh(Vec3::new(0.0, 0.0, z), Vec3::ZERO, Vec3::Y)
        }
    }

    /// Current projection, rebuilt if any projection input changed.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        if let Some(p) = self.projection.get() {
            return p;
        }
        let p = self.build_projection(self.viewport.width, self.viewport.height);
        self.projection.set(Some(p));
        p
    }

    /// Rebuilds the rotation from the angles and returns it.
    pub fn build_view(&mut self) -> Mat4 {
        let mut view = Mat4::from_rotation_x(self.angle_x.to_radians())
            * Mat4::from_rotation_z(self.angle_y.to_radians());
        if self.head != 0.0 {
            view *= Mat4::from_rotation_y(self.head.to_radians());
        }
        if self.pitch != 0.0 {
            view *= Mat4::from_rotation_x(self.pitch.to_radians());
        }
        self.view = view;
        self.rotation = view;
        view
    }

    /// Rebuilds the view and combines it with the data transform.
    pub fn update_model_view(&mut self, transform: &Transform) {
        self.transform = *transform;
        self.refresh_model_view();
    }

    fn refresh_model_view(&mut self) {
        let view = self.build_view();
        self.model_view = view * self.transform.model_matrix();
    }

    /// Replaces the model-view, e.g. with identity for overlays.
    pub fn set_model_view(&mut self, model_view: Mat4) {
        self.model_view = model_view;
    }

    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Rotation without scaling or translation.
    #[must_use]
    pub fn rotation(&self) -> Mat4 {
        self.rotation
    }

    #[must_use]
    pub fn model_view(&self) -> Mat4 {
        self.model_view
    }

    /// Projection times model-view.
    #[must_use]
    pub fn mvp(&self) -> Mat4 {
        self.projection() * self.model_view
    }

    /// Projects a data point to window coordinates.
    #[must_use]
    pub fn project(&self, p: Vec3) -> Vec3 {
        self.project_with(self.model_view, p)
    }

    /// Projects through an explicit model-view.
    #[must_use]
    pub fn project_with(&self, model_view: Mat4, p: Vec3) -> Vec3 {
        let clip = self.projection() * model_view * p.extend(1.0);
        let w = if clip.w.abs() < f32::EPSILON { f32::EPSILON } else { clip.w };
        self.ndc_to_window(clip.xyz() / w)
    }

    fn ndc_to_window(&self, ndc: Vec3) -> Vec3 {
        let size = self.viewport.size();
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * size.x,
            (ndc.y + 1.0) * 0.5 * size.y,
            (ndc.z + 1.0) * 0.5,
        )
    }

    /// Maps window coordinates plus a depth sample back to data space.
    ///
    /// Returns `None` when the combined matrix is singular.
    #[must_use]
    pub fn unproject(&self, x: f32, y: f32, depth: f32) -> Option<Vec3> {
        let m = self.mvp();
        if m.determinant().abs() < f32::MIN_POSITIVE {
            return None;
        }
        let size = self.viewport.size();
        let ndc = Vec3::new(2.0 * x / size.x - 1.0, 2.0 * y / size.y - 1.0, 2.0 * depth - 1.0);
        let p = m.inverse() * ndc.extend(1.0);
        if p.w.abs() < f32::EPSILON {
            return None;
        }
        Some(p.xyz() / p.w)
    }

    /// Screen distance in pixels between two projected data points.
    #[must_use]
    pub fn screen_length(&self, a: Vec3, b: Vec3) -> f32 {
        (self.project(b).truncate() - self.project(a).truncate()).length()
    }

    /// Screen direction from `a` to `b` in degrees, counterclockwise from +x.
    #[must_use]
    pub fn screen_angle(&self, a: Vec3, b: Vec3) -> f32 {
        let d = self.project(b).truncate() - self.project(a).truncate();
        d.y.atan2(d.x).to_degrees()
    }
}
