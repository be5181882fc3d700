//! Axes box, grid lines, ticks and axis labels.
//!
//! Which box edges carry the axes depends only on the quadrant of the
//! camera's z rotation. [`Quadrant::layout`] holds that choice as a table so
//! every drawing routine reads the same sides.
//!
//! All geometry is in data space under the plot's model-view, except for the
//! extra z axes of [`ZAxisOption`], whose ticks are laid out in eye space.

use glam::{Mat4, Vec2, Vec3};
use meteoplot_core::{
    Axis, Axis3, ChartText, Extent3D, GridLine, HAlign, PlotOptions, Transform, VAlign, ZAxisOption,
};

use crate::canvas::DepthMode;
use crate::error::RenderResult;
use crate::painter::Painter;
use crate::text::{ScreenBox, TextContext};

/// Text whose height sets the tick label spacing.
const GAP_PROBE: &str = "Text";
/// Below this x rotation the plot is seen from underneath.
const FLIP_ANGLE_X: f32 = -120.0;

/// End of an extent axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Min,
    Max,
}

impl Side {
    #[must_use]
    pub fn pick(self, min: f32, max: f32) -> f32 {
        match self {
            Side::Min => min,
            Side::Max => max,
        }
    }

    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Side::Min => Side::Max,
            Side::Max => Side::Min,
        }
    }
}

/// Quarter turn of the z rotation: [0, 90), [90, 180), [180, 270), [270, 360).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    First,
    Second,
    Third,
    Fourth,
}

impl Quadrant {
    /// Quadrant of an angle in degrees, any range.
    #[must_use]
    pub fn from_angle(angle_y: f32) -> Self {
        let a = angle_y.rem_euclid(360.0);
        if a < 90.0 {
            Quadrant::First
        } else if a < 180.0 {
            Quadrant::Second
        } else if a < 270.0 {
            Quadrant::Third
        } else {
            Quadrant::Fourth
        }
    }

    #[must_use]
    pub fn layout(self) -> &'static BoxLayout {
        match self {
            Quadrant::First => &LAYOUTS[0],
            Quadrant::Second => &LAYOUTS[1],
            Quadrant::Third => &LAYOUTS[2],
            Quadrant::Fourth => &LAYOUTS[3],
        }
    }
}

/// Box sides used for one quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxLayout {
    /// y side the x axis runs along.
    pub x_axis_y: Side,
    /// x side the y axis runs along.
    pub y_axis_x: Side,
    /// Vertical edge of the z axis and the z grid start.
    pub z_corner: (Side, Side),
    /// x face of the back box wall.
    pub box_x_face: Side,
    /// y face of the back box wall.
    pub box_y_face: Side,
    pub bounding_x_face: Side,
    pub bounding_y_face: Side,
    pub x_tick_align: HAlign,
    pub y_tick_align: HAlign,
}

const LAYOUTS: [BoxLayout; 4] = [
    BoxLayout {
        x_axis_y: Side::Min,
        y_axis_x: Side::Min,
        z_corner: (Side::Min, Side::Max),
        box_x_face: Side::Max,
        box_y_face: Side::Max,
        bounding_x_face: Side::Min,
        bounding_y_face: Side::Min,
        x_tick_align: HAlign::Left,
        y_tick_align: HAlign::Right,
    },
    BoxLayout {
        x_axis_y: Side::Max,
        y_axis_x: Side::Min,
        z_corner: (Side::Max, Side::Max),
        box_x_face: Side::Max,
        box_y_face: Side::Min,
        bounding_x_face: Side::Min,
        bounding_y_face: Side::Max,
        x_tick_align: HAlign::Right,
        y_tick_align: HAlign::Left,
    },
    BoxLayout {
        x_axis_y: Side::Max,
        y_axis_x: Side::Max,
        z_corner: (Side::Max, Side::Min),
        box_x_face: Side::Min,
        box_y_face: Side::Min,
        bounding_x_face: Side::Max,
        bounding_y_face: Side::Max,
        x_tick_align: HAlign::Left,
        y_tick_align: HAlign::Right,
    },
    BoxLayout {
        x_axis_y: Side::Min,
        y_axis_x: Side::Max,
        z_corner: (Side::Min, Side::Min),
        box_x_face: Side::Min,
        box_y_face: Side::Max,
        bounding_x_face: Side::Max,
        bounding_y_face: Side::Min,
        x_tick_align: HAlign::Right,
        y_tick_align: HAlign::Left,
    },
];

/// Stride through `n` tick labels so that the drawn ones fit along
/// `screen_len` pixels at `label_height` pixels each. Always at least 1.
///
/// This is the smallest stride that fits, `ceil(n / fit)`. The older
/// `floor(n / fit) + 1` form gives the same value except when `fit` divides
/// `n`, where it skipped one more label than needed.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn label_skip(n: usize, screen_len: f32, label_height: f32) -> usize {
    let fit = if label_height > 0.0 && screen_len.is_finite() {
        (screen_len / label_height).floor().max(0.0) as usize
    } else {
        0
    };
    n.div_ceil(fit.max(1)).max(1)
}

/// Every `skip`-th tick with its label, filtered by value.
fn stepped_ticks<'a>(
    axis: &'a Axis,
    skip: usize,
    keep: impl Fn(f32) -> bool + 'a,
) -> impl Iterator<Item = (f32, &'a str)> + 'a {
    let labels = axis.tick_labels();
    axis.tick_values()
        .iter()
        .enumerate()
        .step_by(skip.max(1))
        .take_while(move |(i, _)| *i < labels.len())
        .map(|(i, v)| (i, *v as f32))
        .filter(move |(_, v)| keep(*v))
        .map(move |(i, v)| (v, labels[i].as_str()))
}

/// Vertex strip of one z grid line at height `v`, around the back corner.
#[must_use]
pub fn z_grid_strip(layout: &BoxLayout, min: Vec3, max: Vec3, v: f32) -> [Vec3; 3] {
    let (sx, sy) = layout.z_corner;
    let (x, y) = (sx.pick(min.x, max.x), sy.pick(min.y, max.y));
    let (x1, y1) = (sx.flip().pick(min.x, max.x), sy.flip().pick(min.y, max.y));
    let corner = if (x < x1) == (y > y1) {
        Vec3::new(x1, y, v)
    } else {
        Vec3::new(x, y1, v)
    };
    [Vec3::new(x, y, v), corner, Vec3::new(x1, y1, v)]
}

/// Label boxes drawn for one axis.
#[derive(Debug, Clone, Default)]
pub struct AxisLabelBoxes {
    pub ticks: Vec<ScreenBox>,
    pub label: Option<ScreenBox>,
}

impl AxisLabelBoxes {
    fn widest(&self) -> f32 {
        self.ticks.iter().fold(0.0, |w, b| w.max(b.width))
    }
}

/// Label boxes of the three axes.
#[derive(Debug, Clone, Default)]
pub struct AxesLabels {
    pub x: AxisLabelBoxes,
    pub y: AxisLabelBoxes,
    pub z: AxisLabelBoxes,
}

/// Everything the axes routines need for one frame.
#[derive(Debug, Clone, Copy)]
pub struct AxesFrame<'a> {
    pub extent: Extent3D,
    /// Center of the draw transform, in data space.
    pub center: Vec3,
    /// Data lengths of the draw transform's axes.
    pub lengths: Vec3,
    pub x_axis: &'a Axis,
    pub y_axis: &'a Axis,
    pub z_axis: &'a Axis,
    pub grid: &'a GridLine,
    pub angle_x: f32,
    pub angle_y: f32,
    pub boxed: bool,
    pub display_xy: bool,
    pub display_z: bool,
    /// Tick-to-label gap in pixels.
    pub tick_space: f32,
    pub len_scale: f32,
}

impl<'a> AxesFrame<'a> {
    #[must_use]
    pub fn new(
        extent: Extent3D,
        transform: &Transform,
        options: &'a PlotOptions,
        axes: [&'a Axis; 3],
        angle_x: f32,
        angle_y: f32,
    ) -> Self {
        let [x_axis, y_axis, z_axis] = axes;
        Self {
            extent,
            center: transform.center().as_vec3(),
            lengths: Vec3::new(
                transform.axis_length(Axis3::X) as f32,
                transform.axis_length(Axis3::Y) as f32,
                transform.axis_length(Axis3::Z) as f32,
            ),
            x_axis,
            y_axis,
            z_axis,
            grid: &options.grid_line,
            angle_x,
            angle_y: angle_y.rem_euclid(360.0),
            boxed: options.boxed,
            display_xy: options.display_xy,
            display_z: options.display_z,
            tick_space: options.tick_space * options.dpi_scale,
            len_scale: options.len_scale,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &'static BoxLayout {
        Quadrant::from_angle(self.angle_y).layout()
    }

    fn bounds(&self) -> (Vec3, Vec3) {
        (self.extent.min().as_vec3(), self.extent.max().as_vec3())
    }

    fn tick_valign(&self) -> VAlign {
        if self.angle_x > FLIP_ANGLE_X {
            VAlign::Top
        } else {
            VAlign::Bottom
        }
    }

    /// Outline of the bottom face.
    pub fn draw_base(&self, painter: &mut Painter<'_>) {
        let (min, max) = self.bounds();
        let z = min.z;
        let ring = [
            Vec3::new(min.x, max.y, z),
            Vec3::new(min.x, min.y, z),
            Vec3::new(max.x, min.y, z),
            Vec3::new(max.x, max.y, z),
            Vec3::new(min.x, max.y, z),
        ];
        painter.polyline(&ring, self.grid.color, self.grid.width);
    }

    /// The two back walls.
    pub fn draw_box(&self, painter: &mut Painter<'_>) {
        let layout = self.layout();
        self.draw_walls(painter, layout.box_x_face, layout.box_y_face);
    }

    /// The two front walls.
    pub fn draw_bounding_box(&self, painter: &mut Painter<'_>) {
        let layout = self.layout();
        self.draw_walls(painter, layout.bounding_x_face, layout.bounding_y_face);
    }

    fn draw_walls(&self, painter: &mut Painter<'_>, x_face: Side, y_face: Side) {
        let (min, max) = self.bounds();
        let x = x_face.pick(min.x, max.x);
        let y = y_face.pick(min.y, max.y);
        let x_wall = [
            Vec3::new(x, max.y, min.z),
            Vec3::new(x, min.y, min.z),
            Vec3::new(x, min.y, max.z),
            Vec3::new(x, max.y, max.z),
            Vec3::new(x, max.y, min.z),
        ];
        let y_wall = [
            Vec3::new(min.x, y, min.z),
            Vec3::new(max.x, y, min.z),
            Vec3::new(max.x, y, max.z),
            Vec3::new(min.x, y, max.z),
            Vec3::new(min.x, y, min.z),
        ];
        painter.polyline(&x_wall, self.grid.color, self.grid.width);
        painter.polyline(&y_wall, self.grid.color, self.grid.width);
    }

    /// Grid lines at strictly interior ticks.
    pub fn draw_grid_lines(&self, painter: &mut Painter<'_>, text: &mut TextContext) {
        if self.display_xy {
            self.draw_xy_grid(painter, text);
        }
        if self.display_z {
            self.draw_z_grid(painter, text);
        }
    }

    fn draw_xy_grid(&self, painter: &mut Painter<'_>, text: &mut TextContext) {
        let (min, max) = self.bounds();
        let layout = self.layout();
        let mut segments = Vec::new();
        let color = self.grid.color;
        let mut seg = |a: Vec3, b: Vec3| segments.push(((a, color), (b, color)));

        let y = layout.x_axis_y.pick(min.y, max.y);
        let y1 = layout.x_axis_y.flip().pick(min.y, max.y);
        let skip = self.skip(painter, text, self.x_axis, Vec3::new(min.x, y, min.z), Vec3::new(max.x, y, min.z));
        if self.grid.draw_x {
            for (v, _) in stepped_ticks(self.x_axis, skip, |v| v > min.x && v < max.x) {
                seg(Vec3::new(v, y, min.z), Vec3::new(v, y1, min.z));
                if self.display_z && self.boxed {
                    seg(Vec3::new(v, y1, min.z), Vec3::new(v, y1, max.z));
                }
            }
        }

        let x = layout.y_axis_x.pick(min.x, max.x);
        let x1 = layout.y_axis_x.flip().pick(min.x, max.x);
        let skip = self.skip(painter, text, self.y_axis, Vec3::new(x, min.y, min.z), Vec3::new(x, max.y, min.z));
        if self.grid.draw_y {
            for (v, _) in stepped_ticks(self.y_axis, skip, |v| v > min.y && v < max.y) {
                seg(Vec3::new(x, v, min.z), Vec3::new(x1, v, min.z));
                if self.display_z && self.boxed {
                    seg(Vec3::new(x1, v, min.z), Vec3::new(x1, v, max.z));
                }
            }
        }
        painter.segments(&segments, self.grid.width);
    }

    fn draw_z_grid(&self, painter: &mut Painter<'_>, text: &mut TextContext) {
        if !(self.grid.draw_z && self.boxed) {
            return;
        }
        let (min, max) = self.bounds();
        let layout = self.layout();
        let [start, _, _] = z_grid_strip(layout, min, max, min.z);
        let skip = self.skip(painter, text, self.z_axis, start, Vec3::new(start.x, start.y, max.z));
        for (v, _) in stepped_ticks(self.z_axis, skip, |v| v > min.z && v < max.z) {
            painter.polyline(&z_grid_strip(layout, min, max, v), self.grid.color, self.grid.width);
        }
    }

    fn skip(&self, painter: &Painter<'_>, text: &mut TextContext, axis: &Axis, a: Vec3, b: Vec3) -> usize {
        let len = (painter.to_window(b).truncate() - painter.to_window(a).truncate()).length();
        let height = text.renderer(&axis.tick_label_font).measure(GAP_PROBE).y;
        label_skip(axis.tick_labels().len(), len, height)
    }

    /// Axis lines, ticks, tick labels and axis labels, drawn over everything.
    pub fn draw_axes(&self, painter: &mut Painter<'_>, text: &mut TextContext) -> RenderResult<AxesLabels> {
        let depth = painter.set_depth_mode(DepthMode::Always);
        let result = self.draw_axes_inner(painter, text);
        painter.set_depth_mode(depth);
        result
    }

    fn draw_axes_inner(&self, painter: &mut Painter<'_>, text: &mut TextContext) -> RenderResult<AxesLabels> {
        let mut labels = AxesLabels::default();
        let (min, max) = self.bounds();
        let layout = self.layout();
        if self.display_xy {
            if self.x_axis.visible {
                labels.x = self.draw_x_axis(painter, text, layout)?;
            }
            if self.y_axis.visible {
                labels.y = self.draw_y_axis(painter, text, layout)?;
            }
        }
        if self.display_z && self.z_axis.visible {
            let (sx, sy) = layout.z_corner;
            let at = Vec2::new(sx.pick(min.x, max.x), sy.pick(min.y, max.y));
            labels.z = self.draw_z_axis(painter, text, at)?;
        }
        Ok(labels)
    }

    fn draw_x_axis(
        &self,
        painter: &mut Painter<'_>,
        text: &mut TextContext,
        layout: &BoxLayout,
    ) -> RenderResult<AxisLabelBoxes> {
        let axis = self.x_axis;
        let (min, max) = self.bounds();
        let y = layout.x_axis_y.pick(min.y, max.y);
        let (a, b) = (Vec3::new(min.x, y, min.z), Vec3::new(max.x, y, min.z));
        painter.polyline(&[a, b], axis.line_color, axis.line_width);

        let mut boxes = AxisLabelBoxes::default();
        if axis.tick_labels().is_empty() {
            return Ok(boxes);
        }
        let skip = self.skip(painter, text, axis, a, b);
        let tick_len = self.tick_length(axis, self.lengths.y);
        let y1 = if y > self.center.y { y + tick_len } else { y - tick_len };
        let v_align = self.tick_valign();
        for (v, label) in stepped_ticks(axis, skip, |v| v >= min.x && v <= max.x) {
            let foot = Vec3::new(v, y1, min.z);
            painter.polyline(&[Vec3::new(v, y, min.z), foot], axis.line_color, axis.line_width);
            if axis.draw_tick_label {
                let label = tick_text(axis, label);
                boxes.ticks.push(draw_label(painter, text, &label, foot, layout.x_tick_align, v_align, 0.0, Vec2::ZERO)?);
            }
        }

        if let Some(title) = axis.label.as_ref().filter(|_| axis.draw_label) {
            let angle = screen_angle(painter, a, b);
            let angle = if y < self.center.y { angle } else { angle - 180.0 };
            let shift = self.label_shift(boxes.widest());
            let at = Vec3::new((min.x + max.x) * 0.5, y1, min.z);
            boxes.label = Some(draw_label(painter, text, title, at, HAlign::Center, v_align, angle, shift)?);
        }
        Ok(boxes)
    }

    fn draw_y_axis(
        &self,
        painter: &mut Painter<'_>,
        text: &mut TextContext,
        layout: &BoxLayout,
    ) -> RenderResult<AxisLabelBoxes> {
        let axis = self.y_axis;
        let (min, max) = self.bounds();
        let x = layout.y_axis_x.pick(min.x, max.x);
        let (a, b) = (Vec3::new(x, min.y, min.z), Vec3::new(x, max.y, min.z));
        painter.polyline(&[a, b], axis.line_color, axis.line_width);

        let mut boxes = AxisLabelBoxes::default();
        if axis.tick_labels().is_empty() {
            return Ok(boxes);
        }
        let skip = self.skip(painter, text, axis, a, b);
        let tick_len = self.tick_length(axis, self.lengths.x);
        let x1 = if x > self.center.x { x + tick_len } else { x - tick_len };
        let v_align = self.tick_valign();
        for (v, label) in stepped_ticks(axis, skip, |v| v >= min.y && v <= max.y) {
            let foot = Vec3::new(x1, v, min.z);
            painter.polyline(&[Vec3::new(x, v, min.z), foot], axis.line_color, axis.line_width);
            if axis.draw_tick_label {
                let label = tick_text(axis, label);
                boxes.ticks.push(draw_label(painter, text, &label, foot, layout.y_tick_align, v_align, 0.0, Vec2::ZERO)?);
            }
        }

        if let Some(title) = axis.label.as_ref().filter(|_| axis.draw_label) {
            let angle = screen_angle(painter, a, b);
            let angle = if x > self.center.x { angle } else { angle - 180.0 };
            let shift = self.label_shift(boxes.widest());
            let at = Vec3::new(x1, (min.y + max.y) * 0.5, min.z);
            boxes.label = Some(draw_label(painter, text, title, at, HAlign::Center, v_align, angle, shift)?);
        }
        Ok(boxes)
    }

    /// Shift of an x or y axis label away from its tick labels.
    fn label_shift(&self, widest: f32) -> Vec2 {
        let shift = -(widest + self.tick_space);
        if self.angle_x <= FLIP_ANGLE_X {
            Vec2::new(0.0, -shift)
        } else {
            Vec2::new(0.0, shift)
        }
    }

    /// Tick length in data units along an axis of data length `opposite`.
    fn tick_length(&self, axis: &Axis, opposite: f32) -> f32 {
        axis.tick_length * self.len_scale * opposite * 0.5
    }

    /// Z axis on the vertical edge at data `(x, y)`, ticks pointing out of the box.
    pub fn draw_z_axis(&self, painter: &mut Painter<'_>, text: &mut TextContext, at: Vec2) -> RenderResult<AxisLabelBoxes> {
        let axis = self.z_axis;
        let (min, max) = self.bounds();
        let (x, y) = (at.x, at.y);
        let (a, b) = (Vec3::new(x, y, min.z), Vec3::new(x, y, max.z));
        painter.polyline(&[a, b], axis.line_color, axis.line_width);

        let mut boxes = AxisLabelBoxes::default();
        if axis.tick_labels().is_empty() {
            return Ok(boxes);
        }
        let skip = self.skip(painter, text, axis, a, b);
        let x_tick = self.tick_length(axis, self.lengths.x);
        let y_tick = self.tick_length(axis, self.lengths.y);
        let (mut x1, mut y1) = (x, y);
        match (x < self.center.x, y > self.center.y) {
            (true, true) => y1 += y_tick,
            (true, false) => x1 -= x_tick,
            (false, true) => x1 += x_tick,
            (false, false) => y1 -= y_tick,
        }
        for (v, label) in stepped_ticks(axis, skip, |v| v >= min.z && v <= max.z) {
            let foot = Vec3::new(x1, y1, v);
            painter.polyline(&[Vec3::new(x, y, v), foot], axis.line_color, axis.line_width);
            if axis.draw_tick_label {
                let label = tick_text(axis, label);
                let shift = Vec2::new(-self.tick_space, 0.0);
                boxes.ticks.push(draw_label(painter, text, &label, foot, HAlign::Right, VAlign::Center, 0.0, shift)?);
            }
        }

        if let Some(title) = axis.label.as_ref().filter(|_| axis.draw_label) {
            let shift = Vec2::new(0.0, boxes.widest() + self.tick_space * 3.0);
            let at = Vec3::new(x1, y1, (min.z + max.z) * 0.5);
            boxes.label = Some(draw_label(painter, text, title, at, HAlign::Center, VAlign::Bottom, 90.0, shift)?);
        }
        Ok(boxes)
    }

    /// Extra z axis at a fixed data location with screen-horizontal ticks.
    pub fn draw_z_axis_option(
        &self,
        painter: &mut Painter<'_>,
        text: &mut TextContext,
        option: &ZAxisOption,
    ) -> RenderResult<AxisLabelBoxes> {
        let depth = painter.set_depth_mode(DepthMode::Always);
        let model_view = painter.model_view();
        let result = self.draw_z_axis_option_inner(painter, text, option, model_view);
        painter.set_model_view(model_view);
        painter.set_depth_mode(depth);
        result
    }

    fn draw_z_axis_option_inner(
        &self,
        painter: &mut Painter<'_>,
        text: &mut TextContext,
        option: &ZAxisOption,
        model_view: Mat4,
    ) -> RenderResult<AxisLabelBoxes> {
        let axis = self.z_axis;
        let (min, max) = self.bounds();
        let (x, y) = (option.x as f32, option.y as f32);
        let (a, b) = (Vec3::new(x, y, min.z), Vec3::new(x, y, max.z));
        painter.polyline(&[a, b], axis.line_color, axis.line_width);

        let mut boxes = AxisLabelBoxes::default();
        let skip = self.skip(painter, text, axis, a, b);
        painter.set_model_view(Mat4::IDENTITY);

        let tick_len = axis.tick_length * self.len_scale;
        let (dir, h_align) = if option.left {
            (-1.0, HAlign::Right)
        } else {
            (1.0, HAlign::Left)
        };
        for (v, label) in stepped_ticks(axis, skip, |v| v >= min.z && v <= max.z) {
            let eye = model_view.transform_point3(Vec3::new(x, y, v));
            let foot = eye + Vec3::X * dir * tick_len;
            painter.polyline(&[eye, foot], axis.line_color, axis.line_width);
            let label = tick_text(axis, label);
            let shift = Vec2::new(dir * self.tick_space, 0.0);
            boxes.ticks.push(draw_label(painter, text, &label, foot, h_align, VAlign::Center, 0.0, shift)?);
        }

        if let Some(title) = axis.label.as_ref() {
            let mid = model_view.transform_point3(Vec3::new(x, y, (min.z + max.z) * 0.5));
            let at = mid + Vec3::X * dir * tick_len;
            let gap = boxes.widest() + self.tick_space * 3.0;
            let (v_align, shift) = if option.left {
                (VAlign::Bottom, gap)
            } else {
                (VAlign::Top, -gap)
            };
            boxes.label = Some(draw_label(
                painter,
                text,
                title,
                at,
                HAlign::Center,
                v_align,
                90.0,
                Vec2::new(0.0, shift),
            )?);
        }
        Ok(boxes)
    }
}

fn tick_text(axis: &Axis, label: &str) -> ChartText {
    ChartText::new(label)
        .with_font(axis.tick_label_font.clone())
        .with_color(axis.tick_label_color)
}

/// Draws text anchored at a point under the painter's current model-view.
#[allow(clippy::too_many_arguments)]
fn draw_label(
    painter: &mut Painter<'_>,
    text: &mut TextContext,
    label: &ChartText,
    at: Vec3,
    h_align: HAlign,
    v_align: VAlign,
    angle: f32,
    shift: Vec2,
) -> RenderResult<ScreenBox> {
    let anchor = painter.to_window(at).truncate();
    text.draw(painter, label, anchor, h_align, v_align, angle, shift)
}

/// Screen direction from `a` to `b`, degrees counterclockwise from +x.
fn screen_angle(painter: &Painter<'_>, a: Vec3, b: Vec3) -> f32 {
    let d = painter.to_window(b).truncate() - painter.to_window(a).truncate();
    d.y.atan2(d.x).to_degrees()
}
