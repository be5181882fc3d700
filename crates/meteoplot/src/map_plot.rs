//! Plots whose x/y plane is a map projection.

use glam::{DVec2, Vec3};
use meteoplot_core::{Extent3D, Graphic, GraphicHandle, MeteoPlotError};
use meteoplot_render::Canvas;

use crate::plot::{BaseGrid, Plot3D, PlotLifecycle};
use crate::Result;

/// Identifies the coordinate system of the x/y plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionInfo {
    /// Plain longitude/latitude degrees.
    pub lon_lat: bool,
    pub name: String,
}

impl Default for ProjectionInfo {
    fn default() -> Self {
        Self::lon_lat()
    }
}

impl ProjectionInfo {
    #[must_use]
    pub fn lon_lat() -> Self {
        Self {
            lon_lat: true,
            name: "longlat".to_string(),
        }
    }

    /// A projected coordinate system known by name.
    #[must_use]
    pub fn projected(name: impl Into<String>) -> Self {
        Self {
            lon_lat: false,
            name: name.into(),
        }
    }
}

/// A tick label on a map grid line.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLabel {
    /// Where the grid line meets the map edge, in projected coordinates.
    pub coord: DVec2,
    pub text: String,
}

impl GridLabel {
    #[must_use]
    pub fn new(coord: DVec2, text: impl Into<String>) -> Self {
        Self {
            coord,
            text: text.into(),
        }
    }
}

/// Longitude/latitude grid geometry from an external projection library.
///
/// Lines are polylines in projected x/y coordinates.
pub trait MapGridProvider {
    /// Called whenever the mapped region changes.
    fn set_extent(&mut self, extent: &Extent3D);

    fn longitude_lines(&self) -> Vec<Vec<DVec2>>;

    fn latitude_lines(&self) -> Vec<Vec<DVec2>>;

    /// Labels along the x axis.
    fn longitude_labels(&self) -> Vec<GridLabel>;

    /// Labels along the y axis.
    fn latitude_labels(&self) -> Vec<GridLabel>;
}

/// A [`Plot3D`] over a map projection.
///
/// Projected maps draw the provider's grid lines on the base plane and
/// label the x and y axes where those lines meet the map edge. Longitude/
/// latitude maps, or maps without a provider, draw like a plain plot.
pub struct MapPlot3D {
    plot: Plot3D,
    projection: ProjectionInfo,
    grid: Option<Box<dyn MapGridProvider>>,
}

impl Default for MapPlot3D {
    fn default() -> Self {
        Self::new(ProjectionInfo::lon_lat())
    }
}

impl MapPlot3D {
    #[must_use]
    pub fn new(projection: ProjectionInfo) -> Self {
        Self {
            plot: Plot3D::new(),
            projection,
            grid: None,
        }
    }

    #[must_use]
    pub fn with_grid_provider(mut self, provider: Box<dyn MapGridProvider>) -> Self {
        self.set_grid_provider(provider);
        self
    }

    pub fn set_grid_provider(&mut self, mut provider: Box<dyn MapGridProvider>) {
        provider.set_extent(&self.plot.draw_extent());
        self.grid = Some(provider);
    }

    #[must_use]
    pub fn projection(&self) -> &ProjectionInfo {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: ProjectionInfo) {
        self.projection = projection;
        self.sync_grid();
    }

    #[must_use]
    pub fn plot(&self) -> &Plot3D {
        &self.plot
    }

    /// The wrapped plot. Call [`MapPlot3D::set_draw_extent`] rather than
    /// the plot's own setter so the map grid follows.
    pub fn plot_mut(&mut self) -> &mut Plot3D {
        &mut self.plot
    }

    /// Adds a graphic already in this map's coordinates.
    pub fn add_graphic(&mut self, graphic: Graphic) -> GraphicHandle {
        let handle = self.plot.add_graphic(graphic);
        self.sync_grid();
        handle
    }

    /// Adds a graphic declared in `projection`.
    ///
    /// Reprojection belongs to the projection library, so only graphics in
    /// this map's own projection are accepted.
    pub fn add_projected_graphic(&mut self, graphic: Graphic, projection: &ProjectionInfo) -> Result<GraphicHandle> {
        if *projection != self.projection {
            return Err(MeteoPlotError::Config(format!(
                "graphic in {} must be reprojected to {} first",
                projection.name, self.projection.name
            ))
            .into());
        }
        Ok(self.add_graphic(graphic))
    }

    pub fn set_draw_extent(&mut self, extent: Extent3D) {
        self.plot.set_draw_extent(extent);
        self.sync_grid();
    }

    fn uses_map_grid(&self) -> bool {
        !self.projection.lon_lat && self.grid.is_some()
    }

    fn sync_grid(&mut self) {
        if self.projection.lon_lat {
            return;
        }
        let extent = self.plot.draw_extent();
        if let Some(grid) = self.grid.as_mut() {
            grid.set_extent(&extent);
        }
    }

    /// Grid lines on the base plane and edge labels as axis ticks.
    fn base_grid(&self) -> Option<BaseGrid> {
        if !self.uses_map_grid() {
            return None;
        }
        let provider = self.grid.as_deref()?;
        let extent = self.plot.axes_extent();
        let style = &self.plot.options().grid_line;
        #[allow(clippy::cast_possible_truncation)]
        let z = extent.min_z as f32;
        let lift = |line: Vec<DVec2>| -> Vec<Vec3> {
            line.into_iter()
                .map(|p| Vec3::new(p.x as f32, p.y as f32, z))
                .collect()
        };
        let mut lines = Vec::new();
        if style.draw_x {
            lines.extend(provider.longitude_lines().into_iter().map(lift));
        }
        if style.draw_y {
            lines.extend(provider.latitude_lines().into_iter().map(lift));
        }
        let ticks = |labels: Vec<GridLabel>, along_x: bool| {
            labels
                .into_iter()
                .map(|l| (if along_x { l.coord.x } else { l.coord.y }, l.text))
                .unzip()
        };
        Some(BaseGrid {
            lines,
            x_ticks: ticks(provider.longitude_labels(), true),
            y_ticks: ticks(provider.latitude_labels(), false),
        })
    }
}

impl PlotLifecycle for MapPlot3D {
    fn init(&mut self, canvas: &dyn Canvas) {
        self.plot.init(canvas);
    }

    fn reshape(&mut self, canvas: &mut dyn Canvas, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        self.plot.reshape(canvas, x, y, width, height)
    }

    fn display(&mut self, canvas: &mut dyn Canvas) -> Result<()> {
        let base_grid = self.base_grid();
        self.plot.display_with(canvas, base_grid.as_ref())
    }

    fn dispose(&mut self, canvas: &dyn Canvas) {
        self.plot.dispose(canvas);
    }
}
