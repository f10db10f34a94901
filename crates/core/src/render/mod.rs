use std::sync::Arc;

use crate::{SamplePair, SnapshotPublisher};

/// Amplitude that maps onto the edge of the plot.
pub const PLOT_RANGE: f64 = 1.5;

/// Nominal positions of the reference grid on both axes.
pub const GRID_POSITIONS: [f64; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];

/// Grid lines run past the visible range so they always span the surface.
const GRID_EXTENT: f64 = 2.0;

/// Affine map from amplitude space onto a `width` x `height` pixel surface.
///
/// Positive `y` plots upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotMapping {
    pub width: u32,
    pub height: u32,
}

impl PlotMapping {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn screen_x(&self, x: f64) -> f64 {
        ((x / PLOT_RANGE + 1.0) / 2.0) * (f64::from(self.width) - 1.0)
    }

    pub fn screen_y(&self, y: f64) -> f64 {
        (1.0 - (y / PLOT_RANGE + 1.0) / 2.0) * (f64::from(self.height) - 1.0)
    }

    /// Maps a pair to the nearest pixel, rounding half away from zero.
    pub fn to_pixel(&self, pair: SamplePair) -> (i64, i64) {
        (
            self.screen_x(f64::from(pair.x)).round() as i64,
            self.screen_y(f64::from(pair.y)).round() as i64,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pen {
    Grid,
    Trace,
}

/// Drawing target for the renderer.
///
/// A windowing toolkit plugs in here; [`Raster`] is the headless implementation.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    fn clear(&mut self);

    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), pen: Pen);

    /// Plots one pixel. Coordinates outside the surface are ignored.
    fn draw_point(&mut self, x: i64, y: i64, pen: Pen);
}

/// What one render pass put on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub grid_lines: usize,
    pub points: usize,
}

/// Consumer half of the scope.
///
/// Each [`Renderer::tick`] copies the published snapshot into a display-owned
/// buffer and draws it. The lock is released before any drawing happens.
pub struct Renderer {
    tap: Arc<SnapshotPublisher>,
    displayed: Vec<SamplePair>,
}

impl Renderer {
    pub fn new(tap: Arc<SnapshotPublisher>) -> Self {
        let capacity = tap.capacity();
        Self {
            tap,
            displayed: Vec::with_capacity(capacity),
        }
    }

    /// Pulls the latest snapshot and renders it.
    pub fn tick<S: Surface + ?Sized>(&mut self, surface: &mut S) -> RenderStats {
        self.refresh();
        self.render(surface)
    }

    /// Replaces the displayed points with the current snapshot.
    pub fn refresh(&mut self) {
        self.tap.copy_into(&mut self.displayed);
    }

    /// Draws the grid, then every displayed point.
    ///
    /// Pairs with a NaN or infinite coordinate have no position on the plot and
    /// are skipped; they are not counted in [`RenderStats::points`].
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) -> RenderStats {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return RenderStats::default();
        }

        let mapping = PlotMapping::new(width, height);
        surface.clear();
        let grid_lines = draw_grid(surface, &mapping);

        let mut points = 0;
        for &pair in &self.displayed {
            if !pair.is_finite() {
                continue;
            }
            let (x, y) = mapping.to_pixel(pair);
            surface.draw_point(x, y, Pen::Trace);
            points += 1;
        }

        RenderStats { grid_lines, points }
    }

    /// Points as last rendered, in snapshot order.
    pub fn displayed(&self) -> &[SamplePair] {
        &self.displayed
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("displayed", &self.displayed.len())
            .finish()
    }
}

fn draw_grid<S: Surface + ?Sized>(surface: &mut S, mapping: &PlotMapping) -> usize {
    let mut lines = 0;
    for x in GRID_POSITIONS {
        let sx = mapping.screen_x(x);
        surface.draw_line(
            (sx, mapping.screen_y(-GRID_EXTENT)),
            (sx, mapping.screen_y(GRID_EXTENT)),
            Pen::Grid,
        );
        lines += 1;
    }
    for y in GRID_POSITIONS {
        let sy = mapping.screen_y(y);
        surface.draw_line(
            (mapping.screen_x(-GRID_EXTENT), sy),
            (mapping.screen_x(GRID_EXTENT), sy),
            Pen::Grid,
        );
        lines += 1;
    }
    lines
}

/// Headless 8-bit grayscale surface: white background, gray grid, black trace.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub const BACKGROUND: u8 = 255;
    pub const GRID: u8 = 160;
    pub const TRACE: u8 = 0;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Self::BACKGROUND; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    /// Number of pixels currently painted with `value`.
    pub fn count(&self, value: u8) -> usize {
        self.pixels.iter().filter(|&&p| p == value).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn plot(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let index = self.index(x as u32, y as u32);
        self.pixels[index] = value;
    }
}

fn shade(pen: Pen) -> u8 {
    match pen {
        Pen::Grid => Raster::GRID,
        Pen::Trace => Raster::TRACE,
    }
}

impl Surface for Raster {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.pixels.fill(Self::BACKGROUND);
    }

    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), pen: Pen) {
        // Clamp the endpoints first; grid lines deliberately overshoot the plot.
        let max_x = f64::from(self.width) - 1.0;
        let max_y = f64::from(self.height) - 1.0;
        let (x0, y0) = (from.0.clamp(0.0, max_x), from.1.clamp(0.0, max_y));
        let (x1, y1) = (to.0.clamp(0.0, max_x), to.1.clamp(0.0, max_y));

        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        let value = shade(pen);
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let x = (x0 + (x1 - x0) * t).round() as i64;
            let y = (y0 + (y1 - y0) * t).round() as i64;
            self.plot(x, y, value);
        }
    }

    fn draw_point(&mut self, x: i64, y: i64, pen: Pen) {
        self.plot(x, y, shade(pen));
    }
}
