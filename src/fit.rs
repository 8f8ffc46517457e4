//! Cover-fit placement of an image inside a rectangular surface.
//!
//! The image is scaled so it covers the whole surface with its aspect ratio intact, then
//! shifted along the overflowing axis either to the center or by a fraction of the surplus.

/// Size of the rendering surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Target box for the displayed image, relative to the surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

/// Fractional shifts in `[0, 1]` applied to the surplus ("wiggle room") on each axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Offsets {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Offsets {
    /// Per-axis override: values present on `self` win over `fallback`.
    pub fn or(self, fallback: Offsets) -> Offsets {
        Offsets {
            x: self.x.or(fallback.x),
            y: self.y.or(fallback.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub centered_x: bool,
    pub centered_y: bool,
    pub offsets: Offsets,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            centered_x: true,
            centered_y: true,
            offsets: Offsets::default(),
        }
    }
}

/// Width over height of a natural image, or `None` while the size is unknown.
pub fn aspect_ratio(width: u32, height: u32) -> Option<f64> {
    let ratio = f64::from(width) / f64::from(height);
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

/// Compute the cover-fit placement for an image of aspect `ratio` on `viewport`.
///
/// Returns `None` when either the ratio or the viewport is degenerate so callers never
/// assign non-finite geometry.
pub fn cover_fit(viewport: Viewport, ratio: f64, options: &FitOptions) -> Option<Placement> {
    if !(ratio.is_finite() && ratio > 0.0) || !viewport.is_usable() {
        return None;
    }

    let width = viewport.width;
    let height = width / ratio;
    if height >= viewport.height {
        let top = shift(height - viewport.height, options.centered_y, options.offsets.y);
        return Some(Placement {
            width,
            height,
            left: 0.0,
            top,
        });
    }

    let height = viewport.height;
    let width = height * ratio;
    let left = shift(width - viewport.width, options.centered_x, options.offsets.x);
    Some(Placement {
        width,
        height,
        left,
        top: 0.0,
    })
}

fn shift(surplus: f64, centered: bool, offset: Option<f64>) -> f64 {
    match offset {
        None if centered => -surplus / 2.0,
        Some(fraction) => -surplus * fraction,
        None => 0.0,
    }
}
