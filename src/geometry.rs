//! Coordinate spaces and the conversions between them.
//!
//! Four spaces are in play and each one has its own type so they cannot be
//! mixed by accident:
//!
//! | Space | Type | Unit / origin |
//! |-------|------|---------------|
//! | PDF points | [`PointRect`] | 1/72 inch, top-left of the page |
//! | Raster pixels | [`PixelPoint`], [`PixelRect`] | page rendered at `dpi` |
//! | Screen | [`ScreenPoint`], [`ScreenRect`] | absolute desktop pixels, may be negative |
//! | Viewport-relative | [`PixelPoint`], [`PixelRect`] | `screen - viewport origin` |
//!
//! Viewport-relative coordinates *are* raster pixel coordinates: the page
//! raster is displayed unscaled at the top-left of the viewport. The only way
//! to turn a screen quantity into a pixel quantity is [`to_viewport_relative`]
//! (or [`ScreenRect::to_viewport_relative`]), and every rectangle must pass
//! through [`clip_rect_to_bounds`] before it is used to index a bitmap.

use serde::{Deserialize, Serialize};

/// PDF points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert a length in PDF points to raster pixels at `dpi`, rounding to the
/// nearest pixel.
pub fn points_to_pixels(points: f64, dpi: u32) -> i32 {
    (points * f64::from(dpi) / POINTS_PER_INCH).round() as i32
}

/// Inverse of [`points_to_pixels`]. Exact up to the rounding applied by the
/// forward conversion, i.e. within `72 / dpi` points.
pub fn pixels_to_points(pixels: i32, dpi: u32) -> f64 {
    f64::from(pixels) * POINTS_PER_INCH / f64::from(dpi)
}

/// Raster size of a page of `width_pt` x `height_pt` rendered at `dpi`.
pub fn page_pixel_size(width_pt: f64, height_pt: f64, dpi: u32) -> (u32, u32) {
    let w = points_to_pixels(width_pt, dpi).max(1) as u32;
    let h = points_to_pixels(height_pt, dpi).max(1) as u32;
    (w, h)
}

// ── PDF point space ──────────────────────────────────────────────────────

/// Axis-aligned rectangle in PDF point space, origin at the page's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PointRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Project the rectangle into raster pixels at `dpi`.
    pub fn to_pixels(&self, dpi: u32) -> PixelRect {
        let left = points_to_pixels(self.left, dpi);
        let top = points_to_pixels(self.top, dpi);
        let right = points_to_pixels(self.left + self.width, dpi);
        let bottom = points_to_pixels(self.top + self.height, dpi);
        PixelRect::new(left, top, right - left, bottom - top)
    }
}

// ── Raster / viewport-relative pixel space ───────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in raster pixel space. `width`/`height` may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full extent of a `width` x `height` bitmap.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

/// Intersect `rect` with `bounds`.
///
/// Returns `None` when the two do not overlap at all (touching edges count as
/// no overlap), otherwise the exact intersection.
pub fn clip_rect_to_bounds(rect: PixelRect, bounds: PixelRect) -> Option<PixelRect> {
    if rect.is_empty() || bounds.is_empty() {
        return None;
    }
    let left = rect.x.max(bounds.x);
    let top = rect.y.max(bounds.y);
    let right = rect.right().min(bounds.right());
    let bottom = rect.bottom().min(bounds.bottom());
    if right <= left || bottom <= top {
        return None;
    }
    Some(PixelRect::new(
        left,
        top,
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    ))
}

// ── Screen space ─────────────────────────────────────────────────────────

/// Absolute desktop coordinate. Negative values are legal on monitors left of
/// or above the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }

    /// Reproject into viewport-relative pixel space. Size is unchanged.
    pub fn to_viewport_relative(&self, viewport_origin: ScreenPoint) -> PixelRect {
        let p = to_viewport_relative(self.origin(), viewport_origin);
        PixelRect::new(p.x, p.y, self.width, self.height)
    }
}

/// `screen - viewport_origin`, saturating at the `i32` range. A saturated
/// point lands far off the page.
pub fn to_viewport_relative(screen: ScreenPoint, viewport_origin: ScreenPoint) -> PixelPoint {
    PixelPoint::new(
        screen.x.saturating_sub(viewport_origin.x),
        screen.y.saturating_sub(viewport_origin.y),
    )
}

/// `pixel + viewport_origin`; inverse of [`to_viewport_relative`].
pub fn to_screen(pixel: PixelPoint, viewport_origin: ScreenPoint) -> ScreenPoint {
    ScreenPoint::new(
        pixel.x.saturating_add(viewport_origin.x),
        pixel.y.saturating_add(viewport_origin.y),
    )
}
