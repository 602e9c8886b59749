//! Burning annotations into a page raster.
//!
//! Annotations live in screen space. Each one is resized by the row of its
//! [`SizingTable`] that matches its text, so font and rectangle always come
//! from the same row. It is then moved into the raster's
//! pixel space by subtracting the viewport origin, clipped against the
//! raster bounds and then drawn: fill, 3px border, centred label. The base
//! raster is never modified; [`AnnotationCompositor::compose`] draws on a
//! copy.
//!
//! Draw order is the primary guide first, then placed tags in order, so an
//! opaque tag always covers the translucent guide where they overlap.
//!
//! Labels use the 8x8 bitmap glyphs from `font8x8`, scaled by an integral
//! factor derived from the font size of the matching [`SizingRule`]. A label
//! that does not fit its rectangle is drawn at the largest scale that does,
//! and truncated with `..` when even scale 1 is too wide.

use crate::annotation::{
    Annotation, Color, SizingRule, SizingTable, BORDER_PX, PRIMARY_BORDER_ALPHA,
    PRIMARY_FILL_ALPHA, PRIMARY_TEXT_ALPHA,
};
use crate::config::TaggerConfig;
use crate::geometry::{clip_rect_to_bounds, PixelRect, ScreenPoint};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Pixel, RgbaImage};
use tracing::{debug, trace};

/// Edge length of one glyph cell at scale 1.
const GLYPH_PX: i32 = 8;

/// Colours used for one annotation.
#[derive(Debug, Clone, Copy)]
struct Style {
    fill: Color,
    border: Color,
    text: Color,
}

impl Style {
    fn primary(fill: Color) -> Self {
        Self {
            fill: fill.with_alpha(PRIMARY_FILL_ALPHA),
            border: Color::BLACK.with_alpha(PRIMARY_BORDER_ALPHA),
            text: Color::WHITE.with_alpha(PRIMARY_TEXT_ALPHA),
        }
    }

    fn placed(fill: Color) -> Self {
        Self {
            fill: fill.with_alpha(255),
            border: Color::BLACK,
            text: Color::WHITE,
        }
    }
}

/// Draws annotations onto page rasters.
#[derive(Debug, Clone)]
pub struct AnnotationCompositor {
    primary_sizing: SizingTable,
    placed_sizing: SizingTable,
}

impl Default for AnnotationCompositor {
    fn default() -> Self {
        Self::new(SizingTable::primary(), SizingTable::placed())
    }
}

impl AnnotationCompositor {
    pub fn new(primary_sizing: SizingTable, placed_sizing: SizingTable) -> Self {
        Self {
            primary_sizing,
            placed_sizing,
        }
    }

    pub fn from_config(config: &TaggerConfig) -> Self {
        Self::new(config.primary_sizing.clone(), config.placed_sizing.clone())
    }

    /// Return a copy of `base` with `primary` and every non-empty `placed`
    /// annotation burned in.
    pub fn compose(
        &self,
        base: &RgbaImage,
        primary: &Annotation,
        placed: &[Annotation],
        viewport_origin: ScreenPoint,
    ) -> RgbaImage {
        let mut canvas = base.clone();

        draw_annotation(
            &mut canvas,
            primary,
            viewport_origin,
            Style::primary(primary.fill_color),
            self.primary_sizing.resolve(&primary.text),
        );

        let mut drawn = 0;
        for tag in placed.iter().filter(|t| !t.text.is_empty()) {
            if draw_annotation(
                &mut canvas,
                tag,
                viewport_origin,
                Style::placed(tag.fill_color),
                self.placed_sizing.resolve(&tag.text),
            ) {
                drawn += 1;
            }
        }

        debug!(
            "Composited {} of {} placed tags onto {}x{} raster",
            drawn,
            placed.len(),
            canvas.width(),
            canvas.height()
        );
        canvas
    }
}

/// Draw one annotation. Returns `false` when it lies entirely off the raster.
fn draw_annotation(
    canvas: &mut RgbaImage,
    annotation: &Annotation,
    viewport_origin: ScreenPoint,
    style: Style,
    rule: SizingRule,
) -> bool {
    let rect = rule
        .fit(annotation.screen_rect, &annotation.text)
        .to_viewport_relative(viewport_origin);
    let bounds = PixelRect::from_size(canvas.width(), canvas.height());
    let Some(visible) = clip_rect_to_bounds(rect, bounds) else {
        trace!("Annotation at {:?} is off the page, skipped", rect);
        return false;
    };

    fill_rect(canvas, visible, style.fill);
    draw_border(canvas, rect, style.border);
    if !annotation.text.is_empty() {
        draw_label(canvas, rect, &annotation.text, rule.font_px, style.text);
    }
    true
}

/// Fill `rect` (clipped to the canvas), blending translucent colours.
fn fill_rect(canvas: &mut RgbaImage, rect: PixelRect, color: Color) {
    let bounds = PixelRect::from_size(canvas.width(), canvas.height());
    let Some(r) = clip_rect_to_bounds(rect, bounds) else {
        return;
    };
    let px = color.to_rgba();
    // Clipped coordinates are inside the canvas, hence non-negative.
    for y in r.y..r.bottom() {
        for x in r.x..r.right() {
            let dst = canvas.get_pixel_mut(x as u32, y as u32);
            if color.a == 255 {
                *dst = px;
            } else {
                dst.blend(&px);
            }
        }
    }
}

/// A `BORDER_PX` frame just inside `rect`, drawn as four non-overlapping
/// strips so translucent borders are blended once per pixel.
fn draw_border(canvas: &mut RgbaImage, rect: PixelRect, color: Color) {
    let t = BORDER_PX.min(rect.width / 2).min(rect.height / 2).max(1);
    let inner_h = (rect.height - 2 * t).max(0);
    let strips = [
        PixelRect::new(rect.x, rect.y, rect.width, t),
        PixelRect::new(rect.x, rect.bottom().saturating_sub(t), rect.width, t),
        PixelRect::new(rect.x, rect.y.saturating_add(t), t, inner_h),
        PixelRect::new(rect.right().saturating_sub(t), rect.y.saturating_add(t), t, inner_h),
    ];
    for strip in strips {
        fill_rect(canvas, strip, color);
    }
}

/// Draw `text` centred in `rect`.
fn draw_label(canvas: &mut RgbaImage, rect: PixelRect, text: &str, font_px: u32, color: Color) {
    let inner = PixelRect::new(
        rect.x.saturating_add(BORDER_PX),
        rect.y.saturating_add(BORDER_PX),
        rect.width.saturating_sub(2 * BORDER_PX),
        rect.height.saturating_sub(2 * BORDER_PX),
    );
    let Some((label, scale)) = fit_label(text, font_px, inner.width, inner.height) else {
        return;
    };

    let cell = GLYPH_PX * scale;
    let text_w = cell * label.len() as i32;
    let x0 = rect.x.saturating_add((rect.width - text_w) / 2);
    let y0 = rect.y.saturating_add((rect.height - cell) / 2);

    for (i, glyph) in label.iter().enumerate() {
        let gx = x0.saturating_add(i as i32 * cell);
        for (row, &bits) in glyph.iter().enumerate() {
            let py = y0.saturating_add(row as i32 * scale);
            for col in 0..GLYPH_PX {
                if (bits >> col) & 1 != 0 {
                    let px = gx.saturating_add(col * scale);
                    fill_rect(canvas, PixelRect::new(px, py, scale, scale), color);
                }
            }
        }
    }
}

/// Pick the glyph scale and (possibly truncated) glyph run for a label in a
/// `width` x `height` area. `None` when not even one glyph fits.
fn fit_label(text: &str, font_px: u32, width: i32, height: i32) -> Option<(Vec<[u8; 8]>, i32)> {
    if width < GLYPH_PX || height < GLYPH_PX {
        return None;
    }

    let glyphs: Vec<[u8; 8]> = text.chars().map(glyph).collect();
    let len = glyphs.len() as i32;

    let mut scale = (font_px as i32 / GLYPH_PX).max(1);
    while scale > 1 && (len * GLYPH_PX * scale > width || GLYPH_PX * scale > height) {
        scale -= 1;
    }
    if len * GLYPH_PX * scale <= width {
        return Some((glyphs, scale));
    }

    let fits = (width / GLYPH_PX) as usize;
    let mut truncated: Vec<[u8; 8]> = if fits >= 3 {
        glyphs[..fits - 2].to_vec()
    } else {
        glyphs[..fits].to_vec()
    };
    if fits >= 3 {
        truncated.extend([glyph('.'), glyph('.')]);
    }
    Some((truncated, 1))
}

/// Bitmap for `ch`; characters outside the bundled sets render as `?`.
fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}
