//! Annotation descriptors, the tag palette, and the text sizing policy.
//!
//! An editing session has one *primary* annotation (the translucent guide the
//! user drags over the page) and any number of *placed* tags (opaque markers
//! created once and kept fixed). Both are described in screen space; the
//! compositor reprojects them onto the page raster.

use crate::error::TaggerError;
use crate::geometry::{ScreenPoint, ScreenRect};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Text longer than this many characters is sized as free text.
pub const SHORT_TEXT_MAX_CHARS: usize = 5;

/// Alpha applied to the primary guide's fill when it is burned in.
pub const PRIMARY_FILL_ALPHA: u8 = 120;

/// Alpha of the primary guide's border.
pub const PRIMARY_BORDER_ALPHA: u8 = 200;

/// Alpha of the primary guide's text.
pub const PRIMARY_TEXT_ALPHA: u8 = 220;

/// Border width in pixels for all annotations.
pub const BORDER_PX: i32 = 3;

// ── Colour ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Default fill of the primary guide.
    pub const GUIDE_YELLOW: Color = Color::rgb(255, 255, 0);
    /// Default colour for custom text tags.
    pub const TAG_ORANGE: Color = Color::rgb(220, 120, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

// ── Palette ──────────────────────────────────────────────────────────────

/// The fixed one-letter tags bound to hot keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagKind {
    M,
    P,
    R,
    B,
    K,
}

impl TagKind {
    pub const ALL: [TagKind; 5] = [TagKind::M, TagKind::P, TagKind::R, TagKind::B, TagKind::K];

    /// Case-insensitive lookup by hot key.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_uppercase() {
            'M' => Some(TagKind::M),
            'P' => Some(TagKind::P),
            'R' => Some(TagKind::R),
            'B' => Some(TagKind::B),
            'K' => Some(TagKind::K),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TagKind::M => "M",
            TagKind::P => "P",
            TagKind::R => "R",
            TagKind::B => "B",
            TagKind::K => "K",
        }
    }

    pub fn color(self) -> Color {
        match self {
            TagKind::M => Color::rgb(220, 120, 0),
            TagKind::P => Color::rgb(0, 160, 80),
            TagKind::R => Color::rgb(200, 40, 40),
            TagKind::B => Color::rgb(0, 120, 220),
            TagKind::K => Color::rgb(80, 80, 80),
        }
    }
}

// ── Sizing policy ────────────────────────────────────────────────────────

/// How the rectangle of an annotation is sized for a given text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RectSize {
    /// Keep whatever rectangle the annotation already has.
    Keep,
    Fixed { width: i32, height: i32 },
    /// `min(base + len * per_char, max_width)` wide.
    PerChar {
        #[serde(default)]
        base: i32,
        per_char: i32,
        max_width: i32,
        height: i32,
    },
}

impl RectSize {
    /// `(width, height)` for `text_len` characters, `None` for [`RectSize::Keep`].
    pub fn dimensions(&self, text_len: usize) -> Option<(i32, i32)> {
        match *self {
            RectSize::Keep => None,
            RectSize::Fixed { width, height } => Some((width, height)),
            RectSize::PerChar {
                base,
                per_char,
                max_width,
                height,
            } => {
                let len = i32::try_from(text_len).unwrap_or(i32::MAX);
                let width = base.saturating_add(len.saturating_mul(per_char));
                Some((width.min(max_width), height))
            }
        }
    }
}

/// One row of a [`SizingTable`]: texts of up to `max_len` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingRule {
    pub max_len: usize,
    pub font_px: u32,
    pub rect: RectSize,
}

impl SizingRule {
    /// `rect` resized for `text`, its origin kept. [`RectSize::Keep`] returns
    /// `rect` unchanged.
    pub fn fit(&self, rect: ScreenRect, text: &str) -> ScreenRect {
        match self.rect.dimensions(text.chars().count()) {
            Some((width, height)) => ScreenRect::new(rect.x, rect.y, width, height),
            None => rect,
        }
    }
}

/// Font and rectangle size chosen together, keyed by text length.
///
/// Rules are checked in ascending `max_len` order; the last rule also catches
/// anything longer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingTable {
    rules: Vec<SizingRule>,
}

impl SizingTable {
    /// Build a table. Returns `None` when `rules` is empty.
    pub fn new(mut rules: Vec<SizingRule>) -> Option<Self> {
        if rules.is_empty() {
            return None;
        }
        rules.sort_by_key(|r| r.max_len);
        Some(Self { rules })
    }

    /// Sizing for the translucent guide: the rectangle is whatever the user
    /// dragged, only the font changes.
    pub fn primary() -> Self {
        Self {
            rules: vec![
                SizingRule {
                    max_len: SHORT_TEXT_MAX_CHARS,
                    font_px: 24,
                    rect: RectSize::Keep,
                },
                SizingRule {
                    max_len: usize::MAX,
                    font_px: 16,
                    rect: RectSize::Keep,
                },
            ],
        }
    }

    /// Sizing for placed tags: a 58x42 box for one-letter tags that grows
    /// by one 24px glyph cell per extra character, then wider strips at a
    /// smaller font for free text.
    pub fn placed() -> Self {
        Self {
            rules: vec![
                SizingRule {
                    max_len: SHORT_TEXT_MAX_CHARS,
                    font_px: 24,
                    rect: RectSize::PerChar {
                        base: 34,
                        per_char: 24,
                        max_width: 34 + 24 * SHORT_TEXT_MAX_CHARS as i32,
                        height: 42,
                    },
                },
                SizingRule {
                    max_len: usize::MAX,
                    font_px: 16,
                    rect: RectSize::PerChar {
                        base: 0,
                        per_char: 20,
                        max_width: 400,
                        height: 50,
                    },
                },
            ],
        }
    }

    pub fn resolve(&self, text: &str) -> SizingRule {
        let len = text.chars().count();
        self.rules
            .iter()
            .find(|r| len <= r.max_len)
            .or_else(|| self.rules.last())
            .copied()
            .unwrap_or(SizingRule {
                max_len: usize::MAX,
                font_px: 16,
                rect: RectSize::Keep,
            })
    }

    pub fn rules(&self) -> &[SizingRule] {
        &self.rules
    }
}

// ── Annotation ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub screen_rect: ScreenRect,
    pub fill_color: Color,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_free_text: bool,
}

impl Annotation {
    /// The draggable guide.
    pub fn primary(screen_rect: ScreenRect, fill_color: Color) -> Self {
        Self {
            screen_rect,
            fill_color,
            text: String::new(),
            is_free_text: false,
        }
    }

    /// A fixed tag at `origin`, its rectangle sized by `table`.
    pub fn placed(
        text: impl Into<String>,
        color: Color,
        origin: ScreenPoint,
        table: &SizingTable,
    ) -> Self {
        let text = text.into();
        let len = text.chars().count();
        let default = ScreenRect::new(origin.x, origin.y, 58, 42);
        Self {
            screen_rect: table.resolve(&text).fit(default, &text),
            fill_color: color,
            is_free_text: len > SHORT_TEXT_MAX_CHARS,
            text,
        }
    }

    /// A palette tag at `origin`.
    pub fn from_tag(kind: TagKind, origin: ScreenPoint, table: &SizingTable) -> Self {
        let mut a = Self::placed(kind.label(), kind.color(), origin, table);
        a.is_free_text = false;
        a
    }

    /// Custom text tag in the default tag colour.
    pub fn custom_text(text: impl Into<String>, origin: ScreenPoint, table: &SizingTable) -> Self {
        let mut a = Self::placed(text, Color::TAG_ORANGE, origin, table);
        a.is_free_text = true;
        a
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

// ── Session ──────────────────────────────────────────────────────────────

/// Everything needed to burn one page: which page, where its viewport sits
/// on screen, and the annotations on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub page_index: usize,
    pub viewport_origin: ScreenPoint,
    pub primary: Annotation,
    #[serde(default)]
    pub placed: Vec<Annotation>,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, TaggerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| TaggerError::InvalidSession {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| TaggerError::InvalidSession {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}
