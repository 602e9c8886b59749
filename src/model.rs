//! Extraction data model: character samples, the per-page text index, and
//! the transaction records produced from them.
//!
//! [`TransactionSet`] is the unit of persistence (see
//! [`crate::pipeline::cache`]). Field names serialise in camelCase; serde
//! aliases accept the PascalCase layout written by earlier versions of the
//! tool so existing side-car files keep loading.
//!
//! Compatibility is one-way: files written here use the camelCase names
//! (`pixelX`, `rawText`, ...) and cannot be read by those earlier versions.

use crate::geometry::PointRect;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

// ── Character samples ────────────────────────────────────────────────────

/// One decoded character of a page together with its bounding box.
///
/// `index` is the position in the raw character stream of the page, including
/// zero codepoints that never make it into the page text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterSample {
    pub index: usize,
    pub codepoint: u32,
    pub bounds: Option<PointRect>,
}

impl CharacterSample {
    pub fn new(index: usize, codepoint: u32, bounds: Option<PointRect>) -> Self {
        Self {
            index,
            codepoint,
            bounds,
        }
    }
}

/// The text of one page with every text character tied to the sample it came
/// from.
///
/// Zero codepoints (ligature parts, invisible markers) are skipped. Because
/// the sample is stored next to its text position, looking up the box for a
/// string position can never pick up a neighbour's box when earlier samples
/// were skipped or had no geometry.
#[derive(Debug, Clone, Default)]
pub struct PageTextIndex {
    text: String,
    /// Byte offset in `text` of each entry in `samples`, strictly increasing.
    byte_offsets: Vec<usize>,
    samples: Vec<CharacterSample>,
}

impl PageTextIndex {
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = CharacterSample>,
    {
        let mut index = Self::default();
        for sample in samples {
            if sample.codepoint == 0 {
                continue;
            }
            let ch = char::from_u32(sample.codepoint).unwrap_or(char::REPLACEMENT_CHARACTER);
            index.byte_offsets.push(index.text.len());
            index.text.push(ch);
            index.samples.push(sample);
        }
        index
    }

    /// Build an index from plain text where every character gets `bounds_of(i)`
    /// (`i` counts characters). Handy for synthetic pages.
    pub fn from_text<F>(text: &str, mut bounds_of: F) -> Self
    where
        F: FnMut(usize) -> Option<PointRect>,
    {
        Self::from_samples(
            text.chars()
                .enumerate()
                .map(|(i, c)| CharacterSample::new(i, c as u32, bounds_of(i))),
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of characters in the page text.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The sample whose character starts at byte offset `byte` of [`Self::text`].
    pub fn sample_at_byte(&self, byte: usize) -> Option<&CharacterSample> {
        self.byte_offsets
            .binary_search(&byte)
            .ok()
            .map(|pos| &self.samples[pos])
    }

    /// Up to `max_chars` characters of the text starting at byte offset `byte`.
    pub fn window(&self, byte: usize, max_chars: usize) -> &str {
        let Some(tail) = self.text.get(byte..) else {
            return "";
        };
        match tail.char_indices().nth(max_chars) {
            Some((end, _)) => &tail[..end],
            None => tail,
        }
    }

    /// `(string position, x, y)` for every character that has a bounding box.
    pub fn positions(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.bounds.map(|b| (i, b.left, b.top)))
    }
}

// ── Amount ───────────────────────────────────────────────────────────────

/// A monetary amount in fixed-point cents.
///
/// Serialised as a JSON number with two fraction digits (`1234.56`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    cents: i64,
}

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Parse a normalised decimal string (`-1234.56`, `12`, `0.5`).
    ///
    /// At most two fraction digits are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || frac.len() > 2 {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let whole: i64 = whole.parse().ok()?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };
        let cents = whole.checked_mul(100)?.checked_add(frac)?;
        Some(Self::from_cents(if negative { -cents } else { cents }))
    }

    fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = f64::deserialize(deserializer)?;
        if !v.is_finite() {
            return Err(serde::de::Error::custom("amount must be finite"));
        }
        Ok(Self::from_cents((v * 100.0).round() as i64))
    }
}

// ── Records ──────────────────────────────────────────────────────────────

/// One detected transaction, anchored at its date in raster pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(alias = "PageIndex")]
    pub page_index: usize,
    #[serde(alias = "X")]
    pub pixel_x: i32,
    #[serde(alias = "Y")]
    pub pixel_y: i32,
    #[serde(alias = "TransactionText", default, deserialize_with = "null_as_empty")]
    pub raw_text: String,
    #[serde(alias = "Date", default, with = "optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(alias = "Amount", default)]
    pub amount: Option<Amount>,
}

/// All transactions of one document, as produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSet {
    #[serde(alias = "PdfHash")]
    pub content_hash: String,
    #[serde(alias = "OriginalFilePath")]
    pub source_path: PathBuf,
    #[serde(alias = "AnalyzedAt", deserialize_with = "lenient_timestamp")]
    pub analyzed_at: DateTime<Utc>,
    #[serde(alias = "Transactions", default)]
    pub records: Vec<TransactionRecord>,
}

impl TransactionSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records on page `page_index`, in detection order.
    pub fn on_page(&self, page_index: usize) -> impl Iterator<Item = &TransactionRecord> + '_ {
        self.records
            .iter()
            .filter(move |r| r.page_index == page_index)
    }
}

// ── Serde helpers ────────────────────────────────────────────────────────

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps with an offset are taken as-is; bare local timestamps
/// (`2024-05-01T10:22:33.1234567`) are interpreted in the local zone.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(serde::de::Error::custom)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid local timestamp '{s}'")))
}

/// `Option<NaiveDate>` written as `YYYY-MM-DD`; also reads midnight
/// timestamps (`2024-03-12T00:00:00`).
mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        let day = raw.split('T').next().unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
