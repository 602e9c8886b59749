//! Transaction detection: find dated entries in a page's text and anchor
//! them in raster pixels.
//!
//! Every match of the date pattern becomes one record. The amount is the
//! first amount-shaped token in a fixed window of text that *starts* at the
//! date, so it is only ever searched forwards. Dates and amounts that do not
//! parse leave their field empty; the record is still emitted. A date whose
//! first character has no bounding box cannot be placed on the page and is
//! dropped without error.

use crate::config::TaggerConfig;
use crate::geometry::points_to_pixels;
use crate::model::{Amount, PageTextIndex, TransactionRecord};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// `dd.MM.yy` or `dd.MM.yyyy` (three-digit years match but never parse).
static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2}\.\d{2}\.\d{2,4})\b").unwrap());

/// `1.234,56`, `-45,00`, optionally followed by a euro sign.
static RE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d{1,3}(?:\.\d{3})*,\d{2})\s*€?").unwrap());

/// Two-digit years up to this value are in the 2000s, the rest in the 1900s.
const TWO_DIGIT_YEAR_PIVOT: i32 = 49;

/// Scans page text for transactions.
#[derive(Debug, Clone, Copy)]
pub struct TransactionDetector {
    dpi: u32,
    window_chars: usize,
}

impl TransactionDetector {
    pub fn new(dpi: u32, window_chars: usize) -> Self {
        Self { dpi, window_chars }
    }

    pub fn from_config(config: &TaggerConfig) -> Self {
        Self::new(config.dpi, config.amount_window_chars)
    }

    /// Detect all transactions on one page.
    pub fn detect(&self, page: &PageTextIndex, page_index: usize) -> Vec<TransactionRecord> {
        let text = page.text();
        let mut records = Vec::new();

        for m in RE_DATE.find_iter(text) {
            let Some(anchor) = page.sample_at_byte(m.start()).and_then(|s| s.bounds) else {
                trace!(
                    "Dropping date '{}' on page {}: anchor has no bounding box",
                    m.as_str(),
                    page_index + 1
                );
                continue;
            };

            let window = page.window(m.start(), self.window_chars);
            records.push(TransactionRecord {
                page_index,
                pixel_x: points_to_pixels(anchor.left, self.dpi),
                pixel_y: points_to_pixels(anchor.top, self.dpi),
                raw_text: window.trim().to_string(),
                date: parse_date(m.as_str()),
                amount: find_amount(window),
            });
        }

        debug!(
            "Page {}: {} transactions in {} chars",
            page_index + 1,
            records.len(),
            page.len()
        );
        records
    }
}

/// First amount in `window`, normalised from `1.234,56` to fixed point.
fn find_amount(window: &str) -> Option<Amount> {
    let caps = RE_AMOUNT.captures(window)?;
    let normalised = caps[1].replace('.', "").replace(',', ".");
    Amount::parse(&normalised)
}

/// Parse `dd.MM.yyyy`, then `dd.MM.yy`.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('.');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || day.len() != 2 || month.len() != 2 {
        return None;
    }
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = match year.len() {
        4 => year.parse().ok().filter(|y| *y >= 1)?,
        2 => {
            let yy: i32 = year.parse().ok()?;
            if yy <= TWO_DIGIT_YEAR_PIVOT {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointRect;
    use crate::model::CharacterSample;

    const DPI: u32 = 150;

    /// Each character is 6pt wide on a line whose top is at 200pt.
    fn line_box(i: usize) -> Option<PointRect> {
        Some(PointRect::new(50.0 + i as f64 * 6.0, 200.0, 6.0, 10.0))
    }

    fn detector() -> TransactionDetector {
        TransactionDetector::new(DPI, 100)
    }

    #[test]
    fn date_and_amount_on_one_line() {
        let page = PageTextIndex::from_text("12.03.2024 Miete Wohnung 1.234,56 €", line_box);
        let records = detector().detect(&page, 0);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(r.amount, Some(Amount::from_cents(123456)));
        // 50pt * 150/72 = 104.17 → 104; 200pt → 416.67 → 417
        assert_eq!(r.pixel_x, 104);
        assert_eq!(r.pixel_y, 417);
        assert_eq!(r.page_index, 0);
        assert_eq!(r.raw_text, "12.03.2024 Miete Wohnung 1.234,56 €");
    }

    #[test]
    fn anchor_is_the_first_character_of_the_date() {
        let page = PageTextIndex::from_text("Buchung 01.04.2024 Gehalt 2.500,00", line_box);
        let records = detector().detect(&page, 2);
        assert_eq!(records.len(), 1);
        // Date starts at char 8 → x = 50 + 48 = 98pt → 204.17 → 204
        assert_eq!(records[0].pixel_x, 204);
        assert_eq!(records[0].page_index, 2);
    }

    #[test]
    fn anchor_without_box_is_dropped() {
        let page = PageTextIndex::from_text("12.03.2024 Miete 1.234,56", |i| {
            if i == 0 {
                None
            } else {
                line_box(i)
            }
        });
        assert!(detector().detect(&page, 0).is_empty());
    }

    #[test]
    fn only_the_first_character_needs_a_box() {
        let page = PageTextIndex::from_text("12.03.2024 Miete 1.234,56", |i| {
            if i == 0 {
                line_box(0)
            } else {
                None
            }
        });
        assert_eq!(detector().detect(&page, 0).len(), 1);
    }

    #[test]
    fn skipped_zero_codepoints_do_not_shift_the_anchor() {
        // A zero codepoint and a box-less character precede the date in the
        // raw stream; the anchor must still be the '1' of the date.
        let mut samples = vec![
            CharacterSample::new(0, 0, None),
            CharacterSample::new(1, 'X' as u32, None),
            CharacterSample::new(2, ' ' as u32, line_box(1)),
        ];
        for (i, c) in "05.06.2023 Strom 80,00".chars().enumerate() {
            samples.push(CharacterSample::new(3 + i, c as u32, line_box(10 + i)));
        }
        let page = PageTextIndex::from_samples(samples);
        let records = detector().detect(&page, 0);
        assert_eq!(records.len(), 1);
        // line_box(10).left = 110pt → 229.17 → 229
        assert_eq!(records[0].pixel_x, 229);
        assert_eq!(records[0].amount, Some(Amount::from_cents(8000)));
    }

    #[test]
    fn missing_amount_still_emits_record() {
        let page = PageTextIndex::from_text("12.03.2024 Kontostand", line_box);
        let records = detector().detect(&page, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, None);
    }

    #[test]
    fn invalid_date_still_emits_record() {
        let page = PageTextIndex::from_text("31.02.2024 Gebühr 5,00", line_box);
        let records = detector().detect(&page, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, None);
        assert_eq!(records[0].amount, Some(Amount::from_cents(500)));
    }

    #[test]
    fn two_digit_year_pivot() {
        assert_eq!(parse_date("01.02.49"), NaiveDate::from_ymd_opt(2049, 2, 1));
        assert_eq!(parse_date("01.02.50"), NaiveDate::from_ymd_opt(1950, 2, 1));
        assert_eq!(parse_date("01.02.202"), None);
        assert_eq!(parse_date("01.13.2024"), None);
    }

    #[test]
    fn negative_amount() {
        let page = PageTextIndex::from_text("02.01.2024 Lastschrift -45,90 €", line_box);
        let records = detector().detect(&page, 0);
        assert_eq!(records[0].amount, Some(Amount::from_cents(-4590)));
    }

    #[test]
    fn amount_is_searched_forwards_only() {
        let page = PageTextIndex::from_text("1.234,56 € 12.03.2024 Text", line_box);
        let records = detector().detect(&page, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, None);
    }

    #[test]
    fn amount_outside_window_is_ignored() {
        let filler = "x".repeat(120);
        let text = format!("12.03.2024 {filler} 9,99");
        let page = PageTextIndex::from_text(&text, line_box);
        let records = TransactionDetector::new(DPI, 100).detect(&page, 0);
        assert_eq!(records[0].amount, None);
        assert_eq!(records[0].raw_text.chars().count(), 100);

        let wide = TransactionDetector::new(DPI, 200).detect(&page, 0);
        assert_eq!(wide[0].amount, Some(Amount::from_cents(999)));
    }

    #[test]
    fn every_date_match_is_its_own_record() {
        let page = PageTextIndex::from_text("03.01.2024 03.01.2024 Zins 0,12", line_box);
        let records = detector().detect(&page, 0);
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].pixel_x, records[1].pixel_x);
        // Both windows reach the same amount.
        assert!(records.iter().all(|r| r.amount == Some(Amount::from_cents(12))));
    }

    #[test]
    fn dates_embedded_in_words_do_not_match() {
        let page = PageTextIndex::from_text("Ref12.03.2024 7,00", line_box);
        assert!(detector().detect(&page, 0).is_empty());
    }

    #[test]
    fn dpi_is_threaded_through() {
        let page = PageTextIndex::from_text("12.03.2024", line_box);
        let r = TransactionDetector::new(72, 100).detect(&page, 0);
        assert_eq!((r[0].pixel_x, r[0].pixel_y), (50, 200));
    }
}
