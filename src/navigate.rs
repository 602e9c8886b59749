//! Stepping through detected transactions.
//!
//! The cursor walks the records of a [`TransactionSet`] in detection order
//! and wraps around at both ends. For the current record it yields where to
//! go: the page to display and the screen position for the guide overlay,
//! which is the viewport's screen origin plus the record's pixel anchor.

use crate::geometry::{to_screen, PixelPoint, ScreenPoint};
use crate::model::{TransactionRecord, TransactionSet};

/// Where to move the view for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpTarget {
    /// 0-indexed position in the set.
    pub index: usize,
    pub page_index: usize,
    /// Screen position of the guide overlay's top-left corner.
    pub overlay_origin: ScreenPoint,
}

/// A wrap-around cursor over the records of a set.
#[derive(Debug, Clone)]
pub struct TransactionCursor<'a> {
    records: &'a [TransactionRecord],
    current: Option<usize>,
}

impl<'a> TransactionCursor<'a> {
    /// A cursor before the first record.
    pub fn new(set: &'a TransactionSet) -> Self {
        Self::over(&set.records)
    }

    pub fn over(records: &'a [TransactionRecord]) -> Self {
        Self {
            records,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&'a TransactionRecord> {
        self.current.and_then(|i| self.records.get(i))
    }

    /// Move to record `index` (taken modulo the record count).
    pub fn seek(&mut self, index: usize) -> Option<&'a TransactionRecord> {
        if self.records.is_empty() {
            return None;
        }
        self.current = Some(index % self.records.len());
        self.current()
    }

    /// Advance, wrapping from the last record to the first.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'a TransactionRecord> {
        let next = match self.current {
            Some(i) => i + 1,
            None => 0,
        };
        self.seek(next)
    }

    /// Step back, wrapping from the first record to the last.
    pub fn previous(&mut self) -> Option<&'a TransactionRecord> {
        let len = self.records.len();
        if len == 0 {
            return None;
        }
        let prev = match self.current {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.seek(prev)
    }

    /// Jump target for the current record given where the page's viewport
    /// sits on screen.
    pub fn jump_target(&self, viewport_origin: ScreenPoint) -> Option<JumpTarget> {
        let index = self.current?;
        let record = self.records.get(index)?;
        Some(JumpTarget {
            index,
            page_index: record.page_index,
            overlay_origin: to_screen(
                PixelPoint::new(record.pixel_x, record.pixel_y),
                viewport_origin,
            ),
        })
    }

    /// `Position 3/12`, or an empty string before the first step.
    pub fn status(&self) -> String {
        match self.current {
            Some(i) => format!("Position {}/{}", i + 1, self.records.len()),
            None => String::new(),
        }
    }
}
