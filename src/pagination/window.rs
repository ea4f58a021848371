use std::ops::Range;

use crate::pagination::cursor::Anchor;

/// The slice of the version axis served by one page plus its navigation hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    /// Absolute indices into the stability-filtered series.
    pub range: Range<usize>,
    /// Index whose version is the cursor of the opposite page, if one is worth emitting.
    pub prev_index: Option<usize>,
    /// More material exists beyond the page in the scroll direction.
    pub has_more: bool,
}

impl PageWindow {
    /// Derives a page of at most `page_size` elements from an anchor on an axis of
    /// `len` versions.
    ///
    /// A backward cursor that would point outside the axis, or reproduce this page, is
    /// discarded.
    pub fn select(len: usize, page_size: usize, anchor: Anchor) -> Self {
        match anchor {
            Anchor::Start(start) => {
                let start = start.min(len);
                let end = len.min(start.saturating_add(page_size));
                let prev_index = start
                    .checked_sub(page_size.saturating_add(1))
                    .filter(|&p| p != start);
                Self {
                    range: start..end,
                    prev_index,
                    has_more: end != len,
                }
            }
            Anchor::End(end) => {
                let end = end.min(len);
                let start = end.saturating_sub(page_size);
                let prev_index = end
                    .checked_add(page_size)
                    .filter(|&p| p < len && p != start);
                Self {
                    range: start..end,
                    prev_index,
                    has_more: start != 0,
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}
