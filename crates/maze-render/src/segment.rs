//! Screen partitioning into per-worker segments.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// How the screen is cut into segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentLayout {
    /// Full-height vertical strips.
    #[default]
    Columns,
    /// Full-width horizontal strips.
    Rows,
}

/// A rectangular screen region rendered by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Segment index, reported back when the segment is done.
    pub id: usize,
    /// Left screen column.
    pub x: usize,
    /// Top screen row.
    pub y: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Segment {
    /// Number of pixels in the segment.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Whether the segment has no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset of segment row `row` in a BGRA frame `screen_width` wide.
    #[inline]
    pub fn row_offset(&self, row: usize, screen_width: usize) -> usize {
        ((self.y + row) * screen_width + self.x) * 4
    }
}

/// Split a `width` x `height` screen into `workers` equal disjoint segments.
pub fn partition(
    width: usize,
    height: usize,
    workers: usize,
    layout: SegmentLayout,
) -> Result<Vec<Segment>> {
    let extent = match layout {
        SegmentLayout::Columns => width,
        SegmentLayout::Rows => height,
    };
    if workers == 0 || extent % workers != 0 {
        return Err(RenderError::IndivisibleSegments { extent, workers });
    }
    let step = extent / workers;

    let segments = (0..workers)
        .map(|id| match layout {
            SegmentLayout::Columns => Segment {
                id,
                x: id * step,
                y: 0,
                width: step,
                height,
            },
            SegmentLayout::Rows => Segment {
                id,
                x: 0,
                y: id * step,
                width,
                height: step,
            },
        })
        .collect();
    Ok(segments)
}
