//! Keeping the active transcript row on screen.

/// The visible part of the transcript pane, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub offset: f32,
    pub height: f32,
}

/// Row geometry shared by the transcript layout and the scroll math. Rows
/// are laid out at exactly these heights, so offsets computed here land on
/// the row the layout drew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    /// Height of one line of segment text.
    pub line_height: f32,
    /// Timestamp label plus padding around the text.
    pub chrome: f32,
    /// Gap between rows.
    pub spacing: f32,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            line_height: 22.0,
            chrome: 34.0,
            spacing: 4.0,
        }
    }
}

impl RowMetrics {
    pub fn row_height(&self, lines: usize) -> f32 {
        self.chrome + lines.max(1) as f32 * self.line_height
    }
}

/// Where a row sits inside the scrollable content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBox {
    pub top: f32,
    pub height: f32,
}

impl RowBox {
    /// Box of a `lines`-line row stacked below rows with the `above` line counts.
    pub fn stacked(
        metrics: RowMetrics,
        above: impl IntoIterator<Item = usize>,
        lines: usize,
    ) -> Self {
        let top: f32 = above
            .into_iter()
            .map(|above| metrics.row_height(above) + metrics.spacing)
            .sum();
        Self {
            top,
            height: metrics.row_height(lines),
        }
    }
}

/// Offset that centers `row`, or `None` if it is already fully visible.
pub fn center_offset(viewport: Viewport, row: RowBox) -> Option<f32> {
    let bottom = viewport.offset + viewport.height;
    if row.top >= viewport.offset && row.top + row.height <= bottom {
        return None;
    }
    Some((row.top - viewport.height / 2.0 + row.height / 2.0).max(0.0))
}
