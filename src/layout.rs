//! Grid arrangement used by "center all".

use crate::model::Position;
use serde::{Deserialize, Serialize};

/// Visible size of the canvas container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Fixed-size grid cells. Real blocks may be wider; the grid only needs to be stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub table_width: f64,
    pub spacing: f64,
    /// Height assumed per row when centering vertically.
    pub row_height: f64,
    /// Vertical distance between row origins.
    pub row_pitch: f64,
    pub margin: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            table_width: 220.0,
            spacing: 40.0,
            row_height: 200.0,
            row_pitch: 220.0,
            margin: 20.0,
        }
    }
}

impl GridLayout {
    pub fn columns(&self, viewport: Viewport) -> usize {
        let cell = self.table_width + self.spacing;
        // Narrow viewports still get one column
        ((viewport.width / cell).floor() as usize).max(1)
    }

    /// Positions for `count` tables, in store order, centered in the viewport.
    pub fn arrange(&self, count: usize, viewport: Viewport) -> Vec<Position> {
        if count == 0 {
            return Vec::new();
        }

        let cell = self.table_width + self.spacing;
        let per_row = self.columns(viewport);
        let rows = count.div_ceil(per_row);

        let total_width = count.min(per_row) as f64 * cell - self.spacing;
        let total_height = rows as f64 * self.row_height;

        let start_x = self.margin.max((viewport.width - total_width) / 2.0);
        let start_y = self.margin.max((viewport.height - total_height) / 2.0);

        (0..count)
            .map(|i| {
                let row = i / per_row;
                let col = i % per_row;
                Position::new(
                    start_x + col as f64 * cell,
                    start_y + row as f64 * self.row_pitch,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layout() {
        let grid = GridLayout::default();
        assert!(grid.arrange(0, Viewport::new(800.0, 600.0)).is_empty());
    }

    #[test]
    fn test_single_row_is_centered() {
        let grid = GridLayout::default();
        let positions = grid.arrange(2, Viewport::new(1000.0, 600.0));
        // Two cells: 2 * 260 - 40 = 480 wide, 200 tall
        assert_eq!(positions[0], Position::new(260.0, 200.0));
        assert_eq!(positions[1], Position::new(520.0, 200.0));
    }

    #[test]
    fn test_wraps_rows() {
        let grid = GridLayout::default();
        let viewport = Viewport::new(800.0, 600.0);
        assert_eq!(grid.columns(viewport), 3);

        let positions = grid.arrange(5, viewport);
        assert_eq!(positions.len(), 5);
        assert_eq!(positions[3].x, positions[0].x);
        assert_eq!(positions[3].y - positions[0].y, 220.0);
        // 400 tall grid in a 600 viewport
        assert_eq!(positions[0].y, 100.0);
    }

    #[test]
    fn test_narrow_viewport_never_negative() {
        let grid = GridLayout::default();
        let viewport = Viewport::new(100.0, 50.0);
        assert_eq!(grid.columns(viewport), 1);

        let positions = grid.arrange(3, viewport);
        for p in &positions {
            assert!(p.x >= 0.0 && p.y >= 0.0);
        }
        assert_eq!(positions[0], Position::new(20.0, 20.0));
        assert_eq!(positions[2], Position::new(20.0, 460.0));
    }
}
