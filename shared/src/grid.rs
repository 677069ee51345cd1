/// World coordinates beyond this are clamped before snapping to a grid. Past the world
/// border there is nothing to draw.
const COORD_LIMIT: f64 = 3.0e7;

/// A half-open rectangle of integer grid cells: `start..end` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub start_x: i64,
    pub start_y: i64,
    pub end_x: i64,
    pub end_y: i64,
}

impl GridRange {
    /// Cells of side `cell` needed to cover the world rectangle `(min_x, min_y)..(max_x, max_y)`.
    pub fn covering(min_x: f64, min_y: f64, max_x: f64, max_y: f64, cell: f64) -> Self {
        let snap = |v: f64, round: fn(f64) -> f64| -> i64 {
            if v.is_nan() {
                return 0;
            }
            round(v.clamp(-COORD_LIMIT, COORD_LIMIT) / cell) as i64
        };
        Self {
            start_x: snap(min_x, f64::floor),
            start_y: snap(min_y, f64::floor),
            end_x: snap(max_x, f64::ceil),
            end_y: snap(max_y, f64::ceil),
        }
    }

    pub fn width(&self) -> i64 {
        self.end_x - self.start_x
    }

    pub fn height(&self) -> i64 {
        self.end_y - self.start_y
    }

    pub fn cell_count(&self) -> i64 {
        self.width().max(0) * self.height().max(0)
    }

    /// Shrink the range symmetrically, one cell off each end of the longer axis at a time,
    /// until it holds at most `max_cells` cells. Ties shrink the y axis.
    pub fn bounded(mut self, max_cells: i64) -> Self {
        while self.cell_count() > max_cells.max(0) {
            if self.width() > self.height() {
                self.start_x += 1;
                self.end_x -= 1;
            } else {
                self.start_y += 1;
                self.end_y -= 1;
            }
        }
        self
    }

    /// Iterate cells column by column.
    pub fn cells(&self) -> impl Iterator<Item = (i64, i64)> + use<> {
        let (start_y, end_y) = (self.start_y, self.end_y);
        (self.start_x..self.end_x).flat_map(move |x| (start_y..end_y).map(move |y| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covering_snaps_outward() {
        let range = GridRange::covering(-10.0, 5.0, 300.0, 256.0, 256.0);
        assert_eq!(
            range,
            GridRange {
                start_x: -1,
                start_y: 0,
                end_x: 2,
                end_y: 1,
            }
        );
    }

    #[test]
    fn ten_by_ten_view_is_untouched() {
        let range = GridRange::covering(0.0, 0.0, 2560.0, 2560.0, 256.0).bounded(100);
        assert_eq!((range.start_x, range.end_x), (0, 10));
        assert_eq!((range.start_y, range.end_y), (0, 10));
        assert_eq!(range.cells().count(), 100);
    }

    #[test]
    fn wide_range_shrinks_long_axis_symmetrically() {
        let range = GridRange {
            start_x: 0,
            start_y: 0,
            end_x: 40,
            end_y: 4,
        }
        .bounded(100);
        assert_eq!((range.start_x, range.end_x), (8, 32));
        assert_eq!((range.start_y, range.end_y), (0, 4));
        assert!(range.cell_count() <= 100);
    }

    #[test]
    fn square_range_alternates_axes() {
        let range = GridRange {
            start_x: 0,
            start_y: 0,
            end_x: 12,
            end_y: 12,
        }
        .bounded(100);
        assert_eq!((range.start_x, range.end_x), (1, 11));
        assert_eq!((range.start_y, range.end_y), (1, 11));
    }

    #[test]
    fn tie_shrinks_y_first() {
        let range = GridRange {
            start_x: 0,
            start_y: 0,
            end_x: 11,
            end_y: 11,
        }
        .bounded(100);
        assert_eq!((range.width(), range.height()), (11, 9));
    }

    #[test]
    fn huge_ranges_terminate_within_bound() {
        let range = GridRange::covering(-1.0e15, -1.0e15, 1.0e15, 1.0e15, 256.0).bounded(100);
        assert!(range.cell_count() <= 100);
        assert!(range.width() > 0 && range.height() > 0);

        let strip = GridRange::covering(-1.0e9, 0.0, 1.0e9, 16.0, 16.0).bounded(256);
        assert_eq!(strip.height(), 1);
        assert!(strip.width() <= 256);
    }

    #[test]
    fn zero_ceiling_yields_empty_range() {
        let range = GridRange::covering(0.0, 0.0, 100.0, 100.0, 16.0).bounded(0);
        assert_eq!(range.cells().count(), 0);
    }
}
