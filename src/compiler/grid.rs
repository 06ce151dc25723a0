//! Grid clock: measure/slot time windows for a fixed tempo

use crate::dtx::grid::MAX_MEASURE;
use crate::error::{Error, Result};

/// Beats per measure (4/4 only)
pub const BEATS_PER_MEASURE: f64 = 4.0;

/// One half-open time window `[start, end)` of the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub start: f64,
    pub end: f64,
    /// 1-based measure number
    pub measure: u32,
    /// 0-based slot within the measure
    pub slot: u32,
}

/// Largest grid that can be built: every addressable measure plus the
/// alignment search margin (one measure of base correction and the offset)
pub const MAX_GRID_MEASURES: u64 = MAX_MEASURE as u64 + 2;

/// Duration of one measure in seconds
pub fn measure_duration(bpm: f64) -> f64 {
    60.0 * BEATS_PER_MEASURE / bpm
}

/// Enumerate every slot of the piece in time order
pub fn build_grid(bpm: f64, resolution: u32, total_duration: f64) -> Result<Vec<GridCell>> {
    if !(bpm > 0.0) || !bpm.is_finite() {
        return Err(Error::InvalidConfig(format!("bpm must be positive, got {}", bpm)));
    }
    if resolution == 0 {
        return Err(Error::InvalidConfig("resolution must be positive".into()));
    }

    let measure_time = measure_duration(bpm);
    let measures = (total_duration.max(0.0) / measure_time).floor() + 1.0;
    if !measures.is_finite() || measures > MAX_GRID_MEASURES as f64 {
        return Err(Error::Grid(format!(
            "{:.3}s needs {} measures at {} BPM, more than {}",
            total_duration, measures, bpm, MAX_MEASURE
        )));
    }
    let measures = measures as u64;
    let count = measures * resolution as u64;
    let step = measure_time / resolution as f64;

    let cells = (0..count)
        .map(|i| GridCell {
            start: step * i as f64,
            end: step * (i + 1) as f64,
            measure: (i / resolution as u64) as u32 + 1,
            slot: (i % resolution as u64) as u32,
        })
        .collect();

    Ok(cells)
}

/// Grid cells with time lookup
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<GridCell>,
    resolution: u32,
}

impl Grid {
    pub fn new(bpm: f64, resolution: u32, total_duration: f64) -> Result<Self> {
        Ok(Self {
            cells: build_grid(bpm, resolution, total_duration)?,
            resolution,
        })
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Position of the cell whose window contains `time`
    pub fn locate_index(&self, time: f64) -> Option<usize> {
        // Cells are contiguous: end of cell i is bit-identical to start of cell i+1
        let idx = self.cells.partition_point(|cell| cell.end <= time);
        let cell = self.cells.get(idx)?;
        (time >= cell.start && time < cell.end).then_some(idx)
    }

    /// Cell whose window contains `time`
    pub fn locate(&self, time: f64) -> Option<&GridCell> {
        self.locate_index(time).map(|idx| &self.cells[idx])
    }

    /// First cell starting at or after `time`
    pub fn first_at_or_after(&self, time: f64) -> Option<&GridCell> {
        let idx = self.cells.partition_point(|cell| cell.start < time);
        self.cells.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_duration() {
        assert_eq!(measure_duration(120.0), 2.0);
        assert_eq!(measure_duration(60.0), 4.0);
    }

    #[test]
    fn test_grid_shape() {
        let cells = build_grid(120.0, 4, 3.0).unwrap();
        // floor(3.0 / 2.0) + 1 = 2 measures
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[0].measure, 1);
        assert_eq!(cells[3].slot, 3);
        assert_eq!(cells[4].measure, 2);
        assert_eq!(cells[4].slot, 0);
        assert_eq!(cells[4].start, 2.0);
        assert_eq!(cells[7].end, 4.0);
    }

    #[test]
    fn test_grid_contiguous() {
        let cells = build_grid(137.0, 48, 20.0).unwrap();
        for pair in cells.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn test_grid_rejects_bad_input() {
        assert!(build_grid(0.0, 4, 1.0).is_err());
        assert!(build_grid(-10.0, 4, 1.0).is_err());
        assert!(build_grid(f64::NAN, 4, 1.0).is_err());
        assert!(build_grid(120.0, 0, 1.0).is_err());
    }

    #[test]
    fn test_grid_size_limit() {
        // 1001 measures is the search margin past measure 999
        assert_eq!(build_grid(120.0, 1, 2000.0).unwrap().len(), 1001);
        assert!(matches!(build_grid(120.0, 1, 2002.0), Err(Error::Grid(_))));
        assert!(matches!(build_grid(120.0, 32, 1.0e9), Err(Error::Grid(_))));
        assert!(matches!(build_grid(120.0, 32, f64::INFINITY), Err(Error::Grid(_))));
    }

    #[test]
    fn test_empty_piece_has_one_measure() {
        let cells = build_grid(120.0, 16, 0.0).unwrap();
        assert_eq!(cells.len(), 16);
    }

    #[test]
    fn test_locate() {
        let grid = Grid::new(120.0, 4, 3.0).unwrap();
        assert_eq!(grid.locate(0.0).unwrap().slot, 0);
        assert_eq!(grid.locate(0.49).unwrap().slot, 0);
        assert_eq!(grid.locate(0.5).unwrap().slot, 1);
        let cell = grid.locate(2.0).unwrap();
        assert_eq!((cell.measure, cell.slot), (2, 0));
        assert!(grid.locate(-0.01).is_none());
        assert!(grid.locate(4.0).is_none());
    }

    #[test]
    fn test_first_at_or_after() {
        let grid = Grid::new(120.0, 8, 3.0).unwrap();
        let cell = grid.first_at_or_after(-0.03).unwrap();
        assert_eq!((cell.measure, cell.slot), (1, 0));
        let cell = grid.first_at_or_after(0.97).unwrap();
        assert_eq!((cell.measure, cell.slot), (1, 4));
        assert!(grid.first_at_or_after(4.01).is_none());
    }
}
