//! Alignment search: global shift and downbeat anchor
//!
//! Both searches are exhaustive over small integer ranges and keep the first
//! candidate reaching the best score, so results are reproducible bit for bit.

use super::chip::end_time;
use super::grid::{measure_duration, Grid};
use super::note::{Instrument, Note};
use crate::config::ChartConfig;
use crate::error::Result;
use log::{debug, info};

/// Number of small-offset candidates (-0.10s ..= +0.09s)
pub const SHIFT_CANDIDATES: usize = 20;

/// Step between small-offset candidates in seconds
pub const SHIFT_STEP: f64 = 0.01;

/// Anchor indices tried by the anchor search (1-based)
pub const MAX_ANCHOR: usize = 5;

/// Small offset of candidate `i`
pub fn candidate_offset(i: usize) -> f64 {
    (i as f64 - 10.0) * SHIFT_STEP
}

/// Largest positive shift the small-offset search can produce
pub fn max_candidate_offset() -> f64 {
    candidate_offset(SHIFT_CANDIDATES - 1)
}

/// Shift that moves `nth_start` onto the start of its next measure
pub fn base_correction(measure_time: f64, nth_start: f64) -> f64 {
    measure_time * ((nth_start / measure_time).floor() + 1.0) - nth_start
}

/// Start time of the `nth` (1-based) reference note, `None` when unavailable
pub fn anchor_start(reference: &[Note], nth: usize) -> Option<f64> {
    if nth == 0 {
        return None;
    }
    reference.get(nth - 1).map(|note| note.start)
}

/// Base correction for anchor `nth`, zero when the anchor is disabled or out of range
pub fn anchor_correction(reference: &[Note], nth: usize, measure_time: f64) -> f64 {
    anchor_start(reference, nth)
        .map(|start| base_correction(measure_time, start))
        .unwrap_or(0.0)
}

/// Count reference notes landing in a slot-0 cell after shifting
pub fn score_shift(reference: &[Note], grid: &Grid, shift: f64) -> usize {
    reference
        .iter()
        .filter(|note| {
            grid.locate(note.start + shift)
                .is_some_and(|cell| cell.slot == 0)
        })
        .count()
}

/// Winner of the small-offset search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftSearch {
    /// Winning small offset (without base correction)
    pub offset: f64,
    /// Reference notes on a downbeat with that offset
    pub score: usize,
}

/// Try every small offset around the anchor's base correction.
///
/// Without a usable anchor the search measures from time zero, so the base is
/// one whole measure. Falls back to a zero offset when no candidate scores.
pub fn search_shift(reference: &[Note], grid: &Grid, measure_time: f64, nth: usize) -> ShiftSearch {
    let base = base_correction(measure_time, anchor_start(reference, nth).unwrap_or(0.0));

    let scores: Vec<usize> = (0..SHIFT_CANDIDATES)
        .map(|i| score_shift(reference, grid, candidate_offset(i) + base))
        .collect();
    debug!("shift scores (anchor {}): {:?}", nth, scores);

    let (index, score) = first_max(&scores);
    if score == 0 {
        // Nothing lands on a downbeat: no evidence for moving the notes
        return ShiftSearch { offset: 0.0, score };
    }
    ShiftSearch {
        offset: candidate_offset(index),
        score,
    }
}

/// Winner of the anchor search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorSearch {
    /// Winning 1-based anchor index
    pub anchor: usize,
    /// Best small-offset score with that anchor
    pub score: usize,
}

/// Try anchors `1..=MAX_ANCHOR`, scoring each with its own shift search
pub fn search_anchor(reference: &[Note], grid: &Grid, measure_time: f64) -> AnchorSearch {
    let scores: Vec<usize> = (1..=MAX_ANCHOR)
        .map(|nth| search_shift(reference, grid, measure_time, nth).score)
        .collect();
    debug!("anchor scores: {:?}", scores);

    let (index, score) = first_max(&scores);
    AnchorSearch {
        anchor: index + 1,
        score,
    }
}

/// Resolved global shift for one compilation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    /// Anchor index in effect (1-based, 0 when disabled)
    pub anchor: usize,
    /// Whether the anchor's base correction is part of `shift`
    pub anchor_applied: bool,
    /// Small offset, searched or taken from the configuration
    pub offset: f64,
    /// Correction moving the anchor onto a bar line (0 when not applied)
    pub base_correction: f64,
    /// Final shift added to every note start
    pub shift: f64,
    /// Winning score of the shift search, when it ran
    pub score: Option<usize>,
}

/// Bass drum notes sorted by start time
pub fn reference_notes(notes: &[Note]) -> Vec<Note> {
    let pitch = Instrument::REFERENCE.pitch();
    let mut reference: Vec<Note> = notes.iter().filter(|n| n.pitch == pitch).copied().collect();
    reference.sort_by(|a, b| a.start.total_cmp(&b.start));
    reference
}

/// Decide anchor and shift for `notes` (instrument offsets already applied)
pub fn resolve(config: &ChartConfig, notes: &[Note]) -> Result<Alignment> {
    let reference = reference_notes(notes);
    let measure_time = measure_duration(config.bpm);

    // Long enough for the largest candidate: one measure of correction plus the offset
    let span = end_time(notes) + measure_time + max_candidate_offset();
    let grid = Grid::new(config.bpm, config.chip_resolution, span)?;

    let anchor = if config.auto_align_nth_bd {
        let found = search_anchor(&reference, &grid, measure_time);
        info!("best anchor: bass drum #{} (score {})", found.anchor, found.score);
        found.anchor
    } else {
        config.align_nth_bd
    };

    let (offset, score) = if config.auto_shift_time {
        let found = search_shift(&reference, &grid, measure_time, anchor);
        info!("best shift offset: {:.2}s (score {})", found.offset, found.score);
        (found.offset, Some(found.score))
    } else {
        (config.shift_time, None)
    };

    let anchor_applied = anchor_start(&reference, anchor).is_some();
    if anchor > 0 && !anchor_applied {
        debug!(
            "anchor #{} skipped: only {} bass drum note(s)",
            anchor,
            reference.len()
        );
    }
    let base = anchor_correction(&reference, anchor, measure_time);

    Ok(Alignment {
        anchor,
        anchor_applied,
        offset,
        base_correction: base,
        shift: offset + base,
        score,
    })
}

/// Index and value of the first maximum; `(0, 0)` for an empty slice
fn first_max(scores: &[usize]) -> (usize, usize) {
    let mut best = (0, 0);
    for (i, &score) in scores.iter().enumerate() {
        if i == 0 || score > best.1 {
            best = (i, score);
        }
    }
    best
}
