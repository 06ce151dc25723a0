//! Chip placement: quantize notes onto the measure/slot grid

use super::channel::Channel;
use super::grid::Grid;
use super::note::Note;
use super::sample::{SampleSelector, BGM_SAMPLE};
use crate::config::{ChartConfig, KitConfig};
use crate::dtx::MeasureGrid;
use crate::error::Result;
use log::{debug, warn};

/// One placed grid event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chip {
    pub channel: Channel,
    /// Start of the cell in seconds
    pub time: f64,
    /// 1-based measure
    pub measure: u32,
    /// 0-based slot within the measure
    pub slot: u32,
    /// Slots per measure on this channel
    pub resolution: u32,
    pub velocity: u8,
    pub sample_index: u16,
}

/// Placed chips and the grid rows they fill
#[derive(Debug, Clone, Default)]
pub struct ChipChart {
    /// Background chips first, then note chips in time order
    pub chips: Vec<Chip>,
    pub grid: MeasureGrid,
    /// Notes whose pitch has no channel
    pub unmapped: usize,
    /// Notes whose shifted start falls outside the grid
    pub unplaced: usize,
    /// Whether the background audio/video chips were placed
    pub background_placed: bool,
}

/// Latest note end, 0 for an empty list
pub fn end_time(notes: &[Note]) -> f64 {
    notes.iter().map(|note| note.end).fold(0.0, f64::max)
}

/// Copy of `notes` with each instrument's time correction applied once
pub fn apply_instrument_offsets(notes: &[Note], kit: &KitConfig) -> Vec<Note> {
    notes
        .iter()
        .map(|note| {
            let offset = note
                .instrument()
                .map(|inst| kit.get(inst).offset)
                .unwrap_or(0.0);
            if offset != 0.0 {
                note.shifted(offset)
            } else {
                *note
            }
        })
        .collect()
}

/// Places background and note chips for one configuration
pub struct ChipBuilder<'a> {
    config: &'a ChartConfig,
    selector: SampleSelector,
}

impl<'a> ChipBuilder<'a> {
    pub fn new(config: &'a ChartConfig) -> Result<Self> {
        Ok(Self {
            config,
            selector: SampleSelector::new(config.wav_splits)?,
        })
    }

    /// Background audio and video chips at the first cell at or after the music start
    pub fn background_chips(&self, bgm_grid: &Grid, shift: f64) -> Vec<Chip> {
        let target = shift + self.config.bgm_offset_time;
        let Some(cell) = bgm_grid.first_at_or_after(target) else {
            return Vec::new();
        };

        [Channel::BGM, Channel::VIDEO]
            .into_iter()
            .map(|channel| Chip {
                channel,
                time: cell.start,
                measure: cell.measure,
                slot: cell.slot,
                resolution: bgm_grid.resolution(),
                velocity: 0,
                sample_index: BGM_SAMPLE,
            })
            .collect()
    }

    /// Note chips in cell order; notes sharing a cell keep their input order.
    ///
    /// Returns the chips plus the counts of unmapped and unplaced notes.
    pub fn note_chips(&self, notes: &[Note], grid: &Grid, shift: f64) -> (Vec<Chip>, usize, usize) {
        let mut unmapped = 0;
        let mut unplaced = 0;
        let mut located: Vec<(usize, Chip)> = Vec::with_capacity(notes.len());

        for note in notes {
            let Some(channel) = Channel::for_pitch(note.pitch) else {
                unmapped += 1;
                continue;
            };
            let Some(idx) = grid.locate_index(note.start + shift) else {
                unplaced += 1;
                continue;
            };
            let cell = &grid.cells()[idx];
            located.push((
                idx,
                Chip {
                    channel,
                    time: cell.start,
                    measure: cell.measure,
                    slot: cell.slot,
                    resolution: grid.resolution(),
                    velocity: note.velocity,
                    sample_index: self.selector.sample_index(note.pitch, note.velocity),
                },
            ));
        }

        // Stable: equal cells keep note order, so the last note in a cell wins
        located.sort_by_key(|(idx, _)| *idx);
        let chips = located.into_iter().map(|(_, chip)| chip).collect();
        (chips, unmapped, unplaced)
    }

    /// Apply instrument offsets, place every chip and fill the grid
    pub fn build(&self, notes: &[Note], shift: f64) -> Result<ChipChart> {
        let notes = apply_instrument_offsets(notes, &self.config.kit);
        let duration = end_time(&notes) + shift.max(0.0);
        let chip_grid = Grid::new(self.config.bpm, self.config.chip_resolution, duration)?;
        let bgm_grid = Grid::new(self.config.bpm, self.config.bgm_resolution, duration)?;

        let mut chips = self.background_chips(&bgm_grid, shift);
        let background_placed = !chips.is_empty();
        if !background_placed {
            warn!(
                "Background chips not placed: music start {:.3}s is beyond the last measure",
                shift + self.config.bgm_offset_time
            );
        }

        let (note_chips, unmapped, unplaced) = self.note_chips(&notes, &chip_grid, shift);
        if unmapped > 0 {
            debug!("{} note(s) with pitches outside the kit dropped", unmapped);
        }
        if unplaced > 0 {
            debug!("{} note(s) outside the grid after shifting dropped", unplaced);
        }
        chips.extend(note_chips);

        let grid = fill_grid(&chips)?;
        Ok(ChipChart {
            chips,
            grid,
            unmapped,
            unplaced,
            background_placed,
        })
    }
}

/// Write chips into grid rows in order; later chips overwrite earlier ones
pub fn fill_grid(chips: &[Chip]) -> Result<MeasureGrid> {
    let mut grid = MeasureGrid::new();
    for chip in chips {
        grid.place(
            chip.measure,
            chip.channel,
            chip.resolution,
            chip.slot,
            chip.sample_index,
        )?;
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chip_resolution: u32, bgm_resolution: u32) -> ChartConfig {
        let mut config = ChartConfig::default();
        config.chip_resolution = chip_resolution;
        config.bgm_resolution = bgm_resolution;
        config
    }

    #[test]
    fn test_background_placement() {
        let config = config(4, 8);
        let builder = ChipBuilder::new(&config).unwrap();
        let grid = Grid::new(120.0, 8, 4.0).unwrap();

        let chips = builder.background_chips(&grid, 0.0);
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].channel, Channel::BGM);
        assert_eq!(chips[1].channel, Channel::VIDEO);
        assert_eq!((chips[0].measure, chips[0].slot), (1, 0));
        assert_eq!(chips[0].sample_index, 1);
        assert_eq!(chips[0].resolution, 8);

        // 1.0 - 0.03 rounds up to the cell at 1.0s
        let chips = builder.background_chips(&grid, 1.0);
        assert_eq!((chips[0].measure, chips[0].slot), (1, 4));

        assert!(builder.background_chips(&grid, 100.0).is_empty());
    }

    #[test]
    fn test_note_chips_sample_and_slot() {
        let config = config(4, 8);
        let builder = ChipBuilder::new(&config).unwrap();
        let grid = Grid::new(120.0, 4, 4.0).unwrap();
        let notes = [
            Note::new(38, 100, 0.6, 0.7),
            Note::new(36, 20, 0.1, 0.2),
            Note::new(60, 100, 0.1, 0.2),
        ];
        let (chips, unmapped, unplaced) = builder.note_chips(&notes, &grid, 0.0);
        assert_eq!(unmapped, 1);
        assert_eq!(unplaced, 0);
        assert_eq!(chips.len(), 2);
        // Ordered by cell: the bass drum at 0.1s comes first
        assert_eq!(chips[0].channel, Channel::BASS_DRUM);
        assert_eq!(chips[0].slot, 0);
        assert_eq!(chips[0].sample_index, 2 * 4 + 2 + 1);
        assert_eq!(chips[1].channel, Channel::SNARE);
        assert_eq!(chips[1].slot, 1);
        assert_eq!(chips[1].time, 0.5);
    }

    #[test]
    fn test_last_note_in_cell_wins() {
        let config = config(4, 8);
        let builder = ChipBuilder::new(&config).unwrap();
        let notes = [
            Note::new(36, 127, 0.1, 0.2),
            Note::new(36, 10, 0.2, 0.3),
        ];
        let chart = builder.build(&notes, 0.0).unwrap();
        let row = chart.grid.row(1, Channel::BASS_DRUM).unwrap();
        assert_eq!(row[0], builder.selector.sample_index(36, 10));
    }

    #[test]
    fn test_build_applies_offsets_once() {
        let mut config = config(4, 8);
        config.kit.snare.offset = 0.5;
        let builder = ChipBuilder::new(&config).unwrap();
        let notes = [Note::new(38, 100, 0.1, 0.2)];

        for _ in 0..2 {
            let chart = builder.build(&notes, 0.0).unwrap();
            let chip = chart.chips.iter().find(|c| c.channel == Channel::SNARE).unwrap();
            // 0.6s lands in slot 1 (0.5 .. 1.0)
            assert_eq!(chip.slot, 1);
        }
        assert_eq!(notes[0].start, 0.1);
    }

    #[test]
    fn test_shifted_note_lands_in_next_measure() {
        let config = config(4, 8);
        let builder = ChipBuilder::new(&config).unwrap();
        let notes = [Note::new(36, 100, 1.0, 1.1)];
        let chart = builder.build(&notes, 1.0).unwrap();
        let row = chart.grid.row(2, Channel::BASS_DRUM).unwrap();
        assert_eq!(row.len(), 4);
        assert_ne!(row[0], 0);
        assert_eq!(chart.unplaced, 0);
    }

    #[test]
    fn test_negative_time_dropped() {
        let config = config(4, 8);
        let builder = ChipBuilder::new(&config).unwrap();
        let notes = [Note::new(36, 100, 0.05, 0.1)];
        let chart = builder.build(&notes, -0.5).unwrap();
        assert_eq!(chart.unplaced, 1);
        assert!(chart.grid.row(1, Channel::BASS_DRUM).is_none());
    }

    #[test]
    fn test_row_lengths_match_resolution() {
        let config = config(12, 96);
        let builder = ChipBuilder::new(&config).unwrap();
        let notes: Vec<Note> = (0..40)
            .map(|i| Note::new([36, 38, 42, 49][i % 4], 90, i as f64 * 0.37, i as f64 * 0.37 + 0.1))
            .collect();
        let chart = builder.build(&notes, 0.2).unwrap();
        for (key, row) in chart.grid.iter() {
            let expected = if key.channel == Channel::BGM || key.channel == Channel::VIDEO {
                96
            } else {
                12
            };
            assert_eq!(row.len(), expected);
        }
        assert_eq!(chart.grid.occupied() + chart.unplaced, 40 + 2 - collisions(&chart.chips));
    }

    fn collisions(chips: &[Chip]) -> usize {
        let mut seen = std::collections::HashSet::new();
        chips
            .iter()
            .filter(|c| !seen.insert((c.measure, c.channel, c.slot)))
            .count()
    }
}
