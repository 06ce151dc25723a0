//! Measure-channel grid: fixed-length slot rows keyed by `(measure, channel)`

use crate::compiler::channel::Channel;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Highest measure a three-digit measure field can address
pub const MAX_MEASURE: u32 = 999;

/// Row key; ordering matches the lexical order of the `MMMCC` line prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridKey {
    pub measure: u32,
    pub channel: Channel,
}

/// Sample index rows of a chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasureGrid {
    rows: BTreeMap<GridKey, Vec<u16>>,
}

impl MeasureGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `sample` into one slot, creating the row if needed.
    ///
    /// A row whose length differs from `resolution` is re-initialised only while
    /// it is still empty; replacing live data is an error.
    pub fn place(
        &mut self,
        measure: u32,
        channel: Channel,
        resolution: u32,
        slot: u32,
        sample: u16,
    ) -> Result<()> {
        check_measure(measure)?;
        if slot >= resolution {
            return Err(Error::Grid(format!(
                "slot {} out of range for resolution {} (measure {}, channel {})",
                slot, resolution, measure, channel
            )));
        }

        let len = resolution as usize;
        let row = self
            .rows
            .entry(GridKey { measure, channel })
            .or_insert_with(|| vec![0; len]);
        if row.len() != len {
            if row.iter().any(|&s| s != 0) {
                return Err(Error::Grid(format!(
                    "measure {} channel {} already has resolution {}, cannot change to {}",
                    measure,
                    channel,
                    row.len(),
                    resolution
                )));
            }
            *row = vec![0; len];
        }
        row[slot as usize] = sample;
        Ok(())
    }

    /// Insert a whole row, replacing any previous one
    pub fn insert_row(&mut self, measure: u32, channel: Channel, slots: Vec<u16>) -> Result<()> {
        check_measure(measure)?;
        if slots.is_empty() {
            return Err(Error::Grid(format!(
                "measure {} channel {} has no slots",
                measure, channel
            )));
        }
        self.rows.insert(GridKey { measure, channel }, slots);
        Ok(())
    }

    pub fn row(&self, measure: u32, channel: Channel) -> Option<&[u16]> {
        self.rows
            .get(&GridKey { measure, channel })
            .map(|row| row.as_slice())
    }

    /// Rows in output order
    pub fn iter(&self) -> impl Iterator<Item = (&GridKey, &[u16])> {
        self.rows.iter().map(|(key, row)| (key, row.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of non-empty slots across all rows
    pub fn occupied(&self) -> usize {
        self.rows
            .values()
            .map(|row| row.iter().filter(|&&s| s != 0).count())
            .sum()
    }
}

fn check_measure(measure: u32) -> Result<()> {
    if measure > MAX_MEASURE {
        return Err(Error::Grid(format!(
            "measure {} exceeds the last addressable measure {}",
            measure, MAX_MEASURE
        )));
    }
    Ok(())
}
