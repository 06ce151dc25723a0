//! Chart compiler - turns drum notes into a DTX chart
//!
//! Pipeline: instrument offsets, alignment search, chip placement, serialization.

pub mod align;
pub mod channel;
pub mod chip;
pub mod grid;
pub mod note;
pub mod sample;

use crate::config::ChartConfig;
use crate::dtx::{self, MeasureGrid};
use crate::error::{Error, Result};
use crate::input;
use crate::preview;
use align::Alignment;
use chip::{apply_instrument_offsets, Chip, ChipBuilder};
use log::{info, warn};
use note::Note;
use std::path::Path;

/// Result of one compilation run
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Chart text before codepage encoding
    pub text: String,
    pub chips: Vec<Chip>,
    pub grid: MeasureGrid,
    pub alignment: Alignment,
    /// Seconds covered by the grid
    pub duration: f64,
    /// Notes dropped because their pitch has no channel
    pub unmapped: usize,
    /// Notes dropped because they fall outside the grid
    pub unplaced: usize,
    pub background_placed: bool,
}

/// Compiles note lists with one fixed configuration
#[derive(Debug, Clone)]
pub struct Compiler {
    config: ChartConfig,
}

impl Compiler {
    /// Validate `config` and build a compiler for it
    pub fn new(config: ChartConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Compile notes to chart text in memory
    pub fn compile(&self, notes: &[Note]) -> Result<Compilation> {
        validate_notes(notes)?;

        let corrected = apply_instrument_offsets(notes, &self.config.kit);
        let alignment = align::resolve(&self.config, &corrected)?;
        info!(
            "shift {:.3}s (offset {:.2}s, anchor #{}{})",
            alignment.shift,
            alignment.offset,
            alignment.anchor,
            if alignment.anchor_applied { "" } else { " not applied" }
        );

        let builder = ChipBuilder::new(&self.config)?;
        let chart = builder.build(notes, alignment.shift)?;
        let text = dtx::serialize(&chart.grid, &self.config)?;

        Ok(Compilation {
            text,
            chips: chart.chips,
            grid: chart.grid,
            alignment,
            duration: chip::end_time(&corrected) + alignment.shift.max(0.0),
            unmapped: chart.unmapped,
            unplaced: chart.unplaced,
            background_placed: chart.background_placed,
        })
    }

    /// Compile a note file and write the chart (and optionally a preview image)
    pub fn compile_file(
        &self,
        input: &Path,
        output: &Path,
        image: Option<&Path>,
    ) -> Result<Compilation> {
        let notes = input::load_notes(input)?;
        info!("{} note(s) loaded from {}", notes.len(), input.display());
        self.compile_to(&notes, output, image)
    }

    /// Compile notes and write the outputs.
    ///
    /// Both outputs are produced in memory before anything is written. A preview
    /// failure is logged and never prevents the chart from being written.
    pub fn compile_to(
        &self,
        notes: &[Note],
        output: &Path,
        image: Option<&Path>,
    ) -> Result<Compilation> {
        let compilation = self.compile(notes)?;

        let png = image.and_then(|path| match preview::render_png(&compilation) {
            Ok(data) => Some((path, data)),
            Err(e) => {
                warn!("Preview image skipped: {}", e);
                None
            }
        });

        dtx::writer::write_chart(output, &compilation.text)?;

        if let Some((path, data)) = png {
            match dtx::writer::write_atomic(path, &data) {
                Ok(()) => info!("Preview image written to {}", path.display()),
                Err(e) => warn!("Preview image not written to {}: {}", path.display(), e),
            }
        }

        Ok(compilation)
    }
}

/// Reject notes outside the input contract
pub fn validate_notes(notes: &[Note]) -> Result<()> {
    for (i, note) in notes.iter().enumerate() {
        if !note.start.is_finite() || !note.end.is_finite() {
            return Err(Error::InvalidInput(format!("note {} has a non-finite time", i)));
        }
        if note.start < 0.0 || note.end <= note.start {
            return Err(Error::InvalidInput(format!(
                "note {} must satisfy 0 <= start < end, got {} .. {}",
                i, note.start, note.end
            )));
        }
        if note.velocity > 127 {
            return Err(Error::InvalidInput(format!(
                "note {} velocity {} above 127",
                i, note.velocity
            )));
        }
    }
    Ok(())
}
