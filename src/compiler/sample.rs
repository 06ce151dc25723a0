//! Velocity-bucketed sample selection

use super::note::Instrument;
use crate::config::{ChartConfig, MAX_SAMPLE_INDEX};
use crate::error::{Error, Result};

/// Sample index meaning "no sample"
pub const NO_SAMPLE: u16 = 0;

/// Sample index of the background audio and video declarations
pub const BGM_SAMPLE: u16 = 1;

/// First sample index used by instrument buckets
pub const FIRST_INSTRUMENT_SAMPLE: u16 = 2;

/// Maps `(pitch, velocity)` to a declared sample index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSelector {
    bucket_count: u32,
}

impl SampleSelector {
    pub fn new(bucket_count: u32) -> Result<Self> {
        if bucket_count == 0 {
            return Err(Error::InvalidConfig("bucket count must be positive".into()));
        }
        let top = FIRST_INSTRUMENT_SAMPLE as u32 + Instrument::COUNT as u32 * bucket_count - 1;
        if top > MAX_SAMPLE_INDEX {
            return Err(Error::InvalidConfig(format!(
                "{} velocity buckets need sample index {}, above {}",
                bucket_count, top, MAX_SAMPLE_INDEX
            )));
        }
        Ok(Self { bucket_count })
    }

    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    /// Velocity bucket, `0..bucket_count`
    pub fn bucket(&self, velocity: u8) -> u32 {
        let width = (128 / self.bucket_count).max(1) as i32;
        let raw = (velocity as i32 - 1).div_euclid(width) + 1;
        raw.clamp(0, self.bucket_count as i32 - 1) as u32
    }

    /// Sample index of an instrument's first bucket
    pub fn base_offset(&self, inst: Instrument) -> u16 {
        (inst.index() as u32 * self.bucket_count + FIRST_INSTRUMENT_SAMPLE as u32) as u16
    }

    /// Sample index for a hit, `NO_SAMPLE` for pitches outside the kit
    pub fn sample_index(&self, pitch: u8, velocity: u8) -> u16 {
        match Instrument::from_pitch(pitch) {
            Some(inst) => self.base_offset(inst) + self.bucket(velocity) as u16,
            None => NO_SAMPLE,
        }
    }
}

/// One `#WAVxx` / `#VOLUMExx` (/ `#PANxx`) declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDeclaration {
    pub index: u16,
    pub instrument: Instrument,
    pub bucket: u32,
    pub wav: String,
    pub volume: u32,
    pub pan: i32,
}

/// Declarations for every instrument bucket, instrument-major
pub fn declarations(config: &ChartConfig, selector: &SampleSelector) -> Vec<SampleDeclaration> {
    let count = selector.bucket_count();
    let mut decls = Vec::with_capacity(Instrument::COUNT * count as usize);

    for inst in Instrument::ALL {
        let settings = config.kit.get(inst);
        let wav = config.kit.wav(inst);
        let base = selector.base_offset(inst);
        for bucket in 0..count {
            decls.push(SampleDeclaration {
                index: base + bucket as u16,
                instrument: inst,
                bucket,
                wav: wav.clone(),
                volume: bucket_volume(settings.volume, config.wav_volume, count, bucket),
                pan: settings.pan,
            });
        }
    }

    decls
}

/// Volume of one bucket: the instrument's scaled volume split evenly across buckets
pub fn bucket_volume(volume: u32, global: u32, count: u32, bucket: u32) -> u32 {
    let scaled = volume as f64 * global as f64 / 100.0;
    (scaled / count as f64 * (bucket + 1) as f64).round() as u32
}
