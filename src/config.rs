//! Chart compilation settings

use crate::compiler::note::Instrument;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Highest sample index a two-digit base-36 field can hold
pub const MAX_SAMPLE_INDEX: u32 = 36 * 36 - 1;

/// Largest bucket count keeping every sample index in range
pub const MAX_WAV_SPLITS: u32 = (MAX_SAMPLE_INDEX - 2 + 1) / Instrument::COUNT as u32;

/// Settings for one compilation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub title: String,
    pub artist: String,
    pub comment: String,
    pub preview: String,
    pub preimage: String,
    /// Background audio file (sample 01)
    pub bgm: String,
    /// Background video file (AVI 01)
    pub video: String,
    pub bpm: f64,
    pub dlevel: u32,

    /// Slots per measure for drum channels
    pub chip_resolution: u32,
    /// Slots per measure for the background audio/video channels
    pub bgm_resolution: u32,

    /// Manual global shift (seconds), used when `auto_shift_time` is off
    pub shift_time: f64,
    pub auto_shift_time: bool,
    /// Bass drum note (1-based) aligned to a bar line; 0 disables
    pub align_nth_bd: usize,
    pub auto_align_nth_bd: bool,

    pub bgm_offset_time: f64,
    pub bgm_volume: u32,
    /// Velocity buckets per instrument
    pub wav_splits: u32,
    /// Global instrument volume (percent)
    pub wav_volume: u32,

    pub kit: KitConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Sample Music".to_string(),
            artist: String::new(),
            comment: String::new(),
            preview: "pre.ogg".to_string(),
            preimage: "pre.jpg".to_string(),
            bgm: "bgm.ogg".to_string(),
            video: "movie.mp4".to_string(),
            bpm: 120.0,
            dlevel: 50,
            chip_resolution: 32,
            bgm_resolution: 128,
            shift_time: 0.0,
            auto_shift_time: true,
            align_nth_bd: 1,
            auto_align_nth_bd: true,
            bgm_offset_time: -0.03,
            bgm_volume: 100,
            wav_splits: 4,
            wav_volume: 80,
            kit: KitConfig::default(),
        }
    }
}

impl ChartConfig {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings that cannot produce a valid chart
    pub fn validate(&self) -> Result<()> {
        if !(self.bpm > 0.0) || !self.bpm.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "bpm must be positive, got {}",
                self.bpm
            )));
        }
        if self.chip_resolution == 0 {
            return Err(Error::InvalidConfig("chip_resolution must be positive".into()));
        }
        if self.bgm_resolution == 0 {
            return Err(Error::InvalidConfig("bgm_resolution must be positive".into()));
        }
        if self.wav_splits == 0 || self.wav_splits > MAX_WAV_SPLITS {
            return Err(Error::InvalidConfig(format!(
                "wav_splits must be between 1 and {}, got {}",
                MAX_WAV_SPLITS, self.wav_splits
            )));
        }
        if !self.shift_time.is_finite() || !self.bgm_offset_time.is_finite() {
            return Err(Error::InvalidConfig("time offsets must be finite".into()));
        }
        for inst in Instrument::ALL {
            if !self.kit.get(inst).offset.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "{} offset must be finite",
                    inst.name()
                )));
            }
        }
        Ok(())
    }
}

/// Sample file and mix settings for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub wav: String,
    /// Volume (percent) before the global `wav_volume`
    pub volume: u32,
    pub pan: i32,
    /// Time correction (seconds) applied to this instrument's notes
    pub offset: f64,
}

impl InstrumentConfig {
    fn for_instrument(inst: Instrument) -> Self {
        Self {
            wav: default_wav(inst),
            ..Self::default()
        }
    }
}

/// Stock sample file shipped with the player for `inst`
pub fn default_wav(inst: Instrument) -> String {
    let name = match inst {
        Instrument::HiHatClose => "close",
        Instrument::Snare => "snare",
        Instrument::BassDrum => "bd",
        Instrument::HighTom => "high",
        Instrument::LowTom => "low",
        Instrument::FloorTom => "floor",
        Instrument::Cymbal => "cymbal",
        Instrument::HiHatOpen => "open",
        Instrument::Ride => "ride",
        Instrument::LeftCymbal => "lc",
        Instrument::LeftPedal => "lp",
        Instrument::LeftBassDrum => "lbd",
    };
    format!("chips\\{}.xa", name)
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            wav: String::new(),
            volume: 100,
            pan: 0,
            offset: 0.0,
        }
    }
}

/// Per-instrument settings for the whole kit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    pub hhc: InstrumentConfig,
    pub snare: InstrumentConfig,
    pub bd: InstrumentConfig,
    pub ht: InstrumentConfig,
    pub lt: InstrumentConfig,
    pub ft: InstrumentConfig,
    pub cymbal: InstrumentConfig,
    pub hho: InstrumentConfig,
    pub ride: InstrumentConfig,
    pub lc: InstrumentConfig,
    pub lp: InstrumentConfig,
    pub lbd: InstrumentConfig,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            hhc: InstrumentConfig::for_instrument(Instrument::HiHatClose),
            snare: InstrumentConfig::for_instrument(Instrument::Snare),
            bd: InstrumentConfig::for_instrument(Instrument::BassDrum),
            ht: InstrumentConfig::for_instrument(Instrument::HighTom),
            lt: InstrumentConfig::for_instrument(Instrument::LowTom),
            ft: InstrumentConfig::for_instrument(Instrument::FloorTom),
            cymbal: InstrumentConfig::for_instrument(Instrument::Cymbal),
            hho: InstrumentConfig::for_instrument(Instrument::HiHatOpen),
            ride: InstrumentConfig::for_instrument(Instrument::Ride),
            lc: InstrumentConfig::for_instrument(Instrument::LeftCymbal),
            lp: InstrumentConfig::for_instrument(Instrument::LeftPedal),
            lbd: InstrumentConfig::for_instrument(Instrument::LeftBassDrum),
        }
    }
}

impl KitConfig {
    pub fn get(&self, inst: Instrument) -> &InstrumentConfig {
        match inst {
            Instrument::HiHatClose => &self.hhc,
            Instrument::Snare => &self.snare,
            Instrument::BassDrum => &self.bd,
            Instrument::HighTom => &self.ht,
            Instrument::LowTom => &self.lt,
            Instrument::FloorTom => &self.ft,
            Instrument::Cymbal => &self.cymbal,
            Instrument::HiHatOpen => &self.hho,
            Instrument::Ride => &self.ride,
            Instrument::LeftCymbal => &self.lc,
            Instrument::LeftPedal => &self.lp,
            Instrument::LeftBassDrum => &self.lbd,
        }
    }

    /// Sample file for `inst`, falling back to the stock file when unset
    pub fn wav(&self, inst: Instrument) -> String {
        let wav = &self.get(inst).wav;
        if wav.is_empty() {
            default_wav(inst)
        } else {
            wav.clone()
        }
    }

    pub fn get_mut(&mut self, inst: Instrument) -> &mut InstrumentConfig {
        match inst {
            Instrument::HiHatClose => &mut self.hhc,
            Instrument::Snare => &mut self.snare,
            Instrument::BassDrum => &mut self.bd,
            Instrument::HighTom => &mut self.ht,
            Instrument::LowTom => &mut self.lt,
            Instrument::FloorTom => &mut self.ft,
            Instrument::Cymbal => &mut self.cymbal,
            Instrument::HiHatOpen => &mut self.hho,
            Instrument::Ride => &mut self.ride,
            Instrument::LeftCymbal => &mut self.lc,
            Instrument::LeftPedal => &mut self.lp,
            Instrument::LeftBassDrum => &mut self.lbd,
        }
    }
}
