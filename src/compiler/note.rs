//! Drum notes and the fixed instrument table

use serde::{Deserialize, Serialize};

/// One detected drum hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// General MIDI percussion key
    pub pitch: u8,
    /// Strike velocity (0-127)
    pub velocity: u8,
    /// Onset time in seconds
    pub start: f64,
    /// Release time in seconds
    pub end: f64,
}

impl Note {
    pub fn new(pitch: u8, velocity: u8, start: f64, end: f64) -> Self {
        Self {
            pitch,
            velocity,
            start,
            end,
        }
    }

    /// Copy of this note moved by `offset` seconds
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            ..*self
        }
    }

    pub fn instrument(&self) -> Option<Instrument> {
        Instrument::from_pitch(self.pitch)
    }
}

/// Drum kit pieces known to the chart format.
///
/// Declaration order is significant: it fixes the sample numbering
/// (instrument-major, velocity-bucket-minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Instrument {
    HiHatClose,
    Snare,
    BassDrum,
    HighTom,
    LowTom,
    FloorTom,
    Cymbal,
    HiHatOpen,
    Ride,
    LeftCymbal,
    LeftPedal,
    LeftBassDrum,
}

impl Instrument {
    pub const COUNT: usize = 12;

    pub const ALL: [Instrument; Self::COUNT] = [
        Instrument::HiHatClose,
        Instrument::Snare,
        Instrument::BassDrum,
        Instrument::HighTom,
        Instrument::LowTom,
        Instrument::FloorTom,
        Instrument::Cymbal,
        Instrument::HiHatOpen,
        Instrument::Ride,
        Instrument::LeftCymbal,
        Instrument::LeftPedal,
        Instrument::LeftBassDrum,
    ];

    /// Instrument used to anchor the downbeat during alignment
    pub const REFERENCE: Instrument = Instrument::BassDrum;

    pub fn from_pitch(pitch: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|inst| inst.pitch() == pitch)
    }

    pub fn pitch(self) -> u8 {
        match self {
            Instrument::HiHatClose => 42,
            Instrument::Snare => 38,
            Instrument::BassDrum => 36,
            Instrument::HighTom => 50,
            Instrument::LowTom => 45,
            Instrument::FloorTom => 41,
            Instrument::Cymbal => 49,
            Instrument::HiHatOpen => 46,
            Instrument::Ride => 51,
            Instrument::LeftCymbal => 52,
            Instrument::LeftPedal => 44,
            Instrument::LeftBassDrum => 35,
        }
    }

    /// Position in the table
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Instrument::HiHatClose => "hhc",
            Instrument::Snare => "snare",
            Instrument::BassDrum => "bd",
            Instrument::HighTom => "ht",
            Instrument::LowTom => "lt",
            Instrument::FloorTom => "ft",
            Instrument::Cymbal => "cymbal",
            Instrument::HiHatOpen => "hho",
            Instrument::Ride => "ride",
            Instrument::LeftCymbal => "lc",
            Instrument::LeftPedal => "lp",
            Instrument::LeftBassDrum => "lbd",
        }
    }
}
