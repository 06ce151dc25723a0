//! DTX channel codes and lane assignment

use super::note::Instrument;
use crate::dtx::base36;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Two-character DTX channel code (e.g. `13` for bass drum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel([u8; 2]);

impl Channel {
    /// Background audio
    pub const BGM: Channel = Channel(*b"01");
    /// Background video
    pub const VIDEO: Channel = Channel(*b"54");

    pub const HIHAT_CLOSE: Channel = Channel(*b"11");
    pub const SNARE: Channel = Channel(*b"12");
    pub const BASS_DRUM: Channel = Channel(*b"13");
    pub const HIGH_TOM: Channel = Channel(*b"14");
    pub const LOW_TOM: Channel = Channel(*b"15");
    pub const CYMBAL: Channel = Channel(*b"16");
    pub const FLOOR_TOM: Channel = Channel(*b"17");
    pub const HIHAT_OPEN: Channel = Channel(*b"18");
    pub const RIDE: Channel = Channel(*b"19");
    pub const LEFT_CYMBAL: Channel = Channel(*b"1A");
    pub const LEFT_PEDAL: Channel = Channel(*b"1B");
    pub const LEFT_BASS_DRUM: Channel = Channel(*b"1C");

    pub fn for_instrument(inst: Instrument) -> Self {
        match inst {
            Instrument::HiHatClose => Self::HIHAT_CLOSE,
            Instrument::Snare => Self::SNARE,
            Instrument::BassDrum => Self::BASS_DRUM,
            Instrument::HighTom => Self::HIGH_TOM,
            Instrument::LowTom => Self::LOW_TOM,
            Instrument::FloorTom => Self::FLOOR_TOM,
            Instrument::Cymbal => Self::CYMBAL,
            Instrument::HiHatOpen => Self::HIHAT_OPEN,
            Instrument::Ride => Self::RIDE,
            Instrument::LeftCymbal => Self::LEFT_CYMBAL,
            Instrument::LeftPedal => Self::LEFT_PEDAL,
            Instrument::LeftBassDrum => Self::LEFT_BASS_DRUM,
        }
    }

    /// Channel for a MIDI pitch, `None` for pitches outside the kit
    pub fn for_pitch(pitch: u8) -> Option<Self> {
        Instrument::from_pitch(pitch).map(Self::for_instrument)
    }

    /// Preview lane (1-10), `None` for control channels
    pub fn lane(self) -> Option<u32> {
        let lane = match self {
            Self::LEFT_CYMBAL => 1,
            Self::HIHAT_CLOSE | Self::HIHAT_OPEN => 2,
            Self::LEFT_PEDAL | Self::LEFT_BASS_DRUM => 3,
            Self::SNARE => 4,
            Self::HIGH_TOM => 5,
            Self::BASS_DRUM => 6,
            Self::LOW_TOM => 7,
            Self::FLOOR_TOM => 8,
            Self::CYMBAL => 9,
            Self::RIDE => 10,
            _ => return None,
        };
        Some(lane)
    }

    pub fn as_str(&self) -> &str {
        // Always two ASCII base-36 digits
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(|b| base36::digit_value(*b).is_some()) {
            return Err(Error::InvalidChannel(s.to_string()));
        }
        Ok(Channel([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
