//! DTX header fields

use crate::config::ChartConfig;

/// First line of every generated chart
pub const CREATOR_LINE: &str = "; Created by dtxck";

/// Free-text metadata at the top of a chart
#[derive(Debug, Clone, PartialEq)]
pub struct DtxHeader {
    pub title: String,
    pub artist: String,
    pub comment: String,
    pub preview: String,
    pub preimage: String,
    pub bpm: f64,
    pub dlevel: u32,
}

impl Default for DtxHeader {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            comment: String::new(),
            preview: String::new(),
            preimage: String::new(),
            bpm: 120.0,
            dlevel: 0,
        }
    }
}

impl From<&ChartConfig> for DtxHeader {
    fn from(config: &ChartConfig) -> Self {
        Self {
            title: config.title.clone(),
            artist: config.artist.clone(),
            comment: config.comment.clone(),
            preview: config.preview.clone(),
            preimage: config.preimage.clone(),
            bpm: config.bpm,
            dlevel: config.dlevel,
        }
    }
}

/// Shortest form that round-trips and always has a decimal point (`120.0`, `145.5`)
pub fn format_bpm(bpm: f64) -> String {
    format!("{:?}", bpm)
}

/// Strip line breaks so a free-text field cannot start a new command
pub fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}
