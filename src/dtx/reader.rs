//! DTX chart reader and parser

use super::base36;
use super::encoding;
use super::grid::MeasureGrid;
use super::header::DtxHeader;
use crate::compiler::channel::Channel;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Everything a parsed chart declares
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DtxChart {
    pub header: DtxHeader,
    /// `#WAVxx` files by sample index
    pub wavs: BTreeMap<u16, String>,
    /// `#VOLUMExx` by sample index
    pub volumes: BTreeMap<u16, u32>,
    /// `#PANxx` by sample index
    pub pans: BTreeMap<u16, i32>,
    /// `#AVIxx` files by index
    pub avis: BTreeMap<u16, String>,
    /// Sample played as background music (`#BGMWAV`)
    pub bgm_wav: Option<u16>,
    /// Commands this reader does not interpret, in file order
    pub extra: Vec<(String, String)>,
    pub grid: MeasureGrid,
}

/// Line-oriented DTX parser
pub struct DtxReader<'a> {
    text: &'a str,
}

impl<'a> DtxReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Parse the whole chart
    pub fn parse(&self) -> Result<DtxChart> {
        let mut chart = DtxChart::default();

        for (idx, raw) in self.text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_start_matches('\u{FEFF}').trim();
            let Some(body) = line.strip_prefix('#') else {
                // Comments and free text
                continue;
            };

            let (command, value) = split_command(body);
            if command.is_empty() {
                continue;
            }

            if let Some((measure, channel)) = grid_key(command) {
                let slots = parse_slots(value).map_err(|message| Error::Parse {
                    line: line_no,
                    message,
                })?;
                chart
                    .grid
                    .insert_row(measure, channel, slots)
                    .map_err(|e| Error::Parse {
                        line: line_no,
                        message: e.to_string(),
                    })?;
                continue;
            }

            self.parse_command(&mut chart, command, value, line_no)?;
        }

        Ok(chart)
    }

    fn parse_command(
        &self,
        chart: &mut DtxChart,
        command: &str,
        value: &str,
        line: usize,
    ) -> Result<()> {
        let upper = command.to_ascii_uppercase();
        let header = &mut chart.header;

        match upper.as_str() {
            "TITLE" => header.title = value.to_string(),
            "ARTIST" => header.artist = value.to_string(),
            "COMMENT" => header.comment = value.to_string(),
            "PREVIEW" => header.preview = value.to_string(),
            "PREIMAGE" => header.preimage = value.to_string(),
            "BPM" => header.bpm = parse_number(value, line)?,
            "DLEVEL" => header.dlevel = parse_number(value, line)?,
            "BGMWAV" => chart.bgm_wav = Some(parse_id(value, line)?),
            _ => {
                if let Some(id) = indexed(&upper, "WAV") {
                    chart.wavs.insert(id, value.to_string());
                } else if let Some(id) = indexed(&upper, "VOLUME") {
                    chart.volumes.insert(id, parse_number(value, line)?);
                } else if let Some(id) = indexed(&upper, "PAN") {
                    chart.pans.insert(id, parse_number(value, line)?);
                } else if let Some(id) = indexed(&upper, "AVI") {
                    chart.avis.insert(id, value.to_string());
                } else {
                    chart.extra.push((command.to_string(), value.to_string()));
                }
            }
        }

        Ok(())
    }
}

/// Read and parse a chart file written in the single-byte codepage
pub fn read_file(path: &Path) -> Result<DtxChart> {
    let bytes = fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open '{}': {}", path.display(), e),
        ))
    })?;
    let text = encoding::decode(&bytes);
    DtxReader::new(&text).parse()
}

/// Split `CMD: value` or `CMD value`
fn split_command(body: &str) -> (&str, &str) {
    let end = body
        .find(|c: char| c == ':' || c.is_whitespace())
        .unwrap_or(body.len());
    let (command, rest) = body.split_at(end);
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    (command, rest.trim())
}

/// `MMMCC` grid line prefix
fn grid_key(command: &str) -> Option<(u32, Channel)> {
    let bytes = command.as_bytes();
    if bytes.len() != 5 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let measure = command[..3].parse().ok()?;
    let channel = command[3..].parse().ok()?;
    Some((measure, channel))
}

/// `PREFIXxx` with a two-digit base-36 index
fn indexed(command: &str, prefix: &str) -> Option<u16> {
    let id = command.strip_prefix(prefix)?;
    if id.len() != 2 {
        return None;
    }
    base36::decode(id).map(|v| v as u16)
}

fn parse_slots(value: &str) -> std::result::Result<Vec<u16>, String> {
    let data: Vec<u8> = value
        .bytes()
        .filter(|b| *b != b'_' && !b.is_ascii_whitespace())
        .collect();
    if data.is_empty() || data.len() % 2 != 0 {
        return Err(format!("grid data must be pairs of digits, got {} characters", data.len()));
    }
    data.chunks(2)
        .map(|pair| {
            let hi = base36::digit_value(pair[0]);
            let lo = base36::digit_value(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok((hi * 36 + lo) as u16),
                _ => Err(format!(
                    "invalid sample '{}{}'",
                    pair[0] as char, pair[1] as char
                )),
            }
        })
        .collect()
}

fn parse_id(value: &str, line: usize) -> Result<u16> {
    base36::decode(value)
        .filter(|&v| v <= base36::MAX_PAIR as u32)
        .map(|v| v as u16)
        .ok_or_else(|| Error::Parse {
            line,
            message: format!("invalid index '{}'", value),
        })
}

fn parse_number<T: std::str::FromStr>(value: &str, line: usize) -> Result<T> {
    value.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid number '{}'", value),
    })
}
