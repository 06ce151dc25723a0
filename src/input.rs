//! Note list loading: JSON note arrays and Standard MIDI Files

use crate::compiler::note::Note;
use crate::error::{Error, Result};
use log::debug;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Default tempo when a file has no tempo event (120 BPM)
const DEFAULT_US_PER_QUARTER: f64 = 500_000.0;

/// Load notes from a `.mid`/`.midi` file or a JSON note array
pub fn load_notes(path: &Path) -> Result<Vec<Note>> {
    let data = fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open '{}': {}", path.display(), e),
        ))
    })?;

    let is_midi = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
        .unwrap_or(false);

    // Check for the SMF magic even if the extension doesn't indicate it
    if is_midi || data.starts_with(b"MThd") {
        notes_from_midi(&data)
    } else {
        notes_from_json(&String::from_utf8_lossy(&data))
    }
}

/// Read a JSON note array from any reader (e.g. stdin)
pub fn read_json<R: Read>(mut input: R) -> Result<Vec<Note>> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    notes_from_json(&text)
}

pub fn notes_from_json(text: &str) -> Result<Vec<Note>> {
    Ok(serde_json::from_str(text)?)
}

/// Tick to seconds conversion honouring tempo changes
struct TempoMap {
    /// `(tick, seconds at tick, seconds per tick from here on)`
    segments: Vec<(u64, f64, f64)>,
}

impl TempoMap {
    fn new(smf: &Smf<'_>) -> Self {
        let ppq = match smf.header.timing {
            Timing::Metrical(t) => t.as_int() as f64,
            Timing::Timecode(fps, subframes) => {
                // Absolute timing: tempo events do not apply
                let per_tick = 1.0 / (fps.as_f32() as f64 * subframes as f64);
                return Self {
                    segments: vec![(0, 0.0, per_tick)],
                };
            }
        };

        let mut changes: Vec<(u64, f64)> = Vec::new();
        for track in &smf.tracks {
            let mut tick = 0u64;
            for event in track {
                tick += event.delta.as_int() as u64;
                if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                    changes.push((tick, tempo.as_int() as f64));
                }
            }
        }
        changes.sort_by_key(|(tick, _)| *tick);

        let mut segments = vec![(0u64, 0.0, DEFAULT_US_PER_QUARTER / 1_000_000.0 / ppq)];
        for (tick, us_per_quarter) in changes {
            let per_tick = us_per_quarter / 1_000_000.0 / ppq;
            let (last_tick, last_time, last_rate) = segments[segments.len() - 1];
            if tick == last_tick {
                // Later event at the same tick wins
                let idx = segments.len() - 1;
                segments[idx].2 = per_tick;
            } else {
                let time = last_time + (tick - last_tick) as f64 * last_rate;
                segments.push((tick, time, per_tick));
            }
        }

        Self { segments }
    }

    fn seconds(&self, tick: u64) -> f64 {
        let idx = self
            .segments
            .partition_point(|(start, _, _)| *start <= tick)
            .saturating_sub(1);
        let (start, time, rate) = self.segments[idx];
        time + (tick - start) as f64 * rate
    }
}

/// Parse a Standard MIDI File; notes come out per track in note-off order
pub fn notes_from_midi(data: &[u8]) -> Result<Vec<Note>> {
    let smf = Smf::parse(data)?;
    let tempo = TempoMap::new(&smf);
    let mut notes = Vec::new();
    let mut dangling = 0usize;

    for track in &smf.tracks {
        let mut tick = 0u64;
        let mut open: HashMap<(u8, u8), VecDeque<(u64, u8)>> = HashMap::new();

        for event in track {
            tick += event.delta.as_int() as u64;
            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let ch = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    open.entry((ch, key.as_int()))
                        .or_default()
                        .push_back((tick, vel.as_int()));
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    let Some((start_tick, velocity)) = open
                        .get_mut(&(ch, key.as_int()))
                        .and_then(|queue| queue.pop_front())
                    else {
                        continue;
                    };
                    let start = tempo.seconds(start_tick);
                    let end = tempo.seconds(tick);
                    if end > start {
                        notes.push(Note::new(key.as_int(), velocity, start, end));
                    } else {
                        debug!("zero-length note {} at {:.3}s skipped", key.as_int(), start);
                    }
                }
                _ => {}
            }
        }

        dangling += open.values().map(VecDeque::len).sum::<usize>();
    }

    if dangling > 0 {
        debug!("{} note(s) without note-off dropped", dangling);
    }
    Ok(notes)
}
