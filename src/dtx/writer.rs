//! DTX chart writer

use super::base36;
use super::encoding;
use super::grid::MeasureGrid;
use super::header::{format_bpm, single_line, DtxHeader, CREATOR_LINE};
use crate::compiler::sample::{declarations, SampleDeclaration, SampleSelector};
use crate::config::ChartConfig;
use crate::error::{Error, Result};
use log::{info, warn};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Builds chart text section by section
#[derive(Debug, Default)]
pub struct DtxWriter {
    out: String,
}

impl DtxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creator comment and metadata block
    pub fn write_header(&mut self, header: &DtxHeader) {
        let _ = write!(
            self.out,
            "{}\n\n\
             #TITLE: {}\n\
             #ARTIST: {}\n\
             #COMMENT: {}\n\
             #PREVIEW: {}\n\
             #PREIMAGE: {}\n\
             #BPM: {}\n\
             #DLEVEL: {}\n\n",
            CREATOR_LINE,
            single_line(&header.title),
            single_line(&header.artist),
            single_line(&header.comment),
            single_line(&header.preview),
            single_line(&header.preimage),
            format_bpm(header.bpm),
            header.dlevel,
        );
    }

    /// Background audio declaration (always sample 01)
    pub fn write_bgm(&mut self, wav: &str, volume: u32) {
        let _ = write!(
            self.out,
            "\n#WAV01: {}\n#VOLUME01: {}\n#BGMWAV: 01\n",
            single_line(wav),
            volume
        );
    }

    /// Instrument bucket declarations
    pub fn write_samples(&mut self, decls: &[SampleDeclaration]) -> Result<()> {
        for decl in decls {
            let id = base36::pair_string(decl.index).ok_or_else(|| {
                Error::InvalidConfig(format!("sample index {} does not fit two digits", decl.index))
            })?;
            let _ = writeln!(self.out, "#WAV{}: {}", id, single_line(&decl.wav));
            let _ = writeln!(self.out, "#VOLUME{}: {}", id, decl.volume);
            if decl.pan != 0 {
                let _ = writeln!(self.out, "#PAN{}: {}", id, decl.pan);
            }
        }
        Ok(())
    }

    /// Background video declaration (always AVI 01)
    pub fn write_video(&mut self, video: &str) {
        let _ = write!(self.out, "\n#AVI01: {}\n\n", single_line(video));
    }

    /// One `#MMMCC: ...` line per row, in key order
    pub fn write_grid(&mut self, grid: &MeasureGrid) -> Result<()> {
        for (key, row) in grid.iter() {
            let mut line = String::with_capacity(row.len() * 2 + 9);
            let _ = write!(line, "#{:03}{}: ", key.measure, key.channel);
            for &sample in row {
                if !base36::push_pair(&mut line, sample) {
                    return Err(Error::Grid(format!(
                        "sample {} in measure {} channel {} does not fit two digits",
                        sample, key.measure, key.channel
                    )));
                }
            }
            self.out.push_str(&line);
            self.out.push('\n');
        }
        Ok(())
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Render a complete chart for `grid`
pub fn serialize(grid: &MeasureGrid, config: &ChartConfig) -> Result<String> {
    let selector = SampleSelector::new(config.wav_splits)?;
    let mut writer = DtxWriter::new();
    writer.write_header(&DtxHeader::from(config));
    writer.write_bgm(&config.bgm, config.bgm_volume);
    writer.write_samples(&declarations(config, &selector))?;
    writer.write_video(&config.video);
    writer.write_grid(grid)?;
    Ok(writer.finish())
}

/// Replace `path` with `data` through a temporary file in the same directory
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.flush()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Encode chart text to the file codepage and write it atomically
pub fn write_chart(path: &Path, text: &str) -> Result<()> {
    let encoded = encoding::encode(text);
    if encoded.substituted > 0 {
        warn!(
            "{} character(s) not representable in the chart codepage were replaced with '{}'",
            encoded.substituted,
            encoding::SUBSTITUTE as char
        );
    }
    write_atomic(path, &encoded.bytes)?;
    info!("DTX chart written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::channel::Channel;
    use tempfile::tempdir;

    fn small_config() -> ChartConfig {
        let mut config = ChartConfig::default();
        config.wav_splits = 1;
        config
    }

    #[test]
    fn test_header_layout() {
        let text = serialize(&MeasureGrid::new(), &small_config()).unwrap();
        let expected_head = "; Created by dtxck\n\
            \n\
            #TITLE: Sample Music\n\
            #ARTIST: \n\
            #COMMENT: \n\
            #PREVIEW: pre.ogg\n\
            #PREIMAGE: pre.jpg\n\
            #BPM: 120.0\n\
            #DLEVEL: 50\n\
            \n\
            \n\
            #WAV01: bgm.ogg\n\
            #VOLUME01: 100\n\
            #BGMWAV: 01\n\
            #WAV02: chips\\close.xa\n\
            #VOLUME02: 80\n";
        assert!(text.starts_with(expected_head), "got:\n{}", text);
        assert!(text.ends_with("#WAV0D: chips\\lbd.xa\n#VOLUME0D: 80\n\n#AVI01: movie.mp4\n\n"));
    }

    #[test]
    fn test_grid_lines() {
        let mut grid = MeasureGrid::new();
        grid.place(1, Channel::BASS_DRUM, 4, 0, 10).unwrap();
        grid.place(1, Channel::BASS_DRUM, 4, 2, 40).unwrap();
        grid.place(12, Channel::LEFT_CYMBAL, 2, 1, 3).unwrap();
        let mut writer = DtxWriter::new();
        writer.write_grid(&grid).unwrap();
        assert_eq!(writer.finish(), "#00113: 0A001400\n#0121A: 0003\n");
    }

    #[test]
    fn test_line_width() {
        for resolution in [1u32, 3, 32, 192] {
            let mut grid = MeasureGrid::new();
            grid.place(7, Channel::SNARE, resolution, resolution - 1, 1295).unwrap();
            let mut writer = DtxWriter::new();
            writer.write_grid(&grid).unwrap();
            let text = writer.finish();
            let data = text.trim_end().split(": ").nth(1).unwrap();
            assert_eq!(data.len(), 2 * resolution as usize);
            assert!(data.ends_with("ZZ"));
        }
    }

    #[test]
    fn test_pan_written_when_set() {
        let mut config = small_config();
        config.kit.snare.pan = -25;
        let text = serialize(&MeasureGrid::new(), &config).unwrap();
        assert!(text.contains("#WAV03: chips\\snare.xa\n#VOLUME03: 80\n#PAN03: -25\n#WAV04"));
        assert_eq!(text.matches("#PAN").count(), 1);
    }

    #[test]
    fn test_serialize_idempotent() {
        let mut grid = MeasureGrid::new();
        grid.place(3, Channel::HIHAT_CLOSE, 16, 5, 4).unwrap();
        let config = ChartConfig::default();
        assert_eq!(
            serialize(&grid, &config).unwrap(),
            serialize(&grid, &config).unwrap()
        );
    }

    #[test]
    fn test_write_chart_replaces_unmappable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("score.dtx");
        std::fs::write(&path, b"old").unwrap();
        write_chart(&path, "#TITLE: \u{66f2}\n").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"#TITLE: ?\n");
    }
}
