//! Integration tests for DTX chart compilation and parsing
//!
//! These tests compile note lists to DTX files and read them back with DtxReader

use dtxck::compiler::channel::Channel;
use dtxck::compiler::note::Note;
use dtxck::dtx::{reader, DtxChart, DtxJson};
use dtxck::{ChartConfig, Compilation, Compiler};
use std::io::Write;
use tempfile::tempdir;

fn fixed_config() -> ChartConfig {
    let mut config = ChartConfig::default();
    config.auto_shift_time = false;
    config.auto_align_nth_bd = false;
    config.align_nth_bd = 0;
    config
}

/// Helper to compile notes to a file and parse the result back
fn compile_and_parse(config: ChartConfig, notes: &[Note]) -> (Compilation, DtxChart) {
    let dir = tempdir().unwrap();
    let output_path = dir.path().join("test.dtx");

    let compiler = Compiler::new(config).expect("Invalid config");
    let compilation = compiler
        .compile_to(notes, &output_path, None)
        .expect("Compilation failed");

    let chart = reader::read_file(&output_path).expect("Failed to parse chart");
    (compilation, chart)
}

fn groove() -> Vec<Note> {
    (0..16)
        .flat_map(|i| {
            let t = i as f64 * 0.25;
            let mut notes = vec![Note::new(42, 70 + (i % 4) as u8 * 15, t, t + 0.05)];
            if i % 4 == 0 {
                notes.push(Note::new(36, 110, t, t + 0.1));
            }
            if i % 4 == 2 {
                notes.push(Note::new(38, 100, t, t + 0.1));
            }
            notes
        })
        .collect()
}

#[test]
fn test_round_trip_grid() {
    let (compilation, chart) = compile_and_parse(ChartConfig::default(), &groove());
    assert_eq!(chart.grid, compilation.grid);
    assert_eq!(chart.bgm_wav, Some(1));
    assert_eq!(chart.wavs.get(&1).map(String::as_str), Some("bgm.ogg"));
    assert_eq!(chart.avis.get(&1).map(String::as_str), Some("movie.mp4"));
}

#[test]
fn test_sample_declarations() {
    let (_, chart) = compile_and_parse(ChartConfig::default(), &[]);
    // 12 instruments x 4 buckets after the background sample
    assert_eq!(chart.wavs.len(), 1 + 12 * 4);
    assert_eq!(chart.wavs.keys().copied().max(), Some(49));
    // hhc bucket 4: round(100 * 80 / 100 / 4 * 4)
    assert_eq!(chart.volumes.get(&5), Some(&80));
    assert_eq!(chart.volumes.get(&2), Some(&20));
    assert!(chart.pans.is_empty());
}

#[test]
fn test_background_at_measure_one() {
    let mut config = fixed_config();
    config.bgm_resolution = 8;
    let (_, chart) = compile_and_parse(config, &[Note::new(38, 100, 0.5, 0.6)]);

    let bgm = chart.grid.row(1, Channel::BGM).expect("BGM row missing");
    assert_eq!(bgm, &[1, 0, 0, 0, 0, 0, 0, 0]);
    let video = chart.grid.row(1, Channel::VIDEO).expect("video row missing");
    assert_eq!(video, bgm);
}

#[test]
fn test_line_widths() {
    let mut config = ChartConfig::default();
    config.chip_resolution = 16;
    config.bgm_resolution = 64;
    let (compilation, _) = compile_and_parse(config, &groove());

    let grid_lines: Vec<&str> = compilation
        .text
        .lines()
        .filter(|l| l.len() > 7 && l.as_bytes()[1..4].iter().all(u8::is_ascii_digit))
        .collect();
    assert!(!grid_lines.is_empty());
    for line in grid_lines {
        let (key, data) = line.split_once(": ").unwrap();
        let expected = match &key[4..6] {
            "01" | "54" => 64 * 2,
            _ => 16 * 2,
        };
        assert_eq!(data.len(), expected, "bad width: {}", line);
    }
}

#[test]
fn test_lines_sorted() {
    let (compilation, _) = compile_and_parse(ChartConfig::default(), &groove());
    let keys: Vec<&str> = compilation
        .text
        .lines()
        .filter_map(|l| l.split_once(": ").map(|(k, _)| k))
        .filter(|k| k.len() == 6 && k.as_bytes()[1..4].iter().all(u8::is_ascii_digit))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_deterministic_output() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("a.dtx");
    let second = dir.path().join("b.dtx");

    let compiler = Compiler::new(ChartConfig::default()).unwrap();
    compiler.compile_to(&groove(), &first, None).unwrap();
    compiler.compile_to(&groove(), &second, None).unwrap();

    assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
}

#[test]
fn test_anchor_scenario() {
    let mut config = fixed_config();
    config.chip_resolution = 4;
    config.align_nth_bd = 1;
    let (compilation, chart) = compile_and_parse(config, &[Note::new(36, 100, 1.0, 1.1)]);

    assert_eq!(compilation.alignment.shift, 1.0);
    let row = chart.grid.row(2, Channel::BASS_DRUM).expect("bd row missing");
    assert_eq!(row.len(), 4);
    assert_ne!(row[0], 0);
}

#[test]
fn test_auto_alignment_recovers_latency() {
    // Downbeats played 30ms late
    let notes: Vec<Note> = (1..=4)
        .map(|i| {
            let t = i as f64 * 2.0 + 0.03;
            Note::new(36, 100, t, t + 0.1)
        })
        .collect();
    let mut config = ChartConfig::default();
    config.chip_resolution = 16;
    config.auto_align_nth_bd = false;
    config.align_nth_bd = 0;

    let (compilation, _) = compile_and_parse(config, &notes);
    assert_eq!(compilation.alignment.score, Some(4));
    assert_eq!(compilation.alignment.shift, compilation.alignment.offset);
    assert_eq!(compilation.unplaced, 0);
    let on_downbeat = compilation
        .chips
        .iter()
        .filter(|c| c.channel == Channel::BASS_DRUM && c.slot == 0)
        .count();
    assert_eq!(on_downbeat, 4);
}

#[test]
fn test_json_input_file() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("notes.json");
    let output_path = dir.path().join("out.dtx");
    let mut file = std::fs::File::create(&input_path).unwrap();
    file.write_all(
        br#"[{"pitch": 36, "velocity": 127, "start": 0.0, "end": 0.1},
            {"pitch": 99, "velocity": 127, "start": 0.5, "end": 0.6}]"#,
    )
    .unwrap();

    let compiler = Compiler::new(fixed_config()).unwrap();
    let compilation = compiler.compile_file(&input_path, &output_path, None).unwrap();
    assert_eq!(compilation.unmapped, 1);

    let chart = reader::read_file(&output_path).unwrap();
    assert_eq!(chart.grid, compilation.grid);
    // bd is the third instrument: 2 + 2 * 4, highest bucket
    let row = chart.grid.row(1, Channel::BASS_DRUM).unwrap();
    assert_eq!(row[0], 2 + 2 * 4 + 3);
}

#[test]
fn test_preview_image_written() {
    let dir = tempdir().unwrap();
    let output_path = dir.path().join("out.dtx");
    let image_path = dir.path().join("out.png");

    let compiler = Compiler::new(ChartConfig::default()).unwrap();
    compiler
        .compile_to(&groove(), &output_path, Some(&image_path))
        .unwrap();

    let png = std::fs::read(&image_path).expect("preview missing");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    assert!(output_path.exists());
}

#[test]
fn test_unwritable_output_leaves_nothing() {
    let dir = tempdir().unwrap();
    let output_path = dir.path().join("missing").join("out.dtx");
    let compiler = Compiler::new(ChartConfig::default()).unwrap();
    assert!(compiler.compile_to(&groove(), &output_path, None).is_err());
    assert!(!output_path.exists());
}

#[test]
fn test_non_latin1_title_substituted() {
    let mut config = ChartConfig::default();
    config.title = "Drüms 太鼓".to_string();
    let (_, chart) = compile_and_parse(config, &[]);
    assert_eq!(chart.header.title, "Drüms ??");
}

#[test]
fn test_json_export() {
    let (_, chart) = compile_and_parse(fixed_config(), &groove());
    let json = serde_json::to_value(DtxJson::from(&chart)).unwrap();
    assert_eq!(json["bgm_wav"], "01");
    assert!(json["rows"].as_array().unwrap().len() >= 3);
}
