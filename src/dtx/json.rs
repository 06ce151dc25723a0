//! JSON serialization types for DTX charts

use super::base36;
use super::reader::DtxChart;
use serde::Serialize;
use std::collections::BTreeMap;

/// Top-level JSON structure for a chart
#[derive(Debug, Clone, Serialize)]
pub struct DtxJson {
    pub header: DtxHeaderJson,
    /// Sample declarations keyed by two-digit index
    pub wavs: BTreeMap<String, WavJson>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub avis: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgm_wav: Option<String>,
    /// Grid rows in file order
    pub rows: Vec<RowJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DtxHeaderJson {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub artist: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub preview: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub preimage: String,
    pub bpm: f64,
    pub dlevel: u32,
    /// Commands not interpreted by the reader
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WavJson {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<i32>,
}

/// One `(measure, channel)` row with its occupied slots
#[derive(Debug, Clone, Serialize)]
pub struct RowJson {
    pub measure: u32,
    pub channel: String,
    pub resolution: usize,
    pub chips: Vec<ChipJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChipJson {
    pub slot: usize,
    pub sample: String,
}

fn id(index: u16) -> String {
    base36::pair_string(index).unwrap_or_else(|| index.to_string())
}

impl From<&DtxChart> for DtxJson {
    fn from(chart: &DtxChart) -> Self {
        let wavs = chart
            .wavs
            .iter()
            .map(|(&index, file)| {
                (
                    id(index),
                    WavJson {
                        file: file.clone(),
                        volume: chart.volumes.get(&index).copied(),
                        pan: chart.pans.get(&index).copied(),
                    },
                )
            })
            .collect();

        let rows = chart
            .grid
            .iter()
            .map(|(key, row)| RowJson {
                measure: key.measure,
                channel: key.channel.to_string(),
                resolution: row.len(),
                chips: row
                    .iter()
                    .enumerate()
                    .filter(|(_, sample)| **sample != 0)
                    .map(|(slot, &sample)| ChipJson {
                        slot,
                        sample: id(sample),
                    })
                    .collect(),
            })
            .collect();

        let header = &chart.header;
        Self {
            header: DtxHeaderJson {
                title: header.title.clone(),
                artist: header.artist.clone(),
                comment: header.comment.clone(),
                preview: header.preview.clone(),
                preimage: header.preimage.clone(),
                bpm: header.bpm,
                dlevel: header.dlevel,
                extra: chart.extra.clone(),
            },
            wavs,
            avis: chart
                .avis
                .iter()
                .map(|(&index, file)| (id(index), file.clone()))
                .collect(),
            bgm_wav: chart.bgm_wav.map(id),
            rows,
        }
    }
}
