pub mod base36;
pub mod encoding;
pub mod grid;
pub mod header;
pub mod json;
pub mod reader;
pub mod writer;

pub use grid::{GridKey, MeasureGrid};
pub use header::DtxHeader;
pub use json::DtxJson;
pub use reader::{DtxChart, DtxReader};
pub use writer::{serialize, DtxWriter};
