pub mod compiler;
pub mod config;
pub mod dtx;
pub mod error;
pub mod input;
pub mod preview;

pub use compiler::{Compilation, Compiler};
pub use config::ChartConfig;
pub use error::Error;
