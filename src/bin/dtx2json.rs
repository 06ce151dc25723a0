//! DTX to JSON converter

use clap::Parser;
use dtxck::dtx::{reader, DtxJson};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dtx2json")]
#[command(version = "0.1.0")]
#[command(about = "Convert DTX charts to JSON", long_about = None)]
struct Args {
    /// Input DTX file
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let chart = reader::read_file(&args.input)?;
    let dtx_json = DtxJson::from(&chart);

    let json_string = if args.compact {
        serde_json::to_string(&dtx_json)?
    } else {
        serde_json::to_string_pretty(&dtx_json)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_string.as_bytes())?;
            file.write_all(b"\n")?;
        }
        None => {
            println!("{}", json_string);
        }
    }

    Ok(())
}
