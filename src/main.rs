use clap::Parser;
use dtxck::compiler::channel::Channel;
use dtxck::compiler::note::Instrument;
use dtxck::{input, ChartConfig, Compiler};
use log::{info, LevelFilter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dtxck")]
#[command(version = "0.1.0")]
#[command(about = "Drum note to DTX chart compiler", long_about = None)]
struct Args {
    /// Output DTX file
    #[arg(required_unless_present_any = ["list_instruments", "dump_config"])]
    output: Option<PathBuf>,

    /// Input notes, MIDI or JSON (reads JSON from stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Chart configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also render a PNG preview of the chart
    #[arg(long)]
    image: Option<PathBuf>,

    /// Override the configured tempo
    #[arg(long)]
    bpm: Option<f64>,

    /// List the supported instruments
    #[arg(short = 'L', long)]
    list_instruments: bool,

    /// Print the default configuration as JSON
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<(), dtxck::Error> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let args = Args::parse();

    if args.list_instruments {
        for inst in Instrument::ALL {
            println!("{:3}  {}  {}", inst.pitch(), Channel::for_instrument(inst), inst.name());
        }
        return Ok(());
    }

    if args.dump_config {
        println!("{}", ChartConfig::default().to_json()?);
        return Ok(());
    }

    let Some(output) = args.output else {
        return Err(dtxck::Error::InvalidInput("output path is required".into()));
    };

    let mut config = match &args.config {
        Some(path) => ChartConfig::load(path)?,
        None => ChartConfig::default(),
    };
    if let Some(bpm) = args.bpm {
        config.bpm = bpm;
    }

    let compiler = Compiler::new(config)?;

    let compilation = match &args.input {
        Some(path) => compiler.compile_file(path, &output, args.image.as_deref())?,
        None => {
            let notes = input::read_json(std::io::stdin())?;
            compiler.compile_to(&notes, &output, args.image.as_deref())?
        }
    };

    info!(
        "{} chip(s) over {:.2}s written to {}",
        compilation.chips.len(),
        compilation.duration,
        output.display()
    );

    Ok(())
}
