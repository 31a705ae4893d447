// Rusty Soundbank: SF2 to SFZ Converter
//
// Usage: rusty-soundbank <input.sf2> <output.sfz>
//
// Every preset of the input bank becomes `<stem> <preset>.sfz` inside a
// folder named after the output's stem, next to a folder of WAV samples.
// Set RUST_LOG=info (or debug) for more detail than warnings.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use rusty_soundbank::{Converter, OutputLayout, sf2};

#[derive(Parser)]
#[command(name = "rusty-soundbank")]
#[command(about = "Convert a SoundFont 2 bank into SFZ instruments")]
#[command(version)]
struct Cli {
    /// Input .sf2 file
    input: PathBuf,

    /// Output .sfz path; its stem names the output folder and files
    output: PathBuf,
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let bank = sf2::load(&cli.input)?;

    let layout = OutputLayout::from_output_path(&cli.output);
    fs::create_dir_all(layout.root())?;

    let mut converter = Converter::new(&bank, layout);
    for result in converter.convert_all() {
        match result {
            Ok(report) => println!("SFZ file generated: {}", report.document.display()),
            // A preset that cannot be written does not stop the others.
            Err(err) => error!("{err}"),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("❌ Error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
