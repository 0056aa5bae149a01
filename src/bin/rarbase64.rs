//! rarbase64 CLI
//!
//! Pack a file into damage-tolerant RARBase64 text, or unpack an artifact.
//! The direction is picked from the input name: `*.RARBase64` is decoded,
//! anything else is encoded.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use rarbase64::{
    decoded_path, encoded_path, is_encoded_path, Decoder, Encoder, Pipeline, RarArchiver,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rarbase64")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Encode files as damage-tolerant RARBase64 text and back")]
struct Cli {
    /// File to encode, or a .RARBase64 artifact to decode
    input: PathBuf,

    /// Output file when encoding, or when decoding with --raw
    /// (default: input with .RARBase64 added, or removed)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Directory the archiver extracts into when decoding without --raw
    /// (default: current directory)
    #[arg(short = 'C', long)]
    directory: Option<PathBuf>,

    /// Archiver executable
    #[arg(long, default_value = "rar")]
    rar: PathBuf,

    /// Recovery record size in percent
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100))]
    recovery: u8,

    /// Encode or decode the file bytes directly, without the archiver
    #[arg(long)]
    raw: bool,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.input.is_file() {
        bail!("Input not found: {}", cli.input.display());
    }

    let decode = is_encoded_path(&cli.input);
    check_flags(&cli, decode)?;

    if cli.raw {
        if decode {
            decode_raw(&cli)
        } else {
            encode_raw(&cli)
        }
    } else {
        let archiver = RarArchiver::new(&cli.rar);
        if !archiver.is_available() {
            bail!(
                "Archiver '{}' not found. Install RAR 5 or point --rar at it, \
                 or use --raw to skip compression",
                cli.rar.display()
            );
        }
        let pipeline = Pipeline::new(archiver).with_recovery_percent(cli.recovery);

        if decode {
            let directory = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
            let report = pipeline.unpack(&cli.input, &directory)?;
            if !report.is_clean() {
                eprintln!(
                    "Recovered from damaged input: {} lines discarded, {} characters dropped",
                    report.lines_discarded,
                    report.chars_sanitized + report.chars_trimmed
                );
            }
            Ok(())
        } else {
            let output = cli.output.clone().unwrap_or_else(|| encoded_path(&cli.input));
            pipeline.pack(&cli.input, &output)?;
            println!("Created: {}", output.display());
            Ok(())
        }
    }
}

/// Reject options the selected mode would silently ignore
fn check_flags(cli: &Cli, decode: bool) -> Result<()> {
    let extracting = decode && !cli.raw;
    if extracting && cli.output.is_some() {
        bail!("--output is not used when extracting through the archiver; use --directory");
    }
    if !extracting && cli.directory.is_some() {
        bail!("--directory only applies when extracting through the archiver; use --output");
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn encode_raw(cli: &Cli) -> Result<()> {
    let output = cli.output.clone().unwrap_or_else(|| encoded_path(&cli.input));
    Encoder::new().encode_file(&cli.input, &output)?;
    println!("Created: {}", output.display());
    Ok(())
}

fn decode_raw(cli: &Cli) -> Result<()> {
    let output = match &cli.output {
        Some(path) => path.clone(),
        None => decoded_path(&cli.input)
            .with_context(|| format!("Cannot derive output name from: {}", cli.input.display()))?,
    };

    let report = Decoder::new().decode_file(&cli.input, &output)?;
    if !report.is_clean() {
        eprintln!(
            "Recovered from damaged input: {} lines discarded, {} characters dropped",
            report.lines_discarded,
            report.chars_sanitized + report.chars_trimmed
        );
    }
    println!("Extracted: {}", output.display());
    Ok(())
}
