//! Frame conversion tool
//!
//! Converts frames between Arrow IPC, JSON and CSV, pivots time series
//! frames between long and wide, and prints frame summaries.
//!
//! Usage:
//!   framectl convert --input frame.arrow --output frame.json
//!   framectl pivot --input long.json --output wide.arrow --direction long-to-wide --fill previous
//!   framectl inspect --input frame.arrow

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use tsframe::codec::{arrow, json};
use tsframe::config::{ArrowFormat, CodecConfig};
use tsframe::frame::CsvOptions;
use tsframe::prelude::*;
use tsframe::telemetry::Telemetry;

/// Frame conversion tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level
    #[arg(long, env = "TSFRAME_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-encode frames in another format
    Convert {
        #[command(flatten)]
        io: IoArgs,

        /// JSON sections to write (all, schema, data)
        #[arg(long, default_value = "all")]
        include: FrameInclude,

        /// Leave out the header row of field names in CSV output
        #[arg(long)]
        no_header: bool,

        /// Add a row of coarse field types to CSV output
        #[arg(long)]
        types: bool,
    },
    /// Reshape a time series frame
    Pivot {
        #[command(flatten)]
        io: IoArgs,

        #[arg(long, value_enum)]
        direction: Direction,

        /// Fill for missing long-to-wide cells: null, previous or a number
        #[arg(long)]
        fill: Option<String>,
    },
    /// Print a summary of each frame
    Inspect {
        /// Input file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format, detected from the extension when omitted
        #[arg(long, value_enum)]
        from: Option<Format>,
    },
}

#[derive(clap::Args, Debug)]
struct IoArgs {
    /// Input file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Input format, detected from the extension when omitted
    #[arg(long, value_enum)]
    from: Option<Format>,

    /// Output format, detected from the extension when omitted
    #[arg(long, value_enum)]
    to: Option<Format>,

    /// Arrow IPC layout for Arrow output
    #[arg(long, env = "TSFRAME_ARROW_FORMAT")]
    arrow_format: Option<ArrowFormat>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Arrow,
    Json,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    LongToWide,
    WideToLong,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("framectl", &args.log_level)?;

    match args.command {
        Command::Convert {
            io: io_args,
            include,
            no_header,
            types,
        } => {
            let frames = read_frames(&io_args.input, io_args.from)?;
            let csv = CsvOptions {
                include_names: !no_header,
                include_types: types,
                ..Default::default()
            };
            write_frames(&io_args, &frames, include, &csv)?;
            info!(frames = frames.len(), "Converted frames");
        }
        Command::Pivot {
            io: io_args,
            direction,
            fill,
        } => {
            let fill = fill.as_deref().map(parse_fill).transpose()?;
            let frames = read_frames(&io_args.input, io_args.from)?;
            let pivoted = frames
                .iter()
                .map(|frame| match direction {
                    Direction::LongToWide => long_to_wide(frame, fill),
                    Direction::WideToLong => wide_to_long(frame),
                })
                .collect::<Result<Frames>>()?;
            write_frames(&io_args, &pivoted, FrameInclude::All, &CsvOptions::default())?;
            info!(frames = pivoted.len(), direction = ?direction, "Pivoted frames");
        }
        Command::Inspect { input, from } => {
            let frames = read_frames(&input, from)?;
            let mut stdout = io::stdout().lock();
            for frame in &frames {
                describe(&mut stdout, frame)?;
            }
        }
    }

    Ok(())
}

fn parse_fill(s: &str) -> Result<FillMissing> {
    match s.trim().to_ascii_lowercase().as_str() {
        "null" => Ok(FillMissing::Null),
        "previous" => Ok(FillMissing::Previous),
        other => other
            .parse::<f64>()
            .map(FillMissing::Value)
            .map_err(|_| Error::Config(format!("invalid fill '{}'. Use null, previous or a number", s))),
    }
}

fn detect_format(path: &Path, explicit: Option<Format>) -> Result<Format> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("arrow") | Some("ipc") | Some("arrows") => Ok(Format::Arrow),
        Some("json") => Ok(Format::Json),
        Some("csv") => Ok(Format::Csv),
        _ => Err(Error::Config(format!(
            "cannot detect format of '{}'; pass --from/--to",
            path.display()
        ))),
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_frames(path: &Path, from: Option<Format>) -> Result<Frames> {
    let bytes = if is_stdio(path) {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        fs::read(path)?
    };
    let format = if is_stdio(path) {
        from.unwrap_or(Format::Json)
    } else {
        detect_format(path, from)?
    };

    match format {
        Format::Arrow => Ok(vec![arrow::decode(&bytes)?]),
        Format::Json => {
            let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
            if first == Some(&b'[') {
                json::decode_frames(&bytes)
            } else {
                Ok(vec![json::decode(&bytes)?])
            }
        }
        Format::Csv => Err(Error::Config("CSV is an output-only format".to_string())),
    }
}

fn write_frames(io_args: &IoArgs, frames: &[Frame], include: FrameInclude, csv: &CsvOptions) -> Result<()> {
    let format = if is_stdio(&io_args.output) {
        io_args.to.unwrap_or(Format::Json)
    } else {
        detect_format(&io_args.output, io_args.to)?
    };

    let bytes = match (format, frames) {
        (Format::Json, [frame]) => json::encode(frame, include)?.to_vec(),
        (Format::Json, frames) => json::encode_frames(frames, include)?.to_vec(),
        (Format::Arrow, [frame]) => {
            let arrow_format = match io_args.arrow_format {
                Some(format) => format,
                None => CodecConfig::from_env()?.arrow_format,
            };
            arrow::encode_with_format(frame, arrow_format)?
        }
        (Format::Csv, [frame]) => frame.to_csv(csv)?.into_bytes(),
        (format, frames) => {
            return Err(Error::Config(format!(
                "{:?} output holds exactly one frame, got {}",
                format,
                frames.len()
            )))
        }
    };

    if is_stdio(&io_args.output) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
    } else {
        fs::write(&io_args.output, &bytes)?;
    }
    Ok(())
}

fn describe<W: Write>(out: &mut W, frame: &Frame) -> Result<()> {
    let rows = frame.row_len()?;
    let schema = frame.time_series_schema();
    writeln!(
        out,
        "frame '{}' refId '{}': {} fields, {} rows, {:?} time series",
        frame.name,
        frame.ref_id,
        frame.fields.len(),
        rows,
        schema.kind
    )?;
    for (i, field) in frame.fields.iter().enumerate() {
        writeln!(
            out,
            "  [{}] {} {} {}",
            i,
            field.display_name(),
            field.field_type(),
            field.labels
        )?;
    }
    Ok(())
}
