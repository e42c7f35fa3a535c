mod decode;
mod encode;
mod targets;

use std::io::{stderr, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub enum Format {
    Tle,
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Tle, Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Tle => Some(clap::builder::PossibleValue::new("tle")),
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover the element set payload from a captured link frame.
    ///
    /// Undoes the DB DD and C0 00 escapes the link applies and prints the 256-bit
    /// payload as hex.
    Deescape {
        /// Hex text of the captured frame.
        #[arg(required_unless_present = "input")]
        capture: Option<String>,

        /// File of raw captured frame bytes.
        #[arg(short, long, conflicts_with = "capture")]
        input: Option<PathBuf>,
    },
    /// Decode an element set payload into a TLE.
    ///
    /// The payload does not carry the target's identity, i.e., name, catalog number,
    /// etc., so it is taken from --target or --identity.
    Decode {
        /// Hex text of a captured link frame.
        #[arg(short, long, group = "source")]
        capture: Option<String>,

        /// Hex text of a bare 256-bit payload.
        #[arg(short, long, group = "source")]
        payload: Option<String>,

        /// File of raw captured frame bytes.
        #[arg(short, long, group = "source")]
        input: Option<PathBuf>,

        /// Built-in target providing the identity fields. See the targets command.
        #[arg(short, long, default_value = "diwata-2b")]
        target: String,

        /// JSON file providing the identity fields. Overrides --target.
        #[arg(long, value_name = "path")]
        identity: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "tle")]
        format: Format,

        /// Output file path. Defaults to stdout.
        #[arg(short, long, value_name = "path")]
        output: Option<PathBuf>,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,
    },
    /// Encode a TLE into a payload and the commands that upload it.
    Encode {
        /// TLE file with an optional name line, or - for stdin.
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Format,
    },
    /// List the built-in targets.
    Targets {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Format,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("TLELINK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA")
    );

    match &cli.command {
        Commands::Deescape { capture, input } => {
            let source = match (capture, input) {
                (Some(text), None) if text == "-" => {
                    let mut text = String::new();
                    std::io::stdin()
                        .read_to_string(&mut text)
                        .context("reading stdin")?;
                    decode::Source::Capture(text)
                }
                (Some(text), None) => decode::Source::Capture(text.clone()),
                (None, Some(path)) => decode::Source::Input(path.clone()),
                _ => bail!("provide either a capture or --input"),
            };
            let payload = decode::payload(&source)?;
            println!("{payload}");
            Ok(())
        }
        Commands::Decode {
            capture,
            payload,
            input,
            target,
            identity,
            format,
            output,
            clobber,
        } => {
            if let Some(output) = output {
                if !clobber && output.exists() {
                    bail!("{output:?} exists; use --clobber");
                }
            }
            let source = match (capture, payload, input) {
                (Some(text), None, None) => decode::Source::Capture(text.clone()),
                (None, Some(text), None) => decode::Source::Payload(text.clone()),
                (None, None, Some(path)) => decode::Source::Input(path.clone()),
                _ => bail!("provide one of --capture, --payload or --input"),
            };
            let identity = targets::identity(target, identity.as_deref())?;
            debug!("decoding {source:?} for {}", identity.name);
            decode::decode(&source, identity, format, output.as_deref())
        }
        Commands::Encode { input, format } => encode::encode_record(input, format),
        Commands::Targets { format } => targets::targets(format),
    }
}
