use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use speechwire_session::{DEFAULT_ENDPOINT, DEFAULT_OUTPUT_FORMAT, DEFAULT_VOICE};
use speechwire_subtitle::SplitBy;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod envinfo;
pub mod probe;
pub mod synthesize;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize speech and write audio and subtitles.
    Synthesize(SynthesizeArgs),
    /// Open a channel, report open latency, and close it.
    Probe(ProbeArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Synthesize(args) => synthesize::run(args, format),
        Command::Probe(args) => probe::run(args, format),
        Command::Version(args) => version::run(args, format),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

/// Options shared by every command that opens a channel.
#[derive(Args, Debug)]
pub struct ChannelArgs {
    /// Service endpoint URL.
    #[arg(long, env = "SPEECHWIRE_ENDPOINT", default_value = DEFAULT_ENDPOINT, hide_default_value = true)]
    pub endpoint: String,
    /// Audio output format requested from the service.
    #[arg(long, env = "SPEECHWIRE_AUDIO_FORMAT", default_value = DEFAULT_OUTPUT_FORMAT)]
    pub audio_format: String,
    /// Bound on waiting for the channel to open (e.g. 10s, 500ms).
    #[arg(long, env = "SPEECHWIRE_OPEN_TIMEOUT", default_value = "10s")]
    pub open_timeout: String,
}

#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// Text to speak.
    #[arg(long, short = 't', conflicts_with = "file")]
    pub text: Option<String>,
    /// Read text from a file. Reads stdin when neither --text nor --file is given.
    #[arg(long, short = 'f', conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Voice name.
    #[arg(long, short = 'v', env = "SPEECHWIRE_VOICE", default_value = DEFAULT_VOICE)]
    pub voice: String,
    /// Document language. Derived from the voice when unset.
    #[arg(long)]
    pub lang: Option<String>,
    /// Speaking rate (e.g. +0%, -25%).
    #[arg(long, default_value = "+0%", allow_hyphen_values = true)]
    pub rate: String,
    /// Pitch (e.g. +0Hz, -10Hz).
    #[arg(long, default_value = "+0Hz", allow_hyphen_values = true)]
    pub pitch: String,
    /// Volume (e.g. +0%, -50%).
    #[arg(long, default_value = "+0%", allow_hyphen_values = true)]
    pub volume: String,
    /// Write audio to this file. Without it, --format raw writes audio to stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Write subtitles to this file; .srt or .vtt.
    #[arg(long, value_name = "FILE")]
    pub subtitles: Option<PathBuf>,
    /// How cues are split.
    #[arg(long, default_value = "sentence")]
    pub split_by: SplitBy,
    /// Words, sentences or milliseconds per cue.
    #[arg(long, default_value = "1")]
    pub count: u32,
    /// Request sentence boundary metadata as well as word boundaries.
    #[arg(long)]
    pub sentence_boundaries: bool,
    /// Bound on the whole synthesis (e.g. 30s, 1500ms).
    #[arg(long, env = "SPEECHWIRE_TIMEOUT", default_value = "30s")]
    pub timeout: String,
    #[command(flatten)]
    pub channel: ChannelArgs,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

/// Parse `Ns`, `Nms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Single-threaded runtime for one command.
pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))
}
