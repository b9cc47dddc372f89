use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use speechwire_session::{
    edge_connector, synthesize_with, EstablishConfig, Prosody, SessionConfig, Synthesis,
    SynthesisOptions, SynthesisRequest,
};
use speechwire_subtitle::{CueOptions, SubtitleFormat};

use crate::cmd::{parse_duration, runtime, SynthesizeArgs};
use crate::exit::{io_error, session_error, subtitle_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{cue_table, field_table, print_json, print_raw, OutputFormat};

#[derive(Serialize)]
struct SynthesisSummary {
    schema_id: &'static str,
    request_id: String,
    voice: String,
    output_format: String,
    mime_type: &'static str,
    audio_bytes: usize,
    audio_path: Option<PathBuf>,
    subtitle_path: Option<PathBuf>,
    cues: usize,
    metadata_events: usize,
    elapsed_ms: f64,
}

pub fn run(args: SynthesizeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.output.is_none() && format != OutputFormat::Raw {
        return Err(CliError::new(
            USAGE,
            "no --output file given; use --format raw to write audio to stdout",
        ));
    }
    let subtitle_format = args
        .subtitles
        .as_deref()
        .map(SubtitleFormat::from_path)
        .transpose()
        .map_err(|err| subtitle_error("invalid --subtitles path", err))?;

    let options = build_options(&args)?;

    let started = Instant::now();
    let synthesis = runtime()?
        .block_on(synthesize_with(&edge_connector(), &options, options.cues))
        .map_err(|err| session_error("synthesis failed", err))?;
    let elapsed = started.elapsed();

    if let Some(path) = &args.output {
        write_file(path, &synthesis.audio.data)?;
    }
    if let (Some(path), Some(subtitle_format)) = (&args.subtitles, subtitle_format) {
        write_file(path, synthesis.subtitle.render(subtitle_format).as_bytes())?;
    }

    let summary = SynthesisSummary {
        schema_id: "https://schemas.3leaps.dev/speechwire/cli/v1/synthesis-summary.schema.json",
        request_id: synthesis.request_id.clone(),
        voice: options.request.voice.clone(),
        output_format: options.establish.output_format.clone(),
        mime_type: synthesis.audio.mime_type,
        audio_bytes: synthesis.audio.len(),
        audio_path: args.output.clone(),
        subtitle_path: args.subtitles.clone(),
        cues: synthesis.subtitle.len(),
        metadata_events: synthesis.metadata.len(),
        elapsed_ms: (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0,
    };
    print_summary(&summary, &synthesis, format);
    Ok(SUCCESS)
}

fn build_options(args: &SynthesizeArgs) -> CliResult<SynthesisOptions> {
    let text = read_text(args)?;
    let deadline = parse_duration(&args.timeout)?;
    let open_timeout = parse_duration(&args.channel.open_timeout)?;

    Ok(SynthesisOptions {
        request: SynthesisRequest {
            text,
            voice: args.voice.clone(),
            lang: args.lang.clone(),
            prosody: Prosody {
                rate: args.rate.clone(),
                pitch: args.pitch.clone(),
                volume: args.volume.clone(),
            },
        },
        establish: EstablishConfig {
            endpoint: args.channel.endpoint.clone(),
            open_timeout,
            output_format: args.channel.audio_format.clone(),
            word_boundary: true,
            sentence_boundary: args.sentence_boundaries,
        },
        session: SessionConfig {
            deadline,
            ..SessionConfig::default()
        },
        cues: CueOptions::new(args.split_by, args.count),
    })
}

fn read_text(args: &SynthesizeArgs) -> CliResult<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(text)
}

fn write_file(path: &Path, data: &[u8]) -> CliResult<()> {
    fs::write(path, data).map_err(|err| io_error(&format!("failed writing {}", path.display()), err))
}

fn print_summary(summary: &SynthesisSummary, synthesis: &Synthesis, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => {
            let table = field_table([
                ("request_id", summary.request_id.clone()),
                ("voice", summary.voice.clone()),
                ("output_format", summary.output_format.clone()),
                ("audio_bytes", summary.audio_bytes.to_string()),
                ("audio_path", display_path(summary.audio_path.as_deref())),
                ("subtitle_path", display_path(summary.subtitle_path.as_deref())),
                ("metadata_events", summary.metadata_events.to_string()),
                ("elapsed_ms", format!("{:.2}", summary.elapsed_ms)),
            ]);
            println!("{table}");
            if !synthesis.subtitle.is_empty() {
                println!("{}", cue_table(&synthesis.subtitle.cues));
            }
        }
        OutputFormat::Pretty => {
            println!(
                "request={} voice={} audio={} bytes ({}) cues={} elapsed={:.2}ms",
                summary.request_id,
                summary.voice,
                summary.audio_bytes,
                summary.mime_type,
                summary.cues,
                summary.elapsed_ms
            );
        }
        OutputFormat::Raw => {
            if summary.audio_path.is_none() {
                print_raw(&synthesis.audio.data);
            }
        }
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}
