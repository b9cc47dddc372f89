use std::time::Instant;

use serde::Serialize;
use speechwire_session::{edge_connector, open, EstablishConfig};
use speechwire_transport::{redact_endpoint, DuplexChannel};

use crate::cmd::{parse_duration, runtime, ProbeArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{field_table, print_json, OutputFormat};

#[derive(Serialize)]
struct ProbeOutput {
    schema_id: &'static str,
    endpoint: String,
    output_format: String,
    open_latency_ms: f64,
    connected: bool,
}

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = EstablishConfig {
        endpoint: args.channel.endpoint.clone(),
        open_timeout: parse_duration(&args.channel.open_timeout)?,
        output_format: args.channel.audio_format.clone(),
        ..EstablishConfig::default()
    };

    let started = Instant::now();
    let latency = runtime()?.block_on(async {
        let mut channel = open(&edge_connector(), &config).await?;
        let latency = started.elapsed();
        if let Err(err) = channel.close().await {
            tracing::debug!(error = %err, "closing probe channel failed");
        }
        Ok::<_, speechwire_session::SessionError>(latency)
    });
    let latency = latency.map_err(|err| session_error("probe failed", err))?;

    let out = ProbeOutput {
        schema_id: "https://schemas.3leaps.dev/speechwire/cli/v1/probe.schema.json",
        endpoint: redact_endpoint(&config.endpoint),
        output_format: config.output_format.clone(),
        open_latency_ms: (latency.as_secs_f64() * 1000.0 * 100.0).round() / 100.0,
        connected: true,
    };
    print_probe(&out, format);
    Ok(SUCCESS)
}

fn print_probe(out: &ProbeOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let table = field_table([
                ("endpoint", out.endpoint.clone()),
                ("output_format", out.output_format.clone()),
                ("open_latency_ms", format!("{:.2}", out.open_latency_ms)),
                ("connected", out.connected.to_string()),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "endpoint={} connected={} open_latency={:.2}ms",
            out.endpoint, out.connected, out.open_latency_ms
        ),
        OutputFormat::Raw => println!("{:.2}", out.open_latency_ms),
    }
}
