use serde::Serialize;
use speechwire_session::{DEFAULT_ENDPOINT, DEFAULT_OUTPUT_FORMAT, DEFAULT_VOICE};
use speechwire_transport::redact_endpoint;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{field_table, print_json, OutputFormat};

#[derive(Serialize)]
struct BuildInfo {
    schema_id: &'static str,
    name: &'static str,
    version: &'static str,
    target: &'static str,
    rustc: &'static str,
    git_hash: &'static str,
    default_endpoint: String,
    default_voice: &'static str,
    default_audio_format: &'static str,
}

impl BuildInfo {
    fn current() -> Self {
        Self {
            schema_id: "https://schemas.3leaps.dev/speechwire/cli/v1/version.schema.json",
            name: "speechwire",
            version: env!("CARGO_PKG_VERSION"),
            target: option_env!("SPEECHWIRE_BUILD_TARGET").unwrap_or("unknown"),
            rustc: option_env!("RUSTC_VERSION").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            default_endpoint: redact_endpoint(DEFAULT_ENDPOINT),
            default_voice: DEFAULT_VOICE,
            default_audio_format: DEFAULT_OUTPUT_FORMAT,
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.to_string()),
            ("version", self.version.to_string()),
            ("target", self.target.to_string()),
            ("rustc", self.rustc.to_string()),
            ("git_hash", self.git_hash.to_string()),
            ("default_endpoint", self.default_endpoint.clone()),
            ("default_voice", self.default_voice.to_string()),
            ("default_audio_format", self.default_audio_format.to_string()),
        ]
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        println!("speechwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let info = BuildInfo::current();
    match format {
        OutputFormat::Json => print_json(&info),
        OutputFormat::Table => println!("{}", field_table(info.rows())),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (field, value) in info.rows() {
                println!("{field}: {value}");
            }
        }
    }
    Ok(SUCCESS)
}
