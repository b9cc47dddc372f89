use std::collections::BTreeMap;

use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{field_table, print_json, OutputFormat};

const ENV_VARS: &[&str] = &[
    "SPEECHWIRE_ENDPOINT",
    "SPEECHWIRE_VOICE",
    "SPEECHWIRE_AUDIO_FORMAT",
    "SPEECHWIRE_TIMEOUT",
    "SPEECHWIRE_OPEN_TIMEOUT",
    "SPEECHWIRE_FORMAT",
    "SPEECHWIRE_LOG_FORMAT",
    "SPEECHWIRE_LOG_LEVEL",
];

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    schema_id: &'static str,
    version: String,
    target: String,
    rust_version: String,
    git_hash: String,
    platform: PlatformInfo,
    dependencies: BTreeMap<String, String>,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut deps = BTreeMap::new();
    deps.insert("clap".to_string(), "4.5".to_string());
    deps.insert("tokio".to_string(), "1".to_string());
    deps.insert("tokio-tungstenite".to_string(), "0.26".to_string());
    deps.insert("rustls".to_string(), "0.23 (ring)".to_string());

    let mut env: BTreeMap<String, Option<String>> = ENV_VARS
        .iter()
        .map(|name| (name.to_string(), std::env::var(name).ok()))
        .collect();
    if let Some(Some(endpoint)) = env.get_mut("SPEECHWIRE_ENDPOINT") {
        *endpoint = speechwire_transport::redact_endpoint(endpoint);
    }

    let output = EnvInfoOutput {
        schema_id: "https://schemas.3leaps.dev/speechwire/cli/v1/envinfo.schema.json",
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        rust_version: option_env!("RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        dependencies: deps,
        environment: env,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    if let Some(target) = option_env!("SPEECHWIRE_BUILD_TARGET") {
        return target.to_string();
    }
    format!(
        "{}-unknown-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut rows = vec![
                ("version", output.version.clone()),
                ("target", output.target.clone()),
                ("rustc", output.rust_version.clone()),
                ("git_hash", output.git_hash.clone()),
                (
                    "platform",
                    format!("{} ({})", output.platform.os, output.platform.arch),
                ),
            ];
            rows.extend(
                output
                    .dependencies
                    .iter()
                    .map(|(name, version)| (name.as_str(), version.clone())),
            );
            rows.extend(output.environment.iter().map(|(name, value)| {
                (
                    name.as_str(),
                    value.clone().unwrap_or_else(|| "(not set)".to_string()),
                )
            }));
            println!("{}", field_table(rows));
        }
        OutputFormat::Pretty => {
            let set: Vec<String> = output
                .environment
                .iter()
                .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
                .collect();
            println!(
                "speechwire {} on {} ({}/{}) env=[{}]",
                output.version,
                output.target,
                output.platform.os,
                output.platform.arch,
                set.join(" ")
            );
        }
        OutputFormat::Raw => println!("{}", output.version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envinfo_json_has_schema_id() {
        let out = EnvInfoOutput {
            schema_id: "x",
            version: "0.1.0".to_string(),
            target: "a-b-c".to_string(),
            rust_version: "1.85.0".to_string(),
            git_hash: "abc".to_string(),
            platform: PlatformInfo {
                os: "linux".to_string(),
                arch: "x86_64".to_string(),
            },
            dependencies: BTreeMap::new(),
            environment: BTreeMap::from([("SPEECHWIRE_VOICE".to_string(), None)]),
        };

        let json = serde_json::to_string(&out).expect("envinfo output should serialize");
        assert!(json.contains("\"schema_id\""));
        assert!(json.contains("\"SPEECHWIRE_VOICE\":null"));
    }

    #[test]
    fn target_looks_like_triple() {
        assert!(target_triple().split('-').count() >= 3);
    }
}
