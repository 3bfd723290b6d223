// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatreel - scripted WhatsApp Business conversation playback.
//!
//! This is the binary entry point: `play`, `export`, `check` and `config`.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod export;
mod play;
mod script;

use std::path::PathBuf;

use chatreel_config::ChatreelConfig;
use chatreel_core::ChatreelError;
use chatreel_export::NetworkClass;
use clap::{Parser, Subcommand};

/// Chatreel - scripted WhatsApp Business conversation playback.
#[derive(Parser, Debug)]
#[command(name = "chatreel", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a conversation script and print its events.
    Play {
        /// Script file (.json or .toml).
        script: PathBuf,
        /// Speed multiplier (0 < speed <= 10).
        #[arg(long)]
        speed: Option<f64>,
        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
        /// Keep playing through auto-restarts until interrupted.
        #[arg(long = "loop")]
        repeat: bool,
    },
    /// Play a script on the software canvas and write an animated GIF.
    Export {
        script: PathBuf,
        /// Output file.
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long)]
        quality: Option<f32>,
        #[arg(long)]
        fps: Option<u32>,
        /// Capture duration in seconds.
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        scale: Option<f32>,
        #[arg(long)]
        speed: Option<f64>,
        /// Network class used for adaptive quality (slow-2g, 2g, 3g, 4g).
        #[arg(long)]
        network: Option<NetworkClass>,
        /// Apply the reduced-data profile.
        #[arg(long)]
        save_data: bool,
    },
    /// Validate a script without playing it.
    Check {
        script: PathBuf,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => chatreel_config::load_and_validate_path(path),
        None => chatreel_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            chatreel_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    match run(cli.command, config).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

/// Dispatch a subcommand. Returns the process exit code.
async fn run(command: Option<Commands>, config: ChatreelConfig) -> Result<i32, ChatreelError> {
    match command {
        Some(Commands::Play {
            script,
            speed,
            json,
            repeat,
        }) => {
            let conversation = script::load_script(&script)?;
            play::run_play(&config, conversation, speed, json, repeat).await
        }
        Some(Commands::Export {
            script,
            out,
            quality,
            fps,
            duration,
            scale,
            speed,
            network,
            save_data,
        }) => {
            let conversation = script::load_script(&script)?;
            let request = export::ExportRequest {
                out,
                quality,
                fps,
                duration,
                scale,
                speed,
                network,
                save_data,
            };
            export::run_export(&config, conversation, request).await?;
            Ok(0)
        }
        Some(Commands::Check { script, plain }) => {
            let conversation = script::load_script(&script)?;
            Ok(check::run_check(&conversation, plain))
        }
        Some(Commands::Config) => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| ChatreelError::Internal(format!("failed to render config: {e}")))?;
            print!("{rendered}");
            Ok(0)
        }
        None => {
            println!("chatreel: use --help for available commands");
            Ok(0)
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatreel={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = chatreel_config::load_and_validate_str("").expect("defaults are valid");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn parses_export_flags() {
        let cli = Cli::try_parse_from([
            "chatreel", "export", "demo.json", "--out", "demo.gif", "--fps", "12", "--network",
            "3g",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Export {
                fps, network, out, ..
            }) => {
                assert_eq!(fps, Some(12));
                assert_eq!(network, Some(NetworkClass::ThreeG));
                assert_eq!(out, PathBuf::from("demo.gif"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["chatreel", "check", "s.json", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }
}
