//! bcmon - Broadcast monitor for mpv
//!
//! Entry point: attaches to a running mpv through its IPC socket, or runs
//! one of the offline preview commands.

use anyhow::{Context, Result};
use bcmon::host::{ChannelCount, HostEvent};
use bcmon::ipc::Disconnect;
use bcmon::testing::RecordingHost;
use bcmon::timecode::format::format_with_profile;
use bcmon::{AppConfig, FramerateProfile, Session, TimecodeValue};
use std::path::PathBuf;
use tracing::{error, info};

#[cfg(unix)]
const DEFAULT_SOCKET: &str = "/tmp/mpvsocket";
#[cfg(windows)]
const DEFAULT_SOCKET: &str = r"\\.\pipe\mpvsocket";

/// What the command line asked for
enum Action {
    Attach,
    PrintConfig,
    WriteConfig,
    Timecode(String),
    Route(String),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bcmon=info".parse::<tracing_subscriber::filter::Directive>()?),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let mut action = Action::Attach;
    let mut socket = PathBuf::from(DEFAULT_SOCKET);
    let mut config_path: Option<PathBuf> = None;
    let mut fps: Option<f64> = None;
    let mut channels: u32 = 2;
    let mut loudness: Option<String> = None;
    let mut i = 1;

    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--version" | "-v" => {
                println!("bcmon {}", bcmon::VERSION);
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--print-config" => action = Action::PrintConfig,
            "--write-config" => action = Action::WriteConfig,
            flag @ ("--socket" | "-s" | "--config" | "-c" | "--timecode" | "-t" | "--fps"
            | "--route" | "-r" | "--channels" | "--loudness") => {
                let Some(value) = value else {
                    eprintln!("Error: {} requires a value", flag);
                    return Ok(());
                };
                match flag {
                    "--socket" | "-s" => socket = PathBuf::from(value),
                    "--config" | "-c" => config_path = Some(PathBuf::from(value)),
                    "--timecode" | "-t" => action = Action::Timecode(value.clone()),
                    "--route" | "-r" => action = Action::Route(value.clone()),
                    "--loudness" => loudness = Some(value.clone()),
                    "--fps" => match value.parse() {
                        Ok(v) => fps = Some(v),
                        Err(_) => {
                            eprintln!("Error: Invalid frame rate: {}", value);
                            return Ok(());
                        }
                    },
                    _ => match value.parse() {
                        Ok(v) => channels = v,
                        Err(_) => {
                            eprintln!("Error: Invalid channel count: {}", value);
                            return Ok(());
                        }
                    },
                }
                i += 2;
                continue;
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                return Ok(());
            }
        }
        i += 1;
    }

    let config_file = config_path.unwrap_or_else(AppConfig::path);
    let config = AppConfig::load_or_default(&config_file);

    match action {
        Action::Attach => attach(&socket, &config),
        Action::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Action::WriteConfig => {
            config.save(&config_file)?;
            println!("Config written to {}", config_file.display());
            Ok(())
        }
        Action::Timecode(input) => {
            preview_timecode(&input, fps);
            Ok(())
        }
        Action::Route(command) => {
            preview_route(&config, &command, channels, loudness.as_deref());
            Ok(())
        }
    }
}

fn print_help() {
    println!("Usage: bcmon [OPTIONS]");
    println!();
    println!("Attaches to mpv started with --input-ipc-server=PATH.");
    println!();
    println!("Options:");
    println!("  -s, --socket PATH       mpv IPC socket (default: {})", DEFAULT_SOCKET);
    println!("  -c, --config PATH       Config file (default: {})", AppConfig::path().display());
    println!("      --print-config      Print the effective config as JSON");
    println!("      --write-config      Write the effective config to the config file");
    println!("  -t, --timecode VALUE    Convert seconds or HH:MM:SS[:;]FF and exit");
    println!("      --fps FPS           Frame rate for --timecode (default: 25)");
    println!("  -r, --route COMMAND     Show the filter chain for a command and exit");
    println!("      --channels N        Channel count for --route (default: 2)");
    println!("      --loudness NAME     Loudness profile for --route");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Examples:");
    println!("  mpv --input-ipc-server={} video.mxf &", DEFAULT_SOCKET);
    println!("  bcmon");
    println!("  bcmon --timecode 60.06 --fps 29.97");
    println!("  bcmon --route pair:2 --channels 8 --loudness ebu_r128");
}

fn attach(socket: &std::path::Path, config: &AppConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async {
        tokio::select! {
            result = bcmon::ipc::run_socket(socket, config) => match result {
                Ok(Disconnect::Shutdown) => info!("mpv exited"),
                Ok(Disconnect::Closed) => info!("Connection closed"),
                Err(e) => {
                    error!(error = %e, "IPC session failed");
                    return Err(e);
                }
            },
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }
        Ok(())
    })
}

fn preview_timecode(input: &str, fps: Option<f64>) {
    let profile = FramerateProfile::classify(fps.or(Some(25.0)));
    println!("Frame rate: {}", profile.label());

    if let Ok(seconds) = input.parse::<f64>() {
        println!("Timecode:   {}", format_with_profile(Some(seconds), &profile));
        return;
    }

    match TimecodeValue::parse(input) {
        Ok(tc) => {
            let frames = tc.to_frame_count(&profile);
            println!("Timecode:   {}", tc);
            println!("Frames:     {}", frames);
            println!("Seconds:    {:.3}", frames as f64 / profile.frame_rate());
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn preview_route(config: &AppConfig, command: &str, channels: u32, loudness: Option<&str>) {
    let mut host = RecordingHost::new();
    host.channel_count = Some(ChannelCount::Count(channels));

    let mut session = Session::new(config);
    session.handle_event(&mut host, HostEvent::FileLoaded);

    if let Some(name) = loudness.filter(|name| *name != "none") {
        // One full loudness cycle at most
        for _ in 0..=config.loudness_profiles.len() {
            if session.audio.loudness().map(|p| p.name.as_str()) == Some(name) {
                break;
            }
            session.execute(&mut host, bcmon::ControlCommand::ToggleLoudness);
        }
        if session.audio.loudness().map(|p| p.name.as_str()) != Some(name) {
            eprintln!("Error: Unknown loudness profile: {}", name);
            return;
        }
    }

    host.take_commands();
    if session.dispatch(&mut host, command).is_none() {
        eprintln!("Error: Not a valid command: {}", command);
        return;
    }

    for message in host.messages() {
        println!("{}", message);
    }
    let chain = host.filter_chain();
    if chain.is_empty() {
        println!("(no filters)");
    }
    for stage in chain {
        println!("@{}:lavfi=[{}]", stage.label(), stage.to_lavfi());
    }
}
