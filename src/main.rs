use anyhow::{Context, Result};
use callguard::audio::capture::{list_devices, CpalAudioSource};
use callguard::audio::source::AudioSource;
use callguard::audio::wav::WavAudioSource;
use callguard::cli::{Cli, Commands};
use callguard::config::Config;
use callguard::pipeline::chunker::ChunkerConfig;
use callguard::pipeline::sink::StdoutSink;
use callguard::pipeline::supervisor::{PipelineSupervisor, SupervisorConfig};
use callguard::risk::scanner::RiskScanner;
use callguard::stt::remote::{RemoteConfig, RemoteTranscriber};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Devices) => list_audio_devices(),
        None => run(cli),
    }
}

/// Load configuration and run the pipeline until the source ends or the
/// user interrupts.
fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    config.validate()?;

    // Check the credential before touching any audio; a missing key should
    // fail in milliseconds, not after capture has started.
    let api_key = RemoteTranscriber::api_key_from_env()?;

    let remote_config = RemoteConfig {
        endpoint: config.backend.endpoint.clone(),
        model: config.backend.model.clone(),
        language: config.backend.language.clone(),
        sample_rate: config.audio.sample_rate,
        timeout: Duration::from_secs(config.backend.timeout_secs),
    };
    let transcriber = Arc::new(RemoteTranscriber::new(remote_config, api_key)?);
    let scanner = RiskScanner::new()?;
    let sink = Box::new(StdoutSink::new(cli.quiet));

    let supervisor_config = SupervisorConfig {
        chunker: ChunkerConfig::from_durations(
            config.chunking.chunk_ms,
            config.chunking.overlap_ms,
            config.audio.sample_rate,
        ),
        // 100ms frames
        frame_samples: (config.audio.sample_rate / 10) as usize,
        sample_rate: config.audio.sample_rate,
        quiet: cli.quiet,
        ..Default::default()
    };

    let file_mode = cli.file.is_some();
    let source: Box<dyn AudioSource> = match &cli.file {
        Some(path) => Box::new(
            WavAudioSource::from_path(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(CpalAudioSource::new(config.audio.device.as_deref())?),
    };

    let handle = PipelineSupervisor::new(supervisor_config)
        .start(source, transcriber, sink, scanner)
        .context("failed to start pipeline")?;

    if file_mode {
        // Finite source: drains on its own.
        let _ = handle.wait();
        return Ok(());
    }

    if !cli.quiet {
        eprintln!("callguard: listening (Ctrl+C to stop)");
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupted.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    while handle.is_running() && !interrupted.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    if !cli.quiet {
        eprintln!("callguard: stopping");
    }
    let _ = handle.stop();

    Ok(())
}

/// Load configuration from file or defaults.
///
/// Priority order:
/// 1. Custom config path (--config)
/// 2. Default path (~/.config/callguard/config.toml), defaults if missing
/// 3. Environment variable overrides
/// 4. CLI flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else if let Some(default_path) = Config::default_path() {
        Config::load_or_default(&default_path)?
    } else {
        Config::default()
    }
    .with_env_overrides();

    if let Some(device) = &cli.device {
        config.audio.device = Some(device.clone());
    }
    if let Some(chunk_ms) = cli.chunk {
        config.chunking.chunk_ms = chunk_ms;
    }
    if let Some(overlap_ms) = cli.overlap {
        config.chunking.overlap_ms = overlap_ms;
    }
    if let Some(language) = &cli.language {
        config.backend.language = language.clone();
    }
    if let Some(model) = &cli.model {
        config.backend.model = model.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.backend.endpoint = endpoint.clone();
    }

    Ok(config)
}

/// List available audio input devices.
fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}
