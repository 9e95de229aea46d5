//! VoiceFill - voice-guided form filling
//!
//! Terminal host form: asks for each field of a JSON schema by voice and
//! prints the collected values as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voicefill::config::Config;
use voicefill::fields::{self, FieldKind, FieldSpec};
use voicefill::i18n::{Catalog, Locale, LocaleResources};
use voicefill::session::{CollectedData, SessionUpdate, VoiceAssistant};
use voicefill::{asr, audio, tts};

/// Heart disease screening form used when no schema is given
const DEMO_FIELDS: &str = include_str!("../demos/heart_fields.json");

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in a form by voice
    Run(RunArgs),
    /// List input devices and measure the microphone level
    MicTest {
        /// Seconds to record
        #[arg(long, default_value_t = 2)]
        seconds: u64,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// JSON field schema (defaults to the built-in heart form)
    #[arg(short, long)]
    fields: Option<PathBuf>,

    /// Session language (en, te)
    #[arg(short, long)]
    language: Option<Locale>,

    /// Recognizer backend (console, script)
    #[arg(long)]
    recognizer: Option<String>,

    /// Answers file for the script recognizer
    #[arg(long)]
    script: Option<PathBuf>,

    /// TTS backend (console, system, none)
    #[arg(long)]
    tts: Option<String>,

    /// Speech rate, 1.0 is normal
    #[arg(long)]
    rate: Option<f32>,

    /// Check the input device before starting
    #[arg(long)]
    check_mic: bool,

    /// Persist the effective settings to the config file
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_file = args.config.clone().unwrap_or_else(voicefill::config::config_path);
    let mut config = Config::load_from(&config_file)?;

    let default_level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("🎙️ VoiceFill v{} starting...", env!("CARGO_PKG_VERSION"));

    match args.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(run_args) => run(&mut config, &config_file, run_args).await,
        Command::MicTest { seconds } => mic_test(seconds).await,
    }
}

async fn run(config: &mut Config, config_file: &Path, args: RunArgs) -> Result<()> {
    if let Some(language) = args.language {
        config.language = language;
    }
    if let Some(recognizer) = args.recognizer {
        config.recognizer = recognizer;
    }
    if let Some(engine) = args.tts {
        config.tts_engine = engine;
    }
    if let Some(rate) = args.rate {
        config.speech_rate = rate;
    }
    if args.save_config {
        config.save_to(config_file)?;
        info!("💾 Saved settings to {}", config_file.display());
    }

    let form = match &args.fields {
        Some(path) => fields::load_schema(path)
            .with_context(|| format!("loading field schema {}", path.display()))?,
        None => {
            let demo: Vec<FieldSpec> = serde_json::from_str(DEMO_FIELDS)?;
            fields::validate(&demo)?;
            demo
        }
    };

    let mut resources = LocaleResources::builtin(config.language);
    resources.load_overrides(Path::new(&config.locale_dir));
    let catalog = Arc::new(Catalog::from_resources(resources));
    let status_catalog = catalog.clone();

    let recognizer = asr::create_factory(&config.recognizer, args.script.as_deref())?;
    let engine = tts::create_engine(&config.tts_engine);
    let microphone = audio::create_microphone(args.check_mic);

    let (assistant, mut updates) = VoiceAssistant::new(
        catalog,
        config.timings(),
        config.speech_rate,
        recognizer,
        engine,
        microphone,
    )?;
    let session = assistant.spawn();

    if config.recognizer == "console" {
        println!(
            "Type your answers. Prefix interim text with '~' or report an error with '!code'."
        );
    }
    session.start(form.clone()).await?;

    let collected = loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(SessionUpdate::Finished(data)) => break Some(data),
                Some(update) => report(&update, &status_catalog),
                None => break None,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("⏹️ Interrupted");
                session.stop()?;
                break None;
            }
        }
    };
    session.shutdown().await?;

    match collected {
        Some(data) => {
            warn_out_of_range(&form, &data);
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        None => info!("Session ended without completing the form"),
    }
    Ok(())
}

fn report(update: &SessionUpdate, catalog: &Catalog) {
    match update {
        SessionUpdate::Status(status) => println!("[{}]", status.text(catalog)),
        SessionUpdate::Interim(text) if !text.is_empty() => println!("   … {}", text),
        SessionUpdate::Progress { processed, total } => {
            println!("Progress: {}/{}", processed, total)
        }
        SessionUpdate::Guidance(text) if !text.is_empty() => println!("Expected: {}", text),
        SessionUpdate::Error(e) => eprintln!("Error: {}", e),
        _ => {}
    }
}

/// The session accepts any number it hears; flag the ones the form would reject
fn warn_out_of_range(form: &[FieldSpec], data: &CollectedData) {
    for field in form {
        if !matches!(field.kind, FieldKind::Number { .. }) {
            continue;
        }
        let Some(value) = data.get(&field.name) else {
            continue;
        };
        match value.parse::<f64>() {
            Ok(n) if field.in_range(n) => {}
            _ => warn!(
                "⚠️ {} = {} is outside {}",
                field.name,
                value,
                field.guidance()
            ),
        }
    }
}

#[cfg(feature = "microphone")]
async fn mic_test(seconds: u64) -> Result<()> {
    let devices = audio::capture::list_input_devices()?;
    println!("Input devices:");
    for (i, name) in devices.iter().enumerate() {
        println!("  [{}] {}", i, name);
    }

    println!("Recording for {}s, say something...", seconds);
    let duration = std::time::Duration::from_secs(seconds);
    let energy =
        tokio::task::spawn_blocking(move || audio::capture::test_capture(duration)).await??;
    println!("RMS energy: {:.1}", energy);
    if energy < 50.0 {
        println!("⚠️ Very quiet input. Check the selected device and its gain.");
    }
    Ok(())
}

#[cfg(not(feature = "microphone"))]
async fn mic_test(_seconds: u64) -> Result<()> {
    println!("Microphone support is not compiled in. Rebuild with `--features microphone`.");
    Ok(())
}
