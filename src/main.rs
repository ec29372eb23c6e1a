//! fala-tts CLI - concatenative Brazilian Portuguese speech synthesis
//!
//! Two verbs:
//! - `build`: compile a recorded unit dataset into a voice database
//! - `synth`: synthesize text through a compiled database into a WAV file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fala_tts::db::builder::build_database;
use fala_tts::{audio, Engine, SAMPLE_RATE, VERSION};

/// Concatenative text-to-speech engine for Brazilian Portuguese
#[derive(Parser, Debug)]
#[command(name = "fala-tts")]
#[command(author, version, about, long_about = None)]
#[command(long_about = "
fala-tts synthesizes Brazilian Portuguese speech by concatenating
prerecorded letters and syllables from a compiled voice database.

Examples:
  # Compile a dataset into a database
  fala-tts build dataset/ voice.db

  # Synthesize speech
  fala-tts synth voice.db \"olá mundo\" output.wav

  # Half speed
  fala-tts synth voice.db \"olá mundo\" output.wav 0.5
")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a voice dataset into a unit database
    Build {
        /// Dataset root holding letters/ and syllables/ inventories
        dataset_dir: PathBuf,

        /// Output database file
        output: PathBuf,
    },

    /// Synthesize speech from text
    Synth {
        /// Compiled voice database
        database: PathBuf,

        /// Text to synthesize
        text: String,

        /// Output WAV file
        output: PathBuf,

        /// Playback speed (0.5 to 2.0); defaults to the configured speed
        speed: Option<f32>,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb
}

fn run_build(dataset_dir: &PathBuf, output: &PathBuf) -> Result<()> {
    if !dataset_dir.is_dir() {
        anyhow::bail!("Dataset directory not found: {:?}", dataset_dir);
    }

    let pb = create_progress_bar("Loading unit recordings...");
    let start = Instant::now();
    let stats = build_database(dataset_dir, output)
        .with_context(|| format!("Failed to build database from {dataset_dir:?}"))?;
    pb.finish_with_message(format!(
        "Database built in {:.1}s",
        start.elapsed().as_secs_f32()
    ));

    info!("Database written to {:?}", output);
    info!("  Units: {}", stats.unit_count);
    info!("  Max unit length: {} characters", stats.max_unit_chars);
    info!("  Total audio samples: {}", stats.total_samples);
    Ok(())
}

fn run_synth(
    database: &PathBuf,
    text: &str,
    output: &PathBuf,
    speed: Option<f32>,
) -> Result<()> {
    let mut engine = Engine::open(database)
        .with_context(|| format!("Failed to load database: {database:?}"))?;

    // Optional config next to the working directory; defaults otherwise
    engine.load_config("config.yaml")?;

    let speed = speed.unwrap_or(engine.config().default_speed);

    let text_preview: String = text.chars().take(50).collect();
    info!("Text: {} ({} chars)", text_preview, text.chars().count());
    info!(
        "Config: crossfade={:.1}ms (vowel={:.1}ms), word_pause={:.1}ms, speed={:.2}",
        engine.config().crossfade_ms,
        engine.config().crossfade_vowel_ms,
        engine.config().word_pause_ms,
        speed
    );

    let pb = create_progress_bar("Synthesizing...");
    let start = Instant::now();
    let samples = engine
        .synthesize(text, speed)
        .context("Synthesis failed")?;
    pb.finish_with_message(format!(
        "Synthesized in {:.2}s",
        start.elapsed().as_secs_f32()
    ));

    info!(
        "Generated {} samples ({:.2} seconds)",
        samples.len(),
        samples.len() as f32 / SAMPLE_RATE as f32
    );
    info!(
        "Units found: {}, missing: {}",
        engine.units_found(),
        engine.units_missing()
    );

    audio::wav::write_wav_mono(output, &samples, SAMPLE_RATE)
        .with_context(|| format!("Failed to write WAV: {output:?}"))?;
    info!("Written to {:?}", output);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    info!("fala-tts v{}", VERSION);

    match &cli.command {
        Commands::Build {
            dataset_dir,
            output,
        } => run_build(dataset_dir, output),
        Commands::Synth {
            database,
            text,
            output,
            speed,
        } => run_synth(database, text, output, *speed),
    }
}
