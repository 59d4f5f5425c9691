use clap::Parser;
use montuno::api::{generate_with, render, status_message};
use montuno::config::{GenerateOptions, RawOptions};
use montuno::midi::write_midi;
use montuno::{MontunoError, ProgressionEntry, Rendered, Voicing};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "montuno", about = "Voice a chord progression over a reference MIDI rhythm")]
#[command(version)]
struct Cli {
    /// Progression text, e.g. "Cmaj7 (8) G7 (10) Am7"
    progression: Option<String>,

    /// Read the progression from a file instead
    #[arg(short, long, conflicts_with = "progression")]
    file: Option<PathBuf>,

    /// Reference MIDI file supplying the rhythm
    #[arg(short, long)]
    reference: PathBuf,

    /// Output path (default: <reference>_montuno.mid next to the reference)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voicing mode
    #[arg(long)]
    mode: Option<String>,

    /// Group reference notes by clave: 2-3 or 3-2
    #[arg(long)]
    clave: Option<String>,

    /// Directives active from the first chord: octaves, double-octaves,
    /// tenths, thirteenths (comma separated)
    #[arg(long)]
    harmonization: Option<String>,

    /// Print the computed voicings as YAML
    #[arg(long)]
    print_voicings: bool,
}

/// One `--print-voicings` entry: the parsed chord with its voicing
#[derive(Serialize)]
struct VoicingReport<'a> {
    #[serde(flatten)]
    entry: &'a ProgressionEntry,
    voicing: &'a Voicing,
    notes: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(status) => println!("{}", status),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<String, MontunoError> {
    let source = match (&cli.progression, &cli.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
            MontunoError::ConfigError(format!("Error reading '{}': {}", path.display(), e))
        })?,
        (None, None) => {
            return Err(MontunoError::ConfigError(
                "No progression given: pass it as an argument or with --file".to_string(),
            ))
        }
    };

    let mut options = GenerateOptions::from_source(&source)?;
    options.apply(&RawOptions {
        mode: cli.mode.clone(),
        clave: cli.clave.clone(),
        harmonization: cli.harmonization.clone(),
        ..RawOptions::default()
    })?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.reference));

    if !cli.print_voicings {
        return generate_with(options.mode.mode(), &source, &cli.reference, &output, &options);
    }

    let reference = fs::read(&cli.reference).map_err(|e| {
        MontunoError::UnreadableReference(format!("{}: {}", cli.reference.display(), e))
    })?;
    let rendered = render(options.mode.mode(), &source, &reference, &options)?;

    match serde_yaml::to_string(&build_report(&rendered)) {
        Ok(yaml) => print!("{}", yaml),
        Err(e) => eprintln!("Could not print voicings: {}", e),
    }

    write_midi(&output, &rendered.bytes)?;
    Ok(status_message(&output))
}

fn build_report(rendered: &Rendered) -> Vec<VoicingReport<'_>> {
    rendered
        .entries
        .iter()
        .zip(&rendered.voicings)
        .map(|(entry, voicing)| VoicingReport {
            entry,
            voicing,
            notes: voicing.note_names(),
        })
        .collect()
}

/// `song.mid` -> `song_montuno.mid` in the same directory
fn default_output(reference: &Path) -> PathBuf {
    let stem = reference
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reference".to_string());
    reference.with_file_name(format!("{}_montuno.mid", stem))
}
