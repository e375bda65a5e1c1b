use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use verse_align::{
    compute_report, load_whisper_transcript, provider_timings, RealignerBuilder, RealignerConfig,
    ReferenceText,
};

#[path = "verse_realign/json_formatter.rs"]
mod json_formatter;

#[derive(Debug, Parser)]
#[command(name = "verse-realign")]
#[command(about = "Attach transcript word timings to the verses of a reference text")]
struct Args {
    /// Reference JSON: `{ "chapter_id"?, "verses": [ { "id", "text", ... } ] }`
    #[arg(long, env = "VERSE_ALIGN_REFERENCE")]
    reference: PathBuf,
    /// Whisper JSON with word timestamps. Without it, provider timings are emitted.
    #[arg(long, env = "VERSE_ALIGN_TRANSCRIPT")]
    transcript: Option<PathBuf>,
    /// First verse id (0 = last verse, negative counts back from the last).
    #[arg(long, env = "VERSE_ALIGN_FROM", default_value_t = 1, allow_negative_numbers = true)]
    from: i64,
    /// Last verse id (0 = last verse, negative counts back from the last).
    #[arg(long, env = "VERSE_ALIGN_TO", default_value_t = 0, allow_negative_numbers = true)]
    to: i64,
    #[arg(long, env = "VERSE_ALIGN_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "VERSE_ALIGN_MERGE_SPLIT_VERSES", default_value_t = false)]
    merge_split_verses: bool,
    #[arg(long, env = "VERSE_ALIGN_LOW_ACCURACY")]
    low_accuracy_threshold: Option<f64>,
    #[arg(long, env = "VERSE_ALIGN_OUT")]
    out: Option<PathBuf>,
    #[arg(long, env = "VERSE_ALIGN_REPORT")]
    report: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("verse-realign: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => RealignerConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => RealignerConfig::default(),
    };
    if args.merge_split_verses {
        config.merge_split_verses = true;
    }
    if let Some(threshold) = args.low_accuracy_threshold {
        config.low_accuracy_threshold = threshold;
    }
    if args.report.is_some() && args.transcript.is_none() {
        return Err("--report requires --transcript.".to_string());
    }

    let reference = ReferenceText::load(&args.reference)
        .and_then(|reference| reference.select_range(args.from, args.to))
        .map_err(|err| {
            format!(
                "Failed to load reference '{}': {err}",
                args.reference.display()
            )
        })?;

    let verses = match args.transcript.as_ref() {
        None => {
            tracing::info!(
                verses = reference.len(),
                "no transcript given, emitting provider timings"
            );
            provider_timings(&reference).map_err(|err| err.to_string())?
        }
        Some(path) => {
            let fragments = load_whisper_transcript(path).map_err(|err| {
                format!("Failed to load transcript '{}': {err}", path.display())
            })?;
            let realigner = RealignerBuilder::new(config.clone())
                .build()
                .map_err(|err| err.to_string())?;
            let output = realigner
                .realign(&reference, &fragments)
                .map_err(|err| format!("Realignment failed: {err}"))?;
            tracing::info!(
                fragments = fragments.len(),
                records = output.verses.len(),
                "realignment finished"
            );

            if let Some(report_path) = args.report.as_ref() {
                let report = compute_report(&reference, &output, &config)
                    .map_err(|err| format!("Failed to build report: {err}"))?;
                json_formatter::write_json(report_path, &report)?;
            }
            output.verses
        }
    };

    match args.out.as_ref() {
        Some(path) => json_formatter::write_json(path, &verses),
        None => json_formatter::print_json(&verses),
    }
}
