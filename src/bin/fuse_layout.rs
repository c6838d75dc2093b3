//! Fuse recorded detector output into a reading-ordered element table.
//!
//! Reads a recorded detection snapshot (page geometry plus raw structured and
//! visual detector output), runs the reconciliation pipeline and writes the
//! element table as JSON.
//!
//! Usage:
//!   cargo run --release --bin fuse_layout -- detections.json
//!   cargo run --release --bin fuse_layout -- detections.json --config fusion.json --output table.json
//!   cargo run --release --bin fuse_layout -- detections.json --text

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use layout_fusion::detectors::recorded::RecordedDocument;
use layout_fusion::pipeline::{ElementPipeline, PipelineConfig};

struct FuseArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    text: bool,
}

impl FuseArgs {
    fn from_args() -> Option<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut input = None;
        let mut config = None;
        let mut output = None;
        let mut text = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        config = Some(PathBuf::from(&args[i]));
                    }
                },
                "--output" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        output = Some(PathBuf::from(&args[i]));
                    }
                },
                "--text" => {
                    text = true;
                },
                other if input.is_none() && !other.starts_with('-') => {
                    input = Some(PathBuf::from(other));
                },
                other => {
                    eprintln!("Ignoring unknown argument: {}", other);
                },
            }
            i += 1;
        }

        Some(Self {
            input: input?,
            config,
            output,
            text,
        })
    }
}

fn load_config(args: &FuseArgs) -> layout_fusion::Result<PipelineConfig> {
    match &args.config {
        Some(path) => PipelineConfig::from_json(&std::fs::read_to_string(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn run(args: &FuseArgs, config: PipelineConfig) -> layout_fusion::Result<()> {
    let doc = Arc::new(RecordedDocument::load(&args.input)?);
    let mut builder = ElementPipeline::builder(doc.clone()).config(config);
    if doc.has_structured() {
        builder = builder.structured_extractor(doc.clone());
    }
    if doc.has_visual() {
        builder = builder.visual_detector(doc.clone());
    }
    let pipeline = builder.build()?;

    let start = Instant::now();
    let table = pipeline.process()?;
    log::info!(
        "Fused {} page(s) into {} records in {:.2?}",
        table.report.pages,
        table.len(),
        start.elapsed()
    );

    let rendered = if args.text {
        table.plain_text()
    } else {
        table.to_json()?
    };
    match &args.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }

    if table.report.has_failures() {
        eprintln!("warning: {} page failure(s)", table.report.failed_pages.len());
        for failure in &table.report.failed_pages {
            eprintln!(
                "  page {} lost its {} output: {}",
                failure.page, failure.stage, failure.reason
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let Some(args) = FuseArgs::from_args() else {
        eprintln!("Usage: fuse_layout <detections.json> [--config <config.json>] [--output <path>] [--text]");
        return ExitCode::from(2);
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    // RUST_LOG still wins over the configured level.
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
