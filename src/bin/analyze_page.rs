//! Analyze Page Geometry
//!
//! Runs the whitespace cover and table detection over one page described
//! as JSON and writes the resulting layout as JSON.
//!
//! Usage:
//!   cargo run --release --bin analyze_page -- page.json
//!   cargo run --release --bin analyze_page -- page.json --config cfg.json --output layout.json --verbose
//!
//! Set `RUST_LOG=debug` for per-pass statistics.

use page_geometry::config::Config;
use page_geometry::page::{PageAnalyzer, PageGeometry};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

struct AnalyzeConfig {
    page_path: PathBuf,
    config_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    verbose: bool,
}

impl AnalyzeConfig {
    fn from_args() -> Option<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut page_path = None;
        let mut config_path = None;
        let mut output_path = None;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        config_path = Some(PathBuf::from(&args[i]));
                    }
                },
                "--output" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        output_path = Some(PathBuf::from(&args[i]));
                    }
                },
                "--verbose" | "-v" => {
                    verbose = true;
                },
                other if !other.starts_with('-') && page_path.is_none() => {
                    page_path = Some(PathBuf::from(other));
                },
                other => {
                    eprintln!("Ignoring unknown argument: {}", other);
                },
            }
            i += 1;
        }

        Some(Self {
            page_path: page_path?,
            config_path,
            output_path,
            verbose,
        })
    }
}

fn run(args: &AnalyzeConfig) -> page_geometry::Result<()> {
    let config = match &args.config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let page = PageGeometry::from_file(&args.page_path)?;

    if args.verbose {
        println!("Page: {}", args.page_path.display());
        println!(
            "  {} words, {} images, {} letters, {} paths",
            page.words.len(),
            page.images.len(),
            page.letters.len(),
            page.paths.len()
        );
    }

    let start = Instant::now();
    let layout = PageAnalyzer::new(config).analyze(&page, None)?;
    let elapsed = start.elapsed();

    if args.verbose {
        println!("  {} whitespace rectangles", layout.whitespace.len());
        for table in &layout.tables {
            println!(
                "  table #{}: {} cells, bound {:?}",
                table.reading_order(),
                table.cell_count(),
                table.bound
            );
        }
        println!("  Time: {:?}", elapsed);
    }

    let json = serde_json::to_string_pretty(&layout)?;
    match &args.output_path {
        Some(path) => {
            fs::write(path, json)?;
            if args.verbose {
                println!("Output: {}", path.display());
            }
        },
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(args) = AnalyzeConfig::from_args() else {
        eprintln!("Usage: analyze_page <page.json> [--config cfg.json] [--output out.json] [--verbose]");
        return ExitCode::from(2);
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
