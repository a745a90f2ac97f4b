use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use fileminify::{
    process, BarProgress, Mode, ProcessOptions, ProcessSummary, Progress, RuleSet,
    SilentProgress, SUPPORTED_EXTENSIONS,
};
use humansize::{format_size, BINARY};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Minify PHP, SQL, JavaScript, CSS and Vue files by stripping comments and whitespace",
    long_about = None
)]
struct Args {
    /// File or directory to minify
    source: PathBuf,

    /// Combine all minified files into a single output file
    #[arg(long, short)]
    combine: bool,

    /// Output directory (or output file with --combine)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Only process Laravel application files and strip common boilerplate
    #[arg(long, short)]
    laravel: bool,

    /// Framework rule set to use instead of the built-in Laravel rules (implies --laravel)
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Log every file as it is processed
    #[arg(long, short)]
    verbose: bool,

    /// Don't show a progress bar
    #[arg(long)]
    no_progress: bool,
}

fn init_tracing(verbose: bool) {
    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_summary(summary: &ProcessSummary, rules: &RuleSet) {
    match summary.mode {
        Mode::File => {
            if let Some(report) = summary.files.first() {
                println!("{}", format!("Minified: {}", report.relative).bold());
                println!(
                    "  Original size: {}",
                    format_size(report.original_size, BINARY)
                );
                println!(
                    "  Minified size: {}",
                    format_size(report.minified_size, BINARY)
                );
                println!(
                    "  {}",
                    format!(
                        "Saved: {} ({:.2}%)",
                        format_size(report.saved(), BINARY),
                        report.saved_percent()
                    )
                    .green()
                );
            }
            println!("Output: {}", summary.output.display());
            return;
        }
        Mode::Directory => println!("{}", "Minification Summary".bold()),
        Mode::CombinedDirectory => println!("{}", "Combination Summary".bold()),
        Mode::Framework => println!(
            "{}",
            format!("{} Minification Summary", title_case(&rules.name)).bold()
        ),
        Mode::CombinedFramework => println!(
            "{}",
            format!("{} Combination Summary", title_case(&rules.name)).bold()
        ),
    }

    println!("========================================");
    println!("Total files found: {}", summary.total_files);
    println!("Successfully minified: {}", summary.minified);
    if matches!(summary.mode, Mode::Framework | Mode::CombinedFramework) {
        println!("Skipped (not selected): {}", summary.skipped);
    }
    if summary.failed > 0 {
        println!("{}", format!("Failed: {}", summary.failed).red());
    } else {
        println!("Failed: 0");
    }

    for (group, count) in summary.group_counts.iter().filter(|(_, n)| *n > 0) {
        println!("  - {}: {} files", group, count);
    }

    println!(
        "Total space saved: {}",
        format_size(summary.bytes_saved(), BINARY).bold().green()
    );
    if let Some(size) = summary.combined_size {
        println!("Combined file size: {}", format_size(size, BINARY).bold());
    }
    println!("Output: {}", summary.output.display());
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn run(args: Args) -> Result<bool> {
    let rules = match &args.rules {
        Some(path) => RuleSet::load(path)?,
        None => RuleSet::laravel()?,
    };

    let options = ProcessOptions {
        combine: args.combine,
        framework: args.laravel || args.rules.is_some(),
        output: args.output.clone(),
    };

    let mut progress: Box<dyn Progress> = if args.no_progress {
        Box::new(SilentProgress)
    } else {
        Box::new(BarProgress::new())
    };

    let summary = process(&args.source, &options, &rules, progress.as_mut())
        .with_context(|| {
            format!(
                "Failed to minify {} (supported types: {})",
                args.source.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )
        })?;

    print_summary(&summary, &rules);

    Ok(summary.is_success())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if run(args)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
