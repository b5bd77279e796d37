//! xlbrl CLI - Compile spreadsheet-authored XBRL taxonomy extensions

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use colored::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use xlbrl::{compiler, CompileConfig, Compiler, Diagnostics, Severity, Taxonomy, Workbook};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Compile spreadsheet-authored XBRL taxonomy extensions
#[derive(ClapParser)]
#[command(name = "xlbrl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every row the compiler classifies
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a workbook and write the schema and linkbases
    Compile {
        /// Input workbook
        input: PathBuf,

        /// Output directory (defaults to the workbook's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on row errors
        #[arg(long)]
        strict: bool,

        /// Do not read imported schemas from disk
        #[arg(long)]
        no_discover: bool,

        /// Output a JSON summary
        #[arg(short, long)]
        json: bool,
    },

    /// Compile a workbook and report diagnostics without writing anything
    Check {
        /// Input workbook
        input: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Output diagnostics as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Benchmark compilation
    Bench {
        /// Input workbook
        input: PathBuf,

        /// Number of iterations
        #[arg(short, long, default_value = "100")]
        iterations: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "xlbrl=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_diagnostics(diagnostics: &Diagnostics, limit: usize) {
    for diagnostic in diagnostics.iter().take(limit) {
        let tag = match diagnostic.severity {
            Severity::Error => "ERROR:".red(),
            Severity::Warning => "WARN:".yellow(),
        };
        println!("  {} {}", tag, diagnostic);
    }
    if diagnostics.len() > limit {
        println!("  ... and {} more", diagnostics.len() - limit);
    }
}

fn summary(input: &Path, taxonomy: &Taxonomy, written: &[PathBuf]) -> serde_json::Value {
    json!({
        "input": input.display().to_string(),
        "entry": taxonomy.entry_uri(),
        "linkbases": taxonomy.linkbase_refs(),
        "written": written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "errors": taxonomy.diagnostics().error_count(),
        "warnings": taxonomy.diagnostics().warning_count(),
        "diagnostics": taxonomy.diagnostics().as_slice(),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            output,
            strict,
            no_discover,
            json,
        } => {
            let start = Instant::now();
            let config = CompileConfig {
                strict,
                discover_imports: !no_discover,
                base_dir: None,
            };
            let taxonomy = Compiler::with_config(config)
                .compile_file(&input)
                .with_context(|| format!("Failed to compile {}", input.display()))?;

            let out_dir = output
                .or_else(|| input.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."));
            let written = taxonomy
                .save(&out_dir)
                .with_context(|| format!("Failed to write taxonomy to {}", out_dir.display()))?;
            let elapsed = start.elapsed();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary(&input, &taxonomy, &written))?);
                return Ok(());
            }

            println!("{} {}", "✓".green().bold(), input.display());
            for path in &written {
                println!("  Wrote: {}", path.display());
            }
            let diagnostics = taxonomy.diagnostics();
            println!("  Errors: {}", diagnostics.error_count());
            println!("  Warnings: {}", diagnostics.warning_count());
            print_diagnostics(diagnostics, 10);
            println!("  Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
        }

        Commands::Check { input, strict, json } => {
            let taxonomy = Compiler::new()
                .compile_file(&input)
                .with_context(|| format!("Failed to compile {}", input.display()))?;
            let diagnostics = taxonomy.diagnostics();
            let failed = diagnostics.has_errors() || (strict && !diagnostics.is_empty());

            if json {
                println!("{}", serde_json::to_string_pretty(&summary(&input, &taxonomy, &[]))?);
            } else if diagnostics.is_empty() {
                println!("{} {} - No problems found", "✓".green().bold(), input.display());
            } else {
                let mark = if failed { "✗".red().bold() } else { "!".yellow().bold() };
                println!("{} {}", mark, input.display());
                println!("  Errors: {}", diagnostics.error_count());
                println!("  Warnings: {}", diagnostics.warning_count());
                print_diagnostics(diagnostics, 20);
            }

            if failed {
                std::process::exit(1);
            }
        }

        Commands::Bench { input, iterations } => {
            let iterations = iterations.max(1);
            let workbook =
                Workbook::open(&input).with_context(|| format!("Failed to open {}", input.display()))?;
            let runner = Compiler::with_config(CompileConfig {
                base_dir: input.parent().map(Path::to_path_buf),
                ..CompileConfig::default()
            });
            let rows = workbook.sheet(0).map(|data| data.len()).unwrap_or(0);

            // Warmup
            for _ in 0..3 {
                runner.compile_workbook(&workbook)?;
            }

            let mut times = Vec::with_capacity(iterations);
            let mut elements = 0;
            for _ in 0..iterations {
                let start = Instant::now();
                let compilation = compiler::compile_workbook(&workbook)?;
                elements = compilation.elements.len();
                runner.emit(compilation)?;
                times.push(start.elapsed());
            }

            times.sort();
            let min = times[0];
            let max = times[times.len() - 1];
            let median = times[times.len() / 2];
            let mean = times.iter().sum::<Duration>() / times.len() as u32;

            println!("Benchmark Results for {}", input.display());
            println!("  Iterations: {}", iterations);
            println!("  Data rows: {}", rows);
            println!("  Elements: {}", elements);
            println!("  Min:    {:.3}ms", min.as_secs_f64() * 1000.0);
            println!("  Median: {:.3}ms", median.as_secs_f64() * 1000.0);
            println!("  Mean:   {:.3}ms", mean.as_secs_f64() * 1000.0);
            println!("  Max:    {:.3}ms", max.as_secs_f64() * 1000.0);
            println!("  Throughput: {:.0} rows/sec", rows as f64 / mean.as_secs_f64());
        }
    }

    Ok(())
}
