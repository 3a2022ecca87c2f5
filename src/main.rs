use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use t12_extractor::{
    load_grid, run_batch, write_csv, BatchConfig, BatchOutcome, ExportOptions, ExtractionConfig,
    T12Processor,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "t12-extract")]
#[command(about = "Extract Layer-1 line items from trailing-twelve-month statements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a single statement and write the extracted line items
    Extract {
        /// Input statement (.csv, .xlsx, .xls, .ods)
        file: PathBuf,

        /// Output path; defaults to stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Emit JSON instead of CSV
        #[arg(long)]
        json: bool,

        /// Add a Source_Row column pointing back at the sheet
        #[arg(long)]
        source_row: bool,

        /// Print the kept/pruned status of every row to stderr
        #[arg(long)]
        audit: bool,

        /// Extraction settings as JSON
        #[arg(long, env = "T12_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Process every matching statement in a directory
    Batch {
        #[arg(long, default_value = "data/input")]
        input: PathBuf,

        #[arg(long, default_value = "data/output")]
        output: PathBuf,

        /// Only files starting with this prefix are processed
        #[arg(long, default_value = "T12")]
        prefix: String,

        /// Extraction settings as JSON
        #[arg(long, env = "T12_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the JSON schema of the extraction settings
    Schema,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file,
            output,
            json,
            source_row,
            audit,
            config,
        } => {
            let processor = T12Processor::new(load_config(config.as_deref())?)?;
            let grid = load_grid(&file).with_context(|| format!("loading {}", file.display()))?;
            let extraction = processor
                .process(&grid)
                .with_context(|| format!("processing {}", file.display()))?;

            if audit {
                for (index, label, status) in extraction.audit_trail() {
                    eprintln!("{:>5}  {:<40}  {}", index, label, status);
                }
            }

            let mut sink: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    fs::File::create(path)
                        .with_context(|| format!("creating {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };

            if json {
                writeln!(sink, "{}", extraction.table.to_json()?)?;
            } else {
                let options = ExportOptions {
                    include_source_row: source_row,
                };
                write_csv(&extraction.table, &mut sink, &options)?;
            }

            eprintln!("{}", extraction.summary());
        }

        Command::Batch {
            input,
            output,
            prefix,
            config,
        } => {
            let batch = BatchConfig {
                input_dir: input,
                output_dir: output,
                file_prefix: prefix,
                extraction: load_config(config.as_deref())?,
                ..BatchConfig::default()
            };

            let report = run_batch(&batch)?;
            for file in &report.files {
                match &file.outcome {
                    BatchOutcome::Written { output, rows } => {
                        eprintln!("  ✓ {} → {} ({} rows)", file.input.display(), output.display(), rows)
                    }
                    BatchOutcome::Empty => {
                        eprintln!("  - {}: no line items extracted", file.input.display())
                    }
                    BatchOutcome::Failed { error } => {
                        eprintln!("  ✗ {}: {}", file.input.display(), error)
                    }
                }
            }

            if report.failed() > 0 {
                anyhow::bail!("{} of {} files failed", report.failed(), report.files.len());
            }
        }

        Command::Schema => {
            println!("{}", ExtractionConfig::schema_as_json()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ExtractionConfig::from_json(&json)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(ExtractionConfig::default()),
    }
}
