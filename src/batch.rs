use crate::error::Result;
use crate::export::{write_csv_file, ExportOptions};
use crate::ingestion::load_grid;
use crate::schema::ExtractionConfig;
use crate::T12Processor;
use glob::{glob, Pattern};
use log::{info, warn};
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BatchConfig {
    #[schemars(description = "Directory scanned for input statements")]
    pub input_dir: PathBuf,

    #[schemars(description = "Directory receiving one extracted CSV per input")]
    pub output_dir: PathBuf,

    #[schemars(description = "Only files whose name starts with this prefix are processed")]
    pub file_prefix: String,

    #[schemars(description = "Accepted file extensions, matched case-insensitively")]
    pub extensions: Vec<String>,

    #[schemars(description = "Prefix prepended to the input file stem to name the output")]
    pub output_prefix: String,

    pub include_source_row: bool,

    pub extraction: ExtractionConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
            file_prefix: "T12".to_string(),
            extensions: vec!["csv".to_string(), "xlsx".to_string(), "xls".to_string()],
            output_prefix: "L1_".to_string(),
            include_source_row: true,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl BatchConfig {
    /// `<output_dir>/<output_prefix><stem>.csv` for an input path.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output_dir
            .join(format!("{}{}.csv", self.output_prefix, stem))
    }

    fn accepts_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Written { output: PathBuf, rows: usize },
    /// Processed fine but no Layer-1 rows survived; nothing is written.
    Empty,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(|outcome| matches!(outcome, BatchOutcome::Written { .. }))
    }

    pub fn empty(&self) -> usize {
        self.count(|outcome| matches!(outcome, BatchOutcome::Empty))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, BatchOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&BatchOutcome) -> bool) -> usize {
        self.files
            .iter()
            .filter(|file| predicate(&file.outcome))
            .count()
    }
}

/// Input files matching `<input_dir>/<file_prefix>*.*` with an accepted extension, sorted.
pub fn discover_inputs(config: &BatchConfig) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}*.*",
        Pattern::escape(&config.input_dir.to_string_lossy()),
        Pattern::escape(&config.file_prefix)
    );

    let mut inputs: Vec<PathBuf> = glob(&pattern)?
        .filter_map(std::result::Result::ok)
        .filter(|path| path.is_file() && config.accepts_extension(path))
        .collect();
    inputs.sort();

    Ok(inputs)
}

/// Extracts every matching statement in `input_dir`. Sheets are independent
/// and run in parallel; a failing file is reported without stopping the rest.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    let processor = T12Processor::new(config.extraction.clone())?;
    let inputs = discover_inputs(config)?;
    fs::create_dir_all(&config.output_dir)?;

    info!(
        "Processing {} statements from {}",
        inputs.len(),
        config.input_dir.display()
    );

    let files: Vec<FileReport> = inputs
        .par_iter()
        .map(|input| {
            let outcome = match process_file(&processor, config, input) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Skipping {}: {}", input.display(), e);
                    BatchOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            FileReport {
                input: input.clone(),
                outcome,
            }
        })
        .collect();

    let report = BatchReport { files };
    info!(
        "Batch finished: {} written, {} empty, {} failed",
        report.written(),
        report.empty(),
        report.failed()
    );

    Ok(report)
}

fn process_file(processor: &T12Processor, config: &BatchConfig, input: &Path) -> Result<BatchOutcome> {
    info!("Processing: {}", input.display());
    let grid = load_grid(input)?;
    let extraction = processor.process(&grid)?;

    if extraction.table.is_empty() {
        warn!("No Layer-1 rows extracted from {}", input.display());
        return Ok(BatchOutcome::Empty);
    }

    let output = config.output_path_for(input);
    let options = ExportOptions {
        include_source_row: config.include_source_row,
    };
    write_csv_file(&extraction.table, &output, &options)?;
    info!(
        "{} rows saved to {}",
        extraction.table.len(),
        output.display()
    );

    Ok(BatchOutcome::Written {
        output,
        rows: extraction.table.len(),
    })
}
