//! # T12 Extractor
//!
//! Recovers the granular ("Layer-1") line items from a trailing-twelve-month
//! operating statement as people actually build them in spreadsheets: a
//! title block, free-text account names at an arbitrary indent, twelve month
//! columns somewhere to the right, and subtotal or net rows mixed in with
//! the real accounts.
//!
//! ## Pipeline
//!
//! - **Normalize**: every cell becomes a signed number (`$1,200`, `(50)` and `50-` included); anything else is zero
//! - **Locate**: the twelve month columns are the densest run of non-zero columns
//! - **Label**: each row's account name is the longest text left of the month band
//! - **Resolve**: rows whose total equals a contiguous aggregate of the rows above are pruned as subtotals or net figures
//! - **Extract**: kept rows with a label form the [`ResultTable`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use t12_extractor::*;
//!
//! let grid = load_grid(std::path::Path::new("T12_Maple_Court.csv"))?;
//! let extraction = process_t12(&grid)?;
//!
//! for row in &extraction.table {
//!     println!("{:<30} {:>12.2}", row.account, row.total);
//! }
//! println!("{}", extraction.summary());
//! ```

pub mod band;
pub mod batch;
pub mod error;
pub mod export;
pub mod extractor;
pub mod ingestion;
pub mod labeler;
pub mod normalize;
pub mod resolver;
pub mod schema;
pub mod utils;

pub use band::locate_band;
pub use batch::{run_batch, BatchConfig, BatchOutcome, BatchReport, FileReport};
pub use error::{Result, T12Error};
pub use export::{to_csv_string, write_csv, write_csv_file, ExportOptions};
pub use extractor::{apply_statuses, build_records, extract};
pub use ingestion::{load_csv, load_grid, load_workbook, read_csv_grid, InputFormat};
pub use labeler::best_label;
pub use normalize::{normalize_cell, normalize_text};
pub use resolver::SubtotalResolver;
pub use schema::*;
pub use utils::*;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything produced for one sheet: the band, the full audit trail and the extracted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct T12Extraction {
    pub band: ColumnBand,
    pub records: Vec<RowRecord>,
    pub table: ResultTable,
}

impl T12Extraction {
    pub fn summary(&self) -> ExtractionSummary {
        let mut summary = ExtractionSummary {
            band_start: self.band.start,
            rows: self.records.len(),
            layer_one: 0,
            subtotals: 0,
            net_calculations: 0,
            extracted: self.table.len(),
        };

        for record in &self.records {
            match record.status() {
                RowStatus::Kept => summary.layer_one += 1,
                RowStatus::Pruned(PruneReason::Subtotal { .. }) => summary.subtotals += 1,
                RowStatus::Pruned(PruneReason::NetCalculation) => summary.net_calculations += 1,
            }
        }

        summary
    }

    /// Audit lines for every row, kept or pruned.
    pub fn audit_trail(&self) -> impl Iterator<Item = (usize, &str, String)> {
        self.records
            .iter()
            .map(|record| (record.index, record.label.as_str(), record.status().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub band_start: usize,
    pub rows: usize,
    pub layer_one: usize,
    pub subtotals: usize,
    pub net_calculations: usize,
    pub extracted: usize,
}

impl fmt::Display for ExtractionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows, month band at column {}: {} kept, {} subtotals, {} net calculations, {} line items extracted",
            self.rows,
            self.band_start,
            self.layer_one,
            self.subtotals,
            self.net_calculations,
            self.extracted
        )
    }
}

#[derive(Default)]
pub struct T12Processor {
    config: ExtractionConfig,
}

impl T12Processor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn process(&self, grid: &RawGrid) -> Result<T12Extraction> {
        if grid.is_empty() {
            return Err(T12Error::EmptyInput);
        }

        let matrix = NumericMatrix::from_grid(grid);
        let band = locate_band(&matrix)?;
        debug!(
            "Grid is {} rows x {} columns, month band at {}",
            grid.height(),
            grid.width(),
            band
        );

        let mut records = build_records(grid, &matrix, band, self.config.min_label_chars);
        let row_sums: Vec<f64> = records.iter().map(RowRecord::row_sum).collect();

        let resolver = SubtotalResolver::new(self.config.resolver.clone());
        apply_statuses(&mut records, resolver.resolve(&row_sums));

        let table = extract(&records);
        let extraction = T12Extraction {
            band,
            records,
            table,
        };

        info!("{}", extraction.summary());
        Ok(extraction)
    }
}

pub fn process_t12(grid: &RawGrid) -> Result<T12Extraction> {
    T12Processor::default().process(grid)
}

pub fn process_t12_with_config(grid: &RawGrid, config: &ExtractionConfig) -> Result<T12Extraction> {
    T12Processor::new(config.clone())?.process(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Label in column 1, twelve equal months starting at column 2.
    fn line(label: &str, total: f64) -> Vec<Cell> {
        let mut row = vec![Cell::Empty, Cell::from(label)];
        row.extend((0..MONTHS).map(|_| Cell::Number(total / MONTHS as f64)));
        row
    }

    #[test]
    fn test_end_to_end_subtotal() {
        let grid = RawGrid::new(vec![
            line("Rent", 12.0),
            line("Parking", 7.0),
            line("Laundry", 11.0),
            line("Total", 30.0),
        ]);

        let extraction = process_t12(&grid).unwrap();

        assert_eq!(extraction.band, ColumnBand::new(2));
        assert_eq!(extraction.table.accounts(), vec!["Rent", "Parking", "Laundry"]);
        assert!(extraction
            .table
            .iter()
            .all(|row| row.status == LAYER_ONE_REASON));
        assert_eq!(
            extraction.records[3].status().to_string(),
            "Pruned: Subtotal of rows 0-2"
        );
        assert!((extraction.table.rows[2].total - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_to_end_net_operating_income() {
        let grid = RawGrid::new(vec![
            line("Total Revenue", 100.0),
            line("Total Expenses", 40.0),
            line("Net Operating Income", 60.0),
        ]);

        let extraction = process_t12(&grid).unwrap();

        assert_eq!(
            extraction.records[2].status(),
            &RowStatus::Pruned(PruneReason::NetCalculation)
        );
        assert_eq!(extraction.table.len(), 2);

        let summary = extraction.summary();
        assert_eq!(summary.layer_one, 2);
        assert_eq!(summary.net_calculations, 1);
        assert_eq!(summary.subtotals, 0);
    }

    #[test]
    fn test_degenerate_grids_fail_fast() {
        assert!(matches!(
            process_t12(&RawGrid::default()),
            Err(T12Error::EmptyInput)
        ));

        let narrow = RawGrid::from_rows(vec![vec!["Rent", "1", "2", "3"]]);
        assert!(matches!(
            process_t12(&narrow),
            Err(T12Error::GridTooNarrow { columns: 4, .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ExtractionConfig::default();
        config.min_label_chars = 0;
        assert!(T12Processor::new(config).is_err());
    }
}
