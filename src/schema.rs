use crate::error::{Result, T12Error};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

/// Number of month columns in a trailing-twelve-month statement.
pub const MONTHS: usize = 12;

/// Audit reason carried by every row that survives subtotal pruning.
pub const LAYER_ONE_REASON: &str = "Layer 1 Item";

static EMPTY_CELL: Cell = Cell::Empty;

/// One raw spreadsheet cell as handed over by a loader.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text rendering used for labels. Integral numbers print without a fractional part.
    pub fn display_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(text) => Cow::Borrowed(text.as_str()),
            Cell::Number(value) => Cow::Owned(value.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

/// Rectangular view over the rows produced by a loader. Ragged rows are
/// allowed; cells past the end of a short row read as [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, width }
    }

    pub fn from_rows<R, C>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> &[Cell] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.row(row).get(col).unwrap_or(&EMPTY_CELL)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Normalized values for every cell of a [`RawGrid`], stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatrix {
    pub(crate) values: Vec<f64>,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
}

impl NumericMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.rows || col >= self.cols {
            return 0.0;
        }
        self.values[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        if row >= self.rows {
            return &[];
        }
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    /// Count of non-zero cells in each column.
    pub fn nonzero_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.cols];
        for row in 0..self.rows {
            for (col, value) in self.row(row).iter().enumerate() {
                if *value != 0.0 {
                    counts[col] += 1;
                }
            }
        }
        counts
    }

    /// The twelve month values of `row` inside `band`.
    pub fn month_values(&self, row: usize, band: ColumnBand) -> [f64; MONTHS] {
        let mut months = [0.0; MONTHS];
        for (slot, col) in months.iter_mut().zip(band.columns()) {
            *slot = self.get(row, col);
        }
        months
    }
}

/// Half-open run of twelve month columns `[start, start + 12)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBand {
    pub start: usize,
}

impl ColumnBand {
    pub fn new(start: usize) -> Self {
        Self { start }
    }

    pub fn end(&self) -> usize {
        self.start + MONTHS
    }

    pub fn columns(&self) -> Range<usize> {
        self.start..self.end()
    }
}

impl fmt::Display for ColumnBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "columns {}..{}", self.start, self.end())
    }
}

/// Why a row was classified as an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PruneReason {
    /// Sum of the active leaves between `first` and `last` (inclusive row indices).
    Subtotal { first: usize, last: usize },
    /// Difference of two contiguous groups of leaves, e.g. income minus expense.
    NetCalculation,
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneReason::Subtotal { first, last } => {
                write!(f, "Pruned: Subtotal of rows {}-{}", first, last)
            }
            PruneReason::NetCalculation => write!(f, "Pruned: Net Calculation (NOI)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowStatus {
    #[default]
    Kept,
    Pruned(PruneReason),
}

impl RowStatus {
    pub fn is_kept(&self) -> bool {
        matches!(self, RowStatus::Kept)
    }

    pub fn is_pruned(&self) -> bool {
        !self.is_kept()
    }

    pub fn prune_reason(&self) -> Option<&PruneReason> {
        match self {
            RowStatus::Kept => None,
            RowStatus::Pruned(reason) => Some(reason),
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Kept => f.write_str(LAYER_ONE_REASON),
            RowStatus::Pruned(reason) => fmt::Display::fmt(reason, f),
        }
    }
}

/// Per-row working state. Values are fixed at construction; only the
/// status moves, and only from kept to pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    pub index: usize,
    pub label: String,
    monthly_values: [f64; MONTHS],
    row_sum: f64,
    status: RowStatus,
}

impl RowRecord {
    pub fn new(index: usize, label: String, monthly_values: [f64; MONTHS]) -> Self {
        let row_sum = monthly_values.iter().sum();
        Self {
            index,
            label,
            monthly_values,
            row_sum,
            status: RowStatus::Kept,
        }
    }

    pub fn monthly_values(&self) -> &[f64; MONTHS] {
        &self.monthly_values
    }

    pub fn row_sum(&self) -> f64 {
        self.row_sum
    }

    pub fn status(&self) -> &RowStatus {
        &self.status
    }

    /// Marks the row as an aggregate. A row that is already pruned keeps its first reason.
    pub fn prune(&mut self, reason: PruneReason) {
        if self.status.is_kept() {
            self.status = RowStatus::Pruned(reason);
        }
    }
}

/// One Layer-1 line item in the final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResultRow {
    #[schemars(description = "Account label taken from the longest text cell left of the month band")]
    pub account: String,

    #[schemars(description = "Audit status; always 'Layer 1 Item' for extracted rows")]
    pub status: String,

    #[schemars(description = "Zero-based row index in the source sheet")]
    pub source_row: usize,

    #[schemars(description = "The twelve month values in source column order")]
    pub months: [f64; MONTHS],

    #[schemars(description = "Sum of the twelve month values")]
    pub total: f64,
}

/// Ordered Layer-1 rows; the sole output of the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResultTable {
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    pub fn accounts(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.account.as_str()).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResolverConfig {
    #[schemars(description = "How many preceding rows a subtotal may draw its leaves from")]
    pub lookback: usize,

    #[schemars(description = "Absolute tolerance when comparing a row total against a leaf aggregate")]
    pub tolerance: f64,

    #[schemars(
        description = "Relative tolerance added on top of the absolute one, scaled by the aggregate. 0.0 keeps the comparison purely absolute; 1e-5 matches numpy-style closeness."
    )]
    pub relative_tolerance: f64,

    #[schemars(description = "Row totals below this magnitude are never treated as aggregates or leaves")]
    pub zero_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            lookback: 200,
            tolerance: 0.5,
            relative_tolerance: 0.0,
            zero_threshold: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractionConfig {
    #[schemars(description = "Subtotal detection settings")]
    pub resolver: ResolverConfig,

    #[schemars(description = "Minimum trimmed length, in characters, for a cell to be considered as a row label")]
    pub min_label_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            min_label_chars: 2,
        }
    }
}

impl ExtractionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let resolver = &self.resolver;
        for (name, value) in [
            ("tolerance", resolver.tolerance),
            ("relative_tolerance", resolver.relative_tolerance),
            ("zero_threshold", resolver.zero_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(T12Error::InvalidConfig(format!(
                    "{} must be a finite, non-negative number, got {}",
                    name, value
                )));
            }
        }

        if resolver.lookback == 0 {
            return Err(T12Error::InvalidConfig(
                "lookback must be at least 1 row".to_string(),
            ));
        }

        if self.min_label_chars == 0 {
            return Err(T12Error::InvalidConfig(
                "min_label_chars must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ExtractionConfig)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
