use crate::error::{Result, T12Error};
use crate::schema::{Cell, RawGrid};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDateTime;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Workbook,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Workbook),
            _ => Err(T12Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Loads a sheet from disk, choosing the reader by file extension.
pub fn load_grid(path: &Path) -> Result<RawGrid> {
    match InputFormat::from_path(path)? {
        InputFormat::Csv => load_csv(path),
        InputFormat::Workbook => load_workbook(path),
    }
}

pub fn load_csv(path: &Path) -> Result<RawGrid> {
    let file = File::open(path)?;
    let grid = read_csv_grid(file)?;
    debug!(
        "Loaded {} ({} rows x {} columns)",
        path.display(),
        grid.height(),
        grid.width()
    );
    Ok(grid)
}

/// Reads headerless CSV. Rows may have different lengths; every non-empty
/// field is kept as text for the normalizer to interpret.
pub fn read_csv_grid<R: Read>(reader: R) -> Result<RawGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from).collect());
    }

    Ok(RawGrid::new(rows))
}

/// Reads the first worksheet of an Excel or OpenDocument workbook.
pub fn load_workbook(path: &Path) -> Result<RawGrid> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| T12Error::NoWorksheet(path.display().to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let grid = grid_from_range(&range);

    debug!(
        "Loaded sheet '{}' from {} ({} rows x {} columns)",
        sheet_name,
        path.display(),
        grid.height(),
        grid.width()
    );

    Ok(grid)
}

/// Converts a calamine range to a grid anchored at A1, so column indices
/// match the sheet even when the used range starts further in.
pub fn grid_from_range(range: &Range<Data>) -> RawGrid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for source_row in range.rows() {
        let mut row = vec![Cell::Empty; col_offset];
        row.extend(source_row.iter().map(cell_from_data));
        rows.push(row);
    }

    RawGrid::new(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::String(text) => Cell::from(text.as_str()),
        Data::Bool(flag) => Cell::Text(if *flag { "True" } else { "False" }.to_string()),
        // Dates stay textual so header rows of month dates never count as values.
        Data::DateTime(value) => value
            .as_datetime()
            .map(|dt| Cell::Text(render_datetime(dt)))
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::from(text.as_str()),
    }
}

fn render_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}
